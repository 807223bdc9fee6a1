pub mod engine;
pub mod states;

pub use engine::{EngineSettings, OnboardingEngine};
pub use states::{FlowState, TurnInput, TurnOutput};
