pub mod batch;
pub mod branching;
pub mod catalog;
pub mod completion;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod session;
pub mod store;
pub mod validate;

pub use batch::{next_batch, ModalBatch, DEFAULT_FIELDS_PER_MODAL};
pub use branching::{condition_matches, first_matching_action, resolve_flow, FlowPosition};
pub use catalog::Catalog;
pub use completion::{completion_state, CompletionState, Progress};
pub use domain::field::{
    BranchAction, BranchCondition, BranchingRule, CampaignId, ConditionOperator, FieldDefinition,
    FieldType, UserId, ValidationRules,
};
pub use domain::response::{OnboardingResponse, ResponseDraft};
pub use domain::session::ModalSession;
pub use errors::{CatalogError, EngineError};
pub use flows::engine::{EngineSettings, OnboardingEngine};
pub use flows::states::{FlowState, TurnInput, TurnOutput};
pub use session::{SessionManager, DEFAULT_SESSION_TTL_MINUTES};
pub use store::{
    CompletionEvent, FieldCatalog, NoopReferralNotifier, NotifyError, ReferralNotifier,
    ResponseStore, SessionStore, StoreError,
};
pub use validate::{validate, Validation};
