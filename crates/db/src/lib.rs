pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoCampaign, SeedResult, VerificationResult};
pub use repositories::{
    InMemoryFieldCatalog, InMemoryResponseStore, InMemorySessionStore, SqlFieldCatalog,
    SqlResponseStore, SqlSessionStore,
};
