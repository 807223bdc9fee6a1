use intake_core::store::StoreError;

pub mod catalog;
pub mod memory;
pub mod response;
pub mod session;

pub use catalog::SqlFieldCatalog;
pub use memory::{InMemoryFieldCatalog, InMemoryResponseStore, InMemorySessionStore};
pub use response::SqlResponseStore;
pub use session::SqlSessionStore;

pub(crate) fn backend_error(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}

pub(crate) fn decode_error(context: &str, error: impl std::fmt::Display) -> StoreError {
    StoreError::Decode(format!("{context}: {error}"))
}
