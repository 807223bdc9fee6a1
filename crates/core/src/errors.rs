use thiserror::Error;

use crate::store::StoreError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("campaign `{campaign_id}` has no enabled onboarding fields")]
    NotConfigured { campaign_id: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Message safe to show to the end user; the underlying detail stays in
    /// logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "Onboarding is not available for this campaign yet.",
            Self::Store(_) => "Your answers could not be saved. Please try again.",
        }
    }

    /// A retry can succeed for storage failures; a missing catalog cannot be
    /// fixed by retrying the turn.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
