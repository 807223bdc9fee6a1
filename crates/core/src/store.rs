use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::field::{CampaignId, FieldDefinition, UserId};
use crate::domain::response::{OnboardingResponse, ResponseDraft};
use crate::domain::session::ModalSession;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}

/// Source of a campaign's field catalog. Returns rows as stored; ordering and
/// the enabled filter are applied by [`crate::catalog::Catalog::resolve`].
#[async_trait]
pub trait FieldCatalog: Send + Sync {
    async fn enabled_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<FieldDefinition>, StoreError>;
}

/// Durable response rows keyed by (campaign, user, field).
///
/// `upsert` must be idempotent on the composite key with last-write-wins on
/// `value`; `mark_completed` must flip every row for the user atomically.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn upsert(&self, draft: ResponseDraft) -> Result<(), StoreError>;

    async fn list_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Vec<OnboardingResponse>, StoreError>;

    async fn mark_completed(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError>;

    async fn delete_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError>;
}

/// Raw session rows keyed by (campaign, user). TTL semantics live in
/// [`crate::session::SessionManager`], not here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Option<ModalSession>, StoreError>;

    async fn put(&self, session: ModalSession) -> Result<(), StoreError>;

    async fn delete(&self, campaign_id: &CampaignId, user_id: &UserId)
        -> Result<(), StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompletionEvent {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub username: String,
    pub referral_id: Option<String>,
    pub referral_link_id: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("referral notification failed: {0}")]
    Delivery(String),
}

/// Attribution callback fired once per user when a campaign completes.
/// Delivery failure is reported to the caller but never fails the turn.
#[async_trait]
pub trait ReferralNotifier: Send + Sync {
    async fn completed(&self, event: &CompletionEvent) -> Result<(), NotifyError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopReferralNotifier;

#[async_trait]
impl ReferralNotifier for NoopReferralNotifier {
    async fn completed(&self, _event: &CompletionEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
