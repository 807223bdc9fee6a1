use chrono::{Duration, Utc};
use tracing::debug;

use crate::domain::field::{CampaignId, UserId};
use crate::domain::session::ModalSession;
use crate::store::{SessionStore, StoreError};

pub const DEFAULT_SESSION_TTL_MINUTES: u64 = 30;

/// Transient multi-step submission buffer with TTL-at-read semantics.
///
/// Expiry is enforced by timestamp comparison when a session is read; there
/// is no background sweeper, so an expired row sits in the store until the
/// next retrieve (which deletes it) or an explicit clear.
pub struct SessionManager<S> {
    store: S,
    ttl: Duration,
}

impl<S> SessionManager<S>
where
    S: SessionStore,
{
    pub fn new(store: S, ttl_minutes: u64) -> Self {
        Self { store, ttl: Duration::minutes(ttl_minutes.max(1) as i64) }
    }

    /// Overwrites any existing session for the key: a new partial submission
    /// supersedes the old one.
    pub async fn store(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
        payload: serde_json::Value,
    ) -> Result<(), StoreError> {
        let session = ModalSession {
            campaign_id: campaign_id.clone(),
            user_id: user_id.clone(),
            payload,
            expires_at: Utc::now() + self.ttl,
        };
        self.store.put(session).await
    }

    /// Never returns stale data: an expired session is deleted and reported
    /// absent, which silently restarts the flow for the user.
    pub async fn retrieve(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Option<ModalSession>, StoreError> {
        let Some(session) = self.store.get(campaign_id, user_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            debug!(
                campaign_id = %campaign_id.0,
                user_id = %user_id.0,
                "removing expired modal session on read"
            );
            self.store.delete(campaign_id, user_id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Used once a batch has been committed into durable response rows.
    pub async fn clear(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        self.store.delete(campaign_id, user_id).await
    }
}
