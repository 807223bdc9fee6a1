use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use intake_core::domain::field::{CampaignId, UserId};
use intake_core::domain::session::ModalSession;
use intake_core::store::{SessionStore, StoreError};

use super::{backend_error, decode_error};
use crate::DbPool;

/// Raw session rows. Expiry is the session manager's concern; this store
/// returns whatever is on disk.
pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn get(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Option<ModalSession>, StoreError> {
        let row = sqlx::query(
            "SELECT payload, expires_at FROM modal_sessions
             WHERE campaign_id = ? AND user_id = ?",
        )
        .bind(&campaign_id.0)
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String =
            row.try_get("payload").map_err(|error| decode_error("payload", error))?;
        let payload: serde_json::Value =
            serde_json::from_str(&payload).map_err(|error| decode_error("payload", error))?;
        let expires_at: DateTime<Utc> =
            row.try_get("expires_at").map_err(|error| decode_error("expires_at", error))?;

        Ok(Some(ModalSession {
            campaign_id: campaign_id.clone(),
            user_id: user_id.clone(),
            payload,
            expires_at,
        }))
    }

    async fn put(&self, session: ModalSession) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&session.payload)
            .map_err(|error| decode_error("payload", error))?;

        sqlx::query(
            "INSERT INTO modal_sessions (campaign_id, user_id, payload, expires_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (campaign_id, user_id) DO UPDATE SET
               payload = excluded.payload,
               expires_at = excluded.expires_at",
        )
        .bind(&session.campaign_id.0)
        .bind(&session.user_id.0)
        .bind(payload)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM modal_sessions WHERE campaign_id = ? AND user_id = ?")
            .bind(&campaign_id.0)
            .bind(&user_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }
}
