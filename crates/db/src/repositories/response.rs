use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use intake_core::domain::field::{CampaignId, UserId};
use intake_core::domain::response::{OnboardingResponse, ResponseDraft};
use intake_core::store::{ResponseStore, StoreError};

use super::{backend_error, decode_error};
use crate::DbPool;

pub struct SqlResponseStore {
    pool: DbPool,
}

impl SqlResponseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseStore for SqlResponseStore {
    /// Last-write-wins on the composite key. `created_at` and `is_completed`
    /// survive resubmission of the same field.
    async fn upsert(&self, draft: ResponseDraft) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO onboarding_responses
               (campaign_id, user_id, field_key, username, value,
                referral_id, referral_link_id, is_completed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
             ON CONFLICT (campaign_id, user_id, field_key) DO UPDATE SET
               value = excluded.value,
               username = excluded.username,
               referral_id = excluded.referral_id,
               referral_link_id = excluded.referral_link_id",
        )
        .bind(&draft.campaign_id.0)
        .bind(&draft.user_id.0)
        .bind(&draft.field_key)
        .bind(&draft.username)
        .bind(&draft.value)
        .bind(&draft.referral_id)
        .bind(&draft.referral_link_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Vec<OnboardingResponse>, StoreError> {
        let rows = sqlx::query(
            "SELECT campaign_id, user_id, field_key, username, value,
                    referral_id, referral_link_id, is_completed, created_at
             FROM onboarding_responses
             WHERE campaign_id = ? AND user_id = ?
             ORDER BY created_at, field_key",
        )
        .bind(&campaign_id.0)
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend_error)?;

        rows.into_iter().map(decode_response).collect()
    }

    /// A single UPDATE statement, so every row for the user flips in one
    /// atomic step.
    async fn mark_completed(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE onboarding_responses SET is_completed = 1
             WHERE campaign_id = ? AND user_id = ?",
        )
        .bind(&campaign_id.0)
        .bind(&user_id.0)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM onboarding_responses WHERE campaign_id = ? AND user_id = ?")
            .bind(&campaign_id.0)
            .bind(&user_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }
}

fn decode_response(row: SqliteRow) -> Result<OnboardingResponse, StoreError> {
    let created_at: DateTime<Utc> =
        row.try_get("created_at").map_err(|error| decode_error("created_at", error))?;

    Ok(OnboardingResponse {
        campaign_id: CampaignId(
            row.try_get("campaign_id").map_err(|error| decode_error("campaign_id", error))?,
        ),
        user_id: UserId(
            row.try_get("user_id").map_err(|error| decode_error("user_id", error))?,
        ),
        field_key: row.try_get("field_key").map_err(|error| decode_error("field_key", error))?,
        username: row.try_get("username").map_err(|error| decode_error("username", error))?,
        value: row.try_get("value").map_err(|error| decode_error("value", error))?,
        referral_id: row
            .try_get("referral_id")
            .map_err(|error| decode_error("referral_id", error))?,
        referral_link_id: row
            .try_get("referral_link_id")
            .map_err(|error| decode_error("referral_link_id", error))?,
        is_completed: row
            .try_get("is_completed")
            .map_err(|error| decode_error("is_completed", error))?,
        created_at,
    })
}
