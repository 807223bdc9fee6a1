use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use intake_core::domain::field::{CampaignId, FieldDefinition, UserId};
use intake_core::domain::response::{OnboardingResponse, ResponseDraft};
use intake_core::domain::session::ModalSession;
use intake_core::store::{FieldCatalog, ResponseStore, SessionStore, StoreError};

#[derive(Default)]
pub struct InMemoryFieldCatalog {
    campaigns: RwLock<HashMap<String, Vec<FieldDefinition>>>,
}

impl InMemoryFieldCatalog {
    pub async fn set_fields(&self, campaign_id: &CampaignId, fields: Vec<FieldDefinition>) {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign_id.0.clone(), fields);
    }
}

#[async_trait]
impl FieldCatalog for InMemoryFieldCatalog {
    async fn enabled_fields(
        &self,
        campaign_id: &CampaignId,
    ) -> Result<Vec<FieldDefinition>, StoreError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.get(&campaign_id.0).cloned().unwrap_or_default())
    }
}

type ResponseKey = (String, String, String);

#[derive(Default)]
pub struct InMemoryResponseStore {
    rows: RwLock<HashMap<ResponseKey, OnboardingResponse>>,
}

#[async_trait]
impl ResponseStore for InMemoryResponseStore {
    async fn upsert(&self, draft: ResponseDraft) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let key =
            (draft.campaign_id.0.clone(), draft.user_id.0.clone(), draft.field_key.clone());
        let (is_completed, created_at) = rows
            .get(&key)
            .map(|existing| (existing.is_completed, existing.created_at))
            .unwrap_or((false, Utc::now()));

        rows.insert(
            key,
            OnboardingResponse {
                campaign_id: draft.campaign_id,
                user_id: draft.user_id,
                username: draft.username,
                field_key: draft.field_key,
                value: draft.value,
                referral_id: draft.referral_id,
                referral_link_id: draft.referral_link_id,
                is_completed,
                created_at,
            },
        );
        Ok(())
    }

    async fn list_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Vec<OnboardingResponse>, StoreError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<OnboardingResponse> = rows
            .values()
            .filter(|row| row.campaign_id == *campaign_id && row.user_id == *user_id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.field_key.cmp(&b.field_key));
        Ok(matched)
    }

    async fn mark_completed(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        for row in rows.values_mut() {
            if row.campaign_id == *campaign_id && row.user_id == *user_id {
                row.is_completed = true;
            }
        }
        Ok(())
    }

    async fn delete_for_user(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        rows.retain(|_, row| !(row.campaign_id == *campaign_id && row.user_id == *user_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<(String, String), ModalSession>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<Option<ModalSession>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&(campaign_id.0.clone(), user_id.0.clone())).cloned())
    }

    async fn put(&self, session: ModalSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert((session.campaign_id.0.clone(), session.user_id.0.clone()), session);
        Ok(())
    }

    async fn delete(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&(campaign_id.0.clone(), user_id.0.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use intake_core::domain::field::{CampaignId, UserId};
    use intake_core::domain::response::ResponseDraft;
    use intake_core::store::ResponseStore;

    use crate::repositories::InMemoryResponseStore;

    fn draft(field_key: &str, value: &str) -> ResponseDraft {
        ResponseDraft {
            campaign_id: CampaignId("camp-1".to_owned()),
            user_id: UserId("user-1".to_owned()),
            username: "ann".to_owned(),
            field_key: field_key.to_owned(),
            value: value.to_owned(),
            referral_id: None,
            referral_link_id: None,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_on_the_composite_key() {
        let store = InMemoryResponseStore::default();
        let campaign_id = CampaignId("camp-1".to_owned());
        let user_id = UserId("user-1".to_owned());

        store.upsert(draft("name", "Ann")).await.expect("first upsert");
        store.upsert(draft("name", "Anna")).await.expect("second upsert");

        let rows = store.list_for_user(&campaign_id, &user_id).await.expect("list rows");
        assert_eq!(rows.len(), 1, "two upserts of one key must converge to one row");
        assert_eq!(rows[0].value, "Anna", "last write wins");
    }

    #[tokio::test]
    async fn mark_completed_covers_every_row_for_the_user() {
        let store = InMemoryResponseStore::default();
        let campaign_id = CampaignId("camp-1".to_owned());
        let user_id = UserId("user-1".to_owned());

        store.upsert(draft("name", "Ann")).await.expect("upsert name");
        store.upsert(draft("email", "ann@example.com")).await.expect("upsert email");
        store.mark_completed(&campaign_id, &user_id).await.expect("mark completed");

        let rows = store.list_for_user(&campaign_id, &user_id).await.expect("list rows");
        assert!(rows.iter().all(|row| row.is_completed), "no partial completion state");

        // Idempotent: a second call is harmless.
        store.mark_completed(&campaign_id, &user_id).await.expect("mark completed again");
    }

    #[tokio::test]
    async fn resubmission_preserves_completion_flag_and_created_at() {
        let store = InMemoryResponseStore::default();
        let campaign_id = CampaignId("camp-1".to_owned());
        let user_id = UserId("user-1".to_owned());

        store.upsert(draft("name", "Ann")).await.expect("upsert name");
        store.mark_completed(&campaign_id, &user_id).await.expect("mark completed");

        let before = store.list_for_user(&campaign_id, &user_id).await.expect("list")[0].clone();
        store.upsert(draft("name", "Anna")).await.expect("resubmit name");
        let after = store.list_for_user(&campaign_id, &user_id).await.expect("list")[0].clone();

        assert!(after.is_completed);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.value, "Anna");
    }

    #[tokio::test]
    async fn delete_for_user_scopes_to_the_key() {
        let store = InMemoryResponseStore::default();
        let campaign_id = CampaignId("camp-1".to_owned());

        store.upsert(draft("name", "Ann")).await.expect("upsert user-1");
        store
            .upsert(ResponseDraft {
                user_id: UserId("user-2".to_owned()),
                ..draft("name", "Ben")
            })
            .await
            .expect("upsert user-2");

        store
            .delete_for_user(&campaign_id, &UserId("user-1".to_owned()))
            .await
            .expect("delete user-1");

        assert!(store
            .list_for_user(&campaign_id, &UserId("user-1".to_owned()))
            .await
            .expect("list user-1")
            .is_empty());
        assert_eq!(
            store
                .list_for_user(&campaign_id, &UserId("user-2".to_owned()))
                .await
                .expect("list user-2")
                .len(),
            1
        );
    }
}
