use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::field::{CampaignId, UserId};

/// One answered field, durable. At most one row exists per
/// (campaign, user, field); resubmission overwrites `value`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub username: String,
    pub field_key: String,
    pub value: String,
    pub referral_id: Option<String>,
    pub referral_link_id: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Write-side shape for an upsert. The store fills `created_at` on first
/// insert and leaves `is_completed` untouched on conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseDraft {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub username: String,
    pub field_key: String,
    pub value: String,
    pub referral_id: Option<String>,
    pub referral_link_id: Option<String>,
}

impl OnboardingResponse {
    pub fn has_value(&self) -> bool {
        !self.value.trim().is_empty()
    }
}
