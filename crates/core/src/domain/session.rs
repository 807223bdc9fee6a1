use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::field::{CampaignId, UserId};

/// Transient buffer for a multi-field batch awaiting confirmation. Only one
/// live session exists per (campaign, user); a new store overwrites it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalSession {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl ModalSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
