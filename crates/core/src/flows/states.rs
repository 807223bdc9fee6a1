use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::completion::Progress;
use crate::domain::field::{CampaignId, FieldDefinition, UserId};

/// Lifecycle of one user's flow. `InProgress` carries the active step, which
/// is recomputed from recorded responses each turn rather than stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    NotStarted,
    InProgress { step: u32 },
    Completed,
}

/// One inbound user turn: zero or more answered fields keyed by field key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnInput {
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub username: String,
    pub responses: HashMap<String, String>,
    pub referral_id: Option<String>,
    pub referral_link_id: Option<String>,
}

impl TurnInput {
    pub fn new(
        campaign_id: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            campaign_id: CampaignId(campaign_id.into()),
            user_id: UserId(user_id.into()),
            username: username.into(),
            responses: HashMap::new(),
            referral_id: None,
            referral_link_id: None,
        }
    }

    pub fn answer(mut self, field_key: impl Into<String>, value: impl Into<String>) -> Self {
        self.responses.insert(field_key.into(), value.into());
        self
    }

    pub fn referral(mut self, referral_id: impl Into<String>) -> Self {
        self.referral_id = Some(referral_id.into());
        self
    }
}

/// What the chat surface needs to render after a turn.
///
/// `success` reports storage health: validation failures land in `errors`
/// without clearing it, a failed upsert or a failed completion write does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutput {
    pub success: bool,
    pub errors: Vec<String>,
    pub is_completed: bool,
    pub saved_count: usize,
    pub total_fields: usize,
    pub completed_field_keys: Vec<String>,
    pub remaining_fields: usize,
    pub next_batch: Vec<FieldDefinition>,
    pub has_more_batches: bool,
    pub progress: Progress,
}
