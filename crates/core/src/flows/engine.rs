use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::batch::{next_batch, ModalBatch, DEFAULT_FIELDS_PER_MODAL};
use crate::branching::resolve_flow;
use crate::catalog::Catalog;
use crate::completion::{completion_state, Progress};
use crate::domain::field::{CampaignId, UserId};
use crate::domain::response::ResponseDraft;
use crate::errors::EngineError;
use crate::flows::states::{FlowState, TurnInput, TurnOutput};
use crate::store::{CompletionEvent, FieldCatalog, ReferralNotifier, ResponseStore};
use crate::validate::{validate, Validation};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub fields_per_modal: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { fields_per_modal: DEFAULT_FIELDS_PER_MODAL }
    }
}

/// Top-level entry point tying catalog resolution, validation, persistence,
/// branching, completion detection, and batching together per user turn.
///
/// The engine holds no per-user state; everything is recomputed from the
/// stores on each call, so retried and out-of-order turns converge.
pub struct OnboardingEngine<C, R, N> {
    catalog: C,
    responses: R,
    notifier: N,
    settings: EngineSettings,
}

impl<C, R, N> OnboardingEngine<C, R, N>
where
    C: FieldCatalog,
    R: ResponseStore,
    N: ReferralNotifier,
{
    pub fn new(catalog: C, responses: R, notifier: N, settings: EngineSettings) -> Self {
        Self { catalog, responses, notifier, settings }
    }

    pub async fn process_turn(&self, input: TurnInput) -> Result<TurnOutput, EngineError> {
        let catalog = self.load_catalog(&input.campaign_id).await?;
        let rows = self.responses.list_for_user(&input.campaign_id, &input.user_id).await?;
        let already_completed = !rows.is_empty() && rows.iter().all(|row| row.is_completed);

        let mut recorded: HashMap<String, String> =
            rows.into_iter().map(|row| (row.field_key, row.value)).collect();

        let mut errors = Vec::new();
        let mut saved_count = 0;
        let mut storage_failure = false;

        // Iterate in catalog order so error lists are deterministic.
        for field in catalog.fields() {
            let Some(raw_value) = input.responses.get(&field.field_key) else {
                continue;
            };

            match validate(field, raw_value) {
                Validation::Rejected { message } => {
                    errors.push(format!("{}: {}", field.label, message));
                }
                Validation::Accepted { value } => {
                    let draft = ResponseDraft {
                        campaign_id: input.campaign_id.clone(),
                        user_id: input.user_id.clone(),
                        username: input.username.clone(),
                        field_key: field.field_key.clone(),
                        value: value.clone(),
                        referral_id: input.referral_id.clone(),
                        referral_link_id: input.referral_link_id.clone(),
                    };
                    // A failed upsert never aborts sibling fields.
                    match self.responses.upsert(draft).await {
                        Ok(()) => {
                            saved_count += 1;
                            recorded.insert(field.field_key.clone(), value);
                        }
                        Err(store_error) => {
                            warn!(
                                campaign_id = %input.campaign_id.0,
                                user_id = %input.user_id.0,
                                field_key = %field.field_key,
                                error = %store_error,
                                "response upsert failed"
                            );
                            storage_failure = true;
                            errors.push(format!(
                                "{}: could not be saved, please try again",
                                field.label
                            ));
                        }
                    }
                }
            }
        }

        for field_key in input.responses.keys() {
            if catalog.find(field_key).is_none() {
                debug!(
                    campaign_id = %input.campaign_id.0,
                    field_key = %field_key,
                    "ignoring submitted value for unknown field"
                );
            }
        }

        let position = resolve_flow(&catalog, &recorded);
        let completion = completion_state(&catalog, &position, &recorded);

        let mut is_completed = false;
        if completion.is_complete() {
            match self.responses.mark_completed(&input.campaign_id, &input.user_id).await {
                Ok(()) => {
                    is_completed = true;
                    if !already_completed {
                        info!(
                            campaign_id = %input.campaign_id.0,
                            user_id = %input.user_id.0,
                            total_fields = completion.total_fields,
                            "onboarding completed"
                        );
                        self.notify_completion(&input).await;
                    }
                }
                Err(store_error) => {
                    // Completion that was not durably recorded must not be
                    // reported as complete.
                    error!(
                        campaign_id = %input.campaign_id.0,
                        user_id = %input.user_id.0,
                        error = %store_error,
                        "failed to mark onboarding completed"
                    );
                    storage_failure = true;
                    errors.push(
                        "Your answers were saved, but completion could not be recorded. \
                         Please try again."
                            .to_owned(),
                    );
                }
            }
        }

        let batch = if is_completed {
            ModalBatch::empty()
        } else {
            next_batch(&completion.incomplete_fields, self.settings.fields_per_modal)
        };

        let progress = completion.progress();
        Ok(TurnOutput {
            success: !storage_failure,
            errors,
            is_completed,
            saved_count,
            total_fields: completion.total_fields,
            remaining_fields: completion.incomplete_fields.len(),
            completed_field_keys: completion.completed_field_keys,
            has_more_batches: batch.has_more,
            next_batch: batch.fields,
            progress,
        })
    }

    /// Derived lifecycle state for status rendering; never cached.
    pub async fn flow_state(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<FlowState, EngineError> {
        let catalog = self.load_catalog(campaign_id).await?;
        let recorded = self.recorded_values(campaign_id, user_id).await?;

        if recorded.is_empty() {
            return Ok(FlowState::NotStarted);
        }

        let position = resolve_flow(&catalog, &recorded);
        let completion = completion_state(&catalog, &position, &recorded);
        if completion.is_complete() {
            return Ok(FlowState::Completed);
        }

        Ok(FlowState::InProgress { step: position.active_step.unwrap_or(catalog.max_step()) })
    }

    /// The next question batch and progress for a user, without persisting
    /// anything. Used when opening a fresh modal.
    pub async fn next_prompt(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(ModalBatch, Progress), EngineError> {
        let catalog = self.load_catalog(campaign_id).await?;
        let recorded = self.recorded_values(campaign_id, user_id).await?;

        let position = resolve_flow(&catalog, &recorded);
        let completion = completion_state(&catalog, &position, &recorded);
        let batch = next_batch(&completion.incomplete_fields, self.settings.fields_per_modal);
        Ok((batch, completion.progress()))
    }

    /// Explicit session-reset: deletes every recorded response for the user.
    pub async fn reset(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<(), EngineError> {
        self.responses.delete_for_user(campaign_id, user_id).await?;
        info!(campaign_id = %campaign_id.0, user_id = %user_id.0, "onboarding responses reset");
        Ok(())
    }

    async fn load_catalog(&self, campaign_id: &CampaignId) -> Result<Catalog, EngineError> {
        let fields = self.catalog.enabled_fields(campaign_id).await?;
        Ok(Catalog::resolve(campaign_id, fields)?)
    }

    async fn recorded_values(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
    ) -> Result<HashMap<String, String>, EngineError> {
        let rows = self.responses.list_for_user(campaign_id, user_id).await?;
        Ok(rows.into_iter().map(|row| (row.field_key, row.value)).collect())
    }

    async fn notify_completion(&self, input: &TurnInput) {
        let event = CompletionEvent {
            campaign_id: input.campaign_id.clone(),
            user_id: input.user_id.clone(),
            username: input.username.clone(),
            referral_id: input.referral_id.clone(),
            referral_link_id: input.referral_link_id.clone(),
            completed_at: Utc::now(),
        };
        if let Err(notify_error) = self.notifier.completed(&event).await {
            warn!(
                campaign_id = %input.campaign_id.0,
                user_id = %input.user_id.0,
                error = %notify_error,
                "referral completion notification failed"
            );
        }
    }
}
