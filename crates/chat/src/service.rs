use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use intake_core::domain::field::{CampaignId, UserId};
use intake_core::flows::engine::OnboardingEngine;
use intake_core::flows::states::TurnInput;
use intake_core::session::SessionManager;
use intake_core::store::{FieldCatalog, ReferralNotifier, ResponseStore, SessionStore};

use crate::blocks::{self, ChatReply};
use crate::commands::{CommandEnvelope, CommandRouteError, OnboardCommandService};
use crate::events::{
    BlockActionEvent, BlockActionService, EventContext, EventHandlerError, ViewSubmissionEvent,
    ViewSubmissionService,
};

/// Carried through the modal's `private_metadata` so a submission can be
/// turned back into an engine turn without any in-process state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalMetadata {
    pub campaign_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_link_id: Option<String>,
}

/// Glue from chat events to the onboarding engine: opens batch modals,
/// replays submissions as turns, and renders the outcome.
pub struct OnboardingFlowService<C, R, N, S> {
    engine: OnboardingEngine<C, R, N>,
    sessions: SessionManager<S>,
}

impl<C, R, N, S> OnboardingFlowService<C, R, N, S>
where
    C: FieldCatalog,
    R: ResponseStore,
    N: ReferralNotifier,
    S: SessionStore,
{
    pub fn new(engine: OnboardingEngine<C, R, N>, sessions: SessionManager<S>) -> Self {
        Self { engine, sessions }
    }

    async fn open_next_modal(
        &self,
        campaign_id: &CampaignId,
        user_id: &UserId,
        metadata: &ModalMetadata,
        request_id: &str,
    ) -> Result<ChatReply, CommandRouteError> {
        let (batch, progress) = self
            .engine
            .next_prompt(campaign_id, user_id)
            .await
            .map_err(|error| self.command_failure(error, request_id))?;

        if batch.fields.is_empty() {
            return Ok(ChatReply::Message(blocks::progress_message(&progress, 0)));
        }

        let private_metadata = serde_json::to_string(metadata)
            .map_err(|error| CommandRouteError::Service(error.to_string()))?;

        // The pending batch is buffered so an interrupted submission can be
        // distinguished from a fresh start.
        let session_payload = serde_json::json!({
            "field_keys": batch.field_keys(),
            "metadata": metadata,
        });
        if let Err(store_error) =
            self.sessions.store(campaign_id, user_id, session_payload).await
        {
            warn!(
                campaign_id = %campaign_id.0,
                user_id = %user_id.0,
                error = %store_error,
                "failed to buffer modal session"
            );
        }

        Ok(ChatReply::Modal(blocks::onboarding_modal(&batch, &progress, private_metadata)))
    }

    fn command_failure(
        &self,
        error: intake_core::errors::EngineError,
        request_id: &str,
    ) -> CommandRouteError {
        warn!(request_id = %request_id, error = %error, "onboarding command failed");
        CommandRouteError::Service(error.user_message().to_owned())
    }
}

#[async_trait]
impl<C, R, N, S> OnboardCommandService for OnboardingFlowService<C, R, N, S>
where
    C: FieldCatalog,
    R: ResponseStore,
    N: ReferralNotifier,
    S: SessionStore,
{
    async fn start_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        let campaign_id = CampaignId(envelope.campaign_id.clone());
        let user_id = UserId(envelope.user_id.clone());
        let metadata = ModalMetadata {
            campaign_id: envelope.campaign_id.clone(),
            referral_id: envelope.referral_id.clone(),
            referral_link_id: envelope.referral_link_id.clone(),
        };

        self.open_next_modal(&campaign_id, &user_id, &metadata, &envelope.request_id).await
    }

    async fn onboarding_status(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        let campaign_id = CampaignId(envelope.campaign_id.clone());
        let user_id = UserId(envelope.user_id.clone());

        let (_batch, progress) = self
            .engine
            .next_prompt(&campaign_id, &user_id)
            .await
            .map_err(|error| self.command_failure(error, &envelope.request_id))?;

        let remaining = progress.total.saturating_sub(progress.completed);
        Ok(ChatReply::Message(blocks::progress_message(&progress, remaining)))
    }

    async fn reset_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        let campaign_id = CampaignId(envelope.campaign_id.clone());
        let user_id = UserId(envelope.user_id.clone());

        self.engine
            .reset(&campaign_id, &user_id)
            .await
            .map_err(|error| self.command_failure(error, &envelope.request_id))?;
        if let Err(store_error) = self.sessions.clear(&campaign_id, &user_id).await {
            warn!(
                campaign_id = %campaign_id.0,
                user_id = %user_id.0,
                error = %store_error,
                "failed to clear modal session on reset"
            );
        }

        Ok(ChatReply::Message(blocks::reset_message()))
    }
}

#[async_trait]
impl<C, R, N, S> ViewSubmissionService for OnboardingFlowService<C, R, N, S>
where
    C: FieldCatalog,
    R: ResponseStore,
    N: ReferralNotifier,
    S: SessionStore,
{
    async fn handle_view_submission(
        &self,
        event: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<ChatReply, EventHandlerError> {
        let metadata: ModalMetadata = serde_json::from_str(&event.private_metadata)
            .map_err(|error| EventHandlerError::Submission(error.to_string()))?;
        let campaign_id = CampaignId(metadata.campaign_id.clone());
        let user_id = UserId(event.user_id.clone());

        // An expired buffer just means the flow restarts silently; the
        // submitted values themselves are still processed.
        match self.sessions.retrieve(&campaign_id, &user_id).await {
            Ok(_) => {}
            Err(store_error) => {
                warn!(
                    campaign_id = %campaign_id.0,
                    user_id = %user_id.0,
                    error = %store_error,
                    "failed to read modal session"
                );
            }
        }

        let mut input = TurnInput::new(
            metadata.campaign_id.clone(),
            event.user_id.clone(),
            event.username.clone(),
        );
        input.responses = event.values.clone();
        input.referral_id = metadata.referral_id.clone();
        input.referral_link_id = metadata.referral_link_id.clone();

        let output = self
            .engine
            .process_turn(input)
            .await
            .map_err(|error| EventHandlerError::Submission(error.user_message().to_owned()))?;

        if let Err(store_error) = self.sessions.clear(&campaign_id, &user_id).await {
            warn!(
                campaign_id = %campaign_id.0,
                user_id = %user_id.0,
                error = %store_error,
                "failed to clear committed modal session"
            );
        }

        if output.is_completed {
            return Ok(ChatReply::Message(blocks::completion_message(&event.username)));
        }

        if !output.errors.is_empty() {
            return Ok(ChatReply::Message(blocks::validation_errors_message(
                &output.errors,
                &ctx.correlation_id,
            )));
        }

        self.open_next_modal(&campaign_id, &user_id, &metadata, &ctx.correlation_id)
            .await
            .map_err(EventHandlerError::from)
    }
}

#[async_trait]
impl<C, R, N, S> BlockActionService for OnboardingFlowService<C, R, N, S>
where
    C: FieldCatalog,
    R: ResponseStore,
    N: ReferralNotifier,
    S: SessionStore,
{
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<ChatReply>, EventHandlerError> {
        match event.action_id.as_str() {
            "onboarding.help.v1" => Ok(Some(ChatReply::Message(blocks::help_message()))),
            "onboarding.begin.v1" => {
                let campaign_id = CampaignId(event.channel_id.clone());
                let user_id = UserId(event.user_id.clone());
                let metadata = ModalMetadata {
                    campaign_id: event.channel_id.clone(),
                    ..ModalMetadata::default()
                };

                let reply = self
                    .open_next_modal(&campaign_id, &user_id, &metadata, &ctx.correlation_id)
                    .await
                    .map_err(EventHandlerError::from)?;
                Ok(Some(reply))
            }
            _ => Ok(None),
        }
    }
}
