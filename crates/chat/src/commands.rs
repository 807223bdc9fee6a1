use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::{self, ChatReply};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub username: String,
    pub trigger_ts: String,
    pub request_id: String,
}

/// Parsed `/onboard` invocation. `campaign_id` falls back to the channel the
/// command was issued from when no explicit campaign token is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub verb: String,
    pub campaign_id: String,
    pub referral_id: Option<String>,
    pub referral_link_id: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    pub username: String,
    pub trigger_ts: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OnboardCommand {
    Start,
    Status,
    Reset,
    Help,
    Unknown { verb: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

pub fn normalize_onboard_command(
    payload: SlashCommandPayload,
) -> Result<CommandEnvelope, CommandParseError> {
    if payload.command != "/onboard" {
        return Err(CommandParseError::UnsupportedCommand(payload.command));
    }

    let text = payload.text.trim().to_owned();
    let mut parts = text.split_whitespace();
    let verb = parts.next().unwrap_or("help").to_ascii_lowercase();

    let mut campaign_id = None;
    let mut referral_id = None;
    let mut referral_link_id = None;
    for token in parts {
        if let Some(value) = token.strip_prefix("ref=") {
            referral_id = Some(value.to_owned());
        } else if let Some(value) = token.strip_prefix("link=") {
            referral_link_id = Some(value.to_owned());
        } else if campaign_id.is_none() {
            campaign_id = Some(token.to_owned());
        }
    }

    Ok(CommandEnvelope {
        verb,
        campaign_id: campaign_id.unwrap_or_else(|| payload.channel_id.clone()),
        referral_id,
        referral_link_id,
        channel_id: payload.channel_id,
        user_id: payload.user_id,
        username: payload.username,
        trigger_ts: payload.trigger_ts,
        request_id: payload.request_id,
    })
}

pub fn classify_onboard_command(verb: &str) -> OnboardCommand {
    match verb {
        "" | "help" => OnboardCommand::Help,
        "start" | "begin" | "continue" => OnboardCommand::Start,
        "status" | "progress" => OnboardCommand::Status,
        "reset" => OnboardCommand::Reset,
        other => OnboardCommand::Unknown { verb: other.to_owned() },
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: OnboardCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(&self, envelope: CommandEnvelope) -> Result<ChatReply, CommandRouteError> {
        match classify_onboard_command(&envelope.verb) {
            OnboardCommand::Start => self.service.start_onboarding(&envelope).await,
            OnboardCommand::Status => self.service.onboarding_status(&envelope).await,
            OnboardCommand::Reset => self.service.reset_onboarding(&envelope).await,
            OnboardCommand::Help => Ok(ChatReply::Message(blocks::help_message())),
            OnboardCommand::Unknown { verb } => Ok(ChatReply::Message(blocks::error_message(
                &format!("Unsupported command `/onboard {verb}`. Try `/onboard help`."),
                &envelope.request_id,
            ))),
        }
    }
}

#[async_trait]
pub trait OnboardCommandService: Send + Sync {
    async fn start_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError>;

    async fn onboarding_status(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError>;

    async fn reset_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError>;
}

/// Placeholder wiring for dispatchers built without a flow service.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopOnboardCommandService;

#[async_trait]
impl OnboardCommandService for NoopOnboardCommandService {
    async fn start_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        Ok(ChatReply::Message(blocks::error_message(
            "Onboarding is not wired to a flow service yet.",
            &envelope.request_id,
        )))
    }

    async fn onboarding_status(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        Ok(ChatReply::Message(blocks::error_message(
            "Onboarding status is not available yet.",
            &envelope.request_id,
        )))
    }

    async fn reset_onboarding(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ChatReply, CommandRouteError> {
        Ok(ChatReply::Message(blocks::error_message(
            "Onboarding reset is not available yet.",
            &envelope.request_id,
        )))
    }
}
