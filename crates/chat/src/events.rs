use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    blocks::{self, ChatReply, MessageTemplate, ModalView},
    commands::{
        normalize_onboard_command, CommandParseError, CommandRouteError, CommandRouter,
        NoopOnboardCommandService, OnboardCommandService, SlashCommandPayload,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatEnvelope {
    pub envelope_id: String,
    pub event: ChatEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatEvent {
    SlashCommand(SlashCommandPayload),
    BlockAction(BlockActionEvent),
    ViewSubmission(ViewSubmissionEvent),
    Unsupported { event_type: String },
}

impl ChatEvent {
    pub fn event_type(&self) -> ChatEventType {
        match self {
            Self::SlashCommand(_) => ChatEventType::SlashCommand,
            Self::BlockAction(_) => ChatEventType::BlockAction,
            Self::ViewSubmission(_) => ChatEventType::ViewSubmission,
            Self::Unsupported { .. } => ChatEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatEventType {
    SlashCommand,
    BlockAction,
    ViewSubmission,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub channel_id: String,
    pub message_ts: String,
    pub user_id: String,
    pub username: String,
    pub action_id: String,
    pub value: Option<String>,
    pub request_id: Option<String>,
}

/// A submitted modal: raw key→string values keyed by the input block ids,
/// plus the `private_metadata` the modal was opened with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub user_id: String,
    pub username: String,
    pub private_metadata: String,
    pub values: HashMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    ModalOpened(ModalView),
    Processed,
    Ignored,
}

impl From<ChatReply> for HandlerResult {
    fn from(reply: ChatReply) -> Self {
        match reply {
            ChatReply::Message(message) => Self::Responded(message),
            ChatReply::Modal(modal) => Self::ModalOpened(modal),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
    #[error("view submission handler failure: {0}")]
    Submission(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> ChatEventType;
    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<ChatEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(NoopOnboardCommandService));
    dispatcher.register(BlockActionHandler::new(NoopBlockActionService));
    dispatcher.register(ViewSubmissionHandler::new(NoopViewSubmissionService));
    dispatcher
}

pub struct SlashCommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> SlashCommandHandler<S>
where
    S: OnboardCommandService,
{
    pub fn new(service: S) -> Self {
        Self { router: CommandRouter::new(service) }
    }
}

#[async_trait]
impl<S> EventHandler for SlashCommandHandler<S>
where
    S: OnboardCommandService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::SlashCommand
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let normalized = normalize_onboard_command(payload.clone())?;
        let reply = self.router.route(normalized).await?;
        Ok(reply.into())
    }
}

#[async_trait]
pub trait BlockActionService: Send + Sync {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<ChatReply>, EventHandlerError>;
}

pub struct BlockActionHandler<S> {
    service: S,
}

impl<S> BlockActionHandler<S>
where
    S: BlockActionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for BlockActionHandler<S>
where
    S: BlockActionService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::BlockAction
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::BlockAction(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let reply = self.service.handle_block_action(event, ctx).await?;
        Ok(match reply {
            Some(reply) => reply.into(),
            None => HandlerResult::Processed,
        })
    }
}

pub struct NoopBlockActionService;

#[async_trait]
impl BlockActionService for NoopBlockActionService {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Option<ChatReply>, EventHandlerError> {
        let request_id = event.request_id.as_deref().unwrap_or(&ctx.correlation_id);
        if event.action_id == "onboarding.help.v1" {
            return Ok(Some(ChatReply::Message(blocks::help_message())));
        }

        Ok(Some(ChatReply::Message(blocks::error_message(
            &format!("Nothing is wired to `{}` yet. Try `/onboard help`.", event.action_id),
            request_id,
        ))))
    }
}

#[async_trait]
pub trait ViewSubmissionService: Send + Sync {
    async fn handle_view_submission(
        &self,
        event: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<ChatReply, EventHandlerError>;
}

pub struct ViewSubmissionHandler<S> {
    service: S,
}

impl<S> ViewSubmissionHandler<S>
where
    S: ViewSubmissionService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for ViewSubmissionHandler<S>
where
    S: ViewSubmissionService + 'static,
{
    fn event_type(&self) -> ChatEventType {
        ChatEventType::ViewSubmission
    }

    async fn handle(
        &self,
        envelope: &ChatEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let ChatEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if event.callback_id != blocks::ONBOARDING_SUBMIT_CALLBACK {
            return Ok(HandlerResult::Processed);
        }

        let reply = self.service.handle_view_submission(event, ctx).await?;
        Ok(reply.into())
    }
}

pub struct NoopViewSubmissionService;

#[async_trait]
impl ViewSubmissionService for NoopViewSubmissionService {
    async fn handle_view_submission(
        &self,
        _event: &ViewSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<ChatReply, EventHandlerError> {
        Ok(ChatReply::Message(blocks::error_message(
            "Submissions are not wired to a flow service yet.",
            &ctx.correlation_id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{
        default_dispatcher, BlockActionEvent, ChatEnvelope, ChatEvent, EventContext,
        EventDispatcher, HandlerResult, ViewSubmissionEvent,
    };
    use crate::commands::SlashCommandPayload;

    fn slash(text: &str) -> ChatEnvelope {
        ChatEnvelope {
            envelope_id: "env-1".to_owned(),
            event: ChatEvent::SlashCommand(SlashCommandPayload {
                command: "/onboard".to_owned(),
                text: text.to_owned(),
                channel_id: "C1".to_owned(),
                user_id: "U1".to_owned(),
                username: "ann".to_owned(),
                trigger_ts: "1".to_owned(),
                request_id: "req-1".to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_slash_commands() {
        let dispatcher = default_dispatcher();

        let result =
            dispatcher.dispatch(&slash("help"), &EventContext::default()).await.expect("dispatch");

        assert!(matches!(result, HandlerResult::Responded(_)));
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = EventDispatcher::new();

        let result =
            dispatcher.dispatch(&slash("help"), &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        let dispatcher = default_dispatcher();
        assert_eq!(dispatcher.handler_count(), 3);
    }

    #[tokio::test]
    async fn dispatcher_routes_block_actions_to_guidance() {
        let dispatcher = default_dispatcher();
        let envelope = ChatEnvelope {
            envelope_id: "env-block-1".to_owned(),
            event: ChatEvent::BlockAction(BlockActionEvent {
                channel_id: "C1".to_owned(),
                message_ts: "1730000000.6000".to_owned(),
                user_id: "U6".to_owned(),
                username: "ben".to_owned(),
                action_id: "unknown.action".to_owned(),
                value: None,
                request_id: Some("req-block-1".to_owned()),
            }),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        let HandlerResult::Responded(message) = result else {
            panic!("unknown action should resolve to a guidance message");
        };
        assert!(message.fallback_text.contains("unknown.action"));
    }

    #[tokio::test]
    async fn dispatcher_skips_foreign_view_callbacks() {
        let dispatcher = default_dispatcher();
        let envelope = ChatEnvelope {
            envelope_id: "env-view-1".to_owned(),
            event: ChatEvent::ViewSubmission(ViewSubmissionEvent {
                callback_id: "somebody.elses.modal".to_owned(),
                user_id: "U1".to_owned(),
                username: "ann".to_owned(),
                private_metadata: String::new(),
                values: HashMap::new(),
            }),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn unsupported_events_are_ignored_by_the_default_dispatcher() {
        let dispatcher = default_dispatcher();
        let envelope = ChatEnvelope {
            envelope_id: "env-x".to_owned(),
            event: ChatEvent::Unsupported { event_type: "reaction_added".to_owned() },
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
    }
}
