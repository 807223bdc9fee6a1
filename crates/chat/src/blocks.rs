use serde::Serialize;

use intake_core::batch::ModalBatch;
use intake_core::completion::Progress;
use intake_core::domain::field::{FieldDefinition, FieldType};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput {
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<TextObject>,
        multiline: bool,
    },
    EmailTextInput,
    UrlTextInput,
    NumberInput {
        is_decimal_allowed: bool,
    },
    StaticSelect {
        options: Vec<TextObject>,
    },
    Checkboxes {
        options: Vec<TextObject>,
    },
    Datepicker,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputBlock {
    pub block_id: String,
    pub label: TextObject,
    pub element: InputElement,
}

/// A modal form covering one batch of fields. `private_metadata` carries the
/// JSON the submission handler needs to rebuild the turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    pub callback_id: String,
    pub title: TextObject,
    pub submit_label: TextObject,
    pub close_label: TextObject,
    pub private_metadata: String,
    pub inputs: Vec<InputBlock>,
}

/// Which response a service hands back to the dispatcher: a posted message
/// or a modal to open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatReply {
    Message(MessageTemplate),
    Modal(ModalView),
}

pub const ONBOARDING_SUBMIT_CALLBACK: &str = "onboarding.submit.v1";

pub fn input_element_for(field: &FieldDefinition) -> InputElement {
    match field.field_type {
        FieldType::Text => InputElement::PlainTextInput { placeholder: None, multiline: false },
        FieldType::Email => InputElement::EmailTextInput,
        FieldType::Url => InputElement::UrlTextInput,
        FieldType::Number => InputElement::NumberInput { is_decimal_allowed: true },
        FieldType::Select => {
            InputElement::StaticSelect { options: option_texts(&field.options) }
        }
        FieldType::Multiselect => {
            InputElement::Checkboxes { options: option_texts(&field.options) }
        }
        FieldType::Checkbox | FieldType::Boolean => InputElement::StaticSelect {
            options: vec![TextObject::plain("Yes"), TextObject::plain("No")],
        },
        FieldType::Date => InputElement::Datepicker,
    }
}

fn option_texts(options: &[String]) -> Vec<TextObject> {
    options.iter().map(|option| TextObject::plain(option.as_str())).collect()
}

pub fn onboarding_modal(
    batch: &ModalBatch,
    progress: &Progress,
    private_metadata: String,
) -> ModalView {
    let submit_label = if batch.has_more { "Continue" } else { "Finish" };
    let inputs = batch
        .fields
        .iter()
        .map(|field| InputBlock {
            block_id: field.field_key.clone(),
            label: TextObject::plain(field.label.as_str()),
            element: input_element_for(field),
        })
        .collect();

    ModalView {
        callback_id: ONBOARDING_SUBMIT_CALLBACK.to_owned(),
        title: TextObject::plain(format!(
            "Getting Started ({} of {})",
            progress.completed.min(progress.total),
            progress.total
        )),
        submit_label: TextObject::plain(submit_label),
        close_label: TextObject::plain("Later"),
        private_metadata,
        inputs,
    }
}

pub fn progress_message(progress: &Progress, remaining_fields: usize) -> MessageTemplate {
    MessageBuilder::new(format!(
        "Onboarding progress: {} of {} ({}%)",
        progress.completed, progress.total, progress.percentage
    ))
    .section("onboarding.progress.summary.v1", |section| {
        section.mrkdwn(format!(
            "*Onboarding progress*\n{} of {} questions answered ({}%).",
            progress.completed, progress.total, progress.percentage
        ));
    })
    .section("onboarding.progress.remaining.v1", |section| {
        section.plain(if remaining_fields == 0 {
            "All questions are answered.".to_owned()
        } else {
            format!("{remaining_fields} questions remaining.")
        });
    })
    .actions("onboarding.progress.actions.v1", |actions| {
        actions.button(
            ButtonElement::new("onboarding.begin.v1", "Continue")
                .style(ButtonStyle::Primary)
                .value("continue"),
        );
    })
    .build()
}

pub fn completion_message(username: &str) -> MessageTemplate {
    MessageBuilder::new("Onboarding complete")
        .section("onboarding.complete.summary.v1", |section| {
            section.mrkdwn(format!(":tada: Thanks, *{username}* — you're all set!"));
        })
        .context("onboarding.complete.context.v1", |context| {
            context.plain("Your answers were saved. You can update them any time with /onboard start.");
        })
        .build()
}

pub fn validation_errors_message(errors: &[String], correlation_id: &str) -> MessageTemplate {
    let mut listed = errors
        .iter()
        .map(|error| format!("• {error}"))
        .collect::<Vec<_>>()
        .join("\n");
    if listed.is_empty() {
        listed = "• Something was wrong with the submitted values.".to_owned();
    }

    MessageBuilder::new("Some answers need another look")
        .section("onboarding.errors.summary.v1", |section| {
            section.mrkdwn(format!(":warning: *Some answers need another look*\n{listed}"));
        })
        .actions("onboarding.errors.actions.v1", |actions| {
            actions.button(
                ButtonElement::new("onboarding.begin.v1", "Fix answers")
                    .style(ButtonStyle::Primary)
                    .value("retry"),
            );
        })
        .context("onboarding.errors.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn reset_message() -> MessageTemplate {
    MessageBuilder::new("Onboarding reset")
        .section("onboarding.reset.summary.v1", |section| {
            section.plain("Your onboarding answers were cleared. Use /onboard start to begin again.");
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("onboarding.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("onboarding.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Onboard command help")
        .section("onboarding.help.summary.v1", |section| {
            section.mrkdwn(
                "*Available commands*\n• `/onboard start` — open the next questions\n• `/onboard status` — see your progress\n• `/onboard reset` — clear your answers\n• `/onboard help`",
            );
        })
        .build()
}

#[cfg(test)]
mod tests {
    use intake_core::batch::ModalBatch;
    use intake_core::completion::Progress;
    use intake_core::domain::field::{FieldDefinition, FieldType};

    use super::{
        help_message, input_element_for, onboarding_modal, validation_errors_message, Block,
        InputElement, TextObject,
    };

    #[test]
    fn input_elements_follow_the_field_type() {
        let select = FieldDefinition::new("role", "Role", FieldType::Select)
            .options(["Student", "Engineer"]);
        assert_eq!(
            input_element_for(&select),
            InputElement::StaticSelect {
                options: vec![TextObject::plain("Student"), TextObject::plain("Engineer")],
            }
        );

        let email = FieldDefinition::new("email", "Email", FieldType::Email);
        assert_eq!(input_element_for(&email), InputElement::EmailTextInput);

        let checkbox = FieldDefinition::new("newsletter", "Updates?", FieldType::Checkbox);
        assert!(matches!(input_element_for(&checkbox), InputElement::StaticSelect { .. }));

        let date = FieldDefinition::new("start", "Start", FieldType::Date);
        assert_eq!(input_element_for(&date), InputElement::Datepicker);
    }

    #[test]
    fn modal_blocks_are_keyed_by_field_key() {
        let batch = ModalBatch {
            fields: vec![
                FieldDefinition::new("name", "Name", FieldType::Text),
                FieldDefinition::new("email", "Email Address", FieldType::Email),
            ],
            has_more: true,
        };
        let progress = Progress { completed: 0, total: 7, percentage: 0 };

        let modal = onboarding_modal(&batch, &progress, "{\"campaign_id\":\"camp-1\"}".to_owned());

        assert_eq!(modal.inputs.len(), 2);
        assert_eq!(modal.inputs[0].block_id, "name");
        assert_eq!(modal.inputs[1].block_id, "email");
        assert_eq!(modal.submit_label, TextObject::plain("Continue"));
    }

    #[test]
    fn final_batch_modal_submits_as_finish() {
        let batch = ModalBatch {
            fields: vec![FieldDefinition::new("goal", "Goal", FieldType::Text)],
            has_more: false,
        };
        let progress = Progress { completed: 6, total: 7, percentage: 86 };

        let modal = onboarding_modal(&batch, &progress, String::new());
        assert_eq!(modal.submit_label, TextObject::plain("Finish"));
    }

    #[test]
    fn validation_errors_render_one_line_per_field() {
        let message = validation_errors_message(
            &[
                "Email Address: Please enter a valid email address".to_owned(),
                "Age: Please enter a valid number".to_owned(),
            ],
            "req-9",
        );

        let Block::Section { text: TextObject::Mrkdwn { text }, .. } = &message.blocks[0] else {
            panic!("first block should be a mrkdwn section");
        };
        assert!(text.contains("• Email Address: Please enter a valid email address"));
        assert!(text.contains("• Age: Please enter a valid number"));
    }

    #[test]
    fn help_message_lists_the_onboard_verbs() {
        let message = help_message();
        let Block::Section { text: TextObject::Mrkdwn { text }, .. } = &message.blocks[0] else {
            panic!("help should be a mrkdwn section");
        };
        for verb in ["start", "status", "reset", "help"] {
            assert!(text.contains(verb), "help should mention `{verb}`");
        }
    }
}
