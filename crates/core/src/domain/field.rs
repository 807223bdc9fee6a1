use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Email,
    Number,
    Select,
    Multiselect,
    Checkbox,
    Date,
    Url,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Url => "url",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown field type `{0}`")]
pub struct UnknownFieldType(pub String);

impl std::str::FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "email" => Ok(Self::Email),
            "number" => Ok(Self::Number),
            "select" => Ok(Self::Select),
            "multiselect" => Ok(Self::Multiselect),
            "checkbox" => Ok(Self::Checkbox),
            "date" => Ok(Self::Date),
            "url" => Ok(Self::Url),
            "boolean" => Ok(Self::Boolean),
            other => Err(UnknownFieldType(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.pattern_message.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCondition {
    pub field_key: String,
    pub operator: ConditionOperator,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BranchAction {
    SetNextStep { target_step: u32 },
    SkipToStep { target_step: u32 },
    Show { target_fields: Vec<String> },
    Hide { target_fields: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchingRule {
    pub condition: BranchCondition,
    pub action: BranchAction,
}

/// One question in a campaign's intake form. `field_key` is unique within a
/// campaign; (`step_number`, `sort_order`) gives the presentation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_key: String,
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_step")]
    pub step_number: u32,
    #[serde(default)]
    pub validation_rules: ValidationRules,
    #[serde(default)]
    pub branching_logic: Vec<BranchingRule>,
}

fn default_true() -> bool {
    true
}

fn default_step() -> u32 {
    1
}

impl FieldDefinition {
    pub fn new(
        field_key: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            field_key: field_key.into(),
            label: label.into(),
            field_type,
            options: Vec::new(),
            required: true,
            enabled: true,
            sort_order: 0,
            step_number: 1,
            validation_rules: ValidationRules::default(),
            branching_logic: Vec::new(),
        }
    }

    pub fn step(mut self, step_number: u32) -> Self {
        self.step_number = step_number;
        self
    }

    pub fn sort(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn options<I, T>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = rules;
        self
    }

    pub fn branching(mut self, rules: Vec<BranchingRule>) -> Self {
        self.branching_logic = rules;
        self
    }
}
