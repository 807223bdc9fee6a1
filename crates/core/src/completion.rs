use std::collections::HashMap;

use serde::Serialize;

use crate::branching::FlowPosition;
use crate::catalog::Catalog;
use crate::domain::field::FieldDefinition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

/// Derived per turn, never stored: which visible fields have a non-empty
/// recorded value and which still need one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionState {
    pub completed_field_keys: Vec<String>,
    pub incomplete_fields: Vec<FieldDefinition>,
    pub total_fields: usize,
}

impl CompletionState {
    pub fn is_complete(&self) -> bool {
        self.incomplete_fields.is_empty()
    }

    pub fn progress(&self) -> Progress {
        let completed = self.completed_field_keys.len();
        let total = self.total_fields;
        let percentage = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Progress { completed, total, percentage }
    }
}

/// Hidden fields leave the required set while hidden; their recorded
/// responses are kept but do not count toward the totals.
pub fn completion_state(
    catalog: &Catalog,
    position: &FlowPosition,
    responses: &HashMap<String, String>,
) -> CompletionState {
    let mut completed_field_keys = Vec::new();
    let mut incomplete_fields = Vec::new();
    let mut total_fields = 0;

    for field in catalog.fields() {
        if !position.is_visible(field) {
            continue;
        }
        total_fields += 1;
        let answered =
            responses.get(&field.field_key).is_some_and(|value| !value.trim().is_empty());
        if answered {
            completed_field_keys.push(field.field_key.clone());
        } else {
            incomplete_fields.push(field.clone());
        }
    }

    CompletionState { completed_field_keys, incomplete_fields, total_fields }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::branching::resolve_flow;
    use crate::catalog::Catalog;
    use crate::completion::completion_state;
    use crate::domain::field::{
        BranchAction, BranchCondition, BranchingRule, CampaignId, ConditionOperator,
        FieldDefinition, FieldType,
    };

    fn responses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn three_field_catalog() -> Catalog {
        Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("name", "Name", FieldType::Text).sort(0),
                FieldDefinition::new("email", "Email Address", FieldType::Email).sort(1),
                FieldDefinition::new("age", "Age", FieldType::Number).sort(2),
            ],
        )
        .expect("resolve catalog")
    }

    #[test]
    fn one_of_three_rounds_to_thirty_three_percent() {
        let catalog = three_field_catalog();
        let recorded = responses(&[("name", "Ann")]);
        let position = resolve_flow(&catalog, &recorded);

        let state = completion_state(&catalog, &position, &recorded);
        assert_eq!(state.completed_field_keys, vec!["name"]);
        assert_eq!(state.incomplete_fields.len(), 2);
        assert!(!state.is_complete());

        let progress = state.progress();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 3);
        assert_eq!(progress.percentage, 33);
    }

    #[test]
    fn whitespace_values_do_not_count_as_answers() {
        let catalog = three_field_catalog();
        let recorded = responses(&[("name", "   ")]);
        let position = resolve_flow(&catalog, &recorded);

        let state = completion_state(&catalog, &position, &recorded);
        assert!(state.completed_field_keys.is_empty());
        assert_eq!(state.incomplete_fields.len(), 3);
    }

    #[test]
    fn all_answered_is_complete_at_one_hundred_percent() {
        let catalog = three_field_catalog();
        let recorded =
            responses(&[("name", "Ann"), ("email", "ann@example.com"), ("age", "29.5")]);
        let position = resolve_flow(&catalog, &recorded);

        let state = completion_state(&catalog, &position, &recorded);
        assert!(state.is_complete());
        assert_eq!(state.progress().percentage, 100);
    }

    #[test]
    fn hidden_fields_leave_the_required_set() {
        let catalog = Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("employed", "Employed?", FieldType::Checkbox).sort(0).branching(
                    vec![BranchingRule {
                        condition: BranchCondition {
                            field_key: "employed".to_owned(),
                            operator: ConditionOperator::Equals,
                            value: "no".to_owned(),
                        },
                        action: BranchAction::Hide { target_fields: vec!["company".to_owned()] },
                    }],
                ),
                FieldDefinition::new("company", "Company", FieldType::Text).sort(1),
            ],
        )
        .expect("resolve catalog");

        let recorded = responses(&[("employed", "no")]);
        let position = resolve_flow(&catalog, &recorded);

        let state = completion_state(&catalog, &position, &recorded);
        assert!(state.is_complete(), "hidden company field must not block completion");
        assert_eq!(state.total_fields, 1);
    }
}
