use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::domain::field::{BranchAction, ConditionOperator, FieldDefinition};

/// Where the flow currently stands for one user, recomputed from recorded
/// responses every turn. `active_step` of `None` means the step walk ran off
/// the end of the catalog (linear progression capped at max step + 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowPosition {
    pub active_step: Option<u32>,
    pub hidden_fields: HashSet<String>,
}

impl FlowPosition {
    pub fn is_visible(&self, field: &FieldDefinition) -> bool {
        !self.hidden_fields.contains(&field.field_key)
    }
}

pub fn condition_matches(operator: ConditionOperator, recorded: &str, expected: &str) -> bool {
    let recorded = recorded.trim();
    let expected = expected.trim();
    match operator {
        ConditionOperator::Equals => recorded == expected,
        ConditionOperator::NotEquals => recorded != expected,
        ConditionOperator::Contains => recorded.contains(expected),
        ConditionOperator::NotContains => !recorded.contains(expected),
        ConditionOperator::GreaterThan => compare_numeric(recorded, expected, |a, b| a > b),
        ConditionOperator::LessThan => compare_numeric(recorded, expected, |a, b| a < b),
    }
}

fn compare_numeric(recorded: &str, expected: &str, compare: impl Fn(f64, f64) -> bool) -> bool {
    match (recorded.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) => compare(a, b),
        _ => false,
    }
}

/// First-match-wins over a field's rule list. A rule is only considered once
/// its condition field has a recorded response.
pub fn first_matching_action<'a>(
    field: &'a FieldDefinition,
    responses: &HashMap<String, String>,
) -> Option<&'a BranchAction> {
    field.branching_logic.iter().find_map(|rule| {
        let recorded = responses.get(&rule.condition.field_key)?;
        condition_matches(rule.condition.operator, recorded, &rule.condition.value)
            .then_some(&rule.action)
    })
}

/// Walk the catalog from its first step, applying visibility actions and step
/// directives as each fully-answered step is passed. Stops at the first step
/// that still has an unanswered visible field.
///
/// A directive targeting an already-visited step would re-fire forever, so it
/// falls back to linear progression instead.
pub fn resolve_flow(catalog: &Catalog, responses: &HashMap<String, String>) -> FlowPosition {
    let max_step = catalog.max_step();
    let mut hidden_fields: HashSet<String> = HashSet::new();
    let mut visited: HashSet<u32> = HashSet::new();
    let mut step = catalog.first_step();

    loop {
        visited.insert(step);

        let mut directive: Option<u32> = None;
        for field in catalog.step_fields(step) {
            match first_matching_action(field, responses) {
                Some(BranchAction::Show { target_fields }) => {
                    for key in target_fields {
                        hidden_fields.remove(key);
                    }
                }
                Some(BranchAction::Hide { target_fields }) => {
                    hidden_fields.extend(target_fields.iter().cloned());
                }
                Some(BranchAction::SetNextStep { target_step })
                | Some(BranchAction::SkipToStep { target_step }) => {
                    if directive.is_none() && *target_step >= 1 {
                        directive = Some(*target_step);
                    }
                }
                None => {}
            }
        }

        let unanswered = catalog.step_fields(step).any(|field| {
            !hidden_fields.contains(&field.field_key) && !has_answer(responses, &field.field_key)
        });
        if unanswered {
            return FlowPosition { active_step: Some(step), hidden_fields };
        }

        let next = match directive {
            Some(target) if !visited.contains(&target) => target,
            _ => step + 1,
        };
        if next > max_step {
            return FlowPosition { active_step: None, hidden_fields };
        }
        step = next;
    }
}

fn has_answer(responses: &HashMap<String, String>, field_key: &str) -> bool {
    responses.get(field_key).is_some_and(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::branching::{condition_matches, first_matching_action, resolve_flow};
    use crate::catalog::Catalog;
    use crate::domain::field::{
        BranchAction, BranchCondition, BranchingRule, CampaignId, ConditionOperator,
        FieldDefinition, FieldType,
    };

    fn responses(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn rule(field_key: &str, operator: ConditionOperator, value: &str, action: BranchAction) -> BranchingRule {
        BranchingRule {
            condition: BranchCondition {
                field_key: field_key.to_owned(),
                operator,
                value: value.to_owned(),
            },
            action,
        }
    }

    #[test]
    fn operators_cover_string_and_numeric_comparisons() {
        use ConditionOperator::*;
        assert!(condition_matches(Equals, "yes", "yes"));
        assert!(!condition_matches(Equals, "Yes", "yes"));
        assert!(condition_matches(NotEquals, "no", "yes"));
        assert!(condition_matches(Contains, "rust and go", "rust"));
        assert!(condition_matches(NotContains, "python", "rust"));
        assert!(condition_matches(GreaterThan, "29.5", "18"));
        assert!(condition_matches(LessThan, "12", "18"));
        // Unparseable numbers never match a numeric operator.
        assert!(!condition_matches(GreaterThan, "many", "18"));
    }

    #[test]
    fn first_matching_rule_wins_even_when_both_match() {
        let field = FieldDefinition::new("role", "Role", FieldType::Select).branching(vec![
            rule(
                "role",
                ConditionOperator::Contains,
                "engineer",
                BranchAction::SkipToStep { target_step: 3 },
            ),
            rule(
                "role",
                ConditionOperator::Equals,
                "engineer",
                BranchAction::SkipToStep { target_step: 4 },
            ),
        ]);

        let action = first_matching_action(&field, &responses(&[("role", "engineer")]))
            .expect("a rule should match");
        assert_eq!(action, &BranchAction::SkipToStep { target_step: 3 });
    }

    #[test]
    fn rules_do_not_fire_before_their_condition_field_is_answered() {
        let field = FieldDefinition::new("role", "Role", FieldType::Select).branching(vec![rule(
            "role",
            ConditionOperator::Equals,
            "engineer",
            BranchAction::SkipToStep { target_step: 3 },
        )]);

        assert!(first_matching_action(&field, &responses(&[])).is_none());
    }

    #[test]
    fn linear_progression_without_rules() {
        let catalog = Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("name", "Name", FieldType::Text).step(1),
                FieldDefinition::new("city", "City", FieldType::Text).step(2),
            ],
        )
        .expect("resolve catalog");

        let position = resolve_flow(&catalog, &responses(&[]));
        assert_eq!(position.active_step, Some(1));

        let position = resolve_flow(&catalog, &responses(&[("name", "Ann")]));
        assert_eq!(position.active_step, Some(2));

        let position = resolve_flow(&catalog, &responses(&[("name", "Ann"), ("city", "Oslo")]));
        assert_eq!(position.active_step, None, "past the last step means flow complete");
    }

    #[test]
    fn skip_to_step_bypasses_intermediate_steps() {
        let catalog = Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("employed", "Employed?", FieldType::Checkbox).step(1).branching(
                    vec![rule(
                        "employed",
                        ConditionOperator::Equals,
                        "no",
                        BranchAction::SkipToStep { target_step: 3 },
                    )],
                ),
                FieldDefinition::new("company", "Company", FieldType::Text).step(2),
                FieldDefinition::new("goal", "Goal", FieldType::Text).step(3),
            ],
        )
        .expect("resolve catalog");

        let position = resolve_flow(&catalog, &responses(&[("employed", "no")]));
        assert_eq!(position.active_step, Some(3));

        let position = resolve_flow(&catalog, &responses(&[("employed", "yes")]));
        assert_eq!(position.active_step, Some(2));
    }

    #[test]
    fn hide_removes_a_field_from_the_visible_set() {
        let catalog = Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("employed", "Employed?", FieldType::Checkbox).step(1).sort(0).branching(
                    vec![rule(
                        "employed",
                        ConditionOperator::Equals,
                        "no",
                        BranchAction::Hide { target_fields: vec!["company".to_owned()] },
                    )],
                ),
                FieldDefinition::new("company", "Company", FieldType::Text).step(1).sort(1),
            ],
        )
        .expect("resolve catalog");

        let position = resolve_flow(&catalog, &responses(&[("employed", "no")]));
        assert!(position.hidden_fields.contains("company"));
        assert_eq!(position.active_step, None, "only remaining field is hidden");

        let position = resolve_flow(&catalog, &responses(&[("employed", "yes")]));
        assert!(position.hidden_fields.is_empty());
        assert_eq!(position.active_step, Some(1), "company still needs an answer");
    }

    #[test]
    fn backward_directive_falls_back_to_linear_progression() {
        let catalog = Catalog::resolve(
            &CampaignId("camp-1".to_owned()),
            vec![
                FieldDefinition::new("a", "A", FieldType::Text).step(1).branching(vec![rule(
                    "a",
                    ConditionOperator::Equals,
                    "loop",
                    BranchAction::SetNextStep { target_step: 1 },
                )]),
                FieldDefinition::new("b", "B", FieldType::Text).step(2),
            ],
        )
        .expect("resolve catalog");

        let position = resolve_flow(&catalog, &responses(&[("a", "loop")]));
        assert_eq!(position.active_step, Some(2), "revisiting step 1 must not loop");
    }
}
