//! Chat-driven assignment policies: pick a scenario from the user's request,
//! then render condition rows into "When ..., <action>." lines.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, VariableSource, DEFAULT_LOOKBACK_DAYS};
use crate::template::{
    ConfigBranch, ConfigCondition, ConfigVariable, PolicyAction, PolicyConfig, PolicyTemplate,
    ValidationIssue,
};

const DEFAULT_CASE: &str = "For all other cases, use the queue's assignment strategy.";

#[derive(Debug, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Phrases looked for in the request; multi-word phrases weigh more.
    pub keywords: &'static [&'static str],
    pub template: &'static str,
}

impl Scenario {
    /// Sum of the word counts of every keyword found in `message` (already lowercased).
    fn score(&self, message: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| message.contains(&k.to_lowercase()))
            .map(|k| k.split(' ').count())
            .sum()
    }
}

pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        id: "preferred-expert-assignment",
        name: "Assign to Preferred Expert",
        description: "Route customers to their designated preferred expert based on conditions",
        keywords: &[
            "preferred",
            "expert",
            "designated",
            "mapped",
            "assigned agent",
            "specific agent",
            "gold",
            "vip",
            "priority",
        ],
        template: "Get {variables}.\n\n\
                   When {conditions}, assign to the customer's preferred expert.\n\n\
                   If no preferred expert is available, assign to a previous expert who helped the customer in the last {lookback_days} days.\n\n\
                   For all other cases, use the queue's assignment strategy.",
    },
    Scenario {
        id: "previous-expert-assignment",
        name: "Assign to Previous Expert",
        description: "Route customers to an expert they have interacted with before",
        keywords: &["previous", "last", "interacted", "history", "familiar", "continuity", "same agent"],
        template: "Get {variables}.\n\n\
                   When {conditions}, assign to a previous expert who helped the customer in the last {lookback_days} days{expert_requirements}.\n\n\
                   For all other cases, use the queue's assignment strategy.",
    },
    Scenario {
        id: "tiered-assignment",
        name: "Tiered Assignment Policy",
        description: "Different assignment actions for different customer segments",
        keywords: &[
            "tier",
            "segment",
            "different",
            "gold silver",
            "premium standard",
            "vip regular",
            "based on",
        ],
        template: "Get {variables}.\n\n\
                   {tier_conditions}\n\n\
                   For all other cases, use the queue's assignment strategy.",
    },
];

/// The best scoring scenario for a request. Ties keep the earlier
/// scenario; a request matching nothing gets the first one.
pub fn detect_scenario(message: &str) -> &'static Scenario {
    let lower = message.to_lowercase();
    let mut best = &SCENARIOS[0];
    let mut best_score = 0;
    for scenario in SCENARIOS {
        let score = scenario.score(&lower);
        if score > best_score {
            best = scenario;
            best_score = score;
        }
    }
    tracing::debug!(scenario = best.id, score = best_score, "detected scenario");
    best
}

/// One "When <variable> is <values>, <action>." line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRow {
    #[serde(default)]
    pub id: String,
    /// Catalog variable id.
    pub variable: String,
    #[serde(default)]
    pub values: Vec<String>,
    pub action: PolicyAction,
    #[serde(default)]
    pub lookback_days: Option<u32>,
}

impl ConditionRow {
    fn is_complete(&self) -> bool {
        catalog::variable(&self.variable).is_some() && !self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopilotPolicy {
    pub rows: Vec<ConditionRow>,
    /// Used by previous-expert rows that don't set their own lookback.
    #[serde(default = "default_lookback")]
    pub lookback_days: u32,
}

fn default_lookback() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

impl CopilotPolicy {
    pub fn new(rows: Vec<ConditionRow>) -> Self {
        Self { rows, lookback_days: DEFAULT_LOOKBACK_DAYS }
    }

    fn lookback(&self, row: &ConditionRow) -> u32 {
        row.lookback_days.filter(|d| *d > 0).unwrap_or(self.lookback_days)
    }

    fn row_id(row: &ConditionRow, index: usize) -> String {
        if row.id.is_empty() {
            format!("row-{}", index)
        } else {
            row.id.clone()
        }
    }

    fn action_text(&self, row: &ConditionRow) -> String {
        match row.action {
            PolicyAction::PreferredExpert => "assign to the customer's preferred expert".to_string(),
            PolicyAction::PreviousExpert => format!(
                "assign to a previous expert who helped them in the last {} days",
                self.lookback(row)
            ),
            PolicyAction::QueueStrategy => "use the queue's assignment strategy".to_string(),
        }
    }

    /// Variables named by the rows, first mention wins.
    fn variables(&self) -> Vec<&'static catalog::Variable> {
        let mut seen: Vec<&'static catalog::Variable> = Vec::new();
        for row in &self.rows {
            if let Some(var) = catalog::variable(&row.variable) {
                if !seen.iter().any(|v| v.id == var.id) {
                    seen.push(var);
                }
            }
        }
        seen
    }
}

impl PolicyTemplate for CopilotPolicy {
    /// Empty when there are no rows.
    fn render(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        let vars: Vec<String> = self
            .variables()
            .into_iter()
            .map(|v| match v.source {
                VariableSource::Context => {
                    format!("the customer's {} from ContextVariable.{}", v.label, v.id)
                }
                VariableSource::Lwi => format!("the {} from LiveWorkItem.{}", v.label, v.id),
            })
            .collect();

        let mut lines = vec![format!("Get {}.", vars.join(" and ")), String::new()];
        for row in self.rows.iter().filter(|r| r.is_complete()) {
            let label = catalog::variable(&row.variable).map(|v| v.label).unwrap_or_default();
            lines.push(format!(
                "When {} is {}, {}.",
                label,
                row.values.join(" or "),
                self.action_text(row)
            ));
            lines.push(String::new());
        }
        lines.push(DEFAULT_CASE.to_string());
        lines.join("\n")
    }

    fn config(&self) -> PolicyConfig {
        PolicyConfig {
            selected_variables: self
                .variables()
                .into_iter()
                .map(|v| ConfigVariable {
                    id: v.id.to_string(),
                    label: v.label.to_string(),
                    variable_type: v.source,
                })
                .collect(),
            conditions: self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_complete())
                .filter_map(|(i, r)| {
                    let var = catalog::variable(&r.variable)?;
                    Some(ConfigBranch {
                        id: Self::row_id(r, i),
                        conditions: vec![ConfigCondition {
                            variable_id: var.id.to_string(),
                            variable_label: var.label.to_string(),
                            variable_type: var.source,
                            values: r.values.clone(),
                        }],
                        action: r.action,
                        lookback_period: (r.action == PolicyAction::PreviousExpert)
                            .then(|| self.lookback(r)),
                        user_attributes: None,
                    })
                })
                .collect(),
            default_action: PolicyAction::QueueStrategy,
        }
    }

    fn validate(&self) -> Vec<ValidationIssue> {
        if self.rows.is_empty() {
            return vec![ValidationIssue::template("rows", "Add at least one condition")];
        }
        let mut issues = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let id = Some(Self::row_id(row, i));
            if catalog::variable(&row.variable).is_none() {
                issues.push(ValidationIssue {
                    branch_id: id,
                    field: "variable".to_string(),
                    message: format!("Condition {}: Unknown variable \"{}\"", i + 1, row.variable),
                });
            } else if row.values.is_empty() {
                issues.push(ValidationIssue {
                    branch_id: id,
                    field: row.variable.clone(),
                    message: format!("Condition {}: Please select a value", i + 1),
                });
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(variable: &str, values: &[&str], action: PolicyAction) -> ConditionRow {
        ConditionRow {
            id: String::new(),
            variable: variable.to_string(),
            values: values.iter().map(|s| s.to_string()).collect(),
            action,
            lookback_days: None,
        }
    }

    #[test]
    fn test_detect_scenario() {
        assert_eq!(
            detect_scenario("Gold tier customers should go to their preferred expert").id,
            "preferred-expert-assignment"
        );
        assert_eq!(
            detect_scenario("Route billing to the previous agent they interacted with").id,
            "previous-expert-assignment"
        );
        assert_eq!(
            detect_scenario("Different handling for VIP vs regular, based on segment").id,
            "tiered-assignment"
        );
    }

    #[test]
    fn test_detect_scenario_defaults_to_first() {
        assert_eq!(detect_scenario("hello there").id, SCENARIOS[0].id);
        assert_eq!(detect_scenario("").id, SCENARIOS[0].id);
    }

    #[test]
    fn test_multi_word_keywords_weigh_more() {
        // "same agent" (2) beats "expert" (1)
        assert_eq!(
            detect_scenario("keep the same agent, any expert").id,
            "previous-expert-assignment"
        );
    }

    #[test]
    fn test_render() {
        let mut rows = vec![
            row("CustomerTier", &["Gold", "Platinum"], PolicyAction::PreferredExpert),
            row("Intent", &["Billing Inquiry"], PolicyAction::PreviousExpert),
            row("CustomerTier", &[], PolicyAction::QueueStrategy),
        ];
        rows[1].lookback_days = Some(30);
        let text = CopilotPolicy::new(rows).render();
        assert_eq!(
            text,
            "Get the customer's Customer Tier from ContextVariable.CustomerTier and the Conversation Intent from LiveWorkItem.Intent.\n\
             \n\
             When Customer Tier is Gold or Platinum, assign to the customer's preferred expert.\n\
             \n\
             When Conversation Intent is Billing Inquiry, assign to a previous expert who helped them in the last 30 days.\n\
             \n\
             For all other cases, use the queue's assignment strategy."
        );
    }

    #[test]
    fn test_no_rows_renders_nothing() {
        let policy = CopilotPolicy::new(vec![]);
        assert_eq!(policy.render(), "");
        assert!(policy.apply().is_err());
    }

    #[test]
    fn test_config_skips_incomplete_rows() {
        let policy = CopilotPolicy::new(vec![
            row("IsVIP", &["True"], PolicyAction::PreviousExpert),
            row("Channel", &[], PolicyAction::PreferredExpert),
        ]);
        let config = policy.config();
        assert_eq!(config.selected_variables.len(), 2);
        assert_eq!(config.conditions.len(), 1);
        assert_eq!(config.conditions[0].lookback_period, Some(DEFAULT_LOOKBACK_DAYS));

        let issues = policy.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Condition 2: Please select a value");
    }

    proptest! {
        #[test]
        fn prop_detection_is_case_insensitive(message in "[A-Za-z ]{0,60}") {
            let lower = detect_scenario(&message.to_lowercase()).id;
            prop_assert_eq!(detect_scenario(&message.to_uppercase()).id, lower);
            prop_assert!(SCENARIOS.iter().any(|s| s.id == lower));
        }
    }
}
