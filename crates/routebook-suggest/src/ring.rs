//! Ring expansion: offer a conversation to an initial set of agent groups,
//! then widen the ring after each wait time.

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::template::{
    self, BranchConditions, ConfigBranch, PolicyAction, PolicyConfig, PolicyTemplate,
    SelectedVariable, ValidationIssue,
};

const RESTRICTED_FALLBACK: &str = "Do not open the conversation to any other users in the queue.";
const OPEN_FALLBACK: &str = "If the conversation still remains unassigned, assign to any member of the queue.";

/// "45 seconds" under a minute, else whole minutes ("1 minute", "2 minutes").
pub fn format_wait_time(seconds: u32) -> String {
    if seconds >= 60 {
        let mins = seconds / 60;
        format!("{} minute{}", mins, if mins > 1 { "s" } else { "" })
    } else {
        format!("{} seconds", seconds)
    }
}

fn group_names(ids: &[String]) -> Vec<&'static str> {
    ids.iter()
        .filter_map(|id| catalog::ring_group_name(id))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionRule {
    #[serde(default)]
    pub id: String,
    pub wait_time_seconds: u32,
    #[serde(default)]
    pub user_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RingBranch {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub conditions: BranchConditions,
    #[serde(default)]
    pub initial_user_groups: Vec<String>,
    #[serde(default)]
    pub expansion_rules: Vec<ExpansionRule>,
}

impl RingBranch {
    pub fn new(index: usize) -> Self {
        Self {
            id: format!("branch-{}", index),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RingExpansionTemplate {
    #[serde(default)]
    pub variables: Vec<SelectedVariable>,
    pub branches: Vec<RingBranch>,
    /// Never fall back to the rest of the queue once the rings are exhausted.
    #[serde(default)]
    pub restricted: bool,
}

fn branch_id(branch: &RingBranch, index: usize) -> String {
    if branch.id.is_empty() {
        format!("branch-{}", index)
    } else {
        branch.id.clone()
    }
}

impl PolicyTemplate for RingExpansionTemplate {
    fn render(&self) -> String {
        let vars = template::resolve(&self.variables);
        let mut lines = Vec::new();
        if !vars.is_empty() {
            lines.push(template::declaration_line(&vars));
        }

        for branch in &self.branches {
            let initial = group_names(&branch.initial_user_groups);
            let initial = if initial.is_empty() {
                "[choose user group]".to_string()
            } else {
                initial.join(" or ")
            };
            let parts = branch.conditions.condition_parts(&vars);
            if parts.is_empty() {
                lines.push(format!("Assign the conversations to {}.", initial));
            } else {
                lines.push(format!(
                    "For Customer where {}, assign to {}.",
                    parts.join(" AND "),
                    initial
                ));
            }

            for (i, rule) in branch.expansion_rules.iter().enumerate() {
                let names = group_names(&rule.user_group_ids);
                let names = if names.is_empty() {
                    "[choose user group(s)]".to_string()
                } else {
                    names.join(" or ")
                };
                let wait = format_wait_time(rule.wait_time_seconds);
                if i == 0 {
                    lines.push(format!(
                        "If no support representative is available or the conversation remains unassigned for {}, expand to {}.",
                        wait, names
                    ));
                } else {
                    lines.push(format!(
                        "If the conversation is still unassigned after {}, expand to {}.",
                        wait, names
                    ));
                }
            }
        }

        let fallback = if self.restricted { RESTRICTED_FALLBACK } else { OPEN_FALLBACK };
        lines.push(fallback.to_string());
        lines.join("\n")
    }

    fn config(&self) -> PolicyConfig {
        let vars = template::resolve(&self.variables);
        PolicyConfig {
            selected_variables: template::config_variables(&vars),
            conditions: self
                .branches
                .iter()
                .enumerate()
                .map(|(i, b)| ConfigBranch {
                    id: branch_id(b, i),
                    conditions: b.conditions.config_conditions(&vars),
                    action: PolicyAction::QueueStrategy,
                    lookback_period: None,
                    user_attributes: Some(Vec::new()),
                })
                .collect(),
            default_action: PolicyAction::QueueStrategy,
        }
    }

    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = template::unknown_variables(&self.variables);
        if self.branches.is_empty() {
            issues.push(ValidationIssue::template("branches", "Add at least one branch"));
        }
        for (i, branch) in self.branches.iter().enumerate() {
            let id = branch_id(branch, i);
            if group_names(&branch.initial_user_groups).is_empty() {
                issues.push(ValidationIssue {
                    branch_id: Some(id.clone()),
                    field: "initialUserGroups".to_string(),
                    message: format!("Branch {}: Please select initial user group(s)", i + 1),
                });
            }
            for (r, rule) in branch.expansion_rules.iter().enumerate() {
                if group_names(&rule.user_group_ids).is_empty() {
                    issues.push(ValidationIssue {
                        branch_id: Some(id.clone()),
                        field: if rule.id.is_empty() { format!("rule-{}", r) } else { rule.id.clone() },
                        message: format!(
                            "Branch {}: Please select user group(s) for expansion rule {}",
                            i + 1,
                            r + 1
                        ),
                    });
                }
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn rule(wait: u32, groups: &[&str]) -> ExpansionRule {
        ExpansionRule {
            id: String::new(),
            wait_time_seconds: wait,
            user_group_ids: ids(groups),
        }
    }

    fn open_ring() -> RingExpansionTemplate {
        RingExpansionTemplate {
            variables: vec![],
            branches: vec![RingBranch {
                initial_user_groups: ids(&["ug1", "ug2"]),
                expansion_rules: vec![rule(30, &["ug3"]), rule(60, &["ug4"])],
                ..RingBranch::new(0)
            }],
            restricted: false,
        }
    }

    #[test]
    fn test_format_wait_time() {
        assert_eq!(format_wait_time(45), "45 seconds");
        assert_eq!(format_wait_time(60), "1 minute");
        assert_eq!(format_wait_time(90), "1 minute");
        assert_eq!(format_wait_time(180), "3 minutes");
    }

    #[test]
    fn test_render_without_conditions() {
        assert_eq!(
            open_ring().render(),
            "Assign the conversations to Senior Support Agents or Technical Specialists.\n\
             If no support representative is available or the conversation remains unassigned for 30 seconds, expand to Standard Support Team.\n\
             If the conversation is still unassigned after 1 minute, expand to Escalation Team.\n\
             If the conversation still remains unassigned, assign to any member of the queue."
        );
    }

    #[test]
    fn test_restricted_fallback() {
        let mut t = open_ring();
        t.restricted = true;
        assert!(t.render().ends_with("Do not open the conversation to any other users in the queue."));
    }

    #[test]
    fn test_render_with_conditions() {
        let mut t = open_ring();
        t.variables = vec![SelectedVariable::new("Priority")];
        t.branches[0]
            .conditions
            .variable_values
            .insert("Priority".into(), ids(&["Urgent"]));
        let text = t.render();
        assert!(text.starts_with("Get the priority from LiveWorkItem.Priority.\n"));
        assert!(text.contains(
            "For Customer where Priority is Urgent, assign to Senior Support Agents or Technical Specialists."
        ));
    }

    #[test]
    fn test_validation() {
        assert!(open_ring().validate().is_empty());

        let mut t = open_ring();
        t.branches[0].initial_user_groups.clear();
        t.branches[0].expansion_rules[1].user_group_ids = ids(&["nope"]);
        let messages: Vec<String> = t.validate().into_iter().map(|i| i.message).collect();
        assert_eq!(
            messages,
            vec![
                "Branch 1: Please select initial user group(s)",
                "Branch 1: Please select user group(s) for expansion rule 2",
            ]
        );
        let text = t.render();
        assert!(text.contains("Assign the conversations to [choose user group]."));
        assert!(text.contains("expand to [choose user group(s)]."));
    }

    #[test]
    fn test_config_uses_queue_strategy() {
        let config = open_ring().config();
        assert_eq!(config.conditions.len(), 1);
        assert_eq!(config.conditions[0].action, PolicyAction::QueueStrategy);
        assert_eq!(config.conditions[0].lookback_period, None);
    }

    proptest! {
        #[test]
        fn prop_wait_time_unit(seconds in 0u32..7200) {
            let text = format_wait_time(seconds);
            if seconds < 60 {
                prop_assert_eq!(text, format!("{} seconds", seconds));
            } else {
                prop_assert!(text.starts_with(&(seconds / 60).to_string()));
                prop_assert!(text.contains("minute"));
            }
        }
    }
}
