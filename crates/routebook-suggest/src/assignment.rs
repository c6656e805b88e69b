//! Expert assignment policy: per-branch conditions routed to a preferred or
//! previous expert, with a lookback window and required user attributes.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, DEFAULT_LOOKBACK_DAYS};
use crate::template::{
    self, BranchConditions, ConfigAttribute, ConfigBranch, PolicyAction, PolicyConfig,
    PolicyTemplate, SelectedVariable, ValidationIssue, CHOOSE_VALUE,
};

const CLOSING_LINE: &str = "In case of no previous expert, assign to the next best expert in the queue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ExpertAction {
    #[default]
    PreferredExpert,
    PreviousExpert,
}

impl From<ExpertAction> for PolicyAction {
    fn from(action: ExpertAction) -> Self {
        match action {
            ExpertAction::PreferredExpert => PolicyAction::PreferredExpert,
            ExpertAction::PreviousExpert => PolicyAction::PreviousExpert,
        }
    }
}

/// Values an expert must (or must not) hold for one user attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRequirement {
    pub id: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub exclude: bool,
}

impl AttributeRequirement {
    fn text(&self) -> String {
        let label = catalog::user_attribute(&self.id)
            .map(|a| a.label)
            .unwrap_or(&self.id);
        if self.values.is_empty() {
            format!("has {} of {}", label, CHOOSE_VALUE)
        } else if self.exclude {
            format!("has {} of All except {}", label, self.values.join(", "))
        } else {
            format!("has {} of {}", label, self.values.join(" or "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentBranch {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub conditions: BranchConditions,
    #[serde(default)]
    pub action: ExpertAction,
    #[serde(default)]
    pub lookback_days: Option<u32>,
    /// Required expert attributes, in the order they were enabled.
    #[serde(default)]
    pub enabled_attributes: Vec<AttributeRequirement>,
}

impl AssignmentBranch {
    /// A blank branch as the editor creates it.
    pub fn new(index: usize) -> Self {
        Self {
            id: format!("branch-{}", index),
            conditions: BranchConditions::default(),
            action: ExpertAction::PreferredExpert,
            lookback_days: Some(DEFAULT_LOOKBACK_DAYS),
            enabled_attributes: Vec::new(),
        }
    }

    fn lookback(&self) -> u32 {
        match self.lookback_days {
            Some(days) if days > 0 => days,
            _ => DEFAULT_LOOKBACK_DAYS,
        }
    }

    fn attribute_text(&self) -> String {
        self.enabled_attributes
            .iter()
            .map(|a| format!(" and {}", a.text()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentTemplate {
    /// Context and live work item variables, context first.
    pub variables: Vec<SelectedVariable>,
    pub branches: Vec<AssignmentBranch>,
}

impl AssignmentTemplate {
    /// A template with `count` blank branches.
    pub fn with_branches(variables: Vec<SelectedVariable>, count: usize) -> Self {
        Self {
            variables,
            branches: (0..count).map(AssignmentBranch::new).collect(),
        }
    }

    fn branch_id(branch: &AssignmentBranch, index: usize) -> String {
        if branch.id.is_empty() {
            format!("branch-{}", index)
        } else {
            branch.id.clone()
        }
    }
}

impl PolicyTemplate for AssignmentTemplate {
    fn render(&self) -> String {
        let vars = template::resolve(&self.variables);
        let mut lines = Vec::new();
        if !vars.is_empty() {
            lines.push(template::declaration_line(&vars));
        }

        for branch in &self.branches {
            let parts = branch.conditions.condition_parts(&vars);
            let conditions = if parts.is_empty() {
                "[no conditions]".to_string()
            } else {
                parts.join(" AND ")
            };
            let lookback = branch.lookback();
            let attrs = branch.attribute_text();
            match branch.action {
                ExpertAction::PreferredExpert => {
                    lines.push(format!("For Customer where {}, offer to Preferred Expert.", conditions));
                    lines.push(format!(
                        "If no preferred agents are available, assign to an expert who has interacted with the customer in the last {} days{}.",
                        lookback, attrs
                    ));
                }
                ExpertAction::PreviousExpert => {
                    lines.push(format!("For Customer where {}, offer to Previous Expert.", conditions));
                    lines.push(format!(
                        "Route to expert who has interacted with the customer in the last {} days{}.",
                        lookback, attrs
                    ));
                }
            }
        }

        lines.push(CLOSING_LINE.to_string());
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
                    id: Self::branch_id(b, i),
                    conditions: b.conditions.config_conditions(&vars),
                    action: b.action.into(),
                    lookback_period: Some(b.lookback()),
                    user_attributes: Some(
                        b.enabled_attributes
                            .iter()
                            .map(|a| ConfigAttribute {
                                id: a.id.clone(),
                                value: a.values.join(", "),
                            })
                            .collect(),
                    ),
                })
                .collect(),
            default_action: PolicyAction::QueueStrategy,
        }
    }

    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = template::unknown_variables(&self.variables);
        let vars = template::resolve(&self.variables);
        if vars.is_empty() {
            issues.push(ValidationIssue::template("variables", "Select at least one variable"));
        }
        if self.branches.is_empty() {
            issues.push(ValidationIssue::template("branches", "Add at least one branch"));
        }
        for (i, branch) in self.branches.iter().enumerate() {
            let id = Self::branch_id(branch, i);
            issues.extend(branch.conditions.missing_values(&id, i, &vars));
        }
        issues
    }
}
