//! Pieces shared by the policy templates: selected variables, branch
//! conditions, the exported policy config and validation issues.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{self, Variable, VariableSource};

pub(crate) const CHOOSE_VALUE: &str = "[choose value]";

/// A catalog variable picked for a template, with an optional wording
/// that replaces its label in the rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVariable {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

impl SelectedVariable {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), description: String::new() }
    }
}

/// A selected variable joined with its catalog entry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'a> {
    pub var: &'static Variable,
    pub description: &'a str,
}

impl Resolved<'_> {
    /// Name used inside conditions: the description, else the label.
    pub fn name(&self) -> &str {
        if self.description.is_empty() {
            self.var.label
        } else {
            self.description
        }
    }

    /// Name used in the `Get ...` line: the description, else the label lowercased.
    fn declared_name(&self) -> String {
        if self.description.is_empty() {
            self.var.label.to_lowercase()
        } else {
            self.description.to_string()
        }
    }
}

/// Catalog entries for `selected`, in order. Unknown ids are dropped
/// (and reported by [`unknown_variables`]).
pub(crate) fn resolve(selected: &[SelectedVariable]) -> Vec<Resolved<'_>> {
    selected
        .iter()
        .filter_map(|s| {
            catalog::variable(&s.id).map(|var| Resolved { var, description: &s.description })
        })
        .collect()
}

pub(crate) fn unknown_variables(selected: &[SelectedVariable]) -> Vec<ValidationIssue> {
    selected
        .iter()
        .filter(|s| catalog::variable(&s.id).is_none())
        .map(|s| ValidationIssue {
            branch_id: None,
            field: s.id.clone(),
            message: format!("Unknown variable \"{}\"", s.id),
        })
        .collect()
}

/// `Get the <name> from ContextVariable.<id> and the ... .`
pub(crate) fn declaration_line(vars: &[Resolved<'_>]) -> String {
    let parts: Vec<String> = vars
        .iter()
        .map(|v| format!("the {} from {}.{}", v.declared_name(), v.var.source.prefix(), v.var.id))
        .collect();
    format!("Get {}.", parts.join(" and "))
}

/// Per-branch values of the template's variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BranchConditions {
    /// Variable id → selected values.
    #[serde(default)]
    pub variable_values: BTreeMap<String, Vec<String>>,
    /// Variable id → whether the values are exclusions ("All except").
    #[serde(default)]
    pub variable_exclude_mode: BTreeMap<String, bool>,
    /// Variables this branch ignores.
    #[serde(default)]
    pub disabled_variables: Vec<String>,
}

impl BranchConditions {
    pub fn values(&self, variable_id: &str) -> &[String] {
        self.variable_values
            .get(variable_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_excluding(&self, variable_id: &str) -> bool {
        self.variable_exclude_mode
            .get(variable_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_active(&self, variable_id: &str) -> bool {
        !self.disabled_variables.iter().any(|d| d == variable_id)
    }

    pub(crate) fn active<'a, 'b>(&self, vars: &'b [Resolved<'a>]) -> Vec<&'b Resolved<'a>> {
        vars.iter().filter(|v| self.is_active(v.var.id)).collect()
    }

    /// One `<name> is ...` fragment per active variable.
    pub(crate) fn condition_parts(&self, vars: &[Resolved<'_>]) -> Vec<String> {
        self.active(vars)
            .into_iter()
            .map(|v| {
                let values = self.values(v.var.id);
                let name = v.name();
                if values.is_empty() {
                    format!("{} is {}", name, CHOOSE_VALUE)
                } else if self.is_excluding(v.var.id) {
                    format!("{} is All except {}", name, values.join(", "))
                } else if v.var.is_all(values) {
                    format!("{} is All", name)
                } else {
                    format!("{} is {}", name, values.join(" or "))
                }
            })
            .collect()
    }

    /// "Branch N: Please select a value for ..." for each active variable left empty.
    pub(crate) fn missing_values(
        &self,
        branch_id: &str,
        index: usize,
        vars: &[Resolved<'_>],
    ) -> Vec<ValidationIssue> {
        self.active(vars)
            .into_iter()
            .filter(|v| self.values(v.var.id).is_empty())
            .map(|v| ValidationIssue {
                branch_id: Some(branch_id.to_string()),
                field: v.var.id.to_string(),
                message: format!(
                    "Branch {}: Please select a value for \"{}\"",
                    index + 1,
                    v.name()
                ),
            })
            .collect()
    }

    /// Every selected variable (disabled ones too) with this branch's values.
    pub(crate) fn config_conditions(&self, vars: &[Resolved<'_>]) -> Vec<ConfigCondition> {
        vars.iter()
            .map(|v| ConfigCondition {
                variable_id: v.var.id.to_string(),
                variable_label: v.var.label.to_string(),
                variable_type: v.var.source,
                values: self.values(v.var.id).to_vec(),
            })
            .collect()
    }
}

// --- Exported config ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyAction {
    PreferredExpert,
    PreviousExpert,
    QueueStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVariable {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub variable_type: VariableSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCondition {
    pub variable_id: String,
    pub variable_label: String,
    pub variable_type: VariableSource,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigAttribute {
    pub id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigBranch {
    pub id: String,
    pub conditions: Vec<ConfigCondition>,
    pub action: PolicyAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookback_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_attributes: Option<Vec<ConfigAttribute>>,
}

/// Structured form of a generated policy, stored next to its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    pub selected_variables: Vec<ConfigVariable>,
    pub conditions: Vec<ConfigBranch>,
    pub default_action: PolicyAction,
}

pub(crate) fn config_variables(vars: &[Resolved<'_>]) -> Vec<ConfigVariable> {
    vars.iter()
        .map(|v| ConfigVariable {
            id: v.var.id.to_string(),
            label: v.var.label.to_string(),
            variable_type: v.var.source,
        })
        .collect()
}

// --- Validation ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Branch the issue belongs to; `None` for template-wide problems.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<String>,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub(crate) fn template(field: &str, message: &str) -> Self {
        Self { branch_id: None, field: field.to_string(), message: message.to_string() }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Text plus structured config, produced once a template validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedPolicy {
    pub text: String,
    pub config: PolicyConfig,
}

/// A fill-in-the-blanks policy editor.
///
/// `render` always succeeds and leaves `[choose ...]` placeholders where
/// input is missing; `apply` refuses to render until `validate` is clean.
pub trait PolicyTemplate {
    fn render(&self) -> String;
    fn config(&self) -> PolicyConfig;
    fn validate(&self) -> Vec<ValidationIssue>;

    fn apply(&self) -> Result<RenderedPolicy, Vec<ValidationIssue>> {
        let issues = self.validate();
        if !issues.is_empty() {
            tracing::debug!(count = issues.len(), "template has validation issues");
            return Err(issues);
        }
        Ok(RenderedPolicy {
            text: self.render(),
            config: self.config(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(pairs: &[(&str, &[&str])]) -> BranchConditions {
        BranchConditions {
            variable_values: pairs
                .iter()
                .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_declaration_line_uses_description_or_lowercase_label() {
        let selected = vec![
            SelectedVariable {
                id: "IsVIP".into(),
                description: "customer's VIP status".into(),
            },
            SelectedVariable::new("Intent"),
        ];
        assert_eq!(
            declaration_line(&resolve(&selected)),
            "Get the customer's VIP status from ContextVariable.IsVIP and the conversation intent from LiveWorkItem.Intent."
        );
    }

    #[test]
    fn test_condition_parts() {
        let selected = vec![
            SelectedVariable::new("IsVIP"),
            SelectedVariable::new("Intent"),
            SelectedVariable::new("Priority"),
            SelectedVariable::new("Channel"),
        ];
        let vars = resolve(&selected);
        let mut b = branch(&[
            ("IsVIP", &["True", "False"]),
            ("Intent", &["Fraud Assist", "Billing Inquiry"]),
            ("Channel", &["Voice", "Chat"]),
        ]);
        b.variable_exclude_mode.insert("Channel".into(), true);
        assert_eq!(
            b.condition_parts(&vars),
            vec![
                "Is VIP Customer is All",
                "Conversation Intent is Fraud Assist or Billing Inquiry",
                "Priority is [choose value]",
                "Channel is All except Voice, Chat",
            ]
        );

        b.disabled_variables.push("Priority".into());
        assert_eq!(b.condition_parts(&vars).len(), 3);
        assert!(b.missing_values("b0", 0, &vars).is_empty());
    }

    #[test]
    fn test_missing_values_message() {
        let selected = vec![SelectedVariable {
            id: "CustomerTier".into(),
            description: "tier".into(),
        }];
        let issues = branch(&[]).missing_values("branch-1", 1, &resolve(&selected));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "Branch 2: Please select a value for \"tier\"");
        assert_eq!(issues[0].branch_id.as_deref(), Some("branch-1"));
    }

    #[test]
    fn test_unknown_variables_are_reported_and_skipped() {
        let selected = vec![SelectedVariable::new("Mood"), SelectedVariable::new("IsVIP")];
        assert_eq!(resolve(&selected).len(), 1);
        let issues = unknown_variables(&selected);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].to_string(), "Unknown variable \"Mood\"");
    }

    #[test]
    fn test_action_serializes_kebab_case() {
        let json = serde_json::to_string(&PolicyAction::QueueStrategy).unwrap();
        assert_eq!(json, "\"queue-strategy\"");
    }
}
