pub mod assignment;
pub mod catalog;
pub mod copilot;
pub mod ring;
mod template;

use routebook_core::{Policy, PolicyStatus, PolicyType, SelectionMode};

pub use assignment::{AssignmentBranch, AssignmentTemplate, AttributeRequirement, ExpertAction};
pub use copilot::{detect_scenario, ConditionRow, CopilotPolicy, Scenario};
pub use ring::{format_wait_time, ExpansionRule, RingBranch, RingExpansionTemplate};
pub use template::{
    BranchConditions, ConfigAttribute, ConfigBranch, ConfigCondition, ConfigVariable,
    PolicyAction, PolicyConfig, PolicyTemplate, RenderedPolicy, SelectedVariable,
    ValidationIssue,
};

impl RenderedPolicy {
    /// A draft policy carrying the rendered text, applied to every
    /// engagement profile until someone narrows it.
    pub fn into_draft(self, name: &str, policy_type: PolicyType) -> Policy {
        Policy {
            id: String::new(),
            prompt_name: name.to_string(),
            policy_behavior: self.text,
            selected_profiles: Vec::new(),
            selection_mode: SelectionMode::All,
            selected_trigger: "conversation-waiting".to_string(),
            status: PolicyStatus::Draft,
            last_modified: String::new(),
            policy_type,
            created_at: None,
        }
    }
}
