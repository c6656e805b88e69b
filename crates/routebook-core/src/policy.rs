use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Policy, PolicyType, Result, SelectionMode};

const ONE_DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Engagement profile tab a policy is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum PlaybookTab {
    Overflow,
    AutomatedMessages,
    DynamicPrioritization,
    AssignmentMethod,
}

impl Policy {
    pub fn validate(&self) -> Result<()> {
        if self.prompt_name.trim().is_empty() {
            return Err(Error::invalid("policy name is required"));
        }
        Ok(())
    }

    /// Created within the last 24 hours.
    pub fn is_new(&self, now: DateTime<Utc>) -> bool {
        match self.created_at {
            Some(created) => now.timestamp_millis() - created < ONE_DAY_MS,
            None => false,
        }
    }

    pub fn profile_display_text(&self) -> String {
        let names = || {
            self.selected_profiles
                .iter()
                .map(|p| p.profile_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.selection_mode {
            SelectionMode::All => "All Engagement profiles".to_string(),
            SelectionMode::List if !self.selected_profiles.is_empty() => names(),
            SelectionMode::Except if !self.selected_profiles.is_empty() => {
                format!("All except: {}", names())
            }
            _ => "No profiles".to_string(),
        }
    }

    /// Whether the policy runs for the engagement profile `profile_id`.
    pub fn applies_to_profile(&self, profile_id: &str) -> bool {
        let listed = self
            .selected_profiles
            .iter()
            .any(|p| p.profile_id == profile_id);
        match self.selection_mode {
            SelectionMode::All => true,
            SelectionMode::List => listed,
            SelectionMode::Except => !listed,
        }
    }

    /// Classify by name keywords, falling back to the policy type.
    pub fn playbook_tab(&self) -> PlaybookTab {
        let name = self.prompt_name.to_lowercase();
        if name.contains("overflow") {
            PlaybookTab::Overflow
        } else if name.contains("automated") || name.contains("message") {
            PlaybookTab::AutomatedMessages
        } else if name.contains("priorit") {
            PlaybookTab::DynamicPrioritization
        } else if ["assignment", "vip", "expert", "callback"]
            .iter()
            .any(|k| name.contains(k))
        {
            PlaybookTab::AssignmentMethod
        } else if self.policy_type == PolicyType::Assignment {
            PlaybookTab::AssignmentMethod
        } else {
            PlaybookTab::Overflow
        }
    }
}

/// Narrows the playbook list. Empty fields don't filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyFilter {
    pub policy_type: Option<PolicyType>,
    /// Case-insensitive substring of the name or trigger id.
    pub query: String,
    pub profile_id: Option<String>,
    pub tab: Option<PlaybookTab>,
}

impl PolicyFilter {
    pub fn matches(&self, policy: &Policy) -> bool {
        let query = self.query.trim().to_lowercase();
        let found = query.is_empty()
            || policy.prompt_name.to_lowercase().contains(&query)
            || policy.selected_trigger.to_lowercase().contains(&query);
        found
            && self.policy_type.map_or(true, |t| policy.policy_type == t)
            && self.tab.map_or(true, |t| policy.playbook_tab() == t)
            && self
                .profile_id
                .as_deref()
                .map_or(true, |id| policy.applies_to_profile(id))
    }

    /// Matching policies, order kept.
    pub fn apply<'a>(&self, policies: &'a [Policy]) -> Vec<&'a Policy> {
        policies.iter().filter(|p| self.matches(p)).collect()
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
}

/// "Just now", "N minutes ago", "N hours ago", "N days ago", then "Feb 21, 2025".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let (mins, hours, days) = (diff.num_minutes(), diff.num_hours(), diff.num_days());
    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        plural(mins, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}
