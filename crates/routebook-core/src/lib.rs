pub mod config;
pub mod criteria;
pub mod eligibility;
pub mod error;
pub mod fixtures;
pub mod groups;
pub mod policy;
pub mod repository;
pub mod rules;
pub mod store;
pub mod vocabulary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use config::RoutebookConfig;
pub use criteria::{parse_criteria, ParsedClause, ParsedCriteria};
pub use eligibility::{eligible_count, eligible_users, filter_users};
pub use error::{Error, Result};
pub use policy::{time_ago, PlaybookTab, PolicyFilter};
pub use repository::{Collection, PolicyRepository, UserGroupRepository};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use vocabulary::AttributeKey;

// --- Users and queues ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
pub enum Presence {
    Available,
    Busy,
    Away,
    Offline,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Available => "Available",
            Presence::Busy => "Busy",
            Presence::Away => "Away",
            Presence::Offline => "Offline",
        }
    }
}

/// An agent as seen by the eligibility matcher. Fixture data, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub region: Vec<String>,
    #[serde(default)]
    pub capacity_profile: Vec<String>,
    #[serde(default)]
    pub intent: Vec<String>,
    pub presence: Presence,
}

impl UserRecord {
    /// The values this user holds for an attribute. Presence is a single value.
    pub fn values_for(&self, key: AttributeKey) -> Vec<&str> {
        let list = match key {
            AttributeKey::Skills => &self.skills,
            AttributeKey::Language => &self.language,
            AttributeKey::Region => &self.region,
            AttributeKey::CapacityProfile => &self.capacity_profile,
            AttributeKey::Intent => &self.intent,
            AttributeKey::Presence => return vec![self.presence.as_str()],
        };
        list.iter().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QueueType {
    Messaging,
    Voice,
    Email,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub queue_type: QueueType,
    #[serde(default)]
    pub description: String,
}

// --- User groups ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub eligibility_criteria: String,
    #[serde(default)]
    pub associated_queue_ids: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

// --- Policies (playbooks) ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    All,
    List,
    Except,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
pub enum PolicyStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
pub enum PolicyType {
    #[default]
    Orchestrator,
    Assignment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWithQueues {
    pub profile_id: String,
    pub profile_name: String,
    #[serde(default)]
    pub queues: Vec<String>,
}

/// A saved routing policy: trigger, behavior text and the engagement
/// profiles it applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub prompt_name: String,
    #[serde(default)]
    pub policy_behavior: String,
    #[serde(default)]
    pub selected_profiles: Vec<ProfileWithQueues>,
    #[serde(default)]
    pub selection_mode: SelectionMode,
    #[serde(default = "default_trigger")]
    pub selected_trigger: String,
    #[serde(default)]
    pub status: PolicyStatus,
    #[serde(default)]
    pub last_modified: String,
    #[serde(rename = "type", default)]
    pub policy_type: PolicyType,
    /// Epoch milliseconds; used for ordering and the "new" tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

fn default_trigger() -> String {
    "conversation-waiting".to_string()
}

// --- Profiles and triggers ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementProfile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueueProfileMapping {
    pub queue_id: String,
    pub queue_name: String,
    pub profile_id: String,
    pub profile_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerEvent {
    pub id: String,
    pub label: String,
}

// --- Storage location ---

/// Resolve the default data directory (~/.routebook/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".routebook")
}
