//! Static sample data: agents, queues, profiles, triggers, and the records
//! seeded into an empty store.

use chrono::{TimeZone, Utc};

use crate::{
    EngagementProfile, Policy, PolicyStatus, PolicyType, Presence, ProfileWithQueues, Queue,
    QueueProfileMapping, QueueType, SelectionMode, TriggerEvent, UserGroup, UserRecord,
};

/// Criteria offered as one-click examples when authoring a user group.
pub const EXAMPLE_CRITERIA: &[&str] = &[
    "Users with Spanish or English language, Skills Gold tier or Platinum tier",
    "Skills Billing or Fraud, Region North America",
    "Intent Technical Support, capacity profile Blended or High capacity",
    "Users with French language in Europe, presence Available",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn user(
    id: &str,
    name: &str,
    skills: &[&str],
    language: &[&str],
    region: &[&str],
    capacity_profile: &[&str],
    intent: &[&str],
    presence: Presence,
) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: name.to_string(),
        skills: strings(skills),
        language: strings(language),
        region: strings(region),
        capacity_profile: strings(capacity_profile),
        intent: strings(intent),
        presence,
    }
}

pub fn users() -> Vec<UserRecord> {
    use Presence::*;
    vec![
        user("u1", "Maria Garcia", &["Billing", "Gold tier"], &["Spanish", "English"], &["Latin America"], &["Standard capacity"], &["Billing Inquiry"], Available),
        user("u2", "James Wilson", &["Technical Support", "Platinum tier"], &["English"], &["North America"], &["High capacity"], &["Technical Support"], Busy),
        user("u3", "Sophie Martin", &["Account Management", "Silver tier"], &["French", "English"], &["Europe"], &["Blended"], &["Account Management"], Available),
        user("u4", "Hans Mueller", &["Fraud", "Escalation"], &["German", "English"], &["Europe"], &["Voice only"], &["Fraud Assist"], Away),
        user("u5", "Yuki Tanaka", &["Technical Support", "Gold tier"], &["Japanese", "English"], &["Asia Pacific"], &["Chat only"], &["Technical Support", "General Inquiry"], Available),
        user("u6", "Wei Zhang", &["Sales"], &["Mandarin", "English"], &["Asia Pacific"], &["High capacity"], &["Sales"], Busy),
        user("u7", "Ana Souza", &["Returns", "Billing"], &["Portuguese", "Spanish"], &["Latin America"], &["Blended"], &["Returns", "Billing Inquiry"], Available),
        user("u8", "Priya Sharma", &["VIP Support", "Platinum tier"], &["Hindi", "English"], &["Asia Pacific"], &["Standard capacity"], &["Complaints"], Available),
        user("u9", "Omar Haddad", &["Escalation", "Fraud"], &["English"], &["Middle East"], &["Voice only"], &["Fraud Assist", "Complaints"], Offline),
        user("u10", "Grace Okafor", &["Billing", "Silver tier"], &["English", "French"], &["Africa"], &["Chat only"], &["Billing Inquiry"], Available),
        user("u11", "Carlos Ruiz", &["Sales", "Gold tier"], &["Spanish"], &["North America"], &["Blended"], &["Sales", "General Inquiry"], Busy),
        user("u12", "Emily Chen", &["Technical Support", "VIP Support"], &["English", "Mandarin"], &["North America"], &["High capacity"], &["Technical Support"], Available),
    ]
}

fn queue(id: &str, name: &str, queue_type: QueueType, description: &str) -> Queue {
    Queue {
        id: id.to_string(),
        name: name.to_string(),
        queue_type,
        description: description.to_string(),
    }
}

pub fn queues() -> Vec<Queue> {
    use QueueType::*;
    vec![
        queue("q1", "General Support Queue", Messaging, "Default queue for general customer inquiries"),
        queue("q2", "VIP Support Queue", Messaging, "Priority handling for VIP customers"),
        queue("q3", "Technical Support Queue", Messaging, "Product and technical troubleshooting"),
        queue("q4", "Sales Queue", Voice, "Pre-sales questions and upgrades"),
        queue("q5", "Billing Queue", Messaging, "Invoices, payments and refunds"),
        queue("q6", "Chat Support Queue", Messaging, "Live chat conversations from the web widget"),
        queue("q7", "Live Chat Queue", Messaging, "In-app chat conversations"),
        queue("q8", "Case Management Queue", Email, "Email cases and follow-ups"),
        queue("q9", "Emergency Queue", Voice, "Urgent escalations and fraud reports"),
        queue("q10", "After Hours Queue", Voice, "Conversations received outside business hours"),
    ]
}

pub fn engagement_profiles() -> Vec<EngagementProfile> {
    [
        ("profile1", "Standard Support Profile"),
        ("profile2", "VIP Customer Profile"),
        ("profile3", "Technical Support Profile"),
        ("profile4", "Sales Team Profile"),
        ("profile5", "After-Hours Profile"),
        ("profile6", "Billing Support Profile"),
    ]
    .into_iter()
    .map(|(id, name)| EngagementProfile {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

pub fn queue_profile_mappings() -> Vec<QueueProfileMapping> {
    let profiles = engagement_profiles();
    let profile_for = |queue_id: &str| match queue_id {
        "q2" | "q9" => "profile2",
        "q3" => "profile3",
        "q4" => "profile4",
        "q5" => "profile6",
        "q10" => "profile5",
        _ => "profile1",
    };
    queues()
        .into_iter()
        .filter_map(|q| {
            let profile = profiles.iter().find(|p| p.id == profile_for(&q.id))?;
            Some(QueueProfileMapping {
                queue_id: q.id,
                queue_name: q.name,
                profile_id: profile.id.clone(),
                profile_name: profile.name.clone(),
            })
        })
        .collect()
}

pub fn trigger_events() -> Vec<TriggerEvent> {
    [
        ("conversation-waiting", "Conversation is waiting in queue"),
        ("conversation-transferred", "Conversation is transferred"),
    ]
    .into_iter()
    .map(|(id, label)| TriggerEvent {
        id: id.to_string(),
        label: label.to_string(),
    })
    .collect()
}

fn profile(id: &str, name: &str, queues: &[&str]) -> ProfileWithQueues {
    ProfileWithQueues {
        profile_id: id.to_string(),
        profile_name: name.to_string(),
        queues: strings(queues),
    }
}

#[allow(clippy::too_many_arguments)]
fn policy(
    id: &str,
    name: &str,
    behavior: &str,
    profiles: Vec<ProfileWithQueues>,
    mode: SelectionMode,
    trigger: &str,
    status: PolicyStatus,
    last_modified: &str,
    policy_type: PolicyType,
) -> Policy {
    Policy {
        id: id.to_string(),
        prompt_name: name.to_string(),
        policy_behavior: behavior.to_string(),
        selected_profiles: profiles,
        selection_mode: mode,
        selected_trigger: trigger.to_string(),
        status,
        last_modified: last_modified.to_string(),
        policy_type,
        created_at: None,
    }
}

/// Policies seeded into an empty policy store.
pub fn sample_policies() -> Vec<Policy> {
    vec![
        policy(
            "sample-1",
            "Overflow routing policy",
            "If queue wait time is greater than 5 minutes, then route to available overflow queue. Communicate with customer whenever overflow is triggered.",
            vec![profile("profile1", "Standard Support Profile", &["General Support Queue", "Chat Support Queue"])],
            SelectionMode::List,
            "conversation-waiting",
            PolicyStatus::Published,
            "Feb 21, 2025",
            PolicyType::Orchestrator,
        ),
        policy(
            "sample-2",
            "VIP customer routing",
            "Route VIP customers to available VIP agents immediately. If no VIP agents available, escalate to supervisor queue.",
            vec![profile("profile2", "VIP Customer Profile", &["VIP Support Queue", "Emergency Queue"])],
            SelectionMode::List,
            "conversation-waiting",
            PolicyStatus::Published,
            "Feb 18, 2025",
            PolicyType::Assignment,
        ),
        policy(
            "sample-3",
            "After hours automated response",
            "Send automated message to customers during after hours. Inform about business hours and expected response time.",
            vec![],
            SelectionMode::All,
            "conversation-waiting",
            PolicyStatus::Draft,
            "Feb 15, 2025",
            PolicyType::Orchestrator,
        ),
        policy(
            "sample-4",
            "Prioritize for technical issues",
            "Prioritize work items with technical issues and route to specialist agents first.",
            vec![profile("profile3", "Technical Support Profile", &["Technical Support Queue"])],
            SelectionMode::List,
            "conversation-transferred",
            PolicyStatus::Draft,
            "Feb 10, 2025",
            PolicyType::Assignment,
        ),
    ]
}

/// User groups seeded into an empty group store.
pub fn sample_user_groups() -> Vec<UserGroup> {
    let at = |day: u32| {
        Utc.with_ymd_and_hms(2025, 2, day, 9, 30, 0)
            .single()
            .unwrap_or_default()
    };
    vec![
        UserGroup {
            id: "ug-sample-1".to_string(),
            name: "Spanish billing specialists".to_string(),
            description: "Billing agents who can serve Spanish speaking customers".to_string(),
            eligibility_criteria: "Users with Spanish language, Skills Billing".to_string(),
            associated_queue_ids: strings(&["q5"]),
            last_updated: at(20),
        },
        UserGroup {
            id: "ug-sample-2".to_string(),
            name: "Premium tier experts".to_string(),
            description: "Gold and Platinum tier agents in North America and Europe".to_string(),
            eligibility_criteria: "Skills Gold tier or Platinum tier, Region North America or Europe".to_string(),
            associated_queue_ids: strings(&["q2", "q9"]),
            last_updated: at(14),
        },
        UserGroup {
            id: "ug-sample-3".to_string(),
            name: "Fraud responders".to_string(),
            description: "Agents handling fraud reports".to_string(),
            eligibility_criteria: "Intent Fraud Assist".to_string(),
            associated_queue_ids: strings(&["q9"]),
            last_updated: at(3),
        },
    ]
}
