//! Variables, user attributes and ring groups offered by the policy templates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VariableSource {
    /// Customer context, read from `ContextVariable.<id>`.
    Context,
    /// Live work item, read from `LiveWorkItem.<id>`.
    Lwi,
}

impl VariableSource {
    pub fn prefix(self) -> &'static str {
        match self {
            VariableSource::Context => "ContextVariable",
            VariableSource::Lwi => "LiveWorkItem",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Variable {
    pub id: &'static str,
    pub label: &'static str,
    pub values: &'static [&'static str],
    #[serde(rename = "type")]
    pub source: VariableSource,
}

impl Variable {
    /// True when `selected` covers every allowed value.
    pub fn is_all(&self, selected: &[String]) -> bool {
        selected.len() == self.values.len()
            && self.values.iter().all(|v| selected.iter().any(|s| s == v))
    }
}

/// A user attribute a branch can require of the expert.
#[derive(Debug, Serialize)]
pub struct UserAttribute {
    pub id: &'static str,
    pub label: &'static str,
    pub values: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct RingGroup {
    pub id: &'static str,
    pub name: &'static str,
}

const fn context(id: &'static str, label: &'static str, values: &'static [&'static str]) -> Variable {
    Variable { id, label, values, source: VariableSource::Context }
}

const fn lwi(id: &'static str, label: &'static str, values: &'static [&'static str]) -> Variable {
    Variable { id, label, values, source: VariableSource::Lwi }
}

pub static CONTEXT_VARIABLES: &[Variable] = &[
    context("IsVIP", "Is VIP Customer", &["True", "False"]),
    context(
        "CustomerTier",
        "Customer Tier",
        &["Gold", "Silver", "Bronze", "Standard", "Platinum", "Diamond", "Enterprise", "SMB", "Startup"],
    ),
    context(
        "Language",
        "Preferred Language",
        &["English", "Spanish", "French", "German", "Mandarin", "Japanese", "Portuguese"],
    ),
    context(
        "Region",
        "Customer Region",
        &["North America", "Europe", "Asia Pacific", "Latin America", "Middle East", "Africa"],
    ),
    context(
        "AccountType",
        "Account Type",
        &["Premium", "Standard", "Trial", "Free", "Enterprise", "Government", "Education"],
    ),
    context(
        "LoyaltyYears",
        "Years as Customer",
        &["< 1 year", "1-3 years", "3-5 years", "5+ years", "10+ years"],
    ),
    context("SpendTier", "Spend Tier", &["High Value", "Medium Value", "Low Value", "New Customer"]),
];

pub static LWI_VARIABLES: &[Variable] = &[
    lwi(
        "Intent",
        "Conversation Intent",
        &[
            "Fraud Assist",
            "Billing Inquiry",
            "Technical Support",
            "General Inquiry",
            "Account Management",
            "Sales",
            "Complaints",
            "Returns",
        ],
    ),
    lwi("Channel", "Channel", &["Voice", "Chat", "Email", "Social", "SMS", "WhatsApp", "Teams", "Web"]),
    lwi("Priority", "Priority", &["Urgent", "High", "Medium", "Low"]),
    lwi(
        "Sentiment",
        "Customer Sentiment",
        &["Very Positive", "Positive", "Neutral", "Negative", "Very Negative"],
    ),
    lwi(
        "ProductCategory",
        "Product Category",
        &["Software", "Hardware", "Services", "Subscription", "Support", "Training"],
    ),
    lwi("IssueComplexity", "Issue Complexity", &["Simple", "Moderate", "Complex", "Escalation Required"]),
];

pub static USER_ATTRIBUTES: &[UserAttribute] = &[
    UserAttribute {
        id: "Skills",
        label: "Skills",
        values: &[
            "Billing",
            "Technical Support",
            "Sales",
            "Fraud",
            "Account Management",
            "Escalation",
            "VIP Support",
            "Returns",
        ],
    },
    UserAttribute {
        id: "Language",
        label: "Language",
        values: &["English", "Spanish", "French", "German", "Mandarin", "Japanese", "Portuguese", "Hindi"],
    },
    UserAttribute {
        id: "Region",
        label: "Region",
        values: &["North America", "Europe", "Asia Pacific", "Latin America", "Middle East", "Africa"],
    },
    UserAttribute { id: "CSAT", label: "CSAT Score", values: &["5", "6", "7", "8", "9", "10"] },
    UserAttribute {
        id: "ResolutionRate",
        label: "Resolution Rate",
        values: &["70%", "75%", "80%", "85%", "90%", "95%"],
    },
    UserAttribute { id: "Availability", label: "Availability", values: &["Available", "Busy", "Away"] },
    UserAttribute {
        id: "ExpertiseLevel",
        label: "Expertise Level",
        values: &["Junior", "Mid", "Senior", "Expert", "Lead"],
    },
    UserAttribute {
        id: "Certification",
        label: "Certification",
        values: &["Basic", "Advanced", "Expert", "Master"],
    },
];

/// Agent groups a ring expansion can offer conversations to.
pub static RING_GROUPS: &[RingGroup] = &[
    RingGroup { id: "ug1", name: "Senior Support Agents" },
    RingGroup { id: "ug2", name: "Technical Specialists" },
    RingGroup { id: "ug3", name: "Standard Support Team" },
    RingGroup { id: "ug4", name: "Escalation Team" },
    RingGroup { id: "ug5", name: "VIP Support Team" },
    RingGroup { id: "ug6", name: "Billing Specialists" },
    RingGroup { id: "ug7", name: "Fraud Prevention Team" },
    RingGroup { id: "ug8", name: "Account Management Team" },
];

pub const LOOKBACK_DAYS: &[u32] = &[7, 10, 14, 20, 30, 60, 90];
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;
pub const WAIT_TIME_SECONDS: &[u32] = &[15, 30, 45, 60, 90, 120, 180, 300];

/// Look up a context or live work item variable by id.
pub fn variable(id: &str) -> Option<&'static Variable> {
    CONTEXT_VARIABLES
        .iter()
        .chain(LWI_VARIABLES.iter())
        .find(|v| v.id == id)
}

pub fn user_attribute(id: &str) -> Option<&'static UserAttribute> {
    USER_ATTRIBUTES.iter().find(|a| a.id == id)
}

pub fn ring_group_name(id: &str) -> Option<&'static str> {
    RING_GROUPS.iter().find(|g| g.id == id).map(|g| g.name)
}
