use serde::{Deserialize, Serialize};

/// A user attribute the eligibility matcher recognizes.
///
/// Declaration order is the tie-break order when a value token belongs to
/// more than one attribute and the clause doesn't name either.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKey {
    Skills,
    Language,
    Region,
    CapacityProfile,
    Intent,
    Presence,
}

const SKILLS: &[&str] = &[
    "Billing",
    "Technical Support",
    "Sales",
    "Fraud",
    "Account Management",
    "Escalation",
    "VIP Support",
    "Returns",
    "Gold tier",
    "Platinum tier",
    "Silver tier",
];

const LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Mandarin",
    "Japanese",
    "Portuguese",
    "Hindi",
];

const REGIONS: &[&str] = &[
    "North America",
    "Europe",
    "Asia Pacific",
    "Latin America",
    "Middle East",
    "Africa",
];

const CAPACITY_PROFILES: &[&str] = &[
    "Standard capacity",
    "High capacity",
    "Voice only",
    "Chat only",
    "Blended",
];

const INTENTS: &[&str] = &[
    "Fraud Assist",
    "Billing Inquiry",
    "Technical Support",
    "General Inquiry",
    "Account Management",
    "Sales",
    "Complaints",
    "Returns",
];

const PRESENCE: &[&str] = &["Available", "Busy", "Away", "Offline"];

impl AttributeKey {
    pub const ALL: [AttributeKey; 6] = [
        AttributeKey::Skills,
        AttributeKey::Language,
        AttributeKey::Region,
        AttributeKey::CapacityProfile,
        AttributeKey::Intent,
        AttributeKey::Presence,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AttributeKey::Skills => "Skills",
            AttributeKey::Language => "Language",
            AttributeKey::Region => "Region",
            AttributeKey::CapacityProfile => "Capacity profile",
            AttributeKey::Intent => "Intent",
            AttributeKey::Presence => "Presence",
        }
    }

    /// Phrases (lowercase, space separated) that name this attribute in text.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            AttributeKey::Skills => &["skill", "skills", "skilled"],
            AttributeKey::Language => &["language", "languages", "speaks", "speaking"],
            AttributeKey::Region => &["region", "regions"],
            AttributeKey::CapacityProfile => &["capacity profile", "capacity profiles", "capacity"],
            AttributeKey::Intent => &["intent", "intents"],
            AttributeKey::Presence => &["presence", "status"],
        }
    }

    /// Known value tokens in canonical spelling.
    pub fn values(self) -> &'static [&'static str] {
        match self {
            AttributeKey::Skills => SKILLS,
            AttributeKey::Language => LANGUAGES,
            AttributeKey::Region => REGIONS,
            AttributeKey::CapacityProfile => CAPACITY_PROFILES,
            AttributeKey::Intent => INTENTS,
            AttributeKey::Presence => PRESENCE,
        }
    }

    /// Case-insensitive lookup of a value token, returning the canonical spelling.
    pub fn canonical_value(self, token: &str) -> Option<&'static str> {
        let token = token.trim();
        self.values()
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(token))
    }

    /// Every attribute whose vocabulary contains `token`, in declaration order.
    pub fn owners_of(token: &str) -> Vec<AttributeKey> {
        Self::ALL
            .into_iter()
            .filter(|k| k.canonical_value(token).is_some())
            .collect()
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
