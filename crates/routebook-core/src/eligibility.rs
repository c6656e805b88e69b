use crate::criteria::{parse_criteria, ParsedCriteria};
use crate::UserRecord;

/// Users matching already-parsed criteria, in their original order.
///
/// Empty criteria apply no filter and return every user.
pub fn filter_users<'a>(users: &'a [UserRecord], criteria: &ParsedCriteria) -> Vec<&'a UserRecord> {
    users.iter().filter(|u| criteria.matches(u)).collect()
}

/// Parse `criteria` and return the users it admits.
pub fn eligible_users<'a>(users: &'a [UserRecord], criteria: &str) -> Vec<&'a UserRecord> {
    let parsed = parse_criteria(criteria);
    if parsed.is_empty() {
        tracing::debug!("criteria named no known attribute values; no filter applied");
    }
    filter_users(users, &parsed)
}

pub fn eligible_count(users: &[UserRecord], criteria: &str) -> usize {
    eligible_users(users, criteria).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, Presence};
    use proptest::prelude::*;

    fn user(id: &str, skills: &[&str], language: &[&str]) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            name: id.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            language: language.iter().map(|s| s.to_string()).collect(),
            region: vec![],
            capacity_profile: vec![],
            intent: vec![],
            presence: Presence::Available,
        }
    }

    fn ids(users: &[&UserRecord]) -> Vec<String> {
        users.iter().map(|u| u.id.clone()).collect()
    }

    #[test]
    fn test_skills_billing_example() {
        let users = vec![user("u1", &["Billing"], &[]), user("u2", &["Technical Support"], &[])];
        assert_eq!(ids(&eligible_users(&users, "Skills Billing")), vec!["u1"]);
    }

    #[test]
    fn test_or_within_attribute() {
        let users = vec![
            user("es", &[], &["Spanish"]),
            user("en", &[], &["English"]),
            user("fr", &[], &["French"]),
        ];
        assert_eq!(
            ids(&eligible_users(&users, "Spanish or English language")),
            vec!["es", "en"]
        );
    }

    #[test]
    fn test_missing_attribute_value_excludes_user() {
        let users = vec![
            user("both", &["Billing"], &["Spanish"]),
            user("no-language", &["Billing"], &[]),
        ];
        assert_eq!(
            ids(&eligible_users(&users, "Skills Billing, Spanish language")),
            vec!["both"]
        );
    }

    #[test]
    fn test_unknown_text_returns_all_users() {
        let users = fixtures::users();
        assert_eq!(eligible_users(&users, "").len(), users.len());
        assert_eq!(eligible_users(&users, "friendly folks").len(), users.len());
    }

    #[test]
    fn test_exclusion() {
        let users = vec![user("es", &[], &["Spanish"]), user("en", &[], &["English"])];
        assert_eq!(ids(&eligible_users(&users, "not Spanish")), vec!["en"]);
    }

    #[test]
    fn test_presence_is_matched() {
        let mut busy = user("busy", &["Billing"], &[]);
        busy.presence = Presence::Busy;
        let users = vec![user("free", &["Billing"], &[]), busy];
        assert_eq!(ids(&eligible_users(&users, "Billing, presence Available")), vec!["free"]);
    }

    #[test]
    fn test_fixture_counts() {
        let users = fixtures::users();
        assert_eq!(eligible_count(&users, "Users with Spanish language"), 3);
        assert_eq!(eligible_count(&users, "Spanish language, Skills Gold tier"), 2);
        assert_eq!(eligible_count(&users, "Spanish-speaking agents"), 3);
    }

    #[test]
    fn test_and_keeps_the_named_attribute() {
        let users = vec![
            user("billing-sales", &["Billing", "Sales"], &[]),
            user("fraud", &["Fraud"], &[]),
            user("es", &["Billing"], &["Spanish"]),
            user("fr", &["Billing"], &["French"]),
            user("en", &["Billing"], &["English"]),
        ];
        assert_eq!(
            ids(&eligible_users(&users, "Skills Billing, language not Spanish and French")),
            vec!["billing-sales", "en"]
        );
    }

    fn arb_user() -> impl Strategy<Value = UserRecord> {
        let skills = proptest::sample::subsequence(crate::AttributeKey::Skills.values().to_vec(), 0..4);
        let languages =
            proptest::sample::subsequence(crate::AttributeKey::Language.values().to_vec(), 0..3);
        (skills, languages).prop_map(|(s, l)| user("u", &s, &l))
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_idempotent(
            users in proptest::collection::vec(arb_user(), 0..12),
            text in "[A-Za-z ,]{0,40}",
        ) {
            let first: Vec<UserRecord> = eligible_users(&users, &text).into_iter().cloned().collect();
            let second: Vec<UserRecord> = eligible_users(&users, &text).into_iter().cloned().collect();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_unrelated_attribute_only_narrows(
            users in proptest::collection::vec(arb_user(), 0..12),
        ) {
            let base = eligible_users(&users, "Skills Billing");
            let narrowed = eligible_users(&users, "Skills Billing, Spanish language");
            for u in &narrowed {
                prop_assert!(base.iter().any(|b| std::ptr::eq(*b, *u)));
                prop_assert!(u.language.iter().any(|l| l == "Spanish"));
            }
            let expected = base.iter().filter(|u| u.language.iter().any(|l| l == "Spanish")).count();
            prop_assert_eq!(narrowed.len(), expected);
        }

        #[test]
        fn prop_either_value_is_enough(users in proptest::collection::vec(arb_user(), 0..12)) {
            let matched = eligible_users(&users, "Spanish or English language");
            let expected = users
                .iter()
                .filter(|u| u.language.iter().any(|l| l == "Spanish" || l == "English"))
                .count();
            prop_assert_eq!(matched.len(), expected);
        }
    }
}
