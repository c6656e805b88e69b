use crate::eligibility::eligible_users;
use crate::{Error, Queue, Result, UserGroup, UserRecord};

impl UserGroup {
    /// Save-time form check: name and criteria must not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("user group name is required"));
        }
        if self.eligibility_criteria.trim().is_empty() {
            return Err(Error::invalid("eligibility criteria are required"));
        }
        Ok(())
    }

    /// Queues this group references, in `queues` order. Ids with no queue are skipped.
    pub fn associated_queues<'a>(&self, queues: &'a [Queue]) -> Vec<&'a Queue> {
        queues
            .iter()
            .filter(|q| self.associated_queue_ids.contains(&q.id))
            .collect()
    }

    pub fn eligible_users<'a>(&self, users: &'a [UserRecord]) -> Vec<&'a UserRecord> {
        eligible_users(users, &self.eligibility_criteria)
    }

    /// Case-insensitive match on name or description. A blank query matches.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// Queues whose name or description contains `query`, ignoring case.
pub fn search_queues<'a>(queues: &'a [Queue], query: &str) -> Vec<&'a Queue> {
    let query = query.trim().to_lowercase();
    queues
        .iter()
        .filter(|q| {
            query.is_empty()
                || q.name.to_lowercase().contains(&query)
                || q.description.to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn group(queue_ids: &[&str]) -> UserGroup {
        UserGroup {
            id: "g1".into(),
            name: "Billing".into(),
            description: "Spanish speaking billing agents".into(),
            eligibility_criteria: "Skills Billing".into(),
            associated_queue_ids: queue_ids.iter().map(|s| s.to_string()).collect(),
            last_updated: Default::default(),
        }
    }

    #[test]
    fn test_orphaned_queue_ids_are_skipped() {
        let queues = fixtures::queues();
        let g = group(&["q5", "deleted-queue", "q1"]);
        let names: Vec<&str> = g.associated_queues(&queues).iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["General Support Queue", "Billing Queue"]);
    }

    #[test]
    fn test_validate() {
        let mut g = group(&[]);
        assert!(g.validate().is_ok());
        g.eligibility_criteria = "  ".into();
        assert!(matches!(g.validate(), Err(Error::Invalid(_))));
        g.eligibility_criteria = "Skills Billing".into();
        g.name.clear();
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_search() {
        let g = group(&[]);
        assert!(g.matches_search("spanish"));
        assert!(g.matches_search(""));
        assert!(!g.matches_search("fraud"));

        let queues = fixtures::queues();
        assert_eq!(search_queues(&queues, "refunds").len(), 1);
        assert_eq!(search_queues(&queues, " ").len(), queues.len());
    }
}
