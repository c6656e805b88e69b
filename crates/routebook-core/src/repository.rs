use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::KeyValueStore;
use crate::{fixtures, Error, Policy, PolicyStatus, Result, UserGroup};

/// Storage key of the policy map.
pub const POLICY_KEY: &str = "agcd_prompts";
/// Storage key of the user group map.
pub const USER_GROUP_KEY: &str = "user_groups";

/// A JSON object of id → record stored under a single key.
///
/// Every write re-serializes the whole map; concurrent writers are
/// last-writer-wins.
pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Collection<T> {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _record: PhantomData,
        }
    }

    /// A missing key is an empty map. So is a malformed blob: it is logged
    /// and discarded, and the next write replaces it.
    pub fn load(&self) -> Result<BTreeMap<String, T>> {
        let Some(raw) = self.store.get(self.key)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::error!(key = self.key, error = %e, "discarding unreadable store blob");
                Ok(BTreeMap::new())
            }
        }
    }

    pub fn store_all(&self, map: &BTreeMap<String, T>) -> Result<()> {
        let json = serde_json::to_string(map)?;
        self.store.set(self.key, &json)
    }

    pub fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load()?.remove(id))
    }

    pub fn insert(&self, id: &str, record: T) -> Result<()> {
        let mut map = self.load()?;
        map.insert(id.to_string(), record);
        self.store_all(&map)
    }

    /// Returns whether a record was removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut map = self.load()?;
        let removed = map.remove(id).is_some();
        if removed {
            self.store_all(&map)?;
        }
        Ok(removed)
    }
}

// --- Policies ---

pub struct PolicyRepository {
    policies: Collection<Policy>,
    seed_samples: bool,
}

impl PolicyRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            policies: Collection::new(store, POLICY_KEY),
            seed_samples: true,
        }
    }

    pub fn with_samples(mut self, seed: bool) -> Self {
        self.seed_samples = seed;
        self
    }

    pub fn save(&self, id: &str, policy: Policy) -> Result<Policy> {
        self.save_at(id, policy, Utc::now())
    }

    /// Store `policy` under `id`, keeping the original creation time of an
    /// existing record.
    pub fn save_at(&self, id: &str, mut policy: Policy, now: DateTime<Utc>) -> Result<Policy> {
        policy.validate()?;
        let mut map = self.policies.load()?;
        let created_at = map
            .get(id)
            .and_then(|existing| existing.created_at)
            .unwrap_or_else(|| now.timestamp_millis());
        policy.id = id.to_string();
        policy.created_at = Some(created_at);
        policy.last_modified = crate::time_ago(now, now);
        map.insert(id.to_string(), policy.clone());
        self.policies.store_all(&map)?;
        tracing::info!(id, name = %policy.prompt_name, "saved policy");
        Ok(policy)
    }

    pub fn get(&self, id: &str) -> Result<Option<Policy>> {
        self.policies.get(id)
    }

    /// All policies, newest first; records without a creation time sort last.
    /// Sample policies are seeded into an empty store first.
    pub fn list(&self) -> Result<Vec<Policy>> {
        let mut map = self.policies.load()?;
        if map.is_empty() && self.seed_samples {
            for p in fixtures::sample_policies() {
                map.insert(p.id.clone(), p);
            }
            self.policies.store_all(&map)?;
            tracing::debug!(count = map.len(), "seeded sample policies");
        }
        let mut all: Vec<Policy> = map.into_values().collect();
        all.sort_by_key(|p| std::cmp::Reverse(p.created_at.unwrap_or(0)));
        Ok(all)
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.policies.remove(id)
    }

    pub fn duplicate(&self, id: &str) -> Result<Option<Policy>> {
        self.duplicate_at(id, Utc::now())
    }

    /// Copy a policy as a new draft. `None` when `id` doesn't exist.
    pub fn duplicate_at(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Policy>> {
        let mut map = self.policies.load()?;
        let Some(original) = map.get(id) else {
            return Ok(None);
        };
        let copy = Policy {
            id: format!("{}-copy-{}", id, now.timestamp_millis()),
            prompt_name: format!("{} (Copy)", original.prompt_name),
            status: PolicyStatus::Draft,
            last_modified: "Just now".to_string(),
            ..original.clone()
        };
        map.insert(copy.id.clone(), copy.clone());
        self.policies.store_all(&map)?;
        Ok(Some(copy))
    }
}

// --- User groups ---

pub struct UserGroupRepository {
    groups: Collection<UserGroup>,
    seed_samples: bool,
}

impl UserGroupRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            groups: Collection::new(store, USER_GROUP_KEY),
            seed_samples: true,
        }
    }

    pub fn with_samples(mut self, seed: bool) -> Self {
        self.seed_samples = seed;
        self
    }

    pub fn save(&self, group: UserGroup) -> Result<UserGroup> {
        self.save_at(group, Utc::now())
    }

    /// Validate and store a group. A blank id gets a fresh timestamp id.
    pub fn save_at(&self, mut group: UserGroup, now: DateTime<Utc>) -> Result<UserGroup> {
        group.validate()?;
        if group.id.trim().is_empty() {
            group.id = now.timestamp_millis().to_string();
        }
        group.last_updated = now;
        self.groups.insert(&group.id, group.clone())?;
        tracing::info!(id = %group.id, name = %group.name, "saved user group");
        Ok(group)
    }

    pub fn get(&self, id: &str) -> Result<Option<UserGroup>> {
        self.groups.get(id)
    }

    pub fn require(&self, id: &str) -> Result<UserGroup> {
        self.get(id)?.ok_or_else(|| Error::not_found("user group", id))
    }

    /// All groups, most recently updated first. Seeds samples into an empty store.
    pub fn list(&self) -> Result<Vec<UserGroup>> {
        let mut map = self.groups.load()?;
        if map.is_empty() && self.seed_samples {
            for g in fixtures::sample_user_groups() {
                map.insert(g.id.clone(), g);
            }
            self.groups.store_all(&map)?;
            tracing::debug!(count = map.len(), "seeded sample user groups");
        }
        let mut all: Vec<UserGroup> = map.into_values().collect();
        all.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(all)
    }

    pub fn search(&self, query: &str) -> Result<Vec<UserGroup>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|g| g.matches_search(query))
            .collect())
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        self.groups.remove(id)
    }
}

impl PolicyRepository {
    pub fn require(&self, id: &str) -> Result<Policy> {
        self.get(id)?.ok_or_else(|| Error::not_found("policy", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStore, MemoryStore, SelectionMode};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    fn draft(name: &str) -> Policy {
        Policy {
            id: String::new(),
            prompt_name: name.to_string(),
            policy_behavior: "Route to the overflow queue after 5 minutes".to_string(),
            selected_profiles: vec![],
            selection_mode: SelectionMode::All,
            selected_trigger: "conversation-waiting".to_string(),
            status: PolicyStatus::Draft,
            last_modified: String::new(),
            policy_type: Default::default(),
            created_at: None,
        }
    }

    fn group(id: &str, name: &str) -> UserGroup {
        UserGroup {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            eligibility_criteria: "Skills Billing".to_string(),
            associated_queue_ids: vec!["q5".to_string()],
            last_updated: Default::default(),
        }
    }

    #[test]
    fn test_list_seeds_samples_once() {
        let store = memory();
        let repo = PolicyRepository::new(store.clone());
        assert_eq!(repo.list().unwrap().len(), 4);
        assert!(store.get(POLICY_KEY).unwrap().is_some());

        repo.delete("sample-1").unwrap();
        assert_eq!(repo.list().unwrap().len(), 3);
    }

    #[test]
    fn test_without_samples_lists_nothing() {
        let repo = PolicyRepository::new(memory()).with_samples(false);
        assert!(repo.list().unwrap().is_empty());
        let groups = UserGroupRepository::new(memory()).with_samples(false);
        assert!(groups.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_keeps_created_at() {
        let repo = PolicyRepository::new(memory()).with_samples(false);
        let first = repo.save_at("p1", draft("Overflow"), now()).unwrap();
        assert_eq!(first.id, "p1");
        assert_eq!(first.created_at, Some(now().timestamp_millis()));
        assert_eq!(first.last_modified, "Just now");

        let later = now() + Duration::hours(2);
        let second = repo.save_at("p1", draft("Overflow v2"), later).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.get("p1").unwrap().unwrap().prompt_name, "Overflow v2");
    }

    #[test]
    fn test_save_rejects_blank_name() {
        let repo = PolicyRepository::new(memory()).with_samples(false);
        assert!(matches!(repo.save("p1", draft("  ")), Err(Error::Invalid(_))));
        assert!(repo.get("p1").unwrap().is_none());
    }

    #[test]
    fn test_list_orders_newest_first() {
        let repo = PolicyRepository::new(memory());
        repo.save_at("old", draft("Old"), now()).unwrap();
        repo.save_at("new", draft("New"), now() + Duration::minutes(5)).unwrap();
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_list_seeds_only_when_empty() {
        let repo = PolicyRepository::new(memory());
        repo.save_at("mine", draft("Mine"), now()).unwrap();
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["mine"]);
    }

    #[test]
    fn test_duplicate() {
        let repo = PolicyRepository::new(memory());
        repo.list().unwrap();
        let copy = repo.duplicate_at("sample-2", now()).unwrap().unwrap();
        assert_eq!(copy.id, format!("sample-2-copy-{}", now().timestamp_millis()));
        assert_eq!(copy.prompt_name, "VIP customer routing (Copy)");
        assert_eq!(copy.status, PolicyStatus::Draft);
        assert_eq!(copy.last_modified, "Just now");

        let original = repo.require("sample-2").unwrap();
        assert_eq!(original.status, PolicyStatus::Published);
        assert_eq!(copy.policy_behavior, original.policy_behavior);
        assert_eq!(repo.list().unwrap().len(), 5);

        assert!(repo.duplicate("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_false() {
        let repo = PolicyRepository::new(memory());
        assert!(!repo.delete("nope").unwrap());
        assert!(matches!(repo.require("nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_malformed_blob_reads_as_empty() {
        let store = memory();
        store.set(POLICY_KEY, "{not json").unwrap();
        let repo = PolicyRepository::new(store.clone()).with_samples(false);
        assert!(repo.list().unwrap().is_empty());

        repo.save_at("p1", draft("Recovered"), now()).unwrap();
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_group_save_assigns_id_and_timestamp() {
        let repo = UserGroupRepository::new(memory()).with_samples(false);
        let saved = repo.save_at(group("", "Billing"), now()).unwrap();
        assert_eq!(saved.id, now().timestamp_millis().to_string());
        assert_eq!(saved.last_updated, now());
        assert_eq!(repo.require(&saved.id).unwrap(), saved);
    }

    #[test]
    fn test_group_save_validates() {
        let repo = UserGroupRepository::new(memory()).with_samples(false);
        let mut g = group("g1", "Billing");
        g.eligibility_criteria.clear();
        assert!(repo.save(g).is_err());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_group_list_and_search() {
        let repo = UserGroupRepository::new(memory());
        assert_eq!(repo.list().unwrap().len(), 3);

        repo.save_at(group("g1", "Night shift"), now()).unwrap();
        let all = repo.list().unwrap();
        assert_eq!(all[0].id, "g1");
        assert_eq!(all.len(), 4);

        let found = repo.search("FRAUD").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "ug-sample-3");

        assert!(repo.delete("g1").unwrap());
        assert!(repo.get("g1").unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path()));
        PolicyRepository::new(store)
            .with_samples(false)
            .save_at("p1", draft("Persisted"), now())
            .unwrap();

        assert!(dir.path().join("agcd_prompts.json").exists());
        let reopened = PolicyRepository::new(Arc::new(FileStore::new(dir.path()))).with_samples(false);
        assert_eq!(reopened.require("p1").unwrap().prompt_name, "Persisted");
    }
}
