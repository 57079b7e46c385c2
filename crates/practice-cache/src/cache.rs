use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use mailnav_core_types::{PracticeId, PracticeRecord, SecondaryCode};

use crate::policy::CachePolicy;
use crate::store::PersistedCache;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    /// Persisted data adopted; `age_ms` lets the caller decide whether a
    /// background refresh is due.
    Loaded { age_ms: i64 },
    /// Persisted data older than the expiry window; nothing adopted.
    Stale,
}

/// Authoritative in-memory map of practices, keyed by cache key, with a
/// write-through secondary-code index for the fast lookup path.
///
/// Lock discipline: the map guard is never held across an await point;
/// every method is synchronous.
pub struct PracticeCache {
    records: RwLock<BTreeMap<String, PracticeRecord>>,
    secondary_index: DashMap<PracticeId, SecondaryCode>,
    policy: CachePolicy,
}

impl PracticeCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            secondary_index: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn snapshot(&self) -> BTreeMap<String, PracticeRecord> {
        self.records.read().clone()
    }

    /// Adopt a persisted mirror if it is inside the expiry window. Keys
    /// are recomputed rather than trusted from disk.
    pub fn load(&self, persisted: PersistedCache, now: DateTime<Utc>) -> LoadOutcome {
        let age_ms = now.timestamp_millis() - persisted.cache_timestamp;
        if !self.policy.is_fresh(age_ms) {
            debug!(age_ms, "persisted cache stale, ignoring");
            return LoadOutcome::Stale;
        }
        self.install(persisted.practice_cache.into_values().collect());
        LoadOutcome::Loaded { age_ms }
    }

    /// Whole-map swap. Each fresh record is merged against any previous
    /// record with the same identifier: fresh non-empty fields win, and a
    /// previously resolved secondary code survives a refresh that did not
    /// re-fetch it. Records absent from the fresh list are dropped. When
    /// the fresh list repeats an identifier, the last occurrence wins.
    pub fn replace_all(&self, fresh: Vec<PracticeRecord>, now: DateTime<Utc>) -> usize {
        let previous: HashMap<PracticeId, PracticeRecord> = {
            let guard = self.records.read();
            guard
                .values()
                .map(|record| (record.identifier.clone(), record.clone()))
                .collect()
        };

        let mut merged: Vec<PracticeRecord> = Vec::with_capacity(fresh.len());
        for mut record in fresh {
            record.fetched_at = now;
            if let Some(old) = previous.get(&record.identifier) {
                merge_from_previous(&mut record, old);
            }
            merged.push(record);
        }
        self.install(merged)
    }

    /// Linear scan; the cache holds a few hundred records at most.
    pub fn get_by_identifier(&self, identifier: &PracticeId) -> Option<PracticeRecord> {
        self.records
            .read()
            .values()
            .find(|record| &record.identifier == identifier)
            .cloned()
    }

    pub fn get_by_cache_key(&self, key: &str) -> Option<PracticeRecord> {
        self.records.read().get(key).cloned()
    }

    /// Fast-path lookup through the index; kept consistent with the map
    /// by every write path.
    pub fn secondary_of(&self, identifier: &PracticeId) -> Option<SecondaryCode> {
        self.secondary_index
            .get(identifier)
            .map(|entry| entry.value().clone())
    }

    /// Write a resolved (or failed) secondary code back. Returns false
    /// when the identifier is not cached; the write is then dropped.
    pub fn upsert_secondary_code(
        &self,
        identifier: &PracticeId,
        code: SecondaryCode,
        now: DateTime<Utc>,
    ) -> bool {
        let mut guard = self.records.write();
        let key = guard
            .values()
            .find(|record| &record.identifier == identifier)
            .map(PracticeRecord::cache_key);
        let Some(key) = key else {
            debug!(%identifier, "secondary code write for unknown practice dropped");
            return false;
        };
        if let Some(record) = guard.get_mut(&key) {
            record.secondary_code = code.clone();
            record.fetched_at = now;
        }
        drop(guard);
        self.secondary_index.insert(identifier.clone(), code);
        true
    }

    /// Identifiers whose secondary code is not a real value yet, in cache
    /// order. The cheap re-try pass walks this list.
    pub fn unresolved_identifiers(&self) -> Vec<PracticeId> {
        self.records
            .read()
            .values()
            .filter(|record| !record.secondary_code.is_resolved())
            .map(|record| record.identifier.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.records.write().clear();
        self.secondary_index.clear();
    }

    pub fn to_persisted(&self, now: DateTime<Utc>) -> PersistedCache {
        PersistedCache {
            practice_cache: self.snapshot(),
            cache_timestamp: now.timestamp_millis(),
        }
    }

    /// Rebuild map and index from a record list: keys recomputed, one
    /// entry per identifier (later entries win).
    fn install(&self, records: Vec<PracticeRecord>) -> usize {
        let mut next: BTreeMap<String, PracticeRecord> = BTreeMap::new();
        let mut key_of: HashMap<PracticeId, String> = HashMap::new();
        for record in records {
            let key = record.cache_key();
            if let Some(previous_key) = key_of.insert(record.identifier.clone(), key.clone()) {
                next.remove(&previous_key);
            }
            next.insert(key, record);
        }

        self.secondary_index.clear();
        for record in next.values() {
            self.secondary_index
                .insert(record.identifier.clone(), record.secondary_code.clone());
        }
        let len = next.len();
        *self.records.write() = next;
        len
    }
}

fn merge_from_previous(fresh: &mut PracticeRecord, old: &PracticeRecord) {
    if !fresh.secondary_code.is_resolved() {
        // A full-list scrape never carries the secondary code; do not let
        // it erase one we already paid for.
        if old.secondary_code != SecondaryCode::Unresolved {
            fresh.secondary_code = old.secondary_code.clone();
        }
    }
    let attrs = &mut fresh.attributes;
    let old_attrs = &old.attributes;
    if attrs.category.is_none() {
        attrs.category = old_attrs.category.clone();
    }
    if attrs.quota.is_none() {
        attrs.quota = old_attrs.quota.clone();
    }
    if attrs.processed.is_none() {
        attrs.processed = old_attrs.processed.clone();
    }
    if attrs.tier.is_none() {
        attrs.tier = old_attrs.tier.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    fn id(raw: &str) -> PracticeId {
        PracticeId::parse(raw).unwrap()
    }

    fn record(raw_id: &str, name: &str) -> PracticeRecord {
        PracticeRecord::new(id(raw_id), name, Utc::now())
    }

    fn cache() -> PracticeCache {
        PracticeCache::new(CachePolicy::default())
    }

    #[test]
    fn replace_all_preserves_known_secondary_code() {
        let cache = cache();
        let mut old = record("A12345", "Oak Clinic");
        old.secondary_code = SecondaryCode::Value("CDB9".into());
        cache.replace_all(vec![old], Utc::now());

        let mut fresh = record("A12345", "Oak Clinic");
        fresh.attributes.quota = Some("50".into());
        cache.replace_all(vec![fresh], Utc::now());

        let merged = cache.get_by_cache_key("Oak Clinic (A12345)").expect("entry");
        assert_eq!(merged.secondary_code, SecondaryCode::Value("CDB9".into()));
        assert_eq!(merged.attributes.quota.as_deref(), Some("50"));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.secondary_of(&id("A12345")),
            Some(SecondaryCode::Value("CDB9".into()))
        );
    }

    #[test]
    fn replace_all_keeps_failed_marker_but_prefers_fresh_value() {
        let cache = cache();
        let mut old = record("A12345", "Oak Clinic");
        old.secondary_code = SecondaryCode::Failed;
        cache.replace_all(vec![old], Utc::now());

        cache.replace_all(vec![record("A12345", "Oak Clinic")], Utc::now());
        assert_eq!(
            cache.get_by_identifier(&id("A12345")).unwrap().secondary_code,
            SecondaryCode::Failed,
            "failed marker carries forward"
        );

        let mut fresh = record("A12345", "Oak Clinic");
        fresh.secondary_code = SecondaryCode::Value("CDB1".into());
        cache.replace_all(vec![fresh], Utc::now());
        assert_eq!(
            cache.get_by_identifier(&id("A12345")).unwrap().secondary_code,
            SecondaryCode::Value("CDB1".into()),
            "fresh real value wins"
        );
    }

    #[test]
    fn replace_all_drops_records_missing_from_fresh_list() {
        let cache = cache();
        cache.replace_all(
            vec![record("A12345", "Oak Clinic"), record("B22222", "Elm Practice")],
            Utc::now(),
        );
        cache.replace_all(vec![record("B22222", "Elm Practice")], Utc::now());
        assert_eq!(cache.len(), 1);
        assert!(cache.get_by_identifier(&id("A12345")).is_none());
        assert!(cache.secondary_of(&id("A12345")).is_none());
    }

    #[test]
    fn duplicate_identifiers_last_wins() {
        let cache = cache();
        let count = cache.replace_all(
            vec![record("A12345", "Oak Clinic"), record("A12345", "Oak Clinic Renamed")],
            Utc::now(),
        );
        assert_eq!(count, 1);
        let entry = cache.get_by_identifier(&id("A12345")).unwrap();
        assert_eq!(entry.display_name, "Oak Clinic Renamed");
        assert!(cache.get_by_cache_key("Oak Clinic (A12345)").is_none());
    }

    #[test]
    fn load_respects_expiry_boundary() {
        let now = Utc::now();
        let expiry = CachePolicy::default().expiry_ms as i64;

        let fresh_enough = PersistedCache {
            practice_cache: {
                let r = record("A12345", "Oak Clinic");
                BTreeMap::from([(r.cache_key(), r)])
            },
            cache_timestamp: (now - Duration::milliseconds(expiry - 1)).timestamp_millis(),
        };
        let adopted = cache();
        assert!(matches!(
            adopted.load(fresh_enough, now),
            LoadOutcome::Loaded { .. }
        ));
        assert_eq!(adopted.len(), 1);

        let too_old = PersistedCache {
            practice_cache: BTreeMap::new(),
            cache_timestamp: (now - Duration::milliseconds(expiry + 1)).timestamp_millis(),
        };
        let rejected = cache();
        assert_eq!(rejected.load(too_old, now), LoadOutcome::Stale);
        assert!(rejected.is_empty());
    }

    #[test]
    fn load_recomputes_keys_from_record_fields() {
        let now = Utc::now();
        let r = record("A12345", "Oak Clinic");
        let persisted = PersistedCache {
            // Key on disk does not match the record; the record wins.
            practice_cache: BTreeMap::from([("Wrong Key".to_string(), r)]),
            cache_timestamp: now.timestamp_millis(),
        };
        let cache = cache();
        cache.load(persisted, now);
        assert!(cache.get_by_cache_key("Oak Clinic (A12345)").is_some());
        assert!(cache.get_by_cache_key("Wrong Key").is_none());
    }

    #[test]
    fn upsert_updates_map_and_index_together() {
        let cache = cache();
        cache.replace_all(vec![record("A12345", "Oak Clinic")], Utc::now());

        assert!(cache.upsert_secondary_code(
            &id("A12345"),
            SecondaryCode::Value("CDB9".into()),
            Utc::now()
        ));
        assert_eq!(
            cache.get_by_identifier(&id("A12345")).unwrap().secondary_code,
            SecondaryCode::Value("CDB9".into())
        );
        assert_eq!(
            cache.secondary_of(&id("A12345")),
            Some(SecondaryCode::Value("CDB9".into()))
        );

        assert!(!cache.upsert_secondary_code(
            &id("Z99999"),
            SecondaryCode::Failed,
            Utc::now()
        ));
        assert!(cache.secondary_of(&id("Z99999")).is_none());
    }

    #[test]
    fn unresolved_identifiers_lists_non_values_in_cache_order() {
        let cache = cache();
        let mut resolved = record("B22222", "Elm Practice");
        resolved.secondary_code = SecondaryCode::Value("CDB1".into());
        let mut failed = record("C33333", "Pine Surgery");
        failed.secondary_code = SecondaryCode::Failed;
        cache.replace_all(
            vec![record("A12345", "Oak Clinic"), resolved, failed],
            Utc::now(),
        );

        let pending = cache.unresolved_identifiers();
        assert_eq!(pending, vec![id("A12345"), id("C33333")]);
    }
}
