//! Cache matching ladder for free-form practice queries.

use std::collections::BTreeMap;

use mailnav_core_types::{normalize_name, PracticeId, PracticeRecord};

/// Minimum query length before substring matching kicks in; shorter
/// queries flood on realistic data sets.
pub const MIN_SUBSTRING_LEN: usize = 3;

/// Match order: exact name, exact identifier, exact cache key, then name
/// substring. All comparisons are case-insensitive over the normalized
/// query.
pub fn match_query(
    records: &BTreeMap<String, PracticeRecord>,
    query: &str,
) -> Option<PracticeId> {
    let normalized = normalize_name(query);
    if normalized.is_empty() {
        return None;
    }
    let folded = normalized.to_lowercase();

    for record in records.values() {
        if record.display_name.to_lowercase() == folded {
            return Some(record.identifier.clone());
        }
    }
    for record in records.values() {
        if record.identifier.as_str().eq_ignore_ascii_case(&normalized) {
            return Some(record.identifier.clone());
        }
    }
    for (key, record) in records {
        if key.to_lowercase() == folded {
            return Some(record.identifier.clone());
        }
    }
    if folded.chars().count() >= MIN_SUBSTRING_LEN {
        for record in records.values() {
            if record.display_name.to_lowercase().contains(&folded) {
                return Some(record.identifier.clone());
            }
        }
    }
    None
}

/// Ranked name-substring suggestions for a failed lookup: earlier match
/// positions first, alphabetical within a position, at most `limit`.
pub fn suggest(
    records: &BTreeMap<String, PracticeRecord>,
    query: &str,
    limit: usize,
) -> Vec<String> {
    let folded = normalize_name(query).to_lowercase();
    if folded.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<(usize, String)> = records
        .values()
        .filter_map(|record| {
            record
                .display_name
                .to_lowercase()
                .find(&folded)
                .map(|position| (position, record.display_name.clone()))
        })
        .collect();
    ranked.sort();
    ranked.dedup();
    ranked.into_iter().map(|(_, name)| name).take(limit).collect()
}
