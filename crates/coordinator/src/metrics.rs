use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    scrapes_started: AtomicU64,
    scrapes_completed: AtomicU64,
    scrapes_failed: AtomicU64,
    refresh_rejected: AtomicU64,
    secondary_hits: AtomicU64,
    secondary_fetches: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_scrape_started() {
    increment(&COUNTERS.scrapes_started);
}

pub fn record_scrape_completed() {
    increment(&COUNTERS.scrapes_completed);
}

pub fn record_scrape_failed() {
    increment(&COUNTERS.scrapes_failed);
}

pub fn record_refresh_rejected() {
    increment(&COUNTERS.refresh_rejected);
}

pub fn record_secondary_hit() {
    increment(&COUNTERS.secondary_hits);
}

pub fn record_secondary_fetch() {
    increment(&COUNTERS.secondary_fetches);
}

#[derive(Clone, Debug, Default)]
pub struct CoordinatorMetricsSnapshot {
    pub scrapes_started: u64,
    pub scrapes_completed: u64,
    pub scrapes_failed: u64,
    pub refresh_rejected: u64,
    pub secondary_hits: u64,
    pub secondary_fetches: u64,
}

pub fn snapshot() -> CoordinatorMetricsSnapshot {
    CoordinatorMetricsSnapshot {
        scrapes_started: COUNTERS.scrapes_started.load(Ordering::Relaxed),
        scrapes_completed: COUNTERS.scrapes_completed.load(Ordering::Relaxed),
        scrapes_failed: COUNTERS.scrapes_failed.load(Ordering::Relaxed),
        refresh_rejected: COUNTERS.refresh_rejected.load(Ordering::Relaxed),
        secondary_hits: COUNTERS.secondary_hits.load(Ordering::Relaxed),
        secondary_fetches: COUNTERS.secondary_fetches.load(Ordering::Relaxed),
    }
}
