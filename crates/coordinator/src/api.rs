use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use dom_actions::{open_and_click, FlowRequest, WaitPolicy};
use mailnav_core_types::{PracticeId, PracticeRecord, SecondaryCode, SettingTab};
use page_gateway::{PageBroker, PagePort};
use practice_cache::{CacheStore, LoadOutcome, PracticeCache};
use practice_scraper::{scrape_practice_list, scrape_secondary_code, DetailScrapeConfig};
use practice_scraper::selectors;

use crate::errors::CoordinatorError;
use crate::matching;
use crate::metrics;

/// Why a full scrape was requested; tracing only.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefreshPurpose {
    ColdStart,
    Manual,
    Periodic,
    ResolveFallback,
    Background,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorPolicy {
    /// Admin-system origin, e.g. `https://admin.example`.
    pub base_url: String,
    pub wait: WaitPolicy,
    pub detail: DetailScrapeConfig,
    /// Tick for the periodic background refresh task.
    pub refresh_interval_secs: u64,
}

impl Default for CoordinatorPolicy {
    fn default() -> Self {
        Self {
            base_url: "https://admin.example".to_string(),
            wait: WaitPolicy::default(),
            detail: DetailScrapeConfig::default(),
            refresh_interval_secs: 6 * 60 * 60,
        }
    }
}

/// Single entry point balancing freshness, scrape cost and concurrency.
/// All mutation of the cache and its mirror funnels through here.
pub struct Coordinator {
    cache: Arc<PracticeCache>,
    store: Arc<dyn CacheStore>,
    broker: Arc<dyn PageBroker>,
    port: Arc<dyn PagePort>,
    policy: CoordinatorPolicy,
    scrape_active: AtomicBool,
}

struct ScrapeFlag<'a>(&'a AtomicBool);

impl Drop for ScrapeFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Coordinator {
    pub fn new(
        cache: Arc<PracticeCache>,
        store: Arc<dyn CacheStore>,
        broker: Arc<dyn PageBroker>,
        port: Arc<dyn PagePort>,
        policy: CoordinatorPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            cache,
            store,
            broker,
            port,
            policy,
            scrape_active: AtomicBool::new(false),
        })
    }

    pub fn cache(&self) -> &PracticeCache {
        &self.cache
    }

    pub fn policy(&self) -> &CoordinatorPolicy {
        &self.policy
    }

    /// Make sure the in-memory cache holds something usable: an already
    /// warm map, the persisted mirror if unexpired, or a blocking full
    /// scrape as the last resort. A borderline-stale mirror is adopted
    /// immediately and refreshed in the background.
    pub async fn ensure_loaded(self: &Arc<Self>) -> Result<(), CoordinatorError> {
        if !self.cache.is_empty() {
            return Ok(());
        }
        match self.store.load().await {
            Ok(Some(persisted)) => match self.cache.load(persisted, Utc::now()) {
                LoadOutcome::Loaded { age_ms } => {
                    debug!(age_ms, entries = self.cache.len(), "adopted persisted cache");
                    if self.cache.policy().is_borderline(age_ms) {
                        let coordinator = Arc::clone(self);
                        tokio::spawn(async move {
                            if let Err(err) =
                                coordinator.refresh(RefreshPurpose::Background).await
                            {
                                warn!(error = %err, "background refresh failed");
                            }
                        });
                    }
                    return Ok(());
                }
                LoadOutcome::Stale => {}
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "persisted cache unreadable, rescraping"),
        }
        self.refresh(RefreshPurpose::ColdStart).await.map(|_| ())
    }

    /// Full scrape-and-swap with mutual exclusion. A caller arriving
    /// while a scrape is in flight gets the current entry count back
    /// instead of a second scrape; that count describes the pre-refresh
    /// cache, not the result of the scrape still running. Failure leaves
    /// cache and mirror untouched.
    #[instrument(skip(self), fields(purpose = ?purpose))]
    pub async fn refresh(&self, purpose: RefreshPurpose) -> Result<usize, CoordinatorError> {
        if self.scrape_active.swap(true, Ordering::SeqCst) {
            metrics::record_refresh_rejected();
            info!("refresh already in flight, serving cached data");
            return Ok(self.cache.len());
        }
        let _flag = ScrapeFlag(&self.scrape_active);
        self.run_full_scrape().await
    }

    async fn run_full_scrape(&self) -> Result<usize, CoordinatorError> {
        metrics::record_scrape_started();
        let url = format!("{}{}", self.policy.base_url, selectors::PRACTICE_LIST_PATH);
        // The fragment also matches detail pages under /admin/practices,
        // so any reused page is navigated to the listing first.
        let (page, created) = match self.broker.find(selectors::PRACTICE_LIST_PATH).await? {
            Some(existing) => {
                self.broker.navigate(&existing, &url).await?;
                (existing, false)
            }
            None => (self.broker.open(&url, false).await?, true),
        };

        let result = scrape_practice_list(self.port.as_ref(), &page, &self.policy.wait).await;

        if created {
            if let Err(err) = self.broker.close(&page).await {
                warn!(page = %page, error = %err, "failed to close listing page");
            }
        }

        match result {
            Ok(records) => {
                let count = self.cache.replace_all(records, Utc::now());
                self.persist().await;
                metrics::record_scrape_completed();
                info!(count, "practice cache refreshed");
                Ok(count)
            }
            Err(err) => {
                metrics::record_scrape_failed();
                warn!(error = %err, "full scrape failed, keeping previous cache");
                Err(CoordinatorError::ScrapeFailed(err.to_string()))
            }
        }
    }

    /// Turn free-form input into an identifier. Input already in
    /// identifier format passes through untouched with zero scrapes.
    pub async fn resolve_identifier(
        self: &Arc<Self>,
        input: &str,
    ) -> Result<PracticeId, CoordinatorError> {
        if let Some(id) = PracticeId::parse(input) {
            return Ok(id);
        }
        if let Err(err) = self.ensure_loaded().await {
            warn!(error = %err, "cache load failed, matching against what we have");
        }
        if let Some(id) = matching::match_query(&self.cache.snapshot(), input) {
            return Ok(id);
        }

        // One fallback scrape, then re-match against the fresh map.
        if let Err(err) = self.refresh(RefreshPurpose::ResolveFallback).await {
            warn!(error = %err, "fallback scrape failed during resolve");
        }
        let snapshot = self.cache.snapshot();
        if let Some(id) = matching::match_query(&snapshot, input) {
            return Ok(id);
        }
        Err(CoordinatorError::not_found(
            input,
            matching::suggest(&snapshot, input, 5),
        ))
    }

    /// Secondary-code lookup: cached real values come straight from the
    /// index; anything else triggers a single-record detail scrape whose
    /// outcome (value or `Failed`) is written back and persisted.
    pub async fn resolve_secondary_code(
        self: &Arc<Self>,
        identifier: &PracticeId,
    ) -> Result<SecondaryCode, CoordinatorError> {
        self.ensure_loaded().await?;
        if let Some(code) = self.cache.secondary_of(identifier) {
            if code.is_resolved() {
                metrics::record_secondary_hit();
                return Ok(code);
            }
        }
        let record = self
            .cache
            .get_by_identifier(identifier)
            .ok_or_else(|| CoordinatorError::not_found(identifier.as_str(), Vec::new()))?;

        metrics::record_secondary_fetch();
        let code = match scrape_secondary_code(
            self.broker.as_ref(),
            self.port.as_ref(),
            &self.policy.base_url,
            identifier,
            &record.display_name,
            &self.policy.detail,
            &self.policy.wait,
        )
        .await
        {
            Ok(code) => code,
            Err(err) => {
                warn!(%identifier, error = %err, "secondary code scrape failed");
                SecondaryCode::Failed
            }
        };
        self.cache
            .upsert_secondary_code(identifier, code.clone(), Utc::now());
        self.persist().await;
        Ok(code)
    }

    /// Exact search over cached codes, then the expensive fallback: scrape
    /// unresolved candidates one by one, caching as it goes, until a match
    /// or exhaustion.
    pub async fn search_by_secondary_code(
        self: &Arc<Self>,
        query: &str,
    ) -> Result<PracticeRecord, CoordinatorError> {
        let query = query.trim();
        self.ensure_loaded().await?;

        if let Some(record) = self
            .cache
            .snapshot()
            .into_values()
            .find(|record| record.secondary_code.as_value() == Some(query))
        {
            return Ok(record);
        }

        for identifier in self.cache.unresolved_identifiers() {
            let code = self.resolve_secondary_code(&identifier).await?;
            if code.as_value() == Some(query) {
                return self
                    .cache
                    .get_by_identifier(&identifier)
                    .ok_or_else(|| CoordinatorError::not_found(query, Vec::new()));
            }
        }
        Err(CoordinatorError::not_found(query, Vec::new()))
    }

    /// Current record for an identifier, if cached.
    pub async fn status(
        self: &Arc<Self>,
        identifier: &PracticeId,
    ) -> Result<PracticeRecord, CoordinatorError> {
        self.ensure_loaded().await?;
        self.cache
            .get_by_identifier(identifier)
            .ok_or_else(|| CoordinatorError::not_found(identifier.as_str(), Vec::new()))
    }

    /// Resolve the input and bring its detail page to the foreground on
    /// the requested tab.
    pub async fn open_practice(
        self: &Arc<Self>,
        input: &str,
        tab: SettingTab,
    ) -> Result<(), CoordinatorError> {
        let identifier = self.resolve_identifier(input).await?;
        let path = selectors::detail_path(&identifier);
        let url = format!("{}{}", self.policy.base_url, path);
        open_and_click(
            self.broker.as_ref(),
            self.port.as_ref(),
            FlowRequest {
                url: &url,
                url_fragment: &path,
                ready: selectors::detail_ready(),
                target: selectors::tab_target(tab),
                read_after: None,
                foreground: true,
            },
            &self.policy.wait,
        )
        .await
        .map_err(|err| CoordinatorError::ScrapeFailed(err.to_string()))?;
        Ok(())
    }

    pub async fn practice_cache_snapshot(
        self: &Arc<Self>,
    ) -> BTreeMap<String, PracticeRecord> {
        if let Err(err) = self.ensure_loaded().await {
            warn!(error = %err, "cache load failed, returning what we have");
        }
        self.cache.snapshot()
    }

    /// Periodic refresh in the background; shares the single-flight flag
    /// with every other refresh path.
    pub fn spawn_periodic_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        let period = Duration::from_secs(self.policy.refresh_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // immediate first tick
            loop {
                ticker.tick().await;
                if let Err(err) = coordinator.refresh(RefreshPurpose::Periodic).await {
                    warn!(error = %err, "periodic refresh failed");
                }
            }
        })
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save(&self.cache.to_persisted(Utc::now())).await {
            warn!(error = %err, "failed to persist practice cache");
        }
    }
}
