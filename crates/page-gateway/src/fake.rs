//! Scriptable in-memory gateway used by tests across the workspace.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::GatewayError;
use crate::model::{PageHandle, RawRow};
use crate::ports::{PageBroker, PagePort};

#[derive(Clone, Debug)]
pub struct FakePageRecord {
    pub handle: PageHandle,
    pub url: String,
    pub foreground: bool,
    pub closed: bool,
}

/// Implements both ports over scripted responses. Selectors become
/// present after a configured number of polls; clicks can be made to fail
/// a few times before landing; a budget of transient injection errors can
/// be injected ahead of any successful call.
#[derive(Default)]
pub struct FakeSite {
    presence: Mutex<HashMap<String, u64>>,
    attributes: Mutex<HashMap<(String, String), (u64, String)>>,
    texts: Mutex<HashMap<String, String>>,
    values: Mutex<HashMap<String, String>>,
    rows: Mutex<Vec<RawRow>>,
    reveal_on_click: Mutex<HashMap<String, Vec<String>>>,
    click_failures: Mutex<HashMap<String, u64>>,
    clicks: Mutex<Vec<String>>,
    pages: Mutex<Vec<FakePageRecord>>,
    transient_budget: AtomicU64,
    injection_calls: AtomicU64,
    extract_calls: AtomicU64,
    extract_delay_ms: AtomicU64,
    next_handle: AtomicU64,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector is present immediately.
    pub fn set_present(&self, selector: &str) {
        self.presence.lock().insert(selector.to_string(), 0);
    }

    /// Selector turns up only after `polls` presence checks.
    pub fn set_present_after(&self, selector: &str, polls: u64) {
        self.presence.lock().insert(selector.to_string(), polls);
    }

    pub fn set_attribute(&self, selector: &str, attribute: &str, value: &str) {
        self.set_attribute_after(selector, attribute, value, 0);
    }

    pub fn set_attribute_after(&self, selector: &str, attribute: &str, value: &str, polls: u64) {
        self.attributes.lock().insert(
            (selector.to_string(), attribute.to_string()),
            (polls, value.to_string()),
        );
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.texts.lock().insert(selector.to_string(), text.to_string());
    }

    pub fn set_value(&self, selector: &str, value: &str) {
        self.values.lock().insert(selector.to_string(), value.to_string());
    }

    pub fn set_rows(&self, rows: Vec<RawRow>) {
        *self.rows.lock() = rows;
    }

    /// Clicking `clicked` makes `revealed` present from then on.
    pub fn reveal_on_click(&self, clicked: &str, revealed: &str) {
        self.reveal_on_click
            .lock()
            .entry(clicked.to_string())
            .or_default()
            .push(revealed.to_string());
    }

    pub fn fail_clicks(&self, selector: &str, times: u64) {
        self.click_failures.lock().insert(selector.to_string(), times);
    }

    /// The next `count` injection calls fail with a transient error.
    pub fn inject_transient(&self, count: u64) {
        self.transient_budget.store(count, Ordering::SeqCst);
    }

    /// Slow down `extract_rows` to widen interleaving windows in tests.
    pub fn set_extract_delay(&self, delay: Duration) {
        self.extract_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().clone()
    }

    pub fn injection_calls(&self) -> u64 {
        self.injection_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> u64 {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn pages(&self) -> Vec<FakePageRecord> {
        self.pages.lock().clone()
    }

    pub fn open_page_count(&self) -> usize {
        self.pages.lock().iter().filter(|p| !p.closed).count()
    }

    fn begin_injection(&self) -> Result<(), GatewayError> {
        self.injection_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.transient_budget.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_budget.store(remaining - 1, Ordering::SeqCst);
            return Err(GatewayError::Transient("page not ready".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PagePort for FakeSite {
    async fn query_presence(
        &self,
        _page: &PageHandle,
        selector: &str,
    ) -> Result<bool, GatewayError> {
        self.begin_injection()?;
        let mut presence = self.presence.lock();
        match presence.get_mut(selector) {
            Some(0) => Ok(true),
            Some(remaining) => {
                *remaining -= 1;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn read_text(
        &self,
        _page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.begin_injection()?;
        Ok(self.texts.lock().get(selector).cloned())
    }

    async fn read_value(
        &self,
        _page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.begin_injection()?;
        Ok(self.values.lock().get(selector).cloned())
    }

    async fn read_attribute(
        &self,
        _page: &PageHandle,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, GatewayError> {
        self.begin_injection()?;
        let mut attributes = self.attributes.lock();
        match attributes.get_mut(&(selector.to_string(), attribute.to_string())) {
            Some((0, value)) => Ok(Some(value.clone())),
            Some((remaining, _)) => {
                *remaining -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn dispatch_click_sequence(
        &self,
        _page: &PageHandle,
        selector: &str,
    ) -> Result<(), GatewayError> {
        self.begin_injection()?;
        {
            let mut failures = self.click_failures.lock();
            if let Some(remaining) = failures.get_mut(selector) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(GatewayError::Injection(format!(
                        "click did not land on {selector}"
                    )));
                }
            }
        }
        self.clicks.lock().push(selector.to_string());
        let revealed: Vec<String> = self
            .reveal_on_click
            .lock()
            .get(selector)
            .cloned()
            .unwrap_or_default();
        for selector in revealed {
            self.set_present(&selector);
        }
        Ok(())
    }

    async fn extract_rows(
        &self,
        _page: &PageHandle,
        _row_selector: &str,
    ) -> Result<Vec<RawRow>, GatewayError> {
        self.begin_injection()?;
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.extract_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.rows.lock().clone())
    }
}

#[async_trait]
impl PageBroker for FakeSite {
    async fn open(&self, url: &str, foreground: bool) -> Result<PageHandle, GatewayError> {
        let handle = PageHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.pages.lock().push(FakePageRecord {
            handle: handle.clone(),
            url: url.to_string(),
            foreground,
            closed: false,
        });
        Ok(handle)
    }

    async fn find(&self, url_fragment: &str) -> Result<Option<PageHandle>, GatewayError> {
        Ok(self
            .pages
            .lock()
            .iter()
            .find(|p| !p.closed && p.url.contains(url_fragment))
            .map(|p| p.handle.clone()))
    }

    async fn focus(&self, page: &PageHandle) -> Result<(), GatewayError> {
        let mut pages = self.pages.lock();
        match pages.iter_mut().find(|p| &p.handle == page && !p.closed) {
            Some(record) => {
                record.foreground = true;
                Ok(())
            }
            None => Err(GatewayError::PageGone(page.to_string())),
        }
    }

    async fn navigate(&self, page: &PageHandle, url: &str) -> Result<(), GatewayError> {
        let mut pages = self.pages.lock();
        match pages.iter_mut().find(|p| &p.handle == page && !p.closed) {
            Some(record) => {
                record.url = url.to_string();
                Ok(())
            }
            None => Err(GatewayError::PageGone(page.to_string())),
        }
    }

    async fn close(&self, page: &PageHandle) -> Result<(), GatewayError> {
        let mut pages = self.pages.lock();
        match pages.iter_mut().find(|p| &p.handle == page) {
            Some(record) => {
                record.closed = true;
                Ok(())
            }
            None => Err(GatewayError::PageGone(page.to_string())),
        }
    }
}
