use tokio::time::sleep;
use tracing::{debug, warn};

use page_gateway::{PageHandle, PagePort};

use crate::errors::DomActionError;
use crate::policy::WaitPolicy;
use crate::wait;

/// A logical click target: a stable name for logs, the selector it maps
/// to, and the hydration attribute to wait for when the hosting framework
/// renders the element before wiring its handlers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClickTarget {
    pub name: &'static str,
    pub selector: &'static str,
    pub interactive_attr: Option<&'static str>,
}

impl ClickTarget {
    pub const fn new(name: &'static str, selector: &'static str) -> Self {
        Self {
            name,
            selector,
            interactive_attr: None,
        }
    }

    pub const fn hydrated(
        name: &'static str,
        selector: &'static str,
        attribute: &'static str,
    ) -> Self {
        Self {
            name,
            selector,
            interactive_attr: Some(attribute),
        }
    }

    pub async fn wait_ready(
        &self,
        port: &dyn PagePort,
        page: &PageHandle,
        policy: &WaitPolicy,
    ) -> Result<(), DomActionError> {
        match self.interactive_attr {
            Some(attribute) => {
                wait::wait_for_attribute(port, page, self.selector, attribute, policy).await
            }
            None => wait::wait_for_selector(port, page, self.selector, policy).await,
        }
    }
}

/// Wait for the target to be interactive, then run the simulated click
/// sequence with bounded retries and a linearly growing delay between
/// attempts.
pub async fn click_target(
    port: &dyn PagePort,
    page: &PageHandle,
    target: &ClickTarget,
    policy: &WaitPolicy,
) -> Result<(), DomActionError> {
    target.wait_ready(port, page, policy).await?;
    attempt_clicks(port, page, target, policy).await
}

/// Click retries without the readiness wait; the flow runner waits
/// separately so it can report which stage timed out.
pub(crate) async fn attempt_clicks(
    port: &dyn PagePort,
    page: &PageHandle,
    target: &ClickTarget,
    policy: &WaitPolicy,
) -> Result<(), DomActionError> {
    for attempt in 0..policy.click_attempts {
        match port.dispatch_click_sequence(page, target.selector).await {
            Ok(()) => {
                debug!(target = target.name, attempt, "click landed");
                return Ok(());
            }
            Err(err) => {
                warn!(target = target.name, attempt, error = %err, "click attempt failed");
            }
        }
        if attempt + 1 < policy.click_attempts {
            sleep(policy.retry_delay(attempt)).await;
        }
    }
    Err(DomActionError::ClickFailed(target.name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use page_gateway::{FakeSite, PageBroker};

    const TAB: ClickTarget = ClickTarget::new("integrations-tab", "#tab-integrations");

    #[tokio::test]
    async fn click_lands_after_retries() {
        let site = FakeSite::new();
        site.set_present(TAB.selector);
        site.fail_clicks(TAB.selector, 2);
        let page = site.open("https://admin.example/practices/A12345", false).await.unwrap();
        click_target(&site, &page, &TAB, &WaitPolicy::fast())
            .await
            .expect("third attempt should land");
        assert_eq!(site.clicks(), vec![TAB.selector.to_string()]);
    }

    #[tokio::test]
    async fn click_gives_up_after_all_attempts() {
        let site = FakeSite::new();
        site.set_present(TAB.selector);
        site.fail_clicks(TAB.selector, 99);
        let page = site.open("https://admin.example/practices/A12345", false).await.unwrap();
        let err = click_target(&site, &page, &TAB, &WaitPolicy::fast())
            .await
            .unwrap_err();
        assert!(matches!(err, DomActionError::ClickFailed(_)));
        assert!(site.clicks().is_empty());
    }

    #[tokio::test]
    async fn hydrated_target_waits_for_attribute() {
        let site = FakeSite::new();
        let target = ClickTarget::hydrated("tab-strip", ".tab-strip", "data-bound");
        site.set_present(target.selector);
        site.set_attribute_after(target.selector, "data-bound", "true", 2);
        let page = site.open("https://admin.example/practices/A12345", false).await.unwrap();
        click_target(&site, &page, &target, &WaitPolicy::fast())
            .await
            .expect("click after hydration");
    }
}
