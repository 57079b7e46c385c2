use tokio::time::{sleep, Instant};
use tracing::debug;

use page_gateway::{PageHandle, PagePort};

use crate::errors::DomActionError;
use crate::policy::WaitPolicy;

/// Poll until the selector is present. Poll-level injection errors are
/// tolerated and retried until the deadline; only the deadline fails the
/// wait.
pub async fn wait_for_selector(
    port: &dyn PagePort,
    page: &PageHandle,
    selector: &str,
    policy: &WaitPolicy,
) -> Result<(), DomActionError> {
    let deadline = Instant::now() + policy.wait_timeout();
    loop {
        match port.query_presence(page, selector).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err) => debug!(selector, error = %err, "presence poll error, retrying"),
        }
        if Instant::now() >= deadline {
            return Err(DomActionError::WaitTimeout(selector.to_string()));
        }
        sleep(policy.poll_interval()).await;
    }
}

/// Poll until the selector is present *and* carries the attribute. Used
/// for single-page-app targets that render before they hydrate.
pub async fn wait_for_attribute(
    port: &dyn PagePort,
    page: &PageHandle,
    selector: &str,
    attribute: &str,
    policy: &WaitPolicy,
) -> Result<(), DomActionError> {
    let deadline = Instant::now() + policy.wait_timeout();
    loop {
        match port.read_attribute(page, selector, attribute).await {
            Ok(Some(_)) => return Ok(()),
            Ok(None) => {}
            Err(err) => debug!(selector, attribute, error = %err, "attribute poll error, retrying"),
        }
        if Instant::now() >= deadline {
            return Err(DomActionError::WaitTimeout(format!(
                "{selector}[{attribute}]"
            )));
        }
        sleep(policy.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use page_gateway::{FakeSite, PageBroker};

    #[tokio::test]
    async fn resolves_once_selector_appears() {
        let site = FakeSite::new();
        site.set_present_after("#grid tr", 3);
        let page = site.open("https://admin.example/practices", false).await.unwrap();
        wait_for_selector(&site, &page, "#grid tr", &WaitPolicy::fast())
            .await
            .expect("selector should appear");
    }

    #[tokio::test]
    async fn tolerates_transient_injection_errors() {
        let site = FakeSite::new();
        site.set_present("#grid tr");
        site.inject_transient(2);
        let page = site.open("https://admin.example/practices", false).await.unwrap();
        wait_for_selector(&site, &page, "#grid tr", &WaitPolicy::fast())
            .await
            .expect("transient errors must not fail the wait");
    }

    #[tokio::test]
    async fn times_out_when_selector_never_appears() {
        let site = FakeSite::new();
        let page = site.open("https://admin.example/practices", false).await.unwrap();
        let err = wait_for_selector(&site, &page, "#missing", &WaitPolicy::fast())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn attribute_wait_requires_hydration() {
        let site = FakeSite::new();
        site.set_present(".tab-strip");
        site.set_attribute_after(".tab-strip", "data-bound", "true", 2);
        let page = site.open("https://admin.example/practices/A12345", false).await.unwrap();
        wait_for_attribute(&site, &page, ".tab-strip", "data-bound", &WaitPolicy::fast())
            .await
            .expect("attribute should hydrate");
    }
}
