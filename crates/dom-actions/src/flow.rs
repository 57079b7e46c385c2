//! The combined "open a page and click into a target" flow.

use tracing::{debug, warn};

use page_gateway::{PageBroker, PageHandle, PagePort};

use crate::click::{self, ClickTarget};
use crate::errors::DomActionError;
use crate::policy::WaitPolicy;
use crate::wait;

/// Stages of the flow. `Done` and `Failed` are terminal; `Failed` is
/// reachable from both waiting stages (timeout) and from `Clicking`
/// (exhausted retries).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlowState {
    Idle,
    LocatingOrCreatingPage,
    WaitingForFrameworkReady,
    WaitingForTargetElement,
    Clicking,
    Done,
    Failed,
}

#[derive(Clone, Debug)]
pub struct FlowRequest<'a> {
    /// Full URL to open or navigate to.
    pub url: &'a str,
    /// Fragment used to reuse an already-open page instead of creating one.
    pub url_fragment: &'a str,
    /// Framework readiness probe, checked before the target.
    pub ready: ClickTarget,
    pub target: ClickTarget,
    /// Selector read once the click landed (form value, falling back to
    /// element text).
    pub read_after: Option<&'a str>,
    /// Foreground pages are user-visible and stay open on every path.
    pub foreground: bool,
}

#[derive(Clone, Debug)]
pub struct FlowOutcome {
    pub page: PageHandle,
    /// False when a transient scrape page was closed again.
    pub page_kept: bool,
    pub value: Option<String>,
}

/// Run the flow. A page created here purely for scraping is closed on
/// every exit path; pre-existing pages and foreground pages stay open.
pub async fn open_and_click(
    broker: &dyn PageBroker,
    port: &dyn PagePort,
    request: FlowRequest<'_>,
    policy: &WaitPolicy,
) -> Result<FlowOutcome, DomActionError> {
    let mut state = FlowState::LocatingOrCreatingPage;
    debug!(?state, url = request.url, target = request.target.name, "flow started");

    let (page, created) = match broker.find(request.url_fragment).await? {
        Some(existing) => {
            if request.foreground {
                broker.focus(&existing).await?;
            }
            broker.navigate(&existing, request.url).await?;
            (existing, false)
        }
        None => (broker.open(request.url, request.foreground).await?, true),
    };

    let result = drive(port, &page, &request, policy, &mut state).await;

    let keep = request.foreground || !created;
    if !keep {
        if let Err(err) = broker.close(&page).await {
            warn!(page = %page, error = %err, "failed to close transient scrape page");
        }
    }

    match result {
        Ok(value) => {
            state = FlowState::Done;
            debug!(?state, page = %page, target = request.target.name, "flow finished");
            Ok(FlowOutcome {
                page,
                page_kept: keep,
                value,
            })
        }
        Err(err) => {
            state = FlowState::Failed;
            warn!(?state, page = %page, target = request.target.name, error = %err, "flow failed");
            Err(err)
        }
    }
}

async fn drive(
    port: &dyn PagePort,
    page: &PageHandle,
    request: &FlowRequest<'_>,
    policy: &WaitPolicy,
    state: &mut FlowState,
) -> Result<Option<String>, DomActionError> {
    *state = FlowState::WaitingForFrameworkReady;
    request.ready.wait_ready(port, page, policy).await?;

    *state = FlowState::WaitingForTargetElement;
    request.target.wait_ready(port, page, policy).await?;

    *state = FlowState::Clicking;
    click::attempt_clicks(port, page, &request.target, policy).await?;

    match request.read_after {
        None => Ok(None),
        Some(selector) => {
            wait::wait_for_selector(port, page, selector, policy).await?;
            match port.read_value(page, selector).await? {
                Some(value) => Ok(Some(value)),
                None => Ok(port.read_text(page, selector).await?),
            }
        }
    }
}
