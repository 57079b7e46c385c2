use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use dom_actions::{open_and_click, FlowRequest, WaitPolicy};
use mailnav_core_types::{PracticeId, SecondaryCode, SettingTab};
use page_gateway::{PageBroker, PagePort};

use crate::errors::ScrapeError;
use crate::selectors;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetailScrapeConfig {
    /// The site sometimes echoes the practice name into the code field
    /// while the integration widget is still loading. Treat such an echo
    /// as "not fetched" instead of a real code. Workaround for an
    /// upstream rendering bug; kept configurable.
    pub treat_name_echo_as_invalid: bool,
}

impl Default for DetailScrapeConfig {
    fn default() -> Self {
        Self {
            treat_name_echo_as_invalid: true,
        }
    }
}

/// Fetch one practice's secondary code: open (or reuse) its detail page,
/// wait for the tab strip to hydrate, click into the integrations tab,
/// wait for the code field and read it. The transient page is closed on
/// every path by the flow.
///
/// Errors propagate; mapping failures to the `Failed` marker is the
/// coordinator's call.
#[instrument(skip_all, fields(practice = %identifier))]
pub async fn scrape_secondary_code(
    broker: &dyn PageBroker,
    port: &dyn PagePort,
    base_url: &str,
    identifier: &PracticeId,
    display_name: &str,
    config: &DetailScrapeConfig,
    policy: &WaitPolicy,
) -> Result<SecondaryCode, ScrapeError> {
    let path = selectors::detail_path(identifier);
    let url = format!("{base_url}{path}");
    let outcome = open_and_click(
        broker,
        port,
        FlowRequest {
            url: &url,
            url_fragment: &path,
            ready: selectors::detail_ready(),
            target: selectors::tab_target(SettingTab::Integrations),
            read_after: Some(selectors::CDB_FIELD),
            foreground: false,
        },
        policy,
    )
    .await?;

    let Some(raw) = outcome.value else {
        return Err(ScrapeError::FieldMissing(identifier.to_string()));
    };
    let code = SecondaryCode::from(raw);
    if config.treat_name_echo_as_invalid {
        if let Some(value) = code.as_value() {
            if value.eq_ignore_ascii_case(display_name) {
                warn!(%identifier, "secondary code echoed the practice name, treating as unresolved");
                return Ok(SecondaryCode::Unresolved);
            }
        }
    }
    Ok(code)
}
