//! Fixture-backed admin site.
//!
//! The binary has no real injection host behind it, so site state comes
//! from a JSON fixture that arms the in-memory gateway: listing rows,
//! widget hydration and the integration code field. Everything above the
//! gateway runs exactly as it would against the live admin console.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mailnav_core_types::SettingTab;
use page_gateway::{FakeSite, RawRow};
use practice_scraper::selectors;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixturePractice {
    pub identifier: String,
    pub display_name: String,
    /// Listing cells in column order: category, quota, processed, tier.
    #[serde(default)]
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub practices: Vec<FixturePractice>,
    /// Value shown in the integration code field on detail pages.
    #[serde(default)]
    pub secondary_code: Option<String>,
}

impl Fixture {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid fixture {}", path.display()))
    }
}

/// Arm a gateway with the fixture's site state.
pub fn build_fixture_site(fixture: &Fixture) -> Arc<FakeSite> {
    let site = Arc::new(FakeSite::new());

    site.set_present(selectors::PRACTICE_ROW);
    site.set_rows(
        fixture
            .practices
            .iter()
            .map(|practice| RawRow {
                anchor_text: practice.display_name.clone(),
                anchor_href: format!("{}/{}", selectors::PRACTICE_LIST_PATH, practice.identifier),
                cells: practice.cells.clone(),
            })
            .collect(),
    );

    // Detail pages: hydrated tab strip, every tab clickable, and the
    // integrations tab revealing the code field.
    let ready = selectors::detail_ready();
    site.set_present(ready.selector);
    site.set_attribute(ready.selector, selectors::INTERACTIVE_ATTR, "true");
    for tab in [
        SettingTab::General,
        SettingTab::Users,
        SettingTab::Documents,
        SettingTab::Integrations,
        SettingTab::Billing,
    ] {
        let target = selectors::tab_target(tab);
        site.set_present(target.selector);
        site.set_attribute(target.selector, selectors::INTERACTIVE_ATTR, "true");
    }
    let integrations = selectors::tab_target(SettingTab::Integrations);
    site.reveal_on_click(integrations.selector, selectors::CDB_FIELD);
    if let Some(code) = &fixture.secondary_code {
        site.set_value(selectors::CDB_FIELD, code);
    }

    site
}
