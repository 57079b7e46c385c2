//! Selector table for the admin system. The one place that knows the
//! site's DOM; everything else works through logical targets.

use dom_actions::ClickTarget;
use mailnav_core_types::{PracticeId, SettingTab};

pub const PRACTICE_LIST_PATH: &str = "/admin/practices";
pub const PRACTICE_ROW: &str = "#practice-grid tbody tr";

/// The detail page is a single-page app; widgets render first and become
/// interactive once this attribute appears.
pub const INTERACTIVE_ATTR: &str = "data-bound";

pub const DETAIL_TAB_STRIP: &str = "#practice-settings .tab-strip";
pub const CDB_FIELD: &str = "#integration-cdb-code";

pub fn detail_path(identifier: &PracticeId) -> String {
    format!("{PRACTICE_LIST_PATH}/{identifier}/settings")
}

pub fn detail_ready() -> ClickTarget {
    ClickTarget::hydrated("settings-tab-strip", DETAIL_TAB_STRIP, INTERACTIVE_ATTR)
}

pub fn tab_target(tab: SettingTab) -> ClickTarget {
    match tab {
        SettingTab::General => {
            ClickTarget::hydrated("general-tab", "#tab-general", INTERACTIVE_ATTR)
        }
        SettingTab::Users => ClickTarget::hydrated("users-tab", "#tab-users", INTERACTIVE_ATTR),
        SettingTab::Documents => {
            ClickTarget::hydrated("documents-tab", "#tab-documents", INTERACTIVE_ATTR)
        }
        SettingTab::Integrations => {
            ClickTarget::hydrated("integrations-tab", "#tab-integrations", INTERACTIVE_ATTR)
        }
        SettingTab::Billing => {
            ClickTarget::hydrated("billing-tab", "#tab-billing", INTERACTIVE_ATTR)
        }
    }
}
