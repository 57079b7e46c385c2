use serde::Deserialize;

use mailnav_core_types::SettingTab;

/// Requests the popup/panel collaborators send. Tagged by `action`,
/// matching the wire format those UIs already speak.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetPracticeCache,
    #[serde(rename_all = "camelCase")]
    OpenPractice {
        input: String,
        setting_type: SettingTab,
    },
    RequestActiveScrape,
    GetPracticeStatus {
        identifier: String,
    },
    SearchBySecondaryCode {
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn parses_tagged_requests() {
        let request: Request = serde_json::from_value(json!({
            "action": "openPractice",
            "input": "Oak Clinic",
            "settingType": "integrations",
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::OpenPractice {
                input: "Oak Clinic".into(),
                setting_type: SettingTab::Integrations,
            }
        );

        let request: Request =
            serde_json::from_value(json!({ "action": "requestActiveScrape" })).unwrap();
        assert_eq!(request, Request::RequestActiveScrape);
    }

    #[test]
    fn rejects_unknown_actions() {
        assert!(serde_json::from_value::<Request>(json!({ "action": "reboot" })).is_err());
    }
}
