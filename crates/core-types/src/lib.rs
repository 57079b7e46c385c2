use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shared error type used at the crate seams where a richer enum would
/// leak implementation detail.
#[derive(Debug, Error, Clone)]
pub enum NavError {
    #[error("{message}")]
    Message { message: String },
}

impl NavError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Fixed-format practice identifier: one ASCII letter followed by five
/// digits. The letter is upcased on parse so equal identifiers compare
/// equal regardless of how they were typed.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PracticeId(String);

impl PracticeId {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != 6 || !trimmed.is_ascii() {
            return None;
        }
        let mut chars = trimmed.chars();
        let head = chars.next()?;
        if !head.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(format!(
            "{}{}",
            head.to_ascii_uppercase(),
            &trimmed[1..]
        )))
    }

    pub fn is_valid_format(raw: &str) -> bool {
        Self::parse(raw).is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PracticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PracticeId {
    type Error = NavError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
            .ok_or_else(|| NavError::new(format!("invalid practice identifier: {value}")))
    }
}

impl From<PracticeId> for String {
    fn from(value: PracticeId) -> Self {
        value.0
    }
}

/// Secondary (CDB) code state. The wire format keeps the legacy sentinel
/// strings so persisted caches written by older builds still load.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecondaryCode {
    /// Never fetched, or confirmed absent upstream. Wire value `"N/A"`.
    #[default]
    Unresolved,
    /// A fetch was attempted and failed. Wire value `"Error"`.
    Failed,
    Value(String),
}

impl SecondaryCode {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(code) => Some(code),
            _ => None,
        }
    }

    pub fn wire(&self) -> &str {
        match self {
            Self::Unresolved => "N/A",
            Self::Failed => "Error",
            Self::Value(code) => code,
        }
    }
}

impl From<String> for SecondaryCode {
    fn from(value: String) -> Self {
        match value.trim() {
            "" | "N/A" => Self::Unresolved,
            "Error" => Self::Failed,
            other => Self::Value(other.to_string()),
        }
    }
}

impl From<SecondaryCode> for String {
    fn from(value: SecondaryCode) -> Self {
        value.wire().to_string()
    }
}

impl fmt::Display for SecondaryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire())
    }
}

mod na_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(value.as_deref().unwrap_or("N/A"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        let raw = String::deserialize(de)?;
        match raw.trim() {
            "" | "N/A" => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }
}

/// Auxiliary columns scraped from the practice listing. Each is optional;
/// the wire default is the legacy `"N/A"` placeholder.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAttributes {
    #[serde(default, with = "na_string")]
    pub category: Option<String>,
    #[serde(default, with = "na_string")]
    pub quota: Option<String>,
    #[serde(default, with = "na_string")]
    pub processed: Option<String>,
    #[serde(default, with = "na_string")]
    pub tier: Option<String>,
}

/// One managed practice as known to the cache.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRecord {
    pub identifier: PracticeId,
    pub display_name: String,
    #[serde(default)]
    pub secondary_code: SecondaryCode,
    #[serde(default)]
    pub attributes: PracticeAttributes,
    pub fetched_at: DateTime<Utc>,
}

impl PracticeRecord {
    pub fn new(identifier: PracticeId, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identifier,
            display_name: normalize_name(&display_name.into()),
            secondary_code: SecondaryCode::Unresolved,
            attributes: PracticeAttributes::default(),
            fetched_at: now,
        }
    }

    /// Composite lookup key, always derived from the current fields.
    pub fn cache_key(&self) -> String {
        format!("{} ({})", self.display_name, self.identifier)
    }
}

/// Detail-page tabs the UI can jump to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingTab {
    General,
    Users,
    Documents,
    Integrations,
    Billing,
}

impl SettingTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Users => "users",
            Self::Documents => "documents",
            Self::Integrations => "integrations",
            Self::Billing => "billing",
        }
    }
}

/// Collapse internal whitespace runs and trim; names arrive from the DOM
/// with nested markup whitespace intact.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
