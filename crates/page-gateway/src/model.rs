use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to a live page owned by the broker.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PageHandle(pub u64);

impl fmt::Display for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// One table row as read out of the listing DOM: the first anchor's text
/// and target, plus the remaining cells in document order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub anchor_text: String,
    pub anchor_href: String,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(
        anchor_text: impl Into<String>,
        anchor_href: impl Into<String>,
        cells: Vec<&str>,
    ) -> Self {
        Self {
            anchor_text: anchor_text.into(),
            anchor_href: anchor_href.into(),
            cells: cells.into_iter().map(str::to_string).collect(),
        }
    }
}
