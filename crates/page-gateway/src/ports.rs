use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::model::{PageHandle, RawRow};

/// Script execution against a single page's DOM. Implementations run a
/// pure extraction function in the page context and return its result;
/// the core never touches the DOM any other way.
#[async_trait]
pub trait PagePort: Send + Sync {
    async fn query_presence(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<bool, GatewayError>;

    async fn read_text(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, GatewayError>;

    async fn read_value(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<Option<String>, GatewayError>;

    async fn read_attribute(
        &self,
        page: &PageHandle,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, GatewayError>;

    /// Simulated interaction: focus, mousedown, mouseup, click against the
    /// first element matching the selector.
    async fn dispatch_click_sequence(
        &self,
        page: &PageHandle,
        selector: &str,
    ) -> Result<(), GatewayError>;

    /// Structured table read: for each element matching `row_selector`,
    /// the first contained anchor plus the remaining cell texts.
    async fn extract_rows(
        &self,
        page: &PageHandle,
        row_selector: &str,
    ) -> Result<Vec<RawRow>, GatewayError>;
}

/// Page lifecycle: create, locate, focus, navigate and close pages.
#[async_trait]
pub trait PageBroker: Send + Sync {
    async fn open(&self, url: &str, foreground: bool) -> Result<PageHandle, GatewayError>;

    /// First live page whose URL contains the fragment.
    async fn find(&self, url_fragment: &str) -> Result<Option<PageHandle>, GatewayError>;

    async fn focus(&self, page: &PageHandle) -> Result<(), GatewayError>;

    async fn navigate(&self, page: &PageHandle, url: &str) -> Result<(), GatewayError>;

    async fn close(&self, page: &PageHandle) -> Result<(), GatewayError>;
}
