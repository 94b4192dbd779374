use std::path::Path;
use std::time::Duration;

use crate::DriverError;

/// Browser-automation seam: navigation, element interaction and in-page scripts.
///
/// Implementations own one live browsing context. All calls are made from a
/// single sequential flow; `Send + Sync` only lets the driver cross await points.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    /// Navigate and wait for the load to settle.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Wait until `selector` matches an element, polling up to `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Focus the element, clear it and type `text`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Wait for an in-flight navigation to finish.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), DriverError>;

    /// Click a control that triggers a navigation and wait for it to settle.
    async fn click_and_wait_for_navigation(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), DriverError> {
        self.click(selector).await?;
        self.wait_for_navigation(timeout).await
    }

    /// Evaluate a script expression in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    /// Rendered markup of the current document.
    async fn content(&self) -> Result<String, DriverError>;

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;

    /// Tear the browsing context down.
    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}
