//! Chromium-backed [`Driver`] using chromiumoxide.

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use harvest_logging::{harvest_debug, harvest_info, harvest_warn};
use tokio::task::JoinHandle;

use crate::config::BrowserSettings;
use crate::{Driver, DriverError};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumDriver {
    /// Launch a browser process and open one blank page.
    pub async fn launch(
        settings: &BrowserSettings,
        navigation_timeout: Duration,
    ) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .request_timeout(navigation_timeout)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    harvest_debug!("browser handler event error: {}", err);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        harvest_info!(
            "Browser launched (headless={}, {}x{})",
            settings.headless,
            settings.window_width,
            settings.window_height
        );
        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout,
        })
    }

    async fn find(&self, selector: &str) -> Result<chromiumoxide::Element, DriverError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound {
                selector: selector.to_string(),
            })
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn protocol(err: chromiumoxide::error::CdpError) -> DriverError {
    DriverError::Protocol(err.to_string())
}

#[async_trait::async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let timeout = self.navigation_timeout;
        tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await
        .map_err(|_| DriverError::timeout(format!("navigation to {url}"), timeout))?
        .map_err(protocol)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let url = self.page.url().await.map_err(protocol)?;
        Ok(url.map(|u| u.to_string()).unwrap_or_default())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(DriverError::timeout(format!("waiting for {selector}"), timeout));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self.find(selector).await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(protocol)?;
        element
            .click()
            .await
            .map_err(protocol)?
            .type_str(text)
            .await
            .map_err(protocol)?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.find(selector).await?.click().await.map_err(protocol)?;
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), DriverError> {
        tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| DriverError::timeout("waiting for navigation", timeout))?
            .map_err(protocol)?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn content(&self) -> Result<String, DriverError> {
        self.page.content().await.map_err(protocol)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| DriverError::Io(e.to_string()))?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        let mut this = self;
        if let Err(err) = this.page.clone().close().await {
            harvest_warn!("Failed to close page: {}", err);
        }
        this.browser.close().await.map_err(protocol)?;
        if let Err(err) = this.browser.wait().await {
            harvest_warn!("Browser process did not exit cleanly: {}", err);
        }
        harvest_info!("Browser closed");
        Ok(())
    }
}
