use harvest_logging::{harvest_info, harvest_warn};

use crate::config::{Credentials, SiteProfile, TimeoutConfig};
use crate::diagnostics::Diagnostics;
use crate::{AuthError, Driver, DriverError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    Failed,
}

/// An authenticated browsing context, owned by the harvest loop for its lifetime.
pub struct Session {
    driver: Box<dyn Driver>,
    auth: AuthState,
    current_url: String,
}

impl Session {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            auth: AuthState::Unauthenticated,
            current_url: String::new(),
        }
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Refresh the cached URL from the driver.
    pub async fn sync_url(&mut self) -> Result<&str, DriverError> {
        self.current_url = self.driver.current_url().await?;
        Ok(&self.current_url)
    }

    /// Tear down the browser context.
    pub async fn close(self) -> Result<(), DriverError> {
        self.driver.close().await
    }
}

/// Performs the login handshake against the portal's fixed form.
pub struct SessionController<'a> {
    site: &'a SiteProfile,
    timeouts: &'a TimeoutConfig,
    diagnostics: &'a Diagnostics,
}

impl<'a> SessionController<'a> {
    pub fn new(site: &'a SiteProfile, timeouts: &'a TimeoutConfig, diagnostics: &'a Diagnostics) -> Self {
        Self {
            site,
            timeouts,
            diagnostics,
        }
    }

    /// Log in; the session is authenticated only if the post-submit URL left the login page.
    pub async fn login(&self, session: &mut Session, credentials: &Credentials) -> Result<(), AuthError> {
        let outcome = self.submit(session, credentials).await;
        session.auth = match &outcome {
            Ok(()) => AuthState::Authenticated,
            Err(_) => AuthState::Failed,
        };
        outcome
    }

    async fn submit(&self, session: &mut Session, credentials: &Credentials) -> Result<(), AuthError> {
        let site = self.site;
        harvest_info!("Opening login page {}", site.login_url);
        if let Err(err) = session.driver().navigate(&site.login_url).await {
            self.diagnostics.capture(session.driver(), "login-entry").await;
            return Err(AuthError::FormNotInteractive(err));
        }

        let form_ready = async {
            let driver = session.driver();
            driver
                .wait_for_selector(&site.username_selector, self.timeouts.element())
                .await?;
            driver
                .type_text(&site.username_selector, &credentials.username)
                .await?;
            driver
                .type_text(&site.password_selector, &credentials.password)
                .await
        };
        if let Err(err) = form_ready.await {
            self.diagnostics.capture(session.driver(), "login-form").await;
            return Err(AuthError::FormNotInteractive(err));
        }

        harvest_info!("Submitting credentials for {}", credentials.username);
        if let Err(err) = session
            .driver()
            .click_and_wait_for_navigation(&site.submit_selector, self.timeouts.navigation())
            .await
        {
            harvest_warn!("Login submission failed before redirect: {}", err);
            self.diagnostics.capture(session.driver(), "login-submit").await;
            return Err(AuthError::Submit(err));
        }

        let url = session.sync_url().await.map_err(AuthError::Submit)?.to_string();
        if is_login_url(&url, &site.login_url_pattern) {
            return Err(AuthError::InvalidCredentials { url });
        }
        harvest_info!("Login complete, landed on {}", url);
        Ok(())
    }
}

fn is_login_url(url: &str, pattern: &str) -> bool {
    !pattern.is_empty() && url.to_lowercase().contains(&pattern.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::is_login_url;

    #[test]
    fn login_pattern_is_case_insensitive() {
        assert!(is_login_url("https://x.test/User/login?returnurl=%2f", "Login"));
        assert!(!is_login_url("https://x.test/Car/DataSale", "Login"));
        assert!(!is_login_url("https://x.test/anything", ""));
    }
}
