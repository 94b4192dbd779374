#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Once};
use std::time::Duration;

use harvest_engine::{scripts, Driver, DriverError, HarvestConfig, SiteProfile};
use serde_json::{json, Value};
use url::Url;

pub const USERNAME: &str = "dealer01";
pub const PASSWORD: &str = "s3cret";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

/// One listing row in the portal's column order.
pub fn row(vehicle: &str, price: &str) -> Vec<String> {
    [
        "2024-05-01",
        "3일",
        vehicle,
        "Auto",
        "[2019] , 2019.5",
        "Gasoline",
        "83,204 km",
        "White",
        price,
        "Navi, Sunroof",
        "Hanbit Motors",
        "Seoul",
        "no accidents",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Fast config for fixture runs: no settle delay, immediate retries.
pub fn fixture_config(out: &Path, max_attempts: u32) -> HarvestConfig {
    let text = json!({
        "login": { "username": USERNAME, "password": PASSWORD },
        "pagination": { "settle_delay_ms": 0, "max_pages": 50 },
        "retry": {
            "max_attempts": max_attempts,
            "initial_backoff_ms": 0,
            "backoff_multiplier": 1.0,
            "max_backoff_ms": 0
        },
        "timeouts": { "navigation_ms": 1000, "element_ms": 1000 },
        "export": { "path": out.join("listings.csv") },
        "diagnostics": { "enabled": true, "dir": out.join("diagnostics") }
    })
    .to_string();
    HarvestConfig::from_json_str(&text).expect("fixture config is valid")
}

/// Observable state of the scripted portal, shared between a test and its driver.
#[derive(Debug, Default)]
pub struct PortalState {
    pub url: String,
    pub logged_in: bool,
    pub current_page: u32,
    pub typed: HashMap<String, String>,
    pub navigations: Vec<String>,
    pub scripts_run: usize,
    pub page_size_selected: bool,
    pub screenshots: Vec<String>,
    pub closed: bool,
}

#[derive(Debug, Default, Clone)]
pub struct PortalScript {
    pub pages: Vec<Vec<Vec<String>>>,
    /// Advances to this page (or later) leave the previous page rendered.
    pub stall_from: Option<u32>,
    /// The submit click never produces a navigation.
    pub hang_on_submit: bool,
    /// Number of page labels rendered; the rest are reachable only through "next".
    pub label_window: Option<u32>,
}

/// A [`Driver`] that plays a fake listing portal instead of a browser.
pub struct FakeDriver {
    site: SiteProfile,
    script: PortalScript,
    state: Arc<Mutex<PortalState>>,
}

impl FakeDriver {
    pub fn new(site: SiteProfile, script: PortalScript) -> (Self, Arc<Mutex<PortalState>>) {
        let state = Arc::new(Mutex::new(PortalState::default()));
        let driver = Self {
            site,
            script,
            state: Arc::clone(&state),
        };
        (driver, state)
    }

    fn state(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap()
    }

    fn page_count(&self) -> u32 {
        self.script.pages.len() as u32
    }

    fn visible_labels(&self) -> u32 {
        self.script
            .label_window
            .map_or(self.page_count(), |window| window.min(self.page_count()))
    }

    /// Move to `target`, unless the portal is scripted to stall there.
    fn go_to_page(&self, state: &mut PortalState, target: u32) -> bool {
        if target == 0 || target > self.page_count() {
            return false;
        }
        let stalled = self.script.stall_from.is_some_and(|from| target >= from);
        if !stalled {
            state.current_page = target;
        }
        true
    }

    fn snapshot(&self, state: &PortalState) -> Value {
        let rows = self
            .script
            .pages
            .get(state.current_page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();
        let mut labels = vec!["«".to_string()];
        labels.extend((1..=self.visible_labels()).map(|n| n.to_string()));
        labels.push("»".to_string());
        json!({
            "rows": rows,
            "labels": labels,
            "hasNext": state.current_page < self.page_count(),
        })
    }
}

#[async_trait::async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        state.navigations.push(url.to_string());
        if url.starts_with(&self.site.listing_url) {
            if !state.logged_in {
                state.url = self.site.login_url.clone();
                return Ok(());
            }
            let page = Url::parse(url)
                .ok()
                .and_then(|u| {
                    u.query_pairs()
                        .find(|(k, _)| k == self.site.page_param.as_str())
                        .and_then(|(_, v)| v.parse::<u32>().ok())
                })
                .unwrap_or(1);
            if state.current_page == 0 {
                state.current_page = 1;
            } else {
                self.go_to_page(&mut state, page);
            }
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state().url.clone())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let state = self.state();
        let on_login = state.url.starts_with(&self.site.login_url);
        let is_form = selector == self.site.username_selector || selector == self.site.password_selector;
        if is_form && !on_login {
            return Err(DriverError::timeout(format!("waiting for {selector}"), timeout));
        }
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.state().typed.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        if selector == self.site.submit_selector && !self.script.hang_on_submit {
            let user = state.typed.get(&self.site.username_selector).cloned();
            let pass = state.typed.get(&self.site.password_selector).cloned();
            if user.as_deref() == Some(USERNAME) && pass.as_deref() == Some(PASSWORD) {
                state.logged_in = true;
                state.url = format!("{}/Main", self.site.listing_url.trim_end_matches('/'));
            } else {
                state.url = format!("{}&error=1", self.site.login_url);
            }
        }
        Ok(())
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), DriverError> {
        if self.script.hang_on_submit && !self.state().logged_in {
            return Err(DriverError::timeout("waiting for navigation", timeout));
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
        let mut state = self.state();
        state.scripts_run += 1;
        if script == scripts::listing_snapshot(&self.site) {
            return Ok(self.snapshot(&state));
        }
        if script == scripts::select_page_size(&self.site) {
            state.page_size_selected = true;
            return Ok(Value::Bool(true));
        }
        if script == scripts::click_next(&self.site) {
            let target = state.current_page + 1;
            return Ok(Value::Bool(self.go_to_page(&mut state, target)));
        }
        for target in 1..=self.page_count() + 1 {
            if script == scripts::click_page_label(&self.site, target) {
                let shown = target <= self.visible_labels();
                return Ok(Value::Bool(shown && self.go_to_page(&mut state, target)));
            }
            if script == scripts::jump_to_page(&self.site, target) {
                return Ok(Value::Bool(self.go_to_page(&mut state, target)));
            }
        }
        Err(DriverError::Script(format!("unexpected script: {script}")))
    }

    async fn content(&self) -> Result<String, DriverError> {
        let state = self.state();
        Ok(format!("<html><body>page {}</body></html>", state.current_page))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DriverError::Io(e.to_string()))?;
        }
        fs::write(path, b"\x89PNG").map_err(|e| DriverError::Io(e.to_string()))?;
        self.state().screenshots.push(path.display().to_string());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.state().closed = true;
        Ok(())
    }
}
