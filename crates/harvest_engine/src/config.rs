//! Run configuration: credentials, site contract and loop tuning.
//!
//! Loaded once per run from a `.json` or `.ron` file and treated read-only.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use harvest_core::{HarvestSettings, RetryPolicy};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fixed contract of the target portal: URLs and selectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub login_url: String,
    pub listing_url: String,
    /// Substring of the login page URL; still matching it after submit means rejection.
    pub login_url_pattern: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    pub row_selector: String,
    pub pagination_selector: String,
    pub next_selector: String,
    pub page_param: String,
    pub page_size_param: Option<String>,
    pub page_size: u32,
    pub page_size_toggle_selector: String,
    pub page_size_option_selector: String,
    pub page_size_option_label: String,
    pub page_jump_function: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            login_url: "https://www.carmanager.co.kr/User/Login/?returnurl=%2fCar%2fDataSale"
                .to_string(),
            listing_url: "https://www.carmanager.co.kr/Car/DataSale".to_string(),
            login_url_pattern: "Login".to_string(),
            username_selector: "#UserId".to_string(),
            password_selector: "#Password".to_string(),
            submit_selector: ".btn-login".to_string(),
            row_selector: "table.table tbody tr".to_string(),
            pagination_selector: ".pagination li".to_string(),
            next_selector: ".pagination a.next, .pagination li.next a".to_string(),
            page_param: "page".to_string(),
            page_size_param: Some("pageSize".to_string()),
            page_size: 100,
            page_size_toggle_selector: ".page-size .dropdown-toggle".to_string(),
            page_size_option_selector: ".page-size .dropdown-menu li".to_string(),
            page_size_option_label: "100".to_string(),
            page_jump_function: "goPage".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationVariant {
    /// Page index in a query parameter; each page is a full navigation.
    #[default]
    UrlParameter,
    /// Click the page-number control labelled `current + 1`.
    IndexClick,
    /// Pick "100 per page" once, then call the page-jump function.
    PageSizeSubmit,
}

impl FromStr for PaginationVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "url_parameter" | "url" => Ok(PaginationVariant::UrlParameter),
            "index_click" | "click" => Ok(PaginationVariant::IndexClick),
            "page_size_submit" | "page_size" => Ok(PaginationVariant::PageSizeSubmit),
            other => Err(ConfigError::Invalid(format!(
                "unknown pagination variant '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub variant: PaginationVariant,
    pub max_pages: u32,
    pub settle_delay_ms: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            variant: PaginationVariant::default(),
            max_pages: 500,
            settle_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            backoff_multiplier: policy.multiplier,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub navigation_ms: u64,
    pub element_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            element_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub path: PathBuf,
    pub delimiter: char,
    pub summary_path: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("carmanager_data.csv"),
            delimiter: ',',
            summary_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("diagnostics"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: 1024,
            window_height: 768,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    pub login: Credentials,
    #[serde(default)]
    pub site: SiteProfile,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl HarvestConfig {
    /// Load and validate a config file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Self::from_json_str(&text),
            Some("ron") => Self::from_ron_str(&text),
            _ => Err(ConfigError::Invalid(format!(
                "unsupported config format for {path:?}; expected .json or .ron"
            ))),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login.username.trim().is_empty() {
            return Err(ConfigError::Invalid("login.username is empty".into()));
        }
        if self.pagination.max_pages == 0 {
            return Err(ConfigError::Invalid("pagination.max_pages must be at least 1".into()));
        }
        if !self.export.delimiter.is_ascii() || matches!(self.export.delimiter, '"' | '\n' | '\r') {
            return Err(ConfigError::Invalid(format!(
                "export.delimiter {:?} must be a single ASCII character other than a quote or newline",
                self.export.delimiter
            )));
        }
        let jump = &self.site.page_jump_function;
        let valid_jump = !jump.is_empty()
            && jump
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
        if !valid_jump {
            return Err(ConfigError::Invalid(format!(
                "site.page_jump_function '{jump}' is not a plain function name"
            )));
        }
        url::Url::parse(&self.site.login_url)
            .map_err(|e| ConfigError::Invalid(format!("site.login_url: {e}")))?;
        url::Url::parse(&self.site.listing_url)
            .map_err(|e| ConfigError::Invalid(format!("site.listing_url: {e}")))?;
        Ok(())
    }

    /// Export delimiter as a byte; `validate` guarantees it is ASCII.
    pub fn delimiter(&self) -> u8 {
        u8::try_from(self.export.delimiter).unwrap_or(b',')
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.pagination.settle_delay_ms)
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            max_pages: self.pagination.max_pages,
            retry: self.retry.policy(),
        }
    }
}
