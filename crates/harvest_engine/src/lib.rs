//! Harvest engine: browser session, pagination, export and effect execution.
mod chromium;
mod config;
mod diagnostics;
mod driver;
mod engine;
mod export;
mod listing;
mod pagination;
mod persist;
mod session;
mod types;

pub use chromium::ChromiumDriver;
pub use config::{
    BrowserSettings, ConfigError, Credentials, DiagnosticsConfig, ExportConfig, HarvestConfig,
    PaginationConfig, PaginationVariant, RetryConfig, SiteProfile, TimeoutConfig,
};
pub use diagnostics::Diagnostics;
pub use driver::Driver;
pub use engine::Harvester;
pub use export::{export, read_export, render_delimited, ExportError, ExportOptions, ExportSummary};
pub use listing::{read_listing, scripts};
pub use pagination::{
    strategy_for, IndexClickPager, PageSizeSubmitPager, PagerSettings, PaginationStrategy,
    UrlParameterPager,
};
pub use persist::{ensure_output_dir, split_target, AtomicFileWriter, PersistError};
pub use session::{AuthState, Session, SessionController};
pub use types::{AuthError, DriverError, HarvestError, NavigationError};
