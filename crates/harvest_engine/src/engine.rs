use std::collections::VecDeque;

use harvest_core::{
    extract_records, update, AdvanceOutcome, Effect, HarvestFailure, HarvestState, Msg, Phase,
};
use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn, set_current_page};

use crate::config::HarvestConfig;
use crate::diagnostics::Diagnostics;
use crate::export::{export, ExportError, ExportOptions, ExportSummary};
use crate::listing::read_listing;
use crate::pagination::{strategy_for, PaginationStrategy};
use crate::session::{Session, SessionController};
use crate::{AuthError, Driver, HarvestError};

/// Runs one harvest: executes the effects of the core state machine against a
/// live browser session and feeds the results back as messages.
pub struct Harvester {
    config: HarvestConfig,
    pager: Box<dyn PaginationStrategy>,
    export_options: ExportOptions,
    diagnostics: Diagnostics,
}

/// Failure details the core only sees as text.
#[derive(Default)]
struct RunContext {
    auth_error: Option<AuthError>,
    export_error: Option<ExportError>,
    summary: Option<ExportSummary>,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        let pager = strategy_for(&config);
        let mut export_options = ExportOptions::new(config.export.path.clone());
        export_options.delimiter = config.delimiter();
        export_options.summary_path = config.export.summary_path.clone();
        let diagnostics = if config.diagnostics.enabled {
            Diagnostics::new(config.diagnostics.dir.clone())
        } else {
            Diagnostics::disabled()
        };
        Self {
            config,
            pager,
            export_options,
            diagnostics,
        }
    }

    /// Replace the export settings derived from the config (e.g. to inject a clock).
    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export_options
    }

    /// Harvest every page and export the rows.
    ///
    /// The driver is closed on every exit path; a close failure is logged and
    /// does not mask the run's own result.
    pub async fn run(&self, driver: Box<dyn Driver>) -> Result<ExportSummary, HarvestError> {
        harvest_info!(
            "Starting harvest with {:?} pagination",
            self.pager.variant()
        );
        let mut session = Session::new(driver);
        let outcome = self.drive(&mut session).await;
        set_current_page(0);
        if let Err(err) = session.close().await {
            harvest_warn!("Failed to close browser session: {}", err);
        }
        match &outcome {
            Ok(summary) => harvest_info!(
                "Harvest finished: {} rows from {} pages written to {:?}",
                summary.row_count,
                summary.page_count,
                summary.output_path
            ),
            Err(err) => harvest_error!("Harvest failed: {}", err),
        }
        outcome
    }

    async fn drive(&self, session: &mut Session) -> Result<ExportSummary, HarvestError> {
        let mut ctx = RunContext::default();
        let (mut state, effects) = update(
            HarvestState::new(self.config.harvest_settings()),
            Msg::Start,
        );
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            let msg = self.execute(effect, session, &mut ctx).await;
            let page_done = matches!(&msg, Msg::PageExtracted { records, .. } if !records.is_empty());
            let (next, effects) = update(state, msg);
            state = next;
            if page_done {
                harvest_info!("{:?}", state.view());
            } else {
                harvest_debug!("{:?}", state.view());
            }
            queue.extend(effects);
        }

        match state.phase().clone() {
            Phase::Done => ctx
                .summary
                .ok_or_else(|| HarvestError::Incomplete("export summary missing".into())),
            Phase::Failed(failure) => Err(self.fail(failure, session, &mut ctx).await),
            other => Err(HarvestError::Incomplete(format!(
                "loop stopped in phase {other:?}"
            ))),
        }
    }

    async fn execute(&self, effect: Effect, session: &mut Session, ctx: &mut RunContext) -> Msg {
        match effect {
            Effect::Login => {
                let controller =
                    SessionController::new(&self.config.site, &self.config.timeouts, &self.diagnostics);
                match controller.login(session, &self.config.login).await {
                    Ok(()) => Msg::LoginSucceeded,
                    Err(err) => {
                        let reason = err.to_string();
                        ctx.auth_error = Some(err);
                        Msg::LoginFailed { reason }
                    }
                }
            }
            Effect::PreparePages { delay } => {
                backoff(delay).await;
                set_current_page(1);
                match self.pager.prepare(session).await {
                    Ok(pagination) => Msg::PageReady(pagination),
                    Err(err) => {
                        harvest_warn!("Entry page failed: {}", err);
                        Msg::NavigationFailed {
                            message: err.to_string(),
                        }
                    }
                }
            }
            Effect::Advance { from, delay } => {
                backoff(delay).await;
                set_current_page(from.current_page + 1);
                match self.pager.advance(session, &from).await {
                    Ok(AdvanceOutcome::Advanced(pagination)) => Msg::PageReady(pagination),
                    Ok(AdvanceOutcome::NoMorePages) => {
                        harvest_info!("No more pages after page {}", from.current_page);
                        Msg::NoMorePages
                    }
                    Ok(AdvanceOutcome::StallDetected) => {
                        harvest_warn!("Advance did not change the listing");
                        Msg::StallDetected
                    }
                    Err(err) => {
                        harvest_warn!("Advance failed: {}", err);
                        Msg::NavigationFailed {
                            message: err.to_string(),
                        }
                    }
                }
            }
            Effect::Extract { page } => {
                match read_listing(session.driver(), &self.config.site, page).await {
                    Ok(listing) => {
                        let records = extract_records(&listing);
                        if records.is_empty() {
                            harvest_warn!("No rows rendered");
                        } else {
                            harvest_info!("Extracted {} rows", records.len());
                        }
                        Msg::PageExtracted { page, records }
                    }
                    Err(err) => {
                        harvest_warn!("Extraction failed: {}", err);
                        Msg::NavigationFailed {
                            message: err.to_string(),
                        }
                    }
                }
            }
            Effect::Export { result } => {
                set_current_page(0);
                harvest_info!(
                    "Exporting {} rows to {:?}",
                    result.len(),
                    self.export_options.path
                );
                match export(&result, &self.export_options) {
                    Ok(summary) => {
                        let rows = summary.row_count;
                        ctx.summary = Some(summary);
                        Msg::ExportCompleted { rows }
                    }
                    Err(err) => {
                        let reason = err.to_string();
                        ctx.export_error = Some(err);
                        Msg::ExportFailed { reason }
                    }
                }
            }
        }
    }

    async fn fail(
        &self,
        failure: HarvestFailure,
        session: &Session,
        ctx: &mut RunContext,
    ) -> HarvestError {
        match failure {
            HarvestFailure::Authentication { reason } => ctx
                .auth_error
                .take()
                .map(HarvestError::Auth)
                .unwrap_or(HarvestError::Incomplete(reason)),
            HarvestFailure::Navigation {
                page,
                attempts,
                message,
            } => {
                self.diagnostics
                    .capture(session.driver(), &format!("page-{page}-navigation"))
                    .await;
                HarvestError::Navigation {
                    page,
                    attempts,
                    message,
                }
            }
            HarvestFailure::Stalled { page, attempts } => {
                self.diagnostics
                    .capture(session.driver(), &format!("page-{page}-stall"))
                    .await;
                HarvestError::Stalled { page, attempts }
            }
            HarvestFailure::Export { reason } => ctx
                .export_error
                .take()
                .map(HarvestError::Export)
                .unwrap_or(HarvestError::Incomplete(reason)),
        }
    }
}

async fn backoff(delay: std::time::Duration) {
    if !delay.is_zero() {
        harvest_info!("Retrying in {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
