use std::fmt;

use crate::pagination::PaginationState;
use crate::record::HarvestResult;
use crate::retry::RetryPolicy;
use crate::view_model::HarvestView;

/// Loop-level knobs that the pure state machine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    /// Safety bound on pages visited when the total cannot be discovered.
    pub max_pages: u32,
    pub retry: RetryPolicy,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            max_pages: 500,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestFailure {
    Authentication { reason: String },
    Navigation { page: u32, attempts: u32, message: String },
    Stalled { page: u32, attempts: u32 },
    Export { reason: String },
}

impl fmt::Display for HarvestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarvestFailure::Authentication { reason } => write!(f, "authentication failed: {reason}"),
            HarvestFailure::Navigation {
                page,
                attempts,
                message,
            } => write!(
                f,
                "navigation to page {page} failed after {attempts} retries: {message}"
            ),
            HarvestFailure::Stalled { page, attempts } => {
                write!(f, "page {page} stalled after {attempts} retries")
            }
            HarvestFailure::Export { reason } => write!(f, "export failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Authenticating,
    PageLoading,
    Extracting,
    Exporting,
    Done,
    Failed(HarvestFailure),
}

/// The step currently being attempted; a retry re-runs exactly this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingStep {
    Prepare,
    Advance(PaginationState),
}

impl PendingStep {
    pub(crate) fn target_page(&self) -> u32 {
        match self {
            PendingStep::Prepare => 1,
            PendingStep::Advance(from) => from.current_page + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestState {
    pub(crate) settings: HarvestSettings,
    pub(crate) phase: Phase,
    pub(crate) pagination: PaginationState,
    pub(crate) result: HarvestResult,
    pub(crate) pending: PendingStep,
    pub(crate) failures: u32,
    pub(crate) rows_exported: Option<usize>,
}

impl HarvestState {
    pub fn new(settings: HarvestSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            pagination: PaginationState::new(),
            result: HarvestResult::new(),
            pending: PendingStep::Prepare,
            failures: 0,
            rows_exported: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    /// Rows written by the exporter once the run is done.
    pub fn rows_exported(&self) -> Option<usize> {
        self.rows_exported
    }

    pub fn view(&self) -> HarvestView {
        HarvestView {
            phase: self.phase.clone(),
            current_page: self.pagination.current_page,
            total_pages: self.pagination.total_pages,
            rows: self.result.len(),
            pages_harvested: self.result.page_count(),
            retries_used: self.failures,
        }
    }
}
