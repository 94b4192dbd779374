use crate::pagination::PaginationState;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin the run.
    Start,
    /// Login landed outside the login page.
    LoginSucceeded,
    /// Login was rejected or the form never became usable.
    LoginFailed { reason: String },
    /// The first page was prepared, or an advance took effect.
    PageReady(PaginationState),
    /// The current page has no next affordance.
    NoMorePages,
    /// An advance completed without changing the rendered rows.
    StallDetected,
    /// A page load or in-page script failed.
    NavigationFailed { message: String },
    /// Rows extracted from the rendered page.
    PageExtracted { page: u32, records: Vec<Record> },
    ExportCompleted { rows: usize },
    ExportFailed { reason: String },
}
