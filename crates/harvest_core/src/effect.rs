use std::time::Duration;

use crate::pagination::PaginationState;
use crate::record::HarvestResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the login handshake.
    Login,
    /// One-time entry navigation and page-size setup, then load page 1.
    PreparePages { delay: Duration },
    /// Move from `from` to the next page.
    Advance {
        from: PaginationState,
        delay: Duration,
    },
    /// Read the rendered rows of `page`.
    Extract { page: u32 },
    /// Hand the accumulated rows to the exporter. Ownership leaves the loop here.
    Export { result: HarvestResult },
}
