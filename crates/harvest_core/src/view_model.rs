use crate::state::Phase;

/// Read-only progress snapshot of a harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestView {
    pub phase: Phase,
    pub current_page: u32,
    pub total_pages: Option<u32>,
    pub rows: usize,
    pub pages_harvested: u32,
    pub retries_used: u32,
}
