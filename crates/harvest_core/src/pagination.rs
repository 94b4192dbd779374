use crate::normalize::clean_text;
use crate::record::ListingPage;

/// Where the traversal stands. Only pagination strategies produce new values;
/// the harvest loop stores and reads them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaginationState {
    /// 1-based index of the page currently rendered; 0 before the first page loads.
    pub current_page: u32,
    /// Highest page number seen in the pagination affordance so far.
    pub total_pages: Option<u32>,
    /// Explicit "next" affordance of the current page, when one was observable.
    pub has_next: Option<bool>,
    pub exhausted: bool,
    /// Fingerprint of the rows on the current page.
    pub signature: Option<String>,
}

/// Result of one pagination advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced(PaginationState),
    /// The current page has no next affordance. Never inferred from zero rows.
    NoMorePages,
    /// The advance completed but the rendered rows are empty or unchanged.
    StallDetected,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The page to advance to, or `None` when the traversal is over.
    ///
    /// An explicit next affordance wins; otherwise the discovered total caps the
    /// walk. `max_pages` is always honored as a safety bound.
    pub fn next_target(&self, max_pages: u32) -> Option<u32> {
        if self.exhausted || self.current_page >= max_pages {
            return None;
        }
        match (self.has_next, self.total_pages) {
            (Some(false), _) => None,
            (Some(true), _) => Some(self.current_page + 1),
            (None, Some(total)) if self.current_page >= total => None,
            (None, _) => Some(self.current_page + 1),
        }
    }

    /// State after `page` was rendered and accepted.
    pub fn arrived(&self, page: &ListingPage) -> Self {
        let discovered = discover_total_pages(&page.affordance.labels);
        let total_pages = Some(self.total_pages.map_or(discovered, |t| t.max(discovered)));
        let has_next = page.affordance.has_next.or_else(|| {
            numeric_labels(&page.affordance.labels)
                .any(|n| n == page.index + 1)
                .then_some(true)
        });
        Self {
            current_page: page.index,
            total_pages,
            has_next,
            exhausted: false,
            signature: page.signature(),
        }
    }

    pub fn into_exhausted(self) -> Self {
        Self {
            exhausted: true,
            ..self
        }
    }
}

fn numeric_labels(labels: &[String]) -> impl Iterator<Item = u32> + '_ {
    labels
        .iter()
        .filter_map(|label| clean_text(label).parse::<u32>().ok())
}

/// Largest page number among the affordance labels, skipping glyphs such as
/// "«" or "next". Defaults to a single page when nothing parses.
pub fn discover_total_pages(labels: &[String]) -> u32 {
    numeric_labels(labels).max().unwrap_or(1).max(1)
}

/// Decide whether a navigation to `page` took effect.
///
/// Zero rows or rows identical to the previous page mean the navigation did
/// not land; that is a stall, not the end of the data.
pub fn classify_advance(state: &PaginationState, page: &ListingPage) -> AdvanceOutcome {
    let signature = page.signature();
    if signature.is_none() || signature == state.signature {
        return AdvanceOutcome::StallDetected;
    }
    AdvanceOutcome::Advanced(state.arrived(page))
}
