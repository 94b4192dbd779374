//! Harvest core: field normalization, row extraction and the pure harvest-loop state machine.
mod effect;
mod msg;
mod normalize;
mod pagination;
mod record;
mod retry;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use normalize::{clean_text, normalize_count, parse_count, split_model_year, strip_day_suffix};
pub use pagination::{classify_advance, discover_total_pages, AdvanceOutcome, PaginationState};
pub use record::{
    extract_records, page_signature, HarvestResult, ListingPage, PageAffordance, Record,
    FIELD_COUNT, FIELD_NAMES,
};
pub use retry::{RetryDecision, RetryPolicy};
pub use state::{HarvestFailure, HarvestSettings, HarvestState, Phase};
pub use update::update;
pub use view_model::HarvestView;
