use crate::normalize::{clean_text, normalize_count, parse_count, split_model_year, strip_day_suffix};

/// Number of columns in every exported record.
pub const FIELD_COUNT: usize = 14;

/// Export header, in output column order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "date",
    "elapsed_days",
    "vehicle",
    "transmission",
    "model_year",
    "registration_date",
    "fuel",
    "mileage",
    "color",
    "price",
    "options",
    "dealer",
    "location",
    "remarks",
];

/// Source cells from this index on are folded into `remarks`.
const REMARKS_CELL: usize = 12;
const REMARKS_SEPARATOR: &str = " / ";

/// One normalized listing row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub date: String,
    pub elapsed_days: String,
    pub vehicle: String,
    pub transmission: String,
    pub model_year: String,
    pub registration_date: String,
    pub fuel: String,
    pub mileage: Option<u64>,
    pub color: String,
    pub price: Option<u64>,
    pub options: String,
    pub dealer: String,
    pub location: String,
    pub remarks: String,
}

impl Record {
    /// Build a record from the raw cell texts of one table row.
    ///
    /// Short or malformed rows produce blanks rather than being dropped, so the
    /// column layout of the export never shifts.
    pub fn from_cells(cells: &[String]) -> Self {
        let cell = |idx: usize| cells.get(idx).map(|c| clean_text(c)).unwrap_or_default();
        let (model_year, registration_date) = split_model_year(&cell(4));
        let remarks = cells
            .iter()
            .skip(REMARKS_CELL)
            .map(|c| clean_text(c))
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join(REMARKS_SEPARATOR);

        Self {
            date: cell(0),
            elapsed_days: strip_day_suffix(&cell(1)),
            vehicle: cell(2),
            transmission: cell(3),
            model_year,
            registration_date,
            fuel: cell(5),
            mileage: parse_count(&cell(6)),
            color: cell(7),
            price: parse_count(&cell(8)),
            options: cell(9),
            dealer: cell(10),
            location: cell(11),
            remarks,
        }
    }

    /// Field values as text in [`FIELD_NAMES`] order; absent numbers render blank.
    pub fn fields(&self) -> [String; FIELD_COUNT] {
        let number = |n: Option<u64>| n.map(|v| v.to_string()).unwrap_or_default();
        [
            self.date.clone(),
            self.elapsed_days.clone(),
            self.vehicle.clone(),
            self.transmission.clone(),
            self.model_year.clone(),
            self.registration_date.clone(),
            self.fuel.clone(),
            number(self.mileage),
            self.color.clone(),
            number(self.price),
            self.options.clone(),
            self.dealer.clone(),
            self.location.clone(),
            self.remarks.clone(),
        ]
    }

    /// Rebuild a record from exported field text (the inverse of [`Record::fields`]).
    ///
    /// Values are re-normalized, so this is the identity on exported rows.
    pub fn from_fields(fields: &[String]) -> Self {
        let field = |idx: usize| fields.get(idx).map(|c| clean_text(c)).unwrap_or_default();
        let count = |idx: usize| -> Option<u64> { normalize_count(&field(idx)).parse().ok() };
        Self {
            date: field(0),
            elapsed_days: strip_day_suffix(&field(1)),
            vehicle: field(2),
            transmission: field(3),
            model_year: field(4),
            registration_date: field(5),
            fuel: field(6),
            mileage: count(7),
            color: field(8),
            price: count(9),
            options: field(10),
            dealer: field(11),
            location: field(12),
            remarks: field(13),
        }
    }
}

/// Pagination affordance visible on a rendered listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageAffordance {
    /// Text of every pagination item, numeric or not ("«", "1", "2", "»").
    pub labels: Vec<String>,
    /// Whether an enabled "next" control exists; `None` when the page has none at all.
    pub has_next: Option<bool>,
}

/// The rendered state of one listing page, as returned by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingPage {
    /// 1-based page index.
    pub index: u32,
    pub rows: Vec<Vec<String>>,
    pub affordance: PageAffordance,
}

impl ListingPage {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Content fingerprint used to tell whether a navigation actually took effect.
    pub fn signature(&self) -> Option<String> {
        page_signature(&self.rows)
    }
}

/// Fingerprint of a page's rows: row count plus first and last row text.
///
/// `None` for an empty page.
pub fn page_signature(rows: &[Vec<String>]) -> Option<String> {
    let join = |row: &Vec<String>| {
        row.iter()
            .map(|c| clean_text(c))
            .collect::<Vec<_>>()
            .join("\u{1f}")
    };
    let first = rows.first()?;
    let last = rows.last().unwrap_or(first);
    Some(format!("{}|{}|{}", rows.len(), join(first), join(last)))
}

/// Row Extractor: one record per rendered row, in page order.
pub fn extract_records(page: &ListingPage) -> Vec<Record> {
    page.rows.iter().map(|row| Record::from_cells(row)).collect()
}

/// Accumulated records of one run. Grows monotonically, page by page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestResult {
    records: Vec<Record>,
    pages: u32,
}

impl HarvestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> [&'static str; FIELD_COUNT] {
        FIELD_NAMES
    }

    pub fn push_page(&mut self, records: Vec<Record>) {
        self.records.extend(records);
        self.pages += 1;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn page_count(&self) -> u32 {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
