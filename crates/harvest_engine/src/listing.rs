use harvest_core::{ListingPage, PageAffordance};
use serde::Deserialize;

use crate::config::SiteProfile;
use crate::{Driver, NavigationError};

/// In-page scripts evaluated against the rendered listing.
///
/// Each one is a self-invoking expression so the driver receives its return
/// value directly. Selectors and labels are embedded as JSON string literals.
pub mod scripts {
    use crate::config::SiteProfile;

    fn literal(value: &str) -> String {
        serde_json::Value::String(value.to_string()).to_string()
    }

    /// Returns `{ rows: string[][], labels: string[], hasNext: bool | null }`.
    pub fn listing_snapshot(site: &SiteProfile) -> String {
        format!(
            r#"(() => {{
  const clean = (t) => (t || '').replace(/\s+/g, ' ').trim();
  const rows = Array.from(document.querySelectorAll({rows})).map((row) =>
    Array.from(row.querySelectorAll('td')).map((cell) => clean(cell.textContent)));
  const labels = Array.from(document.querySelectorAll({items})).map((item) => clean(item.textContent));
  const next = document.querySelector({next});
  let hasNext = null;
  if (next) {{
    const holder = next.closest('li') || next;
    hasNext = !(holder.classList.contains('disabled') || next.classList.contains('disabled') || next.hasAttribute('disabled'));
  }}
  return {{ rows, labels, hasNext }};
}})()"#,
            rows = literal(&site.row_selector),
            items = literal(&site.pagination_selector),
            next = literal(&site.next_selector),
        )
    }

    /// Clicks the pagination control labelled `page`; returns whether one existed.
    pub fn click_page_label(site: &SiteProfile, page: u32) -> String {
        format!(
            r#"(() => {{
  const target = {target};
  for (const item of document.querySelectorAll({items})) {{
    const control = item.matches('a, button') ? item : (item.querySelector('a, button') || item);
    if ((control.textContent || '').replace(/\s+/g, ' ').trim() === target) {{
      control.click();
      return true;
    }}
  }}
  return false;
}})()"#,
            target = literal(&page.to_string()),
            items = literal(&site.pagination_selector),
        )
    }

    /// Clicks the enabled "next" control; returns whether one existed.
    pub fn click_next(site: &SiteProfile) -> String {
        format!(
            r#"(() => {{
  const next = document.querySelector({next});
  if (!next) return false;
  const holder = next.closest('li') || next;
  if (holder.classList.contains('disabled') || next.classList.contains('disabled') || next.hasAttribute('disabled')) return false;
  next.click();
  return true;
}})()"#,
            next = literal(&site.next_selector),
        )
    }

    /// Picks the page-size option from the opened dropdown; returns whether it existed.
    pub fn select_page_size(site: &SiteProfile) -> String {
        format!(
            r#"(() => {{
  const wanted = {label};
  const options = Array.from(document.querySelectorAll({options}));
  const match = options.find((o) => (o.textContent || '').replace(/\s+/g, ' ').trim() === wanted);
  if (!match) return false;
  (match.querySelector('a, button') || match).click();
  return true;
}})()"#,
            label = literal(&site.page_size_option_label),
            options = literal(&site.page_size_option_selector),
        )
    }

    /// Calls the site's page-jump function with an explicit target index.
    pub fn jump_to_page(site: &SiteProfile, page: u32) -> String {
        format!(
            "(() => {{ {function}({page}); return true; }})()",
            function = site.page_jump_function,
        )
    }
}

#[derive(Debug, Deserialize)]
struct ListingSnapshot {
    #[serde(default)]
    rows: Vec<Vec<String>>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default, rename = "hasNext")]
    has_next: Option<bool>,
}

/// Read the rendered rows and pagination affordance of the current page.
pub async fn read_listing(
    driver: &dyn Driver,
    site: &SiteProfile,
    index: u32,
) -> Result<ListingPage, NavigationError> {
    let value = driver.evaluate(&scripts::listing_snapshot(site)).await?;
    let snapshot: ListingSnapshot =
        serde_json::from_value(value).map_err(|e| NavigationError::Snapshot(e.to_string()))?;
    Ok(ListingPage {
        index,
        rows: snapshot.rows,
        affordance: PageAffordance {
            labels: snapshot.labels,
            has_next: snapshot.has_next,
        },
    })
}

/// Evaluate a script that reports success as a boolean.
pub(crate) async fn evaluate_flag(driver: &dyn Driver, script: &str) -> Result<bool, NavigationError> {
    let value = driver.evaluate(script).await?;
    value
        .as_bool()
        .ok_or_else(|| NavigationError::Snapshot(format!("expected a boolean, got {value}")))
}
