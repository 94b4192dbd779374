//! Pagination strategies, one per navigation mechanism of the portal.

use std::time::Duration;

use harvest_core::{classify_advance, AdvanceOutcome, PaginationState};
use harvest_logging::{harvest_debug, harvest_info};
use url::Url;

use crate::config::{HarvestConfig, PaginationVariant, SiteProfile};
use crate::listing::{evaluate_flag, read_listing, scripts};
use crate::session::Session;
use crate::{DriverError, NavigationError};

#[derive(Debug, Clone)]
pub struct PagerSettings {
    pub max_pages: u32,
    pub settle_delay: Duration,
    pub element_timeout: Duration,
}

impl PagerSettings {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            max_pages: config.pagination.max_pages,
            settle_delay: config.settle_delay(),
            element_timeout: config.timeouts.element(),
        }
    }
}

/// Moves a session through the listing pages.
#[async_trait::async_trait]
pub trait PaginationStrategy: Send + Sync {
    fn variant(&self) -> PaginationVariant;

    /// One-time entry setup; leaves the session on page 1.
    async fn prepare(&self, session: &mut Session) -> Result<PaginationState, NavigationError>;

    /// Move to the page after `state.current_page`.
    async fn advance(
        &self,
        session: &mut Session,
        state: &PaginationState,
    ) -> Result<AdvanceOutcome, NavigationError>;
}

/// Build the strategy selected by configuration.
pub fn strategy_for(config: &HarvestConfig) -> Box<dyn PaginationStrategy> {
    let site = config.site.clone();
    let settings = PagerSettings::from_config(config);
    match config.pagination.variant {
        PaginationVariant::UrlParameter => Box::new(UrlParameterPager::new(site, settings)),
        PaginationVariant::IndexClick => Box::new(IndexClickPager::new(site, settings)),
        PaginationVariant::PageSizeSubmit => Box::new(PageSizeSubmitPager::new(site, settings)),
    }
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Wait for a possible navigation; an in-place refresh never fires one, so a
/// timeout here is expected and ignored.
async fn await_navigation_or_refresh(
    session: &Session,
    bound: Duration,
) -> Result<(), NavigationError> {
    match session.driver().wait_for_navigation(bound).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_timeout() => {
            harvest_debug!("No navigation observed within {:?}; assuming in-place refresh", bound);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn load_entry(
    session: &mut Session,
    site: &SiteProfile,
    url: &str,
    settle_delay: Duration,
) -> Result<PaginationState, NavigationError> {
    session.driver().navigate(url).await?;
    session.sync_url().await?;
    settle(settle_delay).await;
    let page = read_listing(session.driver(), site, 1).await?;
    let state = PaginationState::new().arrived(&page);
    harvest_info!(
        "Entry page loaded: {} rows, total pages {:?}",
        page.row_count(),
        state.total_pages
    );
    Ok(state)
}

/// Read the page after an advance and decide whether it landed.
async fn land(
    session: &mut Session,
    site: &SiteProfile,
    state: &PaginationState,
    target: u32,
) -> Result<AdvanceOutcome, NavigationError> {
    session.sync_url().await?;
    let page = read_listing(session.driver(), site, target).await?;
    Ok(classify_advance(state, &page))
}

/// Page index in a query parameter; every advance is a full navigation.
pub struct UrlParameterPager {
    site: SiteProfile,
    settings: PagerSettings,
}

impl UrlParameterPager {
    pub fn new(site: SiteProfile, settings: PagerSettings) -> Self {
        Self { site, settings }
    }

    /// Listing URL for `page`, replacing any page/page-size parameters already present.
    pub fn page_url(&self, page: u32) -> Result<String, NavigationError> {
        let mut url = Url::parse(&self.site.listing_url)
            .map_err(|e| NavigationError::MissingControl(format!("listing url: {e}")))?;
        let page_param = self.site.page_param.as_str();
        let size_param = self.site.page_size_param.as_deref();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| {
                let key: &str = key;
                key != page_param && Some(key) != size_param
            })
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            if let Some(size_param) = size_param {
                pairs.append_pair(size_param, &self.site.page_size.to_string());
            }
            pairs.append_pair(page_param, &page.to_string());
        }
        Ok(url.to_string())
    }
}

#[async_trait::async_trait]
impl PaginationStrategy for UrlParameterPager {
    fn variant(&self) -> PaginationVariant {
        PaginationVariant::UrlParameter
    }

    async fn prepare(&self, session: &mut Session) -> Result<PaginationState, NavigationError> {
        let url = self.page_url(1)?;
        load_entry(session, &self.site, &url, self.settings.settle_delay).await
    }

    async fn advance(
        &self,
        session: &mut Session,
        state: &PaginationState,
    ) -> Result<AdvanceOutcome, NavigationError> {
        let Some(target) = state.next_target(self.settings.max_pages) else {
            return Ok(AdvanceOutcome::NoMorePages);
        };
        let url = self.page_url(target)?;
        harvest_debug!("Navigating to {}", url);
        session.driver().navigate(&url).await?;
        settle(self.settings.settle_delay).await;
        land(session, &self.site, state, target).await
    }
}

/// Page-number controls are clicked; the content may refresh in place.
pub struct IndexClickPager {
    site: SiteProfile,
    settings: PagerSettings,
}

impl IndexClickPager {
    pub fn new(site: SiteProfile, settings: PagerSettings) -> Self {
        Self { site, settings }
    }
}

#[async_trait::async_trait]
impl PaginationStrategy for IndexClickPager {
    fn variant(&self) -> PaginationVariant {
        PaginationVariant::IndexClick
    }

    async fn prepare(&self, session: &mut Session) -> Result<PaginationState, NavigationError> {
        load_entry(
            session,
            &self.site,
            &self.site.listing_url,
            self.settings.settle_delay,
        )
        .await
    }

    async fn advance(
        &self,
        session: &mut Session,
        state: &PaginationState,
    ) -> Result<AdvanceOutcome, NavigationError> {
        let Some(target) = state.next_target(self.settings.max_pages) else {
            return Ok(AdvanceOutcome::NoMorePages);
        };
        let clicked =
            evaluate_flag(session.driver(), &scripts::click_page_label(&self.site, target)).await?;
        if !clicked {
            // The label window can end before the last page while "next" stays enabled.
            if state.has_next != Some(true) {
                harvest_info!("No control labelled {} on the page", target);
                return Ok(AdvanceOutcome::NoMorePages);
            }
            harvest_debug!("Page {} is outside the visible labels; clicking next", target);
            let moved = evaluate_flag(session.driver(), &scripts::click_next(&self.site)).await?;
            if !moved {
                return Err(NavigationError::MissingControl(format!(
                    "next control for page {target}"
                )));
            }
        }
        await_navigation_or_refresh(session, self.settings.settle_delay).await?;
        settle(self.settings.settle_delay).await;
        land(session, &self.site, state, target).await
    }
}

/// "100 per page" is chosen once, then pages are reached through the jump function.
pub struct PageSizeSubmitPager {
    site: SiteProfile,
    settings: PagerSettings,
}

impl PageSizeSubmitPager {
    pub fn new(site: SiteProfile, settings: PagerSettings) -> Self {
        Self { site, settings }
    }

    async fn choose_page_size(&self, session: &Session) -> Result<(), NavigationError> {
        let driver = session.driver();
        driver
            .wait_for_selector(&self.site.page_size_toggle_selector, self.settings.element_timeout)
            .await?;
        driver.click(&self.site.page_size_toggle_selector).await?;
        let selected = evaluate_flag(driver, &scripts::select_page_size(&self.site)).await?;
        if !selected {
            return Err(NavigationError::MissingControl(format!(
                "page size option '{}'",
                self.site.page_size_option_label
            )));
        }
        harvest_info!("Selected {} rows per page", self.site.page_size_option_label);
        await_navigation_or_refresh(session, self.settings.settle_delay).await?;
        settle(self.settings.settle_delay).await;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PaginationStrategy for PageSizeSubmitPager {
    fn variant(&self) -> PaginationVariant {
        PaginationVariant::PageSizeSubmit
    }

    async fn prepare(&self, session: &mut Session) -> Result<PaginationState, NavigationError> {
        session.driver().navigate(&self.site.listing_url).await?;
        self.choose_page_size(session).await?;
        session.sync_url().await?;
        let page = read_listing(session.driver(), &self.site, 1).await?;
        Ok(PaginationState::new().arrived(&page))
    }

    async fn advance(
        &self,
        session: &mut Session,
        state: &PaginationState,
    ) -> Result<AdvanceOutcome, NavigationError> {
        let Some(target) = state.next_target(self.settings.max_pages) else {
            return Ok(AdvanceOutcome::NoMorePages);
        };
        let jumped = evaluate_flag(session.driver(), &scripts::jump_to_page(&self.site, target))
            .await
            .map_err(|err| match err {
                NavigationError::Driver(DriverError::Script(message)) => {
                    NavigationError::MissingControl(format!(
                        "{}({target}): {message}",
                        self.site.page_jump_function
                    ))
                }
                other => other,
            })?;
        if !jumped {
            return Ok(AdvanceOutcome::NoMorePages);
        }
        await_navigation_or_refresh(session, self.settings.settle_delay).await?;
        settle(self.settings.settle_delay).await;
        land(session, &self.site, state, target).await
    }
}
