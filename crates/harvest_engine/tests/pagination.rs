mod common;

use common::{fixture_config, init_logging, row, FakeDriver, PortalScript};
use harvest_core::{AdvanceOutcome, PaginationState};
use harvest_engine::{
    strategy_for, PagerSettings, PaginationVariant, Session, SiteProfile, UrlParameterPager,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn two_pages() -> PortalScript {
    PortalScript {
        pages: vec![
            vec![row("Sonata", "1,250"), row("Avante", "980")],
            vec![row("K5", "1,730")],
        ],
        ..PortalScript::default()
    }
}

/// A session already past the login form.
async fn logged_in_session(
    variant: PaginationVariant,
    script: PortalScript,
) -> (Session, Box<dyn harvest_engine::PaginationStrategy>, TempDir) {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mut config = fixture_config(temp.path(), 2);
    config.pagination.variant = variant;
    let (driver, portal) = FakeDriver::new(config.site.clone(), script);
    portal.lock().unwrap().logged_in = true;
    (Session::new(Box::new(driver)), strategy_for(&config), temp)
}

#[tokio::test]
async fn last_page_reports_no_more_pages() {
    for variant in [
        PaginationVariant::UrlParameter,
        PaginationVariant::IndexClick,
        PaginationVariant::PageSizeSubmit,
    ] {
        let (mut session, pager, _temp) = logged_in_session(variant, two_pages()).await;
        let first = pager.prepare(&mut session).await.unwrap();
        assert_eq!(first.current_page, 1);
        assert_eq!(first.total_pages, Some(2));

        let second = match pager.advance(&mut session, &first).await.unwrap() {
            AdvanceOutcome::Advanced(state) => state,
            other => panic!("{variant:?}: expected page 2, got {other:?}"),
        };
        assert_eq!(second.current_page, 2);
        assert_eq!(second.has_next, Some(false));
        assert_eq!(
            pager.advance(&mut session, &second).await.unwrap(),
            AdvanceOutcome::NoMorePages
        );
    }
}

#[tokio::test]
async fn unchanged_rows_after_advance_are_a_stall() {
    let script = PortalScript {
        stall_from: Some(2),
        ..two_pages()
    };
    let (mut session, pager, _temp) =
        logged_in_session(PaginationVariant::IndexClick, script).await;
    let first = pager.prepare(&mut session).await.unwrap();

    let outcome = pager.advance(&mut session, &first).await.unwrap();

    assert_eq!(outcome, AdvanceOutcome::StallDetected);
}

#[tokio::test]
async fn exhausted_state_never_advances() {
    let (mut session, pager, _temp) =
        logged_in_session(PaginationVariant::UrlParameter, two_pages()).await;
    let first = pager.prepare(&mut session).await.unwrap();

    let outcome = pager
        .advance(&mut session, &first.clone().into_exhausted())
        .await
        .unwrap();

    assert_eq!(outcome, AdvanceOutcome::NoMorePages);
    assert_eq!(PaginationState::new().next_target(10), Some(1));
}

fn pager_for(listing_url: &str) -> UrlParameterPager {
    let site = SiteProfile {
        listing_url: listing_url.to_string(),
        ..SiteProfile::default()
    };
    let settings = PagerSettings {
        max_pages: 10,
        settle_delay: std::time::Duration::ZERO,
        element_timeout: std::time::Duration::from_secs(1),
    };
    UrlParameterPager::new(site, settings)
}

#[test]
fn page_url_appends_page_size_and_index() {
    let pager = pager_for("https://portal.test/Car/DataSale");
    assert_eq!(
        pager.page_url(3).unwrap(),
        "https://portal.test/Car/DataSale?pageSize=100&page=3"
    );
}

#[test]
fn page_url_replaces_existing_paging_parameters() {
    let pager = pager_for("https://portal.test/Car/DataSale?sort=date&page=7&pageSize=20");
    assert_eq!(
        pager.page_url(2).unwrap(),
        "https://portal.test/Car/DataSale?sort=date&pageSize=100&page=2"
    );
}

#[tokio::test]
async fn next_control_reaches_pages_beyond_the_labels() {
    let script = PortalScript {
        label_window: Some(1),
        ..two_pages()
    };
    let (mut session, pager, _temp) =
        logged_in_session(PaginationVariant::IndexClick, script).await;
    let first = pager.prepare(&mut session).await.unwrap();
    assert_eq!(first.total_pages, Some(1));
    assert_eq!(first.has_next, Some(true));

    match pager.advance(&mut session, &first).await.unwrap() {
        AdvanceOutcome::Advanced(state) => assert_eq!(state.current_page, 2),
        other => panic!("expected page 2, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_label_without_next_affordance_ends_the_walk() {
    let script = PortalScript {
        label_window: Some(1),
        ..two_pages()
    };
    let (mut session, pager, _temp) =
        logged_in_session(PaginationVariant::IndexClick, script).await;
    let first = pager.prepare(&mut session).await.unwrap();
    let unknown_next = PaginationState {
        has_next: None,
        total_pages: None,
        ..first
    };

    assert_eq!(
        pager.advance(&mut session, &unknown_next).await.unwrap(),
        AdvanceOutcome::NoMorePages
    );
}
