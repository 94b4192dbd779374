//! Drives a real Chromium against a local fixture portal.
//!
//! Ignored by default; run with `--ignored` on a machine with Chrome installed.

use std::time::Duration;

use harvest_engine::{read_export, ChromiumDriver, HarvestConfig, Harvester};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
<form action="/home" method="get">
  <input id="UserId" name="UserId"><input id="Password" name="Password" type="password">
  <button class="btn-login" type="submit">Login</button>
</form></body></html>"#;

fn listing_page(page: u32, total: u32, vehicles: &[&str]) -> String {
    let rows: String = vehicles
        .iter()
        .map(|v| {
            format!(
                "<tr><td>2024-05-01</td><td>2일</td><td>{v}</td><td>Auto</td><td>[2020] 2020.3</td>\
                 <td>Diesel</td><td>12,000 km</td><td>Black</td><td>2,100</td><td>-</td>\
                 <td>Dealer</td><td>Busan</td></tr>"
            )
        })
        .collect();
    let items: String = (1..=total)
        .map(|n| format!("<li><a href=\"?pageSize=100&page={n}\">{n}</a></li>"))
        .collect();
    let next_class = if page < total { "next" } else { "next disabled" };
    format!(
        "<html><body><table class=\"table\"><tbody>{rows}</tbody></table>\
         <ul class=\"pagination\">{items}<li class=\"{next_class}\"><a class=\"next\">»</a></li></ul>\
         </body></html>"
    )
}

async fn mount_html(server: &MockServer, route: &str, page: Option<u32>, body: String) {
    let mut mock = Mock::given(method("GET")).and(path(route));
    if let Some(page) = page {
        mock = mock.and(query_param("page", page.to_string()));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

#[tokio::test]
#[ignore = "requires a local Chrome/Chromium installation"]
async fn harvests_fixture_portal_with_chromium() {
    harvest_logging::initialize_for_tests();
    let server = MockServer::start().await;
    mount_html(&server, "/User/Login", None, LOGIN_PAGE.to_string()).await;
    mount_html(&server, "/home", None, "<html><body>welcome</body></html>".to_string()).await;
    mount_html(&server, "/Car/DataSale", Some(1), listing_page(1, 2, &["Tucson", "Santa Fe"])).await;
    mount_html(&server, "/Car/DataSale", Some(2), listing_page(2, 2, &["Palisade"])).await;

    let temp = TempDir::new().unwrap();
    let text = serde_json::json!({
        "login": { "username": "fixture", "password": "fixture" },
        "site": {
            "login_url": format!("{}/User/Login", server.uri()),
            "listing_url": format!("{}/Car/DataSale", server.uri()),
        },
        "pagination": { "settle_delay_ms": 200 },
        "export": { "path": temp.path().join("listings.csv") },
        "diagnostics": { "dir": temp.path().join("diagnostics") }
    })
    .to_string();
    let config = HarvestConfig::from_json_str(&text).unwrap();

    let driver = ChromiumDriver::launch(&config.browser, Duration::from_secs(30))
        .await
        .expect("chromium launches");
    let summary = Harvester::new(config).run(Box::new(driver)).await.unwrap();

    assert_eq!(summary.row_count, 3);
    let (_, rows) = read_export(&summary.output_path, b',').unwrap();
    assert_eq!(rows[2][2], "Palisade");
    assert_eq!(rows[0][1], "2");
    assert_eq!(rows[0][5], "2020.03");
}
