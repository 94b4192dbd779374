mod common;

use common::{fixture_config, init_logging, FakeDriver, PortalScript, PASSWORD};
use harvest_engine::{AuthError, AuthState, Diagnostics, Session, SessionController};
use tempfile::TempDir;

#[tokio::test]
async fn valid_credentials_authenticate_the_session() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let config = fixture_config(temp.path(), 2);
    let (driver, portal) = FakeDriver::new(config.site.clone(), PortalScript::default());
    let mut session = Session::new(Box::new(driver));
    let diagnostics = Diagnostics::disabled();

    SessionController::new(&config.site, &config.timeouts, &diagnostics)
        .login(&mut session, &config.login)
        .await
        .unwrap();

    assert_eq!(session.auth_state(), AuthState::Authenticated);
    assert!(!session.current_url().contains("Login"));
    let portal = portal.lock().unwrap();
    assert_eq!(
        portal.typed.get(&config.site.password_selector).map(String::as_str),
        Some(PASSWORD)
    );
}

#[tokio::test]
async fn staying_on_the_login_page_means_invalid_credentials() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let mut config = fixture_config(temp.path(), 2);
    config.login.username = "intruder".to_string();
    let (driver, _portal) = FakeDriver::new(config.site.clone(), PortalScript::default());
    let mut session = Session::new(Box::new(driver));
    let diagnostics = Diagnostics::disabled();

    let err = SessionController::new(&config.site, &config.timeouts, &diagnostics)
        .login(&mut session, &config.login)
        .await
        .unwrap_err();

    match err {
        AuthError::InvalidCredentials { url } => assert!(url.contains("Login")),
        other => panic!("expected invalid credentials, got {other:?}"),
    }
    assert_eq!(session.auth_state(), AuthState::Failed);
}

#[tokio::test]
async fn submit_timeout_captures_diagnostics() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let config = fixture_config(temp.path(), 2);
    let script = PortalScript {
        hang_on_submit: true,
        ..PortalScript::default()
    };
    let (driver, portal) = FakeDriver::new(config.site.clone(), script);
    let mut session = Session::new(Box::new(driver));
    let diagnostics = Diagnostics::new(temp.path().join("diag"));

    let err = SessionController::new(&config.site, &config.timeouts, &diagnostics)
        .login(&mut session, &config.login)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Submit(ref e) if e.is_timeout()));
    assert!(temp.path().join("diag/login-submit.html").exists());
    assert!(temp.path().join("diag/login-submit.png").exists());
    assert_eq!(portal.lock().unwrap().screenshots.len(), 1);

    session.close().await.unwrap();
    assert!(portal.lock().unwrap().closed);
}
