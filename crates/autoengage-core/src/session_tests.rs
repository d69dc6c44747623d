use super::*;
use autoengage_protocols::Cookie;

use crate::testing::{session_builder, FakePage, MemoryCookieStore};

fn settings(username: &str) -> SessionSettings {
    SessionSettings {
        username: username.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_settings_from_config() {
    let mut config = Config::default();
    config.account.username = " chef.bot ".to_string();
    config.logging.screenshot_dir = "/tmp/autoengage-shots".to_string();

    let settings = SessionSettings::from_config(&config);

    assert_eq!(settings.username, "chef.bot");
    assert_eq!(
        settings.screenshot_dir,
        Some(PathBuf::from("/tmp/autoengage-shots"))
    );
}

#[tokio::test]
async fn test_bootstrap_with_valid_cookies() {
    let page = FakePage::new("about:blank");
    let mut session = session_builder(&page).settings(settings("bot")).build();
    let store = MemoryCookieStore::new(vec![Cookie::new("sessionid", "abc", ".instagram.com")]);

    let method = session.bootstrap(&store, None).await.unwrap();

    assert_eq!(method, LoginMethod::Cookies);
    assert_eq!(page.visited(), vec![site_url("")]);
    assert_eq!(page.cookies().await.unwrap().len(), 1);
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_bootstrap_falls_back_to_credentials() {
    let page = FakePage::new("about:blank");
    page.on_goto("https://www.instagram.com/", |dom| {
        if dom.url == "https://www.instagram.com/" {
            dom.url = "https://www.instagram.com/accounts/login/?next=%2F".to_string();
        }
    });
    page.on_goto("https://www.instagram.com/accounts/login/", |dom| {
        dom.set_text("input[name=\"username\"]", "");
        dom.set_text("input[name=\"password\"]", "");
        dom.set_text("button[type=\"submit\"]", "Log in");
    });
    page.on_click("button[type=\"submit\"]", |dom| {
        dom.url = "https://www.instagram.com/".to_string();
        dom.remove("input[name=\"username\"]");
    });

    let mut session = session_builder(&page).settings(settings("bot")).build();
    let store = MemoryCookieStore::new(vec![Cookie::new("sessionid", "stale", ".instagram.com")]);

    let method = session.bootstrap(&store, Some("hunter2")).await.unwrap();

    assert_eq!(method, LoginMethod::Credentials);
    assert_eq!(page.typed(), "bothunter2");
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_bootstrap_without_password_fails() {
    let page = FakePage::new("about:blank");
    let mut session = session_builder(&page).settings(settings("bot")).build();
    let store = MemoryCookieStore::default();

    let err = session.bootstrap(&store, None).await.unwrap_err();

    assert!(matches!(err, EngineError::Login(_)));
    assert!(page.visited().is_empty());
}

#[tokio::test]
async fn test_bootstrap_login_form_missing() {
    let page = FakePage::new("about:blank");
    let mut session = session_builder(&page).settings(settings("bot")).build();

    let err = session
        .bootstrap(&MemoryCookieStore::default(), Some("pw"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("login form"));
}

#[test]
fn test_contacted_users_case_insensitive() {
    let page = FakePage::new("about:blank");
    let mut session = session_builder(&page).build();
    session.mark_contacted("Chef.Anna");
    assert!(session.has_contacted("chef.anna"));
    assert_eq!(session.contacted_users().len(), 1);
}
