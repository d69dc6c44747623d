use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;

use autoengage_config::EngineConfig;
use autoengage_protocols::{CommentedPostRecord, DedupStore, ElementSnapshot, StoreError};

use super::*;
use crate::options::EngagementThresholds;
use crate::session::SessionSettings;
use crate::testing::{session_builder, FakeBrowser, FakePage, MemoryDedupStore, StaticLanguage};

mock! {
    Store {}

    #[async_trait]
    impl DedupStore for Store {
        fn id(&self) -> &str;
        async fn find(&self, permalink: &str) -> Result<Option<CommentedPostRecord>, StoreError>;
        async fn insert(&self, record: CommentedPostRecord) -> Result<(), StoreError>;
    }
}

const POST: &str = "article:nth-of-type(1)";
const PERMALINK: &str = "https://www.instagram.com/p/abc/";
const CAPTION: &str = "div.x9f619 span._ap3a div span._ap3a";

fn sel(child: &str) -> String {
    format!("{} {}", POST, child)
}

fn candidate() -> Candidate {
    Candidate {
        index: 1,
        selector: POST.to_string(),
        permalink: PERMALINK.to_string(),
        synthesized: false,
    }
}

fn governor(min_likes: Option<u64>) -> ThresholdGovernor {
    ThresholdGovernor::new(
        EngagementThresholds {
            min_likes,
            min_comments: None,
        },
        &EngineConfig::default(),
    )
}

/// A single-view post with metrics, an author link and an English caption.
fn post_page() -> FakePage {
    let page = FakePage::new(PERMALINK);
    page.set_text(POST, "chef.anna\n1,204 likes\nView all 12 comments");
    page.set(
        &sel("header a"),
        vec![ElementSnapshot::new("chef.anna").with_attr("href", "/chef.anna/")],
    );
    page.set_text(&sel(CAPTION), "What a beautiful plate of pasta, I would love to try this place soon");
    page
}

fn settings(username: &str) -> SessionSettings {
    SessionSettings {
        username: username.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_clean_post_passes() {
    let page = post_page();
    let mut session = session_builder(&page).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(Some(1000)))
        .await
        .unwrap();

    assert!(eval.passed());
    assert_eq!(eval.metrics.likes, Some(1204));
    assert_eq!(eval.author.as_deref(), Some("chef.anna"));
    assert_eq!(
        eval.caption.map(|c| c.text).as_deref(),
        Some("What a beautiful plate of pasta, I would love to try this place soon")
    );
    assert!(!eval.is_video);
}

#[tokio::test]
async fn test_threshold_checked_first() {
    let page = post_page();
    page.set_text(POST, "200 likes");
    let mut session = session_builder(&page).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(Some(1000)))
        .await
        .unwrap();

    let reason = eval.skip_reason().unwrap();
    assert!(reason.is_threshold());
    assert_eq!(reason.to_string(), "likes 200 < 1000");
    assert!(eval.caption.is_none());
}

#[tokio::test]
async fn test_session_duplicate() {
    let page = post_page();
    let mut session = session_builder(&page).build();
    session.mark_commented(PERMALINK);

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    assert_eq!(eval.skip_reason(), Some(&SkipReason::DuplicateInSession));
}

#[tokio::test]
async fn test_store_duplicate_joins_session_set() {
    let page = post_page();
    let store = Arc::new(MemoryDedupStore::with_permalinks(&[PERMALINK]));
    let mut session = session_builder(&page).store(store).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    let reason = eval.skip_reason().unwrap();
    assert_eq!(reason.key(), "previously_commented");
    assert!(reason.to_string().starts_with("previously commented "));
    assert!(session.commented_posts().contains(PERMALINK));
}

#[tokio::test]
async fn test_store_lookup_for_unseen_post() {
    let page = post_page();
    let mut store = MockStore::new();
    store
        .expect_find()
        .withf(|permalink| permalink.ends_with("/p/abc/"))
        .times(1)
        .returning(|_| Ok(None));
    let mut session = session_builder(&page).store(Arc::new(store)).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    assert!(eval.passed());
}

#[tokio::test]
async fn test_unavailable_store_degrades() {
    let page = post_page();
    let store = Arc::new(MemoryDedupStore::unavailable());
    let mut session = session_builder(&page).store(store).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    assert!(eval.passed());
}

#[tokio::test]
async fn test_profile_rejection() {
    let page = post_page();
    let browser = FakeBrowser::new();
    let profile = FakePage::new("about:blank");
    profile.set_text(
        "header h1, header h2, header span, header div",
        "Home cook sharing recipes",
    );
    browser.push_page(profile.clone());
    let mut session = session_builder(&page)
        .browser(Arc::new(browser.clone()))
        .build();
    let options = InteractionOptions {
        inspect_profile: true,
        ..Default::default()
    };

    let eval = session
        .evaluate(&candidate(), &options, &governor(None))
        .await
        .unwrap();

    assert_eq!(
        eval.skip_reason().map(|r| r.key()),
        Some("profile_not_approved")
    );
    assert!(eval.profile.is_some_and(|p| !p.approved));
    assert_eq!(profile.visited(), vec!["https://www.instagram.com/chef.anna/"]);
    assert!(profile.is_closed());
}

#[tokio::test]
async fn test_existing_own_comment() {
    let page = post_page();
    let rows = sel("ul li");
    page.set(
        &rows,
        vec![ElementSnapshot::new("someone"), ElementSnapshot::new("tasty_bot")],
    );
    page.set_within(
        &rows,
        1,
        "a[href^=\"/\"]",
        vec![ElementSnapshot::new("tasty_bot").with_attr("href", "/tasty_bot/")],
    );
    let mut session = session_builder(&page).settings(settings("tasty_bot")).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    assert_eq!(eval.skip_reason(), Some(&SkipReason::AlreadyCommented));
}

#[tokio::test]
async fn test_missing_caption() {
    let page = post_page();
    page.with_dom(|dom| dom.remove(&sel(CAPTION)));
    page.set_text(POST, "🍝\n42");
    let mut session = session_builder(&page).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    assert_eq!(eval.skip_reason(), Some(&SkipReason::MissingCaption));
}

#[tokio::test]
async fn test_french_caption_skipped() {
    let page = post_page();
    page.set_text(
        &sel(CAPTION),
        "Bonjour tout le monde, ça va très bien aujourd'hui",
    );
    let mut session = session_builder(&page).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();

    let reason = eval.skip_reason().unwrap();
    assert_eq!(reason, &SkipReason::NonEnglish);
    assert_eq!(reason.to_string(), "non-English caption detected");
}

#[tokio::test]
async fn test_alt_text_used_when_caption_missing() {
    let page = post_page();
    page.with_dom(|dom| dom.remove(&sel(CAPTION)));
    page.set_text(POST, "🍝\n42");
    page.set(
        &sel("img[alt]"),
        vec![ElementSnapshot::new("").with_attr("alt", "Une photo de pâtes")],
    );
    let mut session = session_builder(&page)
        .language_detector(Arc::new(StaticLanguage::other("fra", 0.9)))
        .build();
    let options = InteractionOptions {
        require_caption: false,
        ..Default::default()
    };

    let eval = session
        .evaluate(&candidate(), &options, &governor(None))
        .await
        .unwrap();

    assert_eq!(eval.skip_reason(), Some(&SkipReason::NonEnglish));
}

#[tokio::test]
async fn test_video_skipped_only_when_images_only() {
    let page = post_page();
    page.set_text(&sel("video"), "");
    let mut session = session_builder(&page).build();

    let eval = session
        .evaluate(&candidate(), &InteractionOptions::default(), &governor(None))
        .await
        .unwrap();
    assert_eq!(eval.skip_reason(), Some(&SkipReason::VideoPost));

    let options = InteractionOptions {
        images_only: false,
        ..Default::default()
    };
    let eval = session
        .evaluate(&candidate(), &options, &governor(None))
        .await
        .unwrap();
    assert!(eval.passed());
    assert!(eval.is_video);
}

#[test]
fn test_skip_reason_display() {
    assert_eq!(
        SkipReason::CommentsBelow { actual: None, min: 3 }.to_string(),
        "comments unknown < 3"
    );
    assert_eq!(
        SkipReason::ProfileNotApproved {
            category: Some(ProfileCategory::Foodie)
        }
        .to_string(),
        "profile not approved (foodie)"
    );
    assert_eq!(SkipReason::DuplicateInSession.to_string(), "duplicate in this session");
}
