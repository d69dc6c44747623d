use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde_json::json;

use autoengage_protocols::{ElementSnapshot, NeverCancel};

use super::*;
use crate::options::EngagementThresholds;
use crate::testing::{session_builder, FakePage, MemoryDedupStore, PageAction, StaticLanguage};

const HOME: &str = "https://www.instagram.com/";
const CAPTION: &str = "div.x9f619 span._ap3a div span._ap3a";
const ENGLISH: &str = "What a beautiful plate of pasta, I would love to try this place soon";
const POST_LINKS: &str = "a[href*=\"/p/\"], a[href*=\"/reel/\"]";

fn post_url(slug: &str) -> String {
    format!("https://www.instagram.com/p/{}/", slug)
}

/// A commentable post at `selector` showing `likes`.
fn add_post(page: &FakePage, selector: &str, likes: u64) {
    page.set_text(selector, &format!("chef.anna\n{} likes", likes));
    page.set_text(&format!("{} {}", selector, CAPTION), ENGLISH);
    page.set_text(&format!("{} textarea", selector), "");
    page.set(
        &format!("{} div[role=\"button\"]", selector),
        vec![ElementSnapshot::new("Post")],
    );
}

/// Home feed with one post per slug, each linking to its permalink.
fn feed(posts: &[(&str, u64)]) -> FakePage {
    let page = FakePage::new(HOME);
    for (n, (slug, likes)) in posts.iter().enumerate() {
        let selector = format!("article:nth-of-type({})", n + 1);
        add_post(&page, &selector, *likes);
        page.set(
            &format!("{} a[href*=\"/p/\"]", selector),
            vec![ElementSnapshot::new("").with_attr("href", format!("/p/{}/", slug))],
        );
    }
    page
}

fn session(page: &FakePage, store: Arc<MemoryDedupStore>) -> Session {
    session_builder(page)
        .store(store)
        .language_detector(Arc::new(StaticLanguage::english()))
        .build()
}

fn scrolls(page: &FakePage) -> usize {
    page.actions()
        .iter()
        .filter(|a| matches!(a, PageAction::Scroll(dy) if *dy == 800.0))
        .count()
}

#[test]
fn test_canonical_permalink() {
    assert_eq!(
        canonical_permalink("/p/abc/?img_index=1").as_deref(),
        Some("https://www.instagram.com/p/abc/")
    );
    assert_eq!(
        canonical_permalink("https://www.instagram.com/reel/xyz/#c").as_deref(),
        Some("https://www.instagram.com/reel/xyz/")
    );
    assert_eq!(canonical_permalink("/explore/"), None);
    assert_eq!(canonical_permalink(HOME), None);
}

#[tokio::test]
async fn test_previously_commented_post_skipped_and_loop_continues() {
    let page = feed(&[("one", 120), ("two", 80), ("three", 95)]);
    let store = Arc::new(MemoryDedupStore::with_permalinks(&[&post_url("one")]));
    let mut session = session(&page, store.clone());

    let report = session
        .interact_with_posts(None, Some(3), &InteractionOptions::default(), &NeverCancel)
        .await;

    assert_eq!(report.mode, InteractionMode::Feed);
    assert_eq!(report.attempted, 3);
    assert_eq!(report.skipped.get("previously_commented"), Some(&1));
    assert_eq!(report.skipped_total(), 1);
    assert_eq!(report.interacted, 2);
    assert_eq!(report.commented, 2);
    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(page.typed(), "Great post!Great post!");
    assert!(store.permalinks().contains(&post_url("two")));
    assert!(store.permalinks().contains(&post_url("three")));
    assert_eq!(scrolls(&page), 2);
}

#[tokio::test]
async fn test_threshold_relaxes_after_three_skips() {
    let page = feed(&[("a", 400), ("b", 500), ("c", 600), ("d", 850)]);
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));
    let options = InteractionOptions {
        engagement: EngagementThresholds {
            min_likes: Some(1000),
            min_comments: None,
        },
        ..Default::default()
    };

    let report = session
        .interact_with_posts(None, Some(4), &options, &NeverCancel)
        .await;

    assert_eq!(report.attempted, 4);
    assert_eq!(report.skipped.get("likes_below"), Some(&3));
    assert_eq!(report.relaxations, 1);
    assert_eq!(report.interacted, 1);
    assert_eq!(report.commented, 1);
    assert!(session.commented_posts().contains(&post_url("d")));
}

#[tokio::test]
async fn test_attempts_never_exceed_bound() {
    for bound in 0..=4 {
        let page = feed(&[("a", 10), ("b", 20), ("c", 30)]);
        let mut session = session(&page, Arc::new(MemoryDedupStore::new()));

        let report = session
            .interact_with_posts(Some("feed"), Some(bound), &InteractionOptions::default(), &NeverCancel)
            .await;

        assert_eq!(report.attempted, bound.min(3), "bound {}", bound);
        let expected = if bound > 3 {
            StopReason::Exhausted
        } else {
            StopReason::Completed
        };
        assert_eq!(report.stop, expected, "bound {}", bound);
    }
}

#[tokio::test]
async fn test_cancelled_before_first_candidate() {
    let page = feed(&[("a", 10)]);
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));
    let cancel = AtomicBool::new(true);

    let report = session
        .interact_with_posts(None, Some(5), &InteractionOptions::default(), &cancel)
        .await;

    assert_eq!(report.attempted, 0);
    assert_eq!(report.stop, StopReason::Cancelled);
    assert!(page.typed().is_empty());
}

#[tokio::test]
async fn test_synthesized_identifier_not_persisted() {
    let page = FakePage::new(HOME);
    add_post(&page, "article:nth-of-type(1)", 10);
    let store = Arc::new(MemoryDedupStore::new());
    let mut session = session(&page, store.clone());

    let report = session
        .interact_with_posts(None, Some(1), &InteractionOptions::default(), &NeverCancel)
        .await;

    assert_eq!(report.commented, 1);
    assert!(store.permalinks().is_empty());
    let id = session.commented_posts().iter().next().cloned().unwrap_or_default();
    assert!(id.starts_with("https://www.instagram.com/?postIndex=1&ts="), "{}", id);
}

/// A profile whose first post opens into a single-post view.
fn profile_page() -> FakePage {
    let page = FakePage::new(HOME);
    page.set_text(POST_LINKS, "");
    page.set_text("a[href*=\"/p/\"]", "");
    page.on_click("a[href*=\"/p/\"]", |dom| dom.url = post_url("first"));
    add_post(&page, "article:nth-of-type(1)", 50);
    page
}

#[tokio::test]
async fn test_single_view_advances_with_next() {
    let page = profile_page();
    page.set_text("button[aria-label=\"Next\"]", "");
    page.on_click("button[aria-label=\"Next\"]", |dom| dom.url = post_url("second"));
    let store = Arc::new(MemoryDedupStore::new());
    let mut session = session(&page, store.clone());

    let report = session
        .interact_with_posts(Some("@chef.anna"), Some(2), &InteractionOptions::default(), &NeverCancel)
        .await;

    assert_eq!(report.mode, InteractionMode::User);
    assert_eq!(report.target, "@chef.anna");
    assert_eq!(report.attempted, 2);
    assert_eq!(report.commented, 2);
    assert_eq!(page.clicks_on("button[aria-label=\"Next\"]"), 1);
    assert!(store.permalinks().contains(&post_url("first")));
    assert!(store.permalinks().contains(&post_url("second")));
}

#[tokio::test]
async fn test_single_view_without_next_stops() {
    let page = profile_page();
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));

    let report = session
        .interact_with_posts(Some("chef.anna"), Some(3), &InteractionOptions::default(), &NeverCancel)
        .await;

    assert_eq!(report.attempted, 1);
    assert_eq!(report.stop, StopReason::NoNextControl);
}

#[tokio::test]
async fn test_unresolvable_target() {
    let page = FakePage::new(HOME);
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));
    let options = InteractionOptions {
        mode: Some(InteractionMode::User),
        ..Default::default()
    };

    let report = session
        .interact_with_posts(None, None, &options, &NeverCancel)
        .await;

    assert_eq!(report.mode, InteractionMode::User);
    assert_eq!(
        report.stop,
        StopReason::Unavailable("No username supplied for user mode".to_string())
    );
    assert!(page.actions().is_empty());
}

#[tokio::test]
async fn test_stories_mode_reports_walk() {
    let page = FakePage::new(HOME);
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));

    let report = session
        .interact_with_posts(Some("stories"), None, &InteractionOptions::default(), &NeverCancel)
        .await;

    assert_eq!(report.mode, InteractionMode::Stories);
    assert_eq!(
        report.stop,
        StopReason::Unavailable("no stories available".to_string())
    );
    assert_eq!(report.stories.map(|s| s.available), Some(false));
}

fn story_viewer() -> FakePage {
    let page = FakePage::new(HOME);
    page.set_text("section div[role=\"dialog\"], div[role=\"dialog\"] section", "");
    page.set_text("button[aria-label=\"Next\"]", "");
    page
}

#[tokio::test]
async fn test_stories_mode_respects_max_posts() {
    let page = story_viewer();
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));

    let report = session
        .interact_with_posts(Some("stories"), Some(3), &InteractionOptions::default(), &NeverCancel)
        .await;

    let stories = report.stories.unwrap();
    assert!(stories.available);
    assert_eq!(stories.viewed, 3);
    assert_eq!(page.clicks_on("button[aria-label=\"Next\"]"), 2);
}

#[tokio::test]
async fn test_stories_count_below_bound_kept() {
    let page = story_viewer();
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));
    let mut options = InteractionOptions::default();
    options.stories.count = Some(2);

    let report = session
        .interact_with_posts(Some("stories"), Some(5), &options, &NeverCancel)
        .await;

    assert_eq!(report.stories.map(|s| s.viewed), Some(2));
}

#[test]
fn test_bounded_story_options() {
    let unset = StoryOptions::default();
    assert_eq!(bounded_story_options(&unset, 4).count, Some(4));

    let large = StoryOptions {
        count: Some(10),
        like_probability: Some(0.5),
        ..Default::default()
    };
    let bounded = bounded_story_options(&large, 3);
    assert_eq!(bounded.count, Some(3));
    assert_eq!(bounded.like_probability, Some(0.5));
}

#[tokio::test]
async fn test_competitor_followers_visits_each_follower() {
    let page = FakePage::new(HOME);
    page.set(
        "div[role=\"dialog\"]",
        vec![ElementSnapshot::new("").with_attr("scrollHeight", "900")],
    );
    page.set(
        "div[role=\"dialog\"] a[href^=\"/\"]",
        vec![
            ElementSnapshot::new("a").with_attr("href", "/ann/"),
            ElementSnapshot::new("b").with_attr("href", "/bob/"),
        ],
    );
    let mut session = session(&page, Arc::new(MemoryDedupStore::new()));
    let options = InteractionOptions {
        mode: Some(InteractionMode::CompetitorFollowers),
        followers_to_engage: Some(2),
        ..Default::default()
    };

    let report = session
        .interact_with_posts(Some("rival"), Some(5), &options, &NeverCancel)
        .await;

    assert_eq!(report.target, "followers of @rival");
    assert_eq!(report.attempted, 0);
    assert_eq!(report.stop, StopReason::Completed);
    assert_eq!(
        page.visited(),
        vec![
            "https://www.instagram.com/rival/followers/".to_string(),
            "https://www.instagram.com/ann/".to_string(),
            "https://www.instagram.com/bob/".to_string(),
        ]
    );
}

#[test]
fn test_report_serialization() {
    let mut report = CampaignReport::new(InteractionMode::Hashtag, "#pasta");
    report.attempted = 2;
    report.skipped.insert("video_post".to_string(), 1);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["mode"], json!("hashtag"));
    assert_eq!(value["stop"], json!({ "reason": "completed" }));
    assert_eq!(value["skipped"]["video_post"], json!(1));
    assert!(value.get("stories").is_none());

    report.stop = StopReason::Unavailable("no posts found".to_string());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value["stop"],
        json!({ "reason": "unavailable", "detail": "no posts found" })
    );
}
