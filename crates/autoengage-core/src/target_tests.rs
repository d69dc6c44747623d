use super::*;
use crate::testing::ScriptedRandom;

fn resolve(target: Option<&str>, options: &InteractionOptions) -> Result<Target, ResolveError> {
    Target::resolve(target, options, 15, &ScriptedRandom::constant(0.0))
}

#[test]
fn test_infer_mode() {
    assert_eq!(InteractionMode::infer(None), InteractionMode::Feed);
    assert_eq!(InteractionMode::infer(Some("  ")), InteractionMode::Feed);
    assert_eq!(InteractionMode::infer(Some("recent")), InteractionMode::Feed);
    assert_eq!(InteractionMode::infer(Some("Explore")), InteractionMode::Explore);
    assert_eq!(InteractionMode::infer(Some("stories")), InteractionMode::Stories);
    assert_eq!(InteractionMode::infer(Some("#food")), InteractionMode::Hashtag);
    assert_eq!(
        InteractionMode::infer(Some("location:Rome")),
        InteractionMode::Location
    );
    assert_eq!(InteractionMode::infer(Some("@chef")), InteractionMode::User);
}

#[test]
fn test_mode_from_str() {
    assert_eq!(
        "competitor-followers".parse::<InteractionMode>(),
        Ok(InteractionMode::CompetitorFollowers)
    );
    assert!("bogus".parse::<InteractionMode>().is_err());
}

#[test]
fn test_resolve_user_strips_at() {
    let target = resolve(Some(" @chef.anna "), &InteractionOptions::default()).unwrap();
    assert_eq!(target, Target::User("chef.anna".to_string()));
    assert!(target.is_single_post_view());
    assert_eq!(target.label(), "@chef.anna");
}

#[test]
fn test_explicit_user_mode_without_target() {
    let options = InteractionOptions {
        mode: Some(InteractionMode::User),
        ..Default::default()
    };
    assert_eq!(resolve(None, &options), Err(ResolveError::MissingUsername));
}

#[test]
fn test_resolve_hashtag_from_target() {
    let target = resolve(Some("#FoodPorn"), &InteractionOptions::default()).unwrap();
    assert_eq!(target, Target::Hashtag("foodporn".to_string()));
}

#[test]
fn test_resolve_hashtag_picks_from_list() {
    let options = InteractionOptions {
        mode: Some(InteractionMode::Hashtag),
        hashtags: vec!["#Pizza".to_string(), "".to_string(), "pasta".to_string()],
        ..Default::default()
    };
    let last = Target::resolve(None, &options, 15, &ScriptedRandom::constant(0.99)).unwrap();
    assert_eq!(last, Target::Hashtag("pasta".to_string()));
    let first = resolve(None, &options).unwrap();
    assert_eq!(first, Target::Hashtag("pizza".to_string()));
}

#[test]
fn test_resolve_hashtag_missing() {
    let options = InteractionOptions {
        mode: Some(InteractionMode::Hashtag),
        ..Default::default()
    };
    assert_eq!(resolve(None, &options), Err(ResolveError::MissingHashtag));
}

#[test]
fn test_resolve_location_variants() {
    let path = resolve(Some("location:/212988663/new-york/"), &InteractionOptions::default());
    assert_eq!(
        path.unwrap(),
        Target::Location(LocationTarget::Path("212988663/new-york/".to_string()))
    );

    let query = resolve(Some("Location: Rome Italy"), &InteractionOptions::default());
    assert_eq!(
        query.unwrap(),
        Target::Location(LocationTarget::Query {
            query: "Rome Italy".to_string(),
            coordinates: None
        })
    );

    let options = InteractionOptions {
        mode: Some(InteractionMode::Location),
        location_path: Some("/explore/locations/123/cafe/".to_string()),
        ..Default::default()
    };
    assert_eq!(
        resolve(None, &options).unwrap(),
        Target::Location(LocationTarget::Path("123/cafe/".to_string()))
    );

    let options = InteractionOptions {
        mode: Some(InteractionMode::Location),
        ..Default::default()
    };
    assert_eq!(resolve(None, &options), Err(ResolveError::MissingLocation));
}

#[test]
fn test_resolve_competitor_defaults() {
    let options = InteractionOptions {
        mode: Some(InteractionMode::CompetitorFollowers),
        competitor_username: Some("@rival".to_string()),
        ..Default::default()
    };
    let target = Target::resolve(None, &options, 3, &ScriptedRandom::constant(0.0)).unwrap();
    assert_eq!(
        target,
        Target::CompetitorFollowers {
            account: "rival".to_string(),
            followers: 3,
            posts_per_follower: 1
        }
    );

    let options = InteractionOptions {
        mode: Some(InteractionMode::CompetitorFollowers),
        followers_to_engage: Some(0),
        posts_per_follower: Some(0),
        ..Default::default()
    };
    let target = Target::resolve(Some("rival"), &options, 40, &ScriptedRandom::constant(0.0));
    assert_eq!(
        target.unwrap(),
        Target::CompetitorFollowers {
            account: "rival".to_string(),
            followers: 5,
            posts_per_follower: 1
        }
    );
}

#[test]
fn test_resolve_stories() {
    assert_eq!(
        resolve(Some("stories"), &InteractionOptions::default()).unwrap(),
        Target::Stories { username: None }
    );
    let options = InteractionOptions {
        mode: Some(InteractionMode::Stories),
        ..Default::default()
    };
    assert_eq!(
        resolve(Some("@someone"), &options).unwrap(),
        Target::Stories {
            username: Some("someone".to_string())
        }
    );
}

#[test]
fn test_feed_and_explore_are_not_single_view_equivalent() {
    assert!(!Target::Feed.is_single_post_view());
    assert!(Target::Explore.is_single_post_view());
}

#[test]
fn test_normalize_location_path() {
    assert_eq!(normalize_location_path("//1/a//"), "1/a/");
    assert_eq!(normalize_location_path("  "), "");
}
