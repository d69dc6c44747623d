//! Mode and target resolution.
//!
//! A caller supplies an optional target string plus [`InteractionOptions`].
//! Both are resolved once, at entry, into a closed [`Target`]; nothing
//! downstream re-inspects the raw string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::{Coordinates, InteractionOptions};
use crate::timing::RandomSource;

/// Requested interaction surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    Feed,
    Explore,
    User,
    Hashtag,
    Location,
    CompetitorFollowers,
    Stories,
}

impl InteractionMode {
    /// Infer a mode from the target string's shape.
    pub fn infer(target: Option<&str>) -> Self {
        let raw = target.map(str::trim).unwrap_or_default();
        let lower = raw.to_lowercase();
        match lower.as_str() {
            "" | "feed" | "recent" => Self::Feed,
            "explore" => Self::Explore,
            "stories" => Self::Stories,
            _ if lower.starts_with('#') => Self::Hashtag,
            _ if lower.starts_with("location:") => Self::Location,
            _ => Self::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Explore => "explore",
            Self::User => "user",
            Self::Hashtag => "hashtag",
            Self::Location => "location",
            Self::CompetitorFollowers => "competitor_followers",
            Self::Stories => "stories",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "feed" | "recent" => Ok(Self::Feed),
            "explore" => Ok(Self::Explore),
            "user" => Ok(Self::User),
            "hashtag" => Ok(Self::Hashtag),
            "location" => Ok(Self::Location),
            "competitor_followers" | "competitor" => Ok(Self::CompetitorFollowers),
            "stories" => Ok(Self::Stories),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Where a location campaign points.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationTarget {
    /// Already-resolved `<id>/<slug>/` path.
    Path(String),
    /// Free text to resolve against the place search.
    Query {
        query: String,
        coordinates: Option<Coordinates>,
    },
}

/// Fully resolved interaction target.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Feed,
    Explore,
    User(String),
    Hashtag(String),
    Location(LocationTarget),
    CompetitorFollowers {
        account: String,
        followers: usize,
        posts_per_follower: usize,
    },
    Stories {
        username: Option<String>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("No username supplied for user mode")]
    MissingUsername,

    #[error("No hashtag supplied for hashtag mode")]
    MissingHashtag,

    #[error("No location path or query supplied for location mode")]
    MissingLocation,

    #[error("No competitor account supplied for competitor_followers mode")]
    MissingCompetitor,
}

impl Target {
    /// Resolve the target once at entry.
    pub fn resolve(
        target: Option<&str>,
        options: &InteractionOptions,
        max_posts: usize,
        rng: &dyn RandomSource,
    ) -> Result<Self, ResolveError> {
        let raw = target.map(str::trim).filter(|t| !t.is_empty());
        let mode = options.mode.unwrap_or_else(|| InteractionMode::infer(raw));

        match mode {
            InteractionMode::Feed => Ok(Self::Feed),
            InteractionMode::Explore => Ok(Self::Explore),
            InteractionMode::User => raw
                .map(normalize_username)
                .filter(|u| !u.is_empty())
                .map(Self::User)
                .ok_or(ResolveError::MissingUsername),
            InteractionMode::Hashtag => {
                let tags: Vec<String> = options
                    .hashtags
                    .iter()
                    .map(|t| normalize_hashtag(t))
                    .filter(|t| !t.is_empty())
                    .collect();
                let picked = match rng.index(tags.len()) {
                    Some(i) => Some(tags[i].clone()),
                    None => raw.map(normalize_hashtag).filter(|t| !t.is_empty()),
                };
                picked.map(Self::Hashtag).ok_or(ResolveError::MissingHashtag)
            }
            InteractionMode::Location => resolve_location(raw, options).map(Self::Location),
            InteractionMode::CompetitorFollowers => {
                let account = options
                    .competitor_username
                    .as_deref()
                    .or(raw)
                    .map(normalize_username)
                    .filter(|u| !u.is_empty())
                    .ok_or(ResolveError::MissingCompetitor)?;
                let followers = options
                    .followers_to_engage
                    .filter(|n| *n > 0)
                    .unwrap_or_else(|| max_posts.min(5))
                    .max(1);
                let posts_per_follower = options.posts_per_follower.unwrap_or(1).max(1);
                Ok(Self::CompetitorFollowers {
                    account,
                    followers,
                    posts_per_follower,
                })
            }
            InteractionMode::Stories => Ok(Self::Stories {
                username: raw
                    .filter(|t| !t.eq_ignore_ascii_case("stories"))
                    .map(normalize_username)
                    .filter(|u| !u.is_empty()),
            }),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        match self {
            Self::Feed => InteractionMode::Feed,
            Self::Explore => InteractionMode::Explore,
            Self::User(_) => InteractionMode::User,
            Self::Hashtag(_) => InteractionMode::Hashtag,
            Self::Location(_) => InteractionMode::Location,
            Self::CompetitorFollowers { .. } => InteractionMode::CompetitorFollowers,
            Self::Stories { .. } => InteractionMode::Stories,
        }
    }

    /// Surfaces that open one post at a time and advance with a Next control.
    pub fn is_single_post_view(&self) -> bool {
        matches!(
            self,
            Self::Explore | Self::User(_) | Self::Hashtag(_) | Self::Location(_)
        )
    }

    /// Short human-readable description for logs and reports.
    pub fn label(&self) -> String {
        match self {
            Self::Feed => "feed".to_string(),
            Self::Explore => "explore".to_string(),
            Self::User(u) => format!("@{}", u),
            Self::Hashtag(t) => format!("#{}", t),
            Self::Location(LocationTarget::Path(p)) => format!("location {}", p),
            Self::Location(LocationTarget::Query { query, .. }) => {
                format!("location \"{}\"", query)
            }
            Self::CompetitorFollowers { account, .. } => format!("followers of @{}", account),
            Self::Stories { username: Some(u) } => format!("stories of @{}", u),
            Self::Stories { username: None } => "stories".to_string(),
        }
    }
}

fn resolve_location(
    raw: Option<&str>,
    options: &InteractionOptions,
) -> Result<LocationTarget, ResolveError> {
    if let Some(path) = options
        .location_path
        .as_deref()
        .map(normalize_location_path)
        .filter(|p| !p.is_empty())
    {
        return Ok(LocationTarget::Path(path));
    }

    let query = options
        .location_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    if let Some(query) = query {
        return Ok(LocationTarget::Query {
            query,
            coordinates: options.location_coordinates,
        });
    }

    let rest = raw
        .map(|t| strip_prefix_ignore_case(t, "location:").trim())
        .filter(|t| !t.is_empty())
        .ok_or(ResolveError::MissingLocation)?;

    if rest
        .trim_start_matches('/')
        .starts_with(|c: char| c.is_ascii_digit())
    {
        Ok(LocationTarget::Path(normalize_location_path(rest)))
    } else {
        Ok(LocationTarget::Query {
            query: rest.to_string(),
            coordinates: options.location_coordinates,
        })
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

/// Trim whitespace and a leading `@`.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}

/// Trim whitespace and leading `#`, lowercase.
pub fn normalize_hashtag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').trim().to_lowercase()
}

/// `<id>/<slug>` with a trailing slash and no leading one.
pub fn normalize_location_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    let trimmed = trimmed
        .strip_prefix("explore/locations/")
        .unwrap_or(trimmed)
        .trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
