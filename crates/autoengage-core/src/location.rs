//! Place lookup for location campaigns.
//!
//! First the site's JSON place search (from the page context, so it carries
//! the session cookies); if that yields nothing, the on-screen search UI.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use autoengage_protocols::PageError;

use crate::locator::Locator;
use crate::options::Coordinates;
use crate::session::{Session, NAV_TIMEOUT};
use crate::site_url;

const APP_ID: &str = "936619743392459";
const SEARCH_INPUT: &str = "input[aria-label=\"Search input\"]";
const LOCATION_LINK: &str = "a[href*=\"/explore/locations/\"]";

/// Lowercase, non-alphanumeric runs collapsed to `-`.
pub fn slugify(raw: &str) -> String {
    let mut out = String::new();
    for c in raw.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let slug = out.trim_matches('-');
    if slug.is_empty() {
        "location".to_string()
    } else {
        slug.to_string()
    }
}

/// Pick a place from a place-search response and build its `<pk>/<slug>/` path.
///
/// Prefers the first place whose name contains every query word.
pub fn pick_place(response: &Value, query: &str) -> Option<String> {
    let places: Vec<&Value> = response
        .get("places")?
        .as_array()?
        .iter()
        .filter_map(|p| p.get("place"))
        .collect();

    let words: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let name_of = |place: &Value| -> Option<String> {
        place
            .pointer("/location/name")
            .or_else(|| place.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let chosen = places
        .iter()
        .find(|place| {
            name_of(place).is_some_and(|name| {
                let name = name.to_lowercase();
                words.iter().all(|w| name.contains(w.as_str()))
            })
        })
        .or_else(|| places.first())?;

    let pk = match chosen.pointer("/location/pk")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };

    let slug_source = chosen
        .get("slug")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| name_of(chosen))
        .unwrap_or_else(|| query.to_string());

    Some(format!("{}/{}/", pk, slugify(&slug_source)))
}

/// `<pk>/<slug>/` from a location link href.
fn path_from_href(href: &str) -> Option<String> {
    let path = match url::Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };
    let rest = path.split("/explore/locations/").nth(1)?.trim_matches('/');
    (!rest.is_empty()).then(|| format!("{}/", rest))
}

impl Session {
    /// Resolve a free-text place into a location path.
    pub async fn resolve_location(
        &self,
        query: &str,
        coordinates: Option<Coordinates>,
    ) -> Option<String> {
        if let Some(path) = self.location_from_api(query, coordinates).await {
            info!(query, path = %path, "Location resolved via search API");
            return Some(path);
        }

        let original = self.page.current_url().await.ok();
        let found = match self.location_from_search_ui(query).await {
            Ok(found) => found,
            Err(e) => {
                warn!(query, error = %e, "Location search UI failed");
                None
            }
        };
        if let Some(url) = original {
            if let Err(e) = self.page.goto(&url, NAV_TIMEOUT).await {
                debug!(error = %e, "Cannot restore page after location search");
            }
        }

        match &found {
            Some(path) => info!(query, path = %path, "Location resolved via search UI"),
            None => warn!(query, "Location not found"),
        }
        found
    }

    async fn location_from_api(
        &self,
        query: &str,
        coordinates: Option<Coordinates>,
    ) -> Option<String> {
        let rank_token = format!("{:.16}", self.pacer.rng().next_f64());
        let mut params = vec![
            ("context", "location".to_string()),
            ("query", query.to_string()),
            ("rank_token", rank_token),
        ];
        if let Some(c) = coordinates {
            params.push(("lat", c.latitude.to_string()));
            params.push(("lng", c.longitude.to_string()));
        }

        let url = match url::Url::parse_with_params(&site_url("web/search/topsearch/"), &params) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build location search URL");
                return None;
            }
        };

        match self
            .page
            .fetch_json(url.as_str(), &[("x-ig-app-id", APP_ID)])
            .await
        {
            Ok(Some(body)) => pick_place(&body, query),
            Ok(None) => {
                debug!(query, "Location search API returned an error status");
                None
            }
            Err(e) => {
                debug!(query, error = %e, "Location search API failed");
                None
            }
        }
    }

    async fn location_from_search_ui(&self, query: &str) -> Result<Option<String>, PageError> {
        let page = self.page.as_ref();
        page.goto(&site_url(""), NAV_TIMEOUT).await?;
        self.pacer.wait(2000).await;

        let opened = Locator::new("search button")
            .css("svg[aria-label=\"Search\"]")
            .css("a[href=\"/explore/search/\"]")
            .click(page)
            .await?;
        if !opened {
            return Ok(None);
        }

        if !page.wait_for(SEARCH_INPUT, Duration::from_secs(5)).await? {
            return Ok(None);
        }
        page.click(SEARCH_INPUT).await?;
        self.pacer.type_steady(page, query, 80).await?;
        self.pacer.wait(1500).await;

        if !page.wait_for(LOCATION_LINK, Duration::from_secs(7)).await? {
            return Ok(None);
        }
        Ok(page
            .query(LOCATION_LINK)
            .await?
            .and_then(|el| el.attr("href").and_then(path_from_href)))
    }
}

#[cfg(test)]
#[path = "location_tests.rs"]
mod tests;
