//! Caption extraction.
//!
//! Primary selector first, then an ordered list of broader selectors, then
//! the first plausible line of the post's raw text.

use tracing::debug;

use autoengage_protocols::PageError;

use crate::session::Session;

const PRIMARY: &str = "div.x9f619 span._ap3a div span._ap3a";
const MORE_LINK: &str = "div.x9f619 span._ap3a span div span.x1lliihq";

const FALLBACKS: &[&str] = &[
    "ul li div[dir=\"auto\"] span[dir=\"auto\"]",
    "div[role=\"presentation\"] span[dir=\"auto\"]",
    "header + div span[dir=\"auto\"]",
    "span[dir=\"auto\"]",
];

/// Where a caption came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionSource {
    Primary,
    Fallback,
    RawText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub source: CaptionSource,
}

fn plausible(text: &str) -> bool {
    text.chars().count() >= 4 && text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Qualifying texts, deduplicated case-insensitively, in order.
fn qualifying<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    texts
        .map(str::trim)
        .filter(|t| plausible(t))
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(str::to_string)
        .collect()
}

impl Session {
    /// Extract the caption of the post at `post`.
    pub async fn extract_caption(&self, post: &str) -> Result<Option<Caption>, PageError> {
        let page = self.page.as_ref();

        if let Some(el) = page.query(&format!("{} {}", post, PRIMARY)).await? {
            let text = el.text.trim();
            if !text.is_empty() {
                return Ok(Some(Caption {
                    text: text.to_string(),
                    source: CaptionSource::Primary,
                }));
            }
        }

        for selector in FALLBACKS {
            let elements = page.query_all(&format!("{} {}", post, selector)).await?;
            if let Some(text) = qualifying(elements.iter().map(|e| e.text.as_str()))
                .into_iter()
                .next()
            {
                debug!(selector, "Caption from fallback selector");
                return Ok(Some(Caption {
                    text,
                    source: CaptionSource::Fallback,
                }));
            }
        }

        let raw = page.query(post).await?.map(|el| el.text).unwrap_or_default();
        Ok(qualifying(raw.lines()).into_iter().next().map(|text| Caption {
            text,
            source: CaptionSource::RawText,
        }))
    }

    /// Expand a truncated primary caption. Returns the expanded text when
    /// a "more" control was clicked.
    pub async fn expand_caption(&self, post: &str) -> Result<Option<String>, PageError> {
        let page = self.page.as_ref();
        let more = format!("{} {}", post, MORE_LINK);
        if !page.exists(&more).await? {
            return Ok(None);
        }
        match page.click(&more).await {
            Ok(()) => {}
            Err(e) if e.is_absence() => return Ok(None),
            Err(e) => return Err(e),
        }
        self.pacer.wait(500).await;
        Ok(page
            .query(&format!("{} {}", post, PRIMARY))
            .await?
            .map(|el| el.text.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// Alt text of the post's first image.
    pub async fn image_alt_text(&self, post: &str) -> Result<Option<String>, PageError> {
        Ok(self
            .page
            .query_all(&format!("{} img[alt]", post))
            .await?
            .iter()
            .filter_map(|el| el.attr("alt"))
            .map(str::trim)
            .find(|alt| !alt.is_empty())
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_builder, FakePage};
    use autoengage_protocols::ElementSnapshot;

    const POST: &str = "article:nth-of-type(1)";

    fn sel(child: &str) -> String {
        format!("{} {}", POST, child)
    }

    #[tokio::test]
    async fn test_primary_caption() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set_text(&sel(PRIMARY), "  Sunday brunch vibes ");
        let session = session_builder(&page).build();

        let caption = session.extract_caption(POST).await.unwrap().unwrap();
        assert_eq!(caption.text, "Sunday brunch vibes");
        assert_eq!(caption.source, CaptionSource::Primary);
    }

    #[tokio::test]
    async fn test_fallback_skips_noise() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set(
            &sel(FALLBACKS[1]),
            vec![
                ElementSnapshot::new("🔥🔥🔥🔥"),
                ElementSnapshot::new("123"),
                ElementSnapshot::new("Fresh pasta tonight"),
            ],
        );
        page.set_text(&sel(FALLBACKS[3]), "Something else");
        let session = session_builder(&page).build();

        let caption = session.extract_caption(POST).await.unwrap().unwrap();
        assert_eq!(caption.text, "Fresh pasta tonight");
        assert_eq!(caption.source, CaptionSource::Fallback);
    }

    #[tokio::test]
    async fn test_raw_text_fallback() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set_text(POST, "ab\n12 34\n  chef.anna  \nLovely");
        let session = session_builder(&page).build();

        let caption = session.extract_caption(POST).await.unwrap().unwrap();
        assert_eq!(caption.text, "chef.anna");
        assert_eq!(caption.source, CaptionSource::RawText);
    }

    #[tokio::test]
    async fn test_no_caption() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set_text(POST, "🍕\n42");
        let session = session_builder(&page).build();
        assert!(session.extract_caption(POST).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expand_caption() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set_text(&sel(PRIMARY), "Short…");
        page.set_text(&sel(MORE_LINK), "more");
        let primary = sel(PRIMARY);
        page.on_click(&sel(MORE_LINK), move |dom| {
            dom.set_text(&primary, "Short and now much longer");
        });
        let session = session_builder(&page).build();

        let expanded = session.expand_caption(POST).await.unwrap();
        assert_eq!(expanded.as_deref(), Some("Short and now much longer"));
    }

    #[tokio::test]
    async fn test_alt_text() {
        let page = FakePage::new("https://www.instagram.com/p/a/");
        page.set(
            &sel("img[alt]"),
            vec![
                ElementSnapshot::new("").with_attr("alt", " "),
                ElementSnapshot::new("").with_attr("alt", "Photo of tacos"),
            ],
        );
        let session = session_builder(&page).build();
        assert_eq!(
            session.image_alt_text(POST).await.unwrap().as_deref(),
            Some("Photo of tacos")
        );
    }
}
