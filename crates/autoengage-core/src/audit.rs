//! Screenshot trail and on-page status overlay.
//!
//! Screenshots land in `<root>/<category>/<unix-ms>-<slug>.png`. Capture is
//! best effort: failures are logged and never interrupt a run.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use autoengage_protocols::Page;

use crate::timing::Clock;

/// Overlay colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTone {
    Info,
    Success,
    Warning,
    Error,
}

impl OverlayTone {
    fn color(&self) -> &'static str {
        match self {
            Self::Info => "#4da3ff",
            Self::Success => "#4caf50",
            Self::Warning => "#ff9800",
            Self::Error => "#f44336",
        }
    }
}

/// Lowercase alphanumerics joined by `-`, at most 40 chars.
pub fn sanitize_filename(label: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(40);
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "conversation".to_string()
    } else {
        slug
    }
}

#[derive(Clone)]
pub struct Auditor {
    root: Option<PathBuf>,
    overlay: bool,
    clock: Arc<dyn Clock>,
}

impl Auditor {
    pub fn new(root: Option<PathBuf>, overlay: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            root,
            overlay,
            clock,
        }
    }

    pub fn root(&self) -> Option<&PathBuf> {
        self.root.as_ref()
    }

    /// Viewport screenshot.
    pub async fn capture(&self, page: &dyn Page, category: &str, label: &str) -> Option<PathBuf> {
        self.shoot(page, false, category, label).await
    }

    pub async fn capture_full(
        &self,
        page: &dyn Page,
        category: &str,
        label: &str,
    ) -> Option<PathBuf> {
        self.shoot(page, true, category, label).await
    }

    async fn shoot(
        &self,
        page: &dyn Page,
        full_page: bool,
        category: &str,
        label: &str,
    ) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let bytes = match page.screenshot(None, full_page).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(category, label, error = %e, "Screenshot failed");
                return None;
            }
        };

        let dir = root.join(category);
        let path = dir.join(format!(
            "{}-{}.png",
            self.clock.now_millis(),
            sanitize_filename(label)
        ));
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %e, "Cannot create screenshot directory");
            return None;
        }
        match tokio::fs::write(&path, &bytes).await {
            Ok(()) => {
                debug!(path = %path.display(), "Screenshot saved");
                Some(path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot write screenshot");
                None
            }
        }
    }

    /// Show a transient status pill on the page when enabled.
    pub async fn overlay(&self, page: &dyn Page, message: &str, tone: OverlayTone) {
        if !self.overlay {
            return;
        }
        let text = serde_json::to_string(message).unwrap_or_else(|_| "\"\"".to_string());
        let script = format!(
            r#"(() => {{
  const id = '__autoengage_overlay';
  let el = document.getElementById(id);
  if (!el) {{
    el = document.createElement('div');
    el.id = id;
    Object.assign(el.style, {{
      position: 'fixed', top: '12px', right: '12px', zIndex: 2147483647,
      padding: '8px 14px', borderRadius: '999px', color: '#fff',
      font: '600 13px system-ui, sans-serif', boxShadow: '0 2px 8px rgba(0,0,0,.3)',
      transition: 'opacity .4s', pointerEvents: 'none'
    }});
    document.body.appendChild(el);
  }}
  el.textContent = {text};
  el.style.background = '{color}';
  el.style.opacity = '1';
  clearTimeout(el.__fade);
  el.__fade = setTimeout(() => {{ el.style.opacity = '0'; }}, 2200);
  return true;
}})()"#,
            text = text,
            color = tone.color()
        );
        if let Err(e) = page.evaluate(&script).await {
            debug!(error = %e, "Overlay failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, InstantClock, PageAction};

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("After Login!"), "after-login");
        assert_eq!(sanitize_filename("  @chef.anna -- profile "), "chef-anna-profile");
        assert_eq!(sanitize_filename("🔥🔥"), "conversation");
        assert_eq!(sanitize_filename(&"a".repeat(80)).len(), 40);
        assert!(!sanitize_filename(&format!("{}-b", "a".repeat(39))).ends_with('-'));
    }

    #[tokio::test]
    async fn test_capture_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let auditor = Auditor::new(
            Some(dir.path().to_path_buf()),
            false,
            Arc::new(InstantClock::new()),
        );
        let page = FakePage::new("https://example.test/");

        let path = auditor.capture(&page, "audit", "post 1").await.unwrap();

        assert!(path.starts_with(dir.path().join("audit")));
        assert!(path.to_string_lossy().ends_with("-post-1.png"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_capture_disabled_without_root() {
        let auditor = Auditor::new(None, false, Arc::new(InstantClock::new()));
        let page = FakePage::new("https://example.test/");
        assert!(auditor.capture(&page, "audit", "x").await.is_none());
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn test_overlay_only_when_enabled() {
        let page = FakePage::new("https://example.test/");
        Auditor::new(None, false, Arc::new(InstantClock::new()))
            .overlay(&page, "hi", OverlayTone::Info)
            .await;
        assert!(page.actions().is_empty());

        Auditor::new(None, true, Arc::new(InstantClock::new()))
            .overlay(&page, "Liked", OverlayTone::Success)
            .await;
        match &page.actions()[0] {
            PageAction::Evaluate(script) => {
                assert!(script.contains("\"Liked\""));
                assert!(script.contains("#4caf50"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }
}
