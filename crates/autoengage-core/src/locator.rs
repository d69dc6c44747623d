//! Ordered element-location strategies.
//!
//! A [`Locator`] is a named list of independent strategies tried in order
//! until one yields an element. Absence at any step is not an error; only
//! transport-level page failures propagate.

use std::time::Duration;

use tracing::debug;

use autoengage_protocols::{ElementSnapshot, Page, PageError};

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq)]
pub enum LocatorStrategy {
    /// First match of a CSS selector.
    Css(String),
    /// First element under `selector` whose trimmed, lowercased text equals
    /// one of `texts`.
    Text {
        selector: String,
        texts: Vec<String>,
        skip_disabled: bool,
    },
}

impl LocatorStrategy {
    fn selector(&self) -> &str {
        match self {
            Self::Css(s) => s,
            Self::Text { selector, .. } => selector,
        }
    }

    fn with_scope(&self, scope: &str) -> Self {
        let scoped = |sel: &str| {
            sel.split(',')
                .map(|part| format!("{} {}", scope, part.trim()))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Css(s) => Self::Css(scoped(s)),
            Self::Text {
                selector,
                texts,
                skip_disabled,
            } => Self::Text {
                selector: scoped(selector),
                texts: texts.clone(),
                skip_disabled: *skip_disabled,
            },
        }
    }

    fn pick(&self, elements: &[ElementSnapshot]) -> Option<usize> {
        match self {
            Self::Css(_) => (!elements.is_empty()).then_some(0),
            Self::Text {
                texts,
                skip_disabled,
                ..
            } => elements.iter().position(|el| {
                let text = el.text.trim().to_lowercase();
                texts.iter().any(|t| *t == text) && !(*skip_disabled && el.is_disabled())
            }),
        }
    }
}

/// A found element: the selector that matched and its index among matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub selector: String,
    pub index: usize,
    pub element: ElementSnapshot,
}

impl Located {
    pub async fn click(&self, page: &dyn Page) -> Result<(), PageError> {
        page.click_nth(&self.selector, self.index).await
    }
}

/// A named, ordered list of strategies.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    name: String,
    strategies: Vec<LocatorStrategy>,
}

impl Locator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.strategies.push(LocatorStrategy::Css(selector.into()));
        self
    }

    /// Add a CSS strategy per selector, in order.
    pub fn any_css(mut self, selectors: &[&str]) -> Self {
        for s in selectors {
            self.strategies.push(LocatorStrategy::Css(s.to_string()));
        }
        self
    }

    /// Match by visible text (case-insensitive, exact after trim).
    pub fn text(mut self, selector: impl Into<String>, texts: &[&str]) -> Self {
        self.strategies.push(LocatorStrategy::Text {
            selector: selector.into(),
            texts: texts.iter().map(|t| t.to_lowercase()).collect(),
            skip_disabled: false,
        });
        self
    }

    /// Like [`Locator::text`] but ignoring disabled elements.
    pub fn enabled_text(mut self, selector: impl Into<String>, texts: &[&str]) -> Self {
        self.strategies.push(LocatorStrategy::Text {
            selector: selector.into(),
            texts: texts.iter().map(|t| t.to_lowercase()).collect(),
            skip_disabled: true,
        });
        self
    }

    /// Same strategies restricted to descendants of `scope`.
    pub fn scoped(&self, scope: &str) -> Self {
        Self {
            name: self.name.clone(),
            strategies: self.strategies.iter().map(|s| s.with_scope(scope)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategies(&self) -> &[LocatorStrategy] {
        &self.strategies
    }

    /// Try every strategy once, in order.
    pub async fn locate(&self, page: &dyn Page) -> Result<Option<Located>, PageError> {
        for strategy in &self.strategies {
            let selector = strategy.selector();
            let elements = match page.query_all(selector).await {
                Ok(elements) => elements,
                Err(e) if tolerable(&e) => {
                    debug!(locator = %self.name, selector, error = %e, "Strategy failed");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(index) = strategy.pick(&elements) {
                return Ok(Some(Located {
                    selector: selector.to_string(),
                    index,
                    element: elements[index].clone(),
                }));
            }
        }
        debug!(locator = %self.name, "No strategy matched");
        Ok(None)
    }

    /// Like [`Locator::locate`], but each strategy first waits up to
    /// `per_strategy` for its selector to appear.
    pub async fn wait_locate(
        &self,
        page: &dyn Page,
        per_strategy: Duration,
    ) -> Result<Option<Located>, PageError> {
        for strategy in &self.strategies {
            let selector = strategy.selector();
            match page.wait_for(selector, per_strategy).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) if tolerable(&e) => continue,
                Err(e) => return Err(e),
            }
            let single = Locator {
                name: self.name.clone(),
                strategies: vec![strategy.clone()],
            };
            if let Some(found) = single.locate(page).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Locate and click. Returns whether anything was clicked.
    pub async fn click(&self, page: &dyn Page) -> Result<bool, PageError> {
        match self.locate(page).await? {
            Some(found) => match found.click(page).await {
                Ok(()) => Ok(true),
                Err(e) if tolerable(&e) => Ok(false),
                Err(e) => Err(e),
            },
            None => Ok(false),
        }
    }
}

/// Errors a fallback chain absorbs.
pub(crate) fn tolerable(err: &PageError) -> bool {
    err.is_absence() || matches!(err, PageError::Script(_))
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
