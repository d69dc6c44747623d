//! Scripted doubles for exercising the engine without a browser.
//!
//! [`FakePage`] is a selector-keyed DOM: tests register what each exact
//! selector string returns and optional hooks that rewrite the DOM when an
//! element is clicked or a URL is visited. Every call is recorded as a
//! [`PageAction`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use autoengage_protocols::{
    Browser, CommentedPostRecord, ContentGenerator, Cookie, CookieError, CookieStore,
    DedupStore, ElementSnapshot, GenerationError, GenerationRequest, Page, PageError,
    StoreError, Viewport,
};

use crate::language::{Detection, LanguageDetector};
use crate::session::{Session, SessionBuilder};
use crate::timing::{Clock, RandomSource};

/// A recorded page interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    Goto(String),
    Click(String, usize),
    ClickAt(f64, f64),
    MouseMove(f64, f64),
    Scroll(f64),
    ScrollElement(String),
    Type(String),
    Key(String),
    KeyCombo(Vec<String>, String),
    Screenshot(Option<String>, bool),
    Evaluate(String),
    Fetch(String),
    SetCookies(usize),
    GoBack,
    Close,
}

type Hook = Box<dyn FnMut(&mut FakeDom) + Send>;

/// Mutable DOM state behind a [`FakePage`].
#[derive(Default)]
pub struct FakeDom {
    pub url: String,
    pub viewport: Viewport,
    elements: HashMap<String, Vec<ElementSnapshot>>,
    within: HashMap<(String, usize, String), Vec<ElementSnapshot>>,
    json: Vec<(String, Value)>,
    evals: Vec<(String, Value)>,
    cookies: Vec<Cookie>,
    closed: bool,
}

impl FakeDom {
    pub fn set(&mut self, selector: &str, elements: Vec<ElementSnapshot>) {
        self.elements.insert(selector.to_string(), elements);
    }

    pub fn set_text(&mut self, selector: &str, text: &str) {
        self.set(selector, vec![ElementSnapshot::new(text)]);
    }

    pub fn remove(&mut self, selector: &str) {
        self.elements.remove(selector);
    }

    pub fn set_within(
        &mut self,
        selector: &str,
        index: usize,
        child: &str,
        elements: Vec<ElementSnapshot>,
    ) {
        self.within
            .insert((selector.to_string(), index, child.to_string()), elements);
    }

    pub fn has(&self, selector: &str) -> bool {
        self.elements.get(selector).is_some_and(|e| !e.is_empty())
    }
}

#[derive(Default)]
struct Hooks {
    click: HashMap<String, Vec<Hook>>,
    goto: Vec<(String, Hook)>,
}

/// Selector-keyed page double. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct FakePage {
    dom: Arc<Mutex<FakeDom>>,
    hooks: Arc<Mutex<Hooks>>,
    actions: Arc<Mutex<Vec<PageAction>>>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let page = Self::default();
        page.dom.lock().url = url.to_string();
        page
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut FakeDom) -> R) -> R {
        f(&mut self.dom.lock())
    }

    pub fn set(&self, selector: &str, elements: Vec<ElementSnapshot>) {
        self.dom.lock().set(selector, elements);
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.dom.lock().set_text(selector, text);
    }

    pub fn set_within(
        &self,
        selector: &str,
        index: usize,
        child: &str,
        elements: Vec<ElementSnapshot>,
    ) {
        self.dom.lock().set_within(selector, index, child, elements);
    }

    /// JSON returned by `fetch_json` for URLs starting with `prefix`.
    pub fn set_json(&self, prefix: &str, value: Value) {
        self.dom.lock().json.push((prefix.to_string(), value));
    }

    /// Value returned by `evaluate` for scripts containing `needle`.
    pub fn set_eval(&self, needle: &str, value: Value) {
        self.dom.lock().evals.push((needle.to_string(), value));
    }

    pub fn on_click(&self, selector: &str, hook: impl FnMut(&mut FakeDom) + Send + 'static) {
        self.hooks
            .lock()
            .click
            .entry(selector.to_string())
            .or_default()
            .push(Box::new(hook));
    }

    pub fn on_goto(&self, prefix: &str, hook: impl FnMut(&mut FakeDom) + Send + 'static) {
        self.hooks
            .lock()
            .goto
            .push((prefix.to_string(), Box::new(hook)));
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.actions.lock().clone()
    }

    /// Everything typed so far, concatenated.
    pub fn typed(&self) -> String {
        self.actions
            .lock()
            .iter()
            .filter_map(|a| match a {
                PageAction::Type(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.actions
            .lock()
            .iter()
            .filter(|a| matches!(a, PageAction::Click(s, _) if s == selector))
            .count()
    }

    pub fn visited(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|a| match a {
                PageAction::Goto(u) => Some(u.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.actions
            .lock()
            .iter()
            .filter_map(|a| match a {
                PageAction::Key(k) => Some(k.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.dom.lock().closed
    }

    fn record(&self, action: PageAction) {
        self.actions.lock().push(action);
    }

    fn ensure_open(&self) -> Result<(), PageError> {
        if self.dom.lock().closed {
            return Err(PageError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), PageError> {
        self.ensure_open()?;
        self.record(PageAction::Goto(url.to_string()));
        self.dom.lock().url = url.to_string();
        let mut hooks = self.hooks.lock();
        let mut dom = self.dom.lock();
        for (prefix, hook) in hooks.goto.iter_mut() {
            if url.starts_with(prefix.as_str()) {
                hook(&mut dom);
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.dom.lock().url.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, PageError> {
        self.ensure_open()?;
        Ok(self
            .dom
            .lock()
            .elements
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_within(
        &self,
        selector: &str,
        index: usize,
        child: &str,
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        self.ensure_open()?;
        Ok(self
            .dom
            .lock()
            .within
            .get(&(selector.to_string(), index, child.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool, PageError> {
        self.ensure_open()?;
        Ok(self.dom.lock().has(selector))
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<(), PageError> {
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        self.ensure_open()?;
        let present = self
            .dom
            .lock()
            .elements
            .get(selector)
            .is_some_and(|e| e.len() > index);
        if !present {
            return Err(PageError::ElementNotFound(selector.to_string()));
        }
        self.record(PageAction::Click(selector.to_string(), index));
        let mut hooks = self.hooks.lock();
        if let Some(list) = hooks.click.get_mut(selector) {
            let mut dom = self.dom.lock();
            for hook in list.iter_mut() {
                hook(&mut dom);
            }
        }
        Ok(())
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), PageError> {
        self.ensure_open()?;
        self.record(PageAction::ClickAt(x, y));
        Ok(())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<(), PageError> {
        self.record(PageAction::MouseMove(x, y));
        Ok(())
    }

    async fn scroll_by(&self, dy: f64) -> Result<(), PageError> {
        self.record(PageAction::Scroll(dy));
        Ok(())
    }

    async fn scroll_element_to_bottom(&self, selector: &str) -> Result<Option<f64>, PageError> {
        self.record(PageAction::ScrollElement(selector.to_string()));
        let dom = self.dom.lock();
        Ok(dom.elements.get(selector).and_then(|e| e.first()).map(|el| {
            el.attr("scrollHeight")
                .and_then(|h| h.parse::<f64>().ok())
                .unwrap_or(0.0)
        }))
    }

    async fn type_text(&self, text: &str) -> Result<(), PageError> {
        self.ensure_open()?;
        self.record(PageAction::Type(text.to_string()));
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.record(PageAction::Key(key.to_string()));
        Ok(())
    }

    async fn press_key_combo(&self, modifiers: &[&str], key: &str) -> Result<(), PageError> {
        self.record(PageAction::KeyCombo(
            modifiers.iter().map(|m| m.to_string()).collect(),
            key.to_string(),
        ));
        Ok(())
    }

    async fn screenshot(
        &self,
        selector: Option<&str>,
        full_page: bool,
    ) -> Result<Vec<u8>, PageError> {
        self.ensure_open()?;
        if let Some(sel) = selector {
            if !self.dom.lock().has(sel) {
                return Err(PageError::ElementNotFound(sel.to_string()));
            }
        }
        self.record(PageAction::Screenshot(selector.map(str::to_string), full_page));
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn viewport(&self) -> Result<Viewport, PageError> {
        Ok(self.dom.lock().viewport)
    }

    async fn evaluate(&self, script: &str) -> Result<Value, PageError> {
        self.ensure_open()?;
        self.record(PageAction::Evaluate(script.to_string()));
        let dom = self.dom.lock();
        Ok(dom
            .evals
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null))
    }

    async fn fetch_json(
        &self,
        url: &str,
        _headers: &[(&str, &str)],
    ) -> Result<Option<Value>, PageError> {
        self.record(PageAction::Fetch(url.to_string()));
        let dom = self.dom.lock();
        Ok(dom
            .json
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, v)| v.clone()))
    }

    async fn set_cookies(&self, cookies: &[Cookie]) -> Result<(), PageError> {
        self.record(PageAction::SetCookies(cookies.len()));
        self.dom.lock().cookies.extend_from_slice(cookies);
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>, PageError> {
        Ok(self.dom.lock().cookies.clone())
    }

    async fn go_back(&self) -> Result<(), PageError> {
        self.record(PageAction::GoBack);
        Ok(())
    }

    async fn close(&self) -> Result<(), PageError> {
        self.record(PageAction::Close);
        self.dom.lock().closed = true;
        Ok(())
    }
}

/// Browser double handing out queued [`FakePage`]s.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pages: Arc<Mutex<VecDeque<FakePage>>>,
    opened: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page to be returned by the next `new_page` call.
    pub fn push_page(&self, page: FakePage) {
        self.pages.lock().push_back(page);
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, PageError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let page = self
            .pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| FakePage::new("about:blank"));
        Ok(Box::new(page))
    }
}

/// Clock that never waits. Sleeps advance a virtual time and are recorded.
pub struct InstantClock {
    now: AtomicI64,
    slept: Mutex<Vec<Duration>>,
}

impl InstantClock {
    pub fn new() -> Self {
        Self {
            now: AtomicI64::new(1_700_000_000_000),
            slept: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.slept.lock().iter().sum()
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
        self.now
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }

    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Deterministic random source: plays back a sequence, then a fallback value.
pub struct ScriptedRandom {
    values: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn constant(value: f64) -> Self {
        Self::sequence(Vec::new(), value)
    }

    pub fn sequence(values: Vec<f64>, fallback: f64) -> Self {
        Self {
            values: Mutex::new(values.into()),
            fallback,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        self.values.lock().pop_front().unwrap_or(self.fallback)
    }
}

/// Generator returning a fixed value and recording every request.
pub struct StaticGenerator {
    response: Result<Value, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StaticGenerator {
    pub fn new(response: Value) -> Self {
        Self {
            response: Ok(response),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A generator answering with a single comment suggestion.
    pub fn comment(text: &str) -> Self {
        Self::new(serde_json::json!([
            {"comment": text, "viralRate": 50, "commentTokenCount": 10}
        ]))
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ContentGenerator for StaticGenerator {
    fn id(&self) -> &str {
        "static"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Value, GenerationError> {
        self.requests.lock().push(request);
        self.response
            .clone()
            .map_err(GenerationError::Network)
    }
}

/// In-memory dedup store with the same duplicate semantics as a real one.
#[derive(Default)]
pub struct MemoryDedupStore {
    records: Mutex<HashMap<String, CommentedPostRecord>>,
    unavailable: bool,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permalinks(permalinks: &[&str]) -> Self {
        let store = Self::new();
        for p in permalinks {
            store
                .records
                .lock()
                .insert(p.to_string(), CommentedPostRecord::new(*p, "earlier"));
        }
        store
    }

    /// A store whose every call fails.
    pub fn unavailable() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            unavailable: true,
        }
    }

    pub fn permalinks(&self) -> HashSet<String> {
        self.records.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl DedupStore for MemoryDedupStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn find(&self, permalink: &str) -> Result<Option<CommentedPostRecord>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        Ok(self.records.lock().get(permalink).cloned())
    }

    async fn insert(&self, record: CommentedPostRecord) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("offline".to_string()));
        }
        let mut records = self.records.lock();
        if records.contains_key(&record.permalink) {
            return Err(StoreError::Duplicate(record.permalink));
        }
        records.insert(record.permalink.clone(), record);
        Ok(())
    }
}

/// Cookie store kept in memory.
#[derive(Default)]
pub struct MemoryCookieStore {
    cookies: Mutex<Vec<Cookie>>,
    saves: AtomicUsize,
}

impl MemoryCookieStore {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies: Mutex::new(cookies),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.cookies.lock().clone()
    }
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    async fn load(&self) -> Result<Vec<Cookie>, CookieError> {
        Ok(self.cookies.lock().clone())
    }

    async fn save(&self, cookies: &[Cookie]) -> Result<(), CookieError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.cookies.lock() = cookies.to_vec();
        Ok(())
    }
}

/// Language detector with a fixed answer.
pub struct StaticLanguage {
    pub detection: Option<Detection>,
}

impl StaticLanguage {
    pub fn english() -> Self {
        Self::other("eng", 1.0)
    }

    pub fn other(language: &str, confidence: f64) -> Self {
        Self {
            detection: Some(Detection {
                language: language.to_string(),
                is_english: language == "eng",
                confidence,
            }),
        }
    }
}

impl LanguageDetector for StaticLanguage {
    fn detect(&self, _text: &str) -> Option<Detection> {
        self.detection.clone()
    }
}

/// Session wired to fakes: instant clock, constant 0.5 randomness, a
/// generator answering "Great post!", no store.
pub fn session_builder(page: &FakePage) -> SessionBuilder {
    Session::builder(
        Arc::new(page.clone()),
        Arc::new(FakeBrowser::new()),
        Arc::new(StaticGenerator::comment("Great post!")),
    )
    .clock(Arc::new(InstantClock::new()))
    .random(Arc::new(ScriptedRandom::constant(0.5)))
}
