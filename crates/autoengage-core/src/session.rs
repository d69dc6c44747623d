//! The session context.
//!
//! A [`Session`] is the single owner of the primary page and of all per-run
//! state (session dedup set, contacted users, outbound DM counter). Every
//! engine operation is a method on it; nothing is kept in statics.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use autoengage_config::{Config, ConfigLoader, EngineConfig, KeywordsConfig, OutreachConfig};
use autoengage_protocols::{Browser, ContentGenerator, CookieStore, DedupStore, Page};

use crate::audit::Auditor;
use crate::error::EngineError;
use crate::language::{LanguageDetector, LanguagePolicy, WhatlangDetector};
use crate::profile::ProfileClassifier;
use crate::site_url;
use crate::timing::{Clock, HumanPacer, RandomSource, SystemClock, ThreadRandom};

/// Default navigation timeout.
pub(crate) const NAV_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine settings resolved from configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    /// The logged-in account's own username.
    pub username: String,
    pub engine: EngineConfig,
    pub keywords: KeywordsConfig,
    pub outreach: OutreachConfig,
    /// Root of the screenshot trail. `None` disables screenshots.
    pub screenshot_dir: Option<PathBuf>,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        let dir = config.logging.screenshot_dir.trim();
        Self {
            username: config.account.username.trim().to_string(),
            engine: config.engine.clone(),
            keywords: config.keywords.clone(),
            outreach: config.outreach.clone(),
            screenshot_dir: (!dir.is_empty()).then(|| PathBuf::from(ConfigLoader::expand_path(dir))),
        }
    }
}

/// How the session got authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    Cookies,
    Credentials,
}

pub struct Session {
    pub(crate) page: Arc<dyn Page>,
    pub(crate) browser: Arc<dyn Browser>,
    pub(crate) generator: Arc<dyn ContentGenerator>,
    pub(crate) store: Option<Arc<dyn DedupStore>>,
    pub(crate) pacer: HumanPacer,
    pub(crate) language: LanguagePolicy,
    pub(crate) classifier: ProfileClassifier,
    pub(crate) audit: Auditor,
    pub(crate) settings: SessionSettings,
    commented_posts: HashSet<String>,
    contacted_users: HashSet<String>,
    outbound_dms: u32,
}

impl Session {
    pub fn builder(
        page: Arc<dyn Page>,
        browser: Arc<dyn Browser>,
        generator: Arc<dyn ContentGenerator>,
    ) -> SessionBuilder {
        SessionBuilder {
            page,
            browser,
            generator,
            store: None,
            clock: Arc::new(SystemClock),
            rng: Arc::new(ThreadRandom::new()),
            detector: Arc::new(WhatlangDetector),
            settings: SessionSettings::default(),
        }
    }

    pub fn page(&self) -> &Arc<dyn Page> {
        &self.page
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn commented_posts(&self) -> &HashSet<String> {
        &self.commented_posts
    }

    pub fn contacted_users(&self) -> &HashSet<String> {
        &self.contacted_users
    }

    pub fn outbound_dms(&self) -> u32 {
        self.outbound_dms
    }

    pub(crate) fn is_commented(&self, permalink: &str) -> bool {
        self.commented_posts.contains(permalink)
    }

    pub(crate) fn mark_commented(&mut self, permalink: &str) {
        self.commented_posts.insert(permalink.to_string());
    }

    pub(crate) fn has_contacted(&self, username: &str) -> bool {
        self.contacted_users.contains(&username.to_lowercase())
    }

    pub(crate) fn mark_contacted(&mut self, username: &str) {
        self.contacted_users.insert(username.to_lowercase());
    }

    pub(crate) fn count_outbound_dm(&mut self) {
        self.outbound_dms += 1;
    }

    /// Authenticate the primary page.
    ///
    /// Saved cookies are tried first; a redirect to the login page falls back
    /// to credentials, after which fresh cookies are saved back.
    pub async fn bootstrap(
        &mut self,
        cookies: &dyn CookieStore,
        password: Option<&str>,
    ) -> Result<LoginMethod, EngineError> {
        let saved = match cookies.load().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "Cannot read saved cookies");
                Vec::new()
            }
        };

        if !saved.is_empty() {
            self.page.set_cookies(&saved).await?;
            self.page.goto(&site_url(""), NAV_TIMEOUT).await?;
            self.pacer.wait(2000).await;
            let url = self.page.current_url().await?;
            if !url.contains("/login/") {
                info!(cookies = saved.len(), "Logged in with saved cookies");
                self.audit
                    .capture(self.page.as_ref(), "session", "after-cookie-login")
                    .await;
                return Ok(LoginMethod::Cookies);
            }
            info!("Saved cookies rejected, logging in with credentials");
        }

        self.login_with_credentials(password).await?;

        match self.page.cookies().await {
            Ok(fresh) => {
                if let Err(e) = cookies.save(&fresh).await {
                    warn!(error = %e, "Cannot save cookies");
                }
            }
            Err(e) => warn!(error = %e, "Cannot read cookies after login"),
        }

        self.handle_popup().await;
        self.audit
            .capture(self.page.as_ref(), "session", "after-login")
            .await;
        Ok(LoginMethod::Credentials)
    }

    async fn login_with_credentials(&self, password: Option<&str>) -> Result<(), EngineError> {
        let username = self.settings.username.as_str();
        if username.is_empty() {
            return Err(EngineError::Login("no username configured".to_string()));
        }
        let password = password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| EngineError::Login("no password configured".to_string()))?;

        let page = self.page.as_ref();
        page.goto(&site_url("accounts/login/"), NAV_TIMEOUT).await?;
        self.pacer.wait(3000).await;

        const USERNAME: &str = "input[name=\"username\"]";
        const PASSWORD: &str = "input[name=\"password\"]";
        if !page.wait_for(USERNAME, Duration::from_secs(60)).await? {
            return Err(EngineError::Login("login form did not appear".to_string()));
        }
        self.pacer.wait(1000).await;

        page.click(USERNAME).await?;
        self.pacer.type_steady(page, username, 100).await?;
        self.pacer.wait(500).await;
        page.click(PASSWORD).await?;
        self.pacer.type_steady(page, password, 100).await?;
        self.pacer.wait(1000).await;

        page.click("button[type=\"submit\"]").await?;
        if let Err(e) = page.wait_for_navigation(NAV_TIMEOUT).await {
            warn!(error = %e, "No navigation after login submit");
        }

        let url = page.current_url().await?;
        if url.contains("/accounts/login") && page.exists(USERNAME).await? {
            return Err(EngineError::Login("still on the login page".to_string()));
        }
        info!(username, "Logged in with credentials");
        Ok(())
    }
}

/// Wires a [`Session`] from its collaborators.
pub struct SessionBuilder {
    page: Arc<dyn Page>,
    browser: Arc<dyn Browser>,
    generator: Arc<dyn ContentGenerator>,
    store: Option<Arc<dyn DedupStore>>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
    detector: Arc<dyn LanguageDetector>,
    settings: SessionSettings,
}

impl SessionBuilder {
    /// Context used for secondary pages (profile inspection).
    pub fn browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = browser;
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// Persistent dedup store. Without one, dedup is session-only.
    pub fn store(mut self, store: Arc<dyn DedupStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn language_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Session {
        let engine = &self.settings.engine;
        let language = LanguagePolicy::new(
            self.detector,
            engine.language_confidence_floor,
            engine.language_min_chars,
        );
        let audit = Auditor::new(
            self.settings.screenshot_dir.clone(),
            engine.show_overlay,
            self.clock.clone(),
        );
        Session {
            page: self.page,
            browser: self.browser,
            generator: self.generator,
            store: self.store,
            pacer: HumanPacer::new(self.clock, self.rng),
            language,
            classifier: ProfileClassifier::from_keywords(&self.settings.keywords),
            audit,
            settings: self.settings,
            commented_posts: HashSet::new(),
            contacted_users: HashSet::new(),
            outbound_dms: 0,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
