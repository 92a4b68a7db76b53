//! The traversal engine: applies selections to the traversal state and
//! keeps the URL, the cookies, the recommendation panel and usage tracking
//! in step with it.
//!
//! All mutation goes through `&mut self` from a single event loop. The only
//! work that outlives a call is card fetching (see [`crate::resolver`]) and
//! fire-and-forget tracking deliveries.

pub mod restore;
pub mod traversal;

use actix_web::cookie::CookieJar;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::BrowserContext;
use crate::config::CookieSettings;
use crate::errors::WizardError;
use crate::persistence::{CookieAdapter, Persistence, StateAdapter, StateSource, UrlAdapter};
use crate::resolver::{CardArrival, ContentSource, PanelItem, Resolver};
use crate::session::SessionId;
use crate::state::FormState;
use crate::tracking::{Tracker, UsageEvent, UsageSink, UsageStatus};
use crate::wizard::{Styles, WizardDocument};

pub use self::restore::ReplayReport;
pub use self::traversal::{Advance, Focus, StepState, Traversal};

/// The services the engine talks to.
pub struct Collaborators {
    pub content: Arc<dyn ContentSource>,
    pub usage: Arc<dyn UsageSink>,
    pub tracking_enabled: bool,
}

/// What the debug view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo {
    pub session_id: String,
    pub cookie_state: Option<String>,
    pub current_state: FormState,
    pub url: String,
    pub styles: Styles,
}

pub struct Engine {
    document: Arc<WizardDocument>,
    traversal: Traversal,
    ctx: BrowserContext,
    persistence: Persistence,
    session: SessionId,
    resolver: Resolver,
    tracker: Tracker,
    /// Set while a replay is running; persistence writes are skipped.
    suspended: bool,
}

impl Engine {
    pub fn new(
        document: Arc<WizardDocument>,
        mut ctx: BrowserContext,
        cookies: CookieSettings,
        collaborators: Collaborators,
    ) -> Self {
        let session = SessionId::new(cookies.clone());
        let session_id = session.get_or_create(&mut ctx.cookies);
        let persistence = Persistence::new(
            UrlAdapter::new(document.step_slugs()),
            CookieAdapter::new(cookies),
        );
        Self {
            traversal: Traversal::initial(&document),
            document,
            ctx,
            persistence,
            session,
            resolver: Resolver::new(collaborators.content),
            tracker: Tracker::new(collaborators.usage, session_id, collaborators.tracking_enabled),
            suspended: false,
        }
    }

    /// Reports the visit and restores any stored progress, from the URL
    /// when it carries some and from the cookie otherwise.
    pub fn start(&mut self) -> Option<StateSource> {
        self.tracker.track(UsageStatus::Started, 0, &FormState::new());
        let (state, source) = self.persistence.load(&self.ctx)?;
        if state.is_empty() {
            log::debug!("The {} names steps but answers none; starting fresh.", source.as_str());
            return None;
        }
        log::info!("Restoring {} answered step(s) from the {}.", state.len(), source.as_str());
        self.replay(&state, source);
        Some(source)
    }

    /// Selects option `option` on step `step` (both by position).
    pub fn choose(&mut self, step: usize, option: usize) -> Result<Advance, WizardError> {
        let document = Arc::clone(&self.document);
        self.traversal.begin(&document, step, option)?;
        self.resolver.hide();
        self.persist();
        self.tracker.track(
            UsageStatus::InProgress,
            self.traversal.answered_count(),
            &self.form_state(),
        );

        let advance = self.traversal.advance(&document, step, option);
        match &advance {
            Advance::Complete { recommendations, .. } => {
                self.resolver.show(&document, recommendations);
                self.persist();
                self.tracker.track(
                    UsageStatus::Completed,
                    document.steps.len(),
                    &self.form_state(),
                );
            }
            Advance::Step(_) => self.persist(),
        }
        Ok(advance)
    }

    /// Selects by step and option id.
    pub fn select(&mut self, step_id: &str, option_id: &str) -> Result<Advance, WizardError> {
        let step = self
            .document
            .step_index(step_id)
            .ok_or_else(|| WizardError::InvalidSelection(format!("unknown step '{}'", step_id)))?;
        let option = self.document.steps[step].option_index(option_id).ok_or_else(|| {
            WizardError::InvalidSelection(format!("step '{}' has no option '{}'", step_id, option_id))
        })?;
        self.choose(step, option)
    }

    /// Moves one entry back in history and replays it. `false` when there
    /// is nothing to go back to.
    pub fn back(&mut self) -> bool {
        if self.ctx.history.back().is_none() {
            return false;
        }
        self.replay_current_url();
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.ctx.history.forward().is_none() {
            return false;
        }
        self.replay_current_url();
        true
    }

    /// Starts over: clears both cookies, issues a new session id and points
    /// the URL back at the bare path.
    pub fn reset(&mut self) {
        self.traversal = Traversal::initial(&self.document);
        self.resolver.hide();
        self.persistence.cookie.clear(&mut self.ctx);
        let session_id = self.session.regenerate(&mut self.ctx.cookies);
        self.tracker.set_session_id(session_id);
        let path = self.ctx.history.path().to_string();
        if self.ctx.history.current() != path {
            self.ctx.history.push(path);
        }
        log::info!("Wizard reset.");
    }

    /// The `abandoned` event to send when the user leaves with progress
    /// but without reaching a recommendation.
    pub fn unload_event(&self) -> Option<UsageEvent> {
        if !self.tracker.is_enabled() || self.traversal.is_completed() {
            return None;
        }
        let state = self.form_state();
        if state.is_empty() {
            return None;
        }
        Some(self.tracker.event(UsageStatus::Abandoned, state.len(), &state))
    }

    pub async fn unload(&self, timeout: Duration) {
        if let Some(event) = self.unload_event() {
            self.tracker.beacon(event, timeout).await;
        }
    }

    /// Waits for every card fetch started so far.
    pub async fn settle(&mut self) {
        self.resolver.settle().await;
    }

    /// Card fetches report here as they land, from now on.
    pub fn card_arrivals(&mut self) -> tokio::sync::mpsc::UnboundedReceiver<CardArrival> {
        self.resolver.subscribe()
    }

    /// The panel item and card an arrival delivered, while that panel is
    /// still the one shown.
    pub fn arrived(&self, arrival: &CardArrival) -> Option<(PanelItem, String)> {
        self.resolver.arrived(arrival)
    }

    pub fn form_state(&self) -> FormState {
        self.traversal.form_state(&self.document)
    }

    pub fn document(&self) -> &WizardDocument {
        &self.document
    }

    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    pub fn panel(&self) -> Option<Vec<PanelItem>> {
        self.resolver.snapshot()
    }

    pub fn url(&self) -> &str {
        self.ctx.history.current()
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.ctx.cookies
    }

    pub fn session_id(&self) -> &str {
        self.tracker.session_id()
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            session_id: self.session_id().to_string(),
            cookie_state: self.persistence.cookie.raw(&self.ctx),
            current_state: self.form_state(),
            url: self.url().to_string(),
            styles: self.document.styles.clone(),
        }
    }

    fn persist(&mut self) {
        if self.suspended {
            return;
        }
        let state = self.form_state();
        self.persistence.write(&mut self.ctx, &state);
    }

    fn replay_current_url(&mut self) {
        let state = self
            .persistence
            .url
            .read(&self.ctx)
            .unwrap_or_default();
        self.replay(&state, StateSource::Url);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::resolver::testing::StaticSource;
    use crate::tracking::testing::RecordingSink;

    pub fn engine_at(document: WizardDocument, url: &str, jar: CookieJar) -> (Engine, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let engine = Engine::new(
            Arc::new(document),
            BrowserContext::new(url, jar),
            CookieSettings::default(),
            Collaborators {
                content: Arc::new(StaticSource::with_cards(&[1, 2, 3])),
                usage: sink.clone(),
                tracking_enabled: true,
            },
        );
        (engine, sink)
    }
}
