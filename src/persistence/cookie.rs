use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, CookieJar};

use super::StateAdapter;
use crate::browser::BrowserContext;
use crate::config::CookieSettings;
use crate::state::FormState;

/// Builds a long-lived cookie the way both client cookies are stored.
pub fn persistent_cookie(settings: &CookieSettings, name: &str, value: String) -> Cookie<'static> {
    let max_age = Duration::days(settings.max_age_days);
    Cookie::build(name.to_string(), value)
        .path(settings.path.clone())
        .max_age(max_age)
        .expires(OffsetDateTime::now_utc() + max_age)
        .finish()
}

/// Drops `name` from the jar. Saving the jar afterwards leaves it out.
pub fn expire_cookie(jar: &mut CookieJar, settings: &CookieSettings, name: &str) {
    jar.remove(Cookie::build(name.to_string(), "").path(settings.path.clone()).finish());
}

/// Stores the form state as JSON in a single cookie.
pub struct CookieAdapter {
    settings: CookieSettings,
}

impl CookieAdapter {
    pub fn new(settings: CookieSettings) -> Self {
        Self { settings }
    }

    pub fn clear(&self, ctx: &mut BrowserContext) {
        expire_cookie(&mut ctx.cookies, &self.settings, &self.settings.form_state_name);
    }

    /// The raw stored value, for the debug view.
    pub fn raw(&self, ctx: &BrowserContext) -> Option<String> {
        ctx.cookies
            .get(&self.settings.form_state_name)
            .map(|c| c.value().to_string())
    }
}

impl StateAdapter for CookieAdapter {
    fn write(&self, ctx: &mut BrowserContext, state: &FormState) {
        let cookie = persistent_cookie(&self.settings, &self.settings.form_state_name, state.to_json());
        ctx.cookies.add(cookie);
    }

    fn read(&self, ctx: &BrowserContext) -> Option<FormState> {
        let raw = self.raw(ctx)?;
        match serde_json::from_str::<FormState>(&raw) {
            Ok(state) if state.is_empty() => None,
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!(
                    "Ignoring malformed '{}' cookie: {}",
                    self.settings.form_state_name, e
                );
                None
            }
        }
    }
}
