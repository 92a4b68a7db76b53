use actix_web::cookie::CookieJar;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::config::CookieSettings;
use crate::persistence::cookie::{expire_cookie, persistent_cookie};

/// The anonymous id every usage event is filed under. Lives in its own
/// cookie so it survives across visits.
pub struct SessionId {
    settings: CookieSettings,
}

impl SessionId {
    pub fn new(settings: CookieSettings) -> Self {
        Self { settings }
    }

    pub fn generate() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("wf_{}_{}", millis, Uuid::new_v4().simple())
    }

    /// Returns the stored id, creating and storing one if there is none.
    pub fn get_or_create(&self, jar: &mut CookieJar) -> String {
        if let Some(existing) = jar.get(&self.settings.session_name) {
            if !existing.value().is_empty() {
                return existing.value().to_string();
            }
        }
        let id = Self::generate();
        log::debug!("New session id {}", id);
        jar.add(persistent_cookie(&self.settings, &self.settings.session_name, id.clone()));
        id
    }

    /// Forgets the current id and stores a fresh one.
    pub fn regenerate(&self, jar: &mut CookieJar) -> String {
        expire_cookie(jar, &self.settings, &self.settings.session_name);
        self.get_or_create(jar)
    }
}
