//! The client's stand-in for a browser tab: a session history that can be
//! pushed to and walked back and forth, and a cookie jar that survives
//! between runs in a profile file.

use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::{Cookie, CookieJar};
use std::fs;
use std::path::Path;

use crate::errors::WizardError;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![initial_url.into()],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    /// Path part of the current entry, without the query string.
    pub fn path(&self) -> &str {
        let url = self.current();
        url.split_once('?').map(|(p, _)| p).unwrap_or(url)
    }

    pub fn query(&self) -> &str {
        self.current().split_once('?').map(|(_, q)| q).unwrap_or("")
    }

    /// Adds an entry after the current one, dropping any forward entries.
    pub fn push(&mut self, url: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(url.into());
        self.cursor = self.entries.len() - 1;
    }

    pub fn replace(&mut self, url: impl Into<String>) {
        self.entries[self.cursor] = url.into();
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct BrowserContext {
    pub history: History,
    pub cookies: CookieJar,
}

impl BrowserContext {
    pub fn new(initial_url: impl Into<String>, cookies: CookieJar) -> Self {
        Self {
            history: History::new(initial_url),
            cookies,
        }
    }
}

/// Loads a cookie profile written by [`save_cookie_jar`]. Unreadable lines
/// and expired cookies are skipped; a missing file is an empty jar.
pub fn load_cookie_jar(path: &Path) -> CookieJar {
    let mut jar = CookieJar::new();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return jar,
        Err(e) => {
            log::warn!("Could not read cookie profile {}: {}. Starting fresh.", path.display(), e);
            return jar;
        }
    };

    let now = OffsetDateTime::now_utc();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        match Cookie::parse_encoded(line.to_string()) {
            Ok(cookie) => {
                if cookie.expires_datetime().map_or(false, |at| at <= now) {
                    log::debug!("Cookie '{}' has expired, dropping it.", cookie.name());
                    continue;
                }
                jar.add_original(cookie);
            }
            Err(e) => log::warn!("Skipping unreadable cookie line in {}: {}", path.display(), e),
        }
    }
    jar
}

pub fn save_cookie_jar(jar: &CookieJar, path: &Path) -> Result<(), WizardError> {
    let lines: Vec<String> = jar.iter().map(|c| c.encoded().to_string()).collect();
    fs::write(path, lines.join("\n"))?;
    Ok(())
}
