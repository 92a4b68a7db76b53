//! Writing the form state to, and reading it back from, the two places it
//! outlives a single run: the URL query string and a cookie.

pub mod cookie;
pub mod url;

use crate::browser::BrowserContext;
use crate::state::FormState;

pub use self::cookie::CookieAdapter;
pub use self::url::UrlAdapter;

/// A place the form state can be written to and read back from.
pub trait StateAdapter {
    fn write(&self, ctx: &mut BrowserContext, state: &FormState);

    /// `None` when nothing usable is stored. Never fails: damaged data is
    /// logged and reported as absent.
    fn read(&self, ctx: &BrowserContext) -> Option<FormState>;
}

/// Where a restored state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    Url,
    Cookie,
}

impl StateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateSource::Url => "url",
            StateSource::Cookie => "cookie",
        }
    }
}

/// Both adapters, written together and read with URL precedence.
pub struct Persistence {
    pub url: UrlAdapter,
    pub cookie: CookieAdapter,
}

impl Persistence {
    pub fn new(url: UrlAdapter, cookie: CookieAdapter) -> Self {
        Self { url, cookie }
    }

    pub fn write(&self, ctx: &mut BrowserContext, state: &FormState) {
        self.url.write(ctx, state);
        self.cookie.write(ctx, state);
    }

    /// The URL wins whenever it carries at least one known step; the cookie
    /// is only consulted otherwise.
    pub fn load(&self, ctx: &BrowserContext) -> Option<(FormState, StateSource)> {
        if let Some(state) = self.url.read(ctx) {
            return Some((state, StateSource::Url));
        }
        self.cookie.read(ctx).map(|state| (state, StateSource::Cookie))
    }
}
