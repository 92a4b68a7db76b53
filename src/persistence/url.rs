use super::StateAdapter;
use crate::browser::BrowserContext;
use crate::state::FormState;

/// Mirrors the form state into the query string of the current history
/// entry, one `step=option` pair per answered step.
pub struct UrlAdapter {
    step_slugs: Vec<String>,
}

impl UrlAdapter {
    pub fn new(step_slugs: Vec<String>) -> Self {
        Self { step_slugs }
    }

    pub fn encode(state: &FormState) -> String {
        let pairs: Vec<(&str, &str)> = state.iter().collect();
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }

    /// Full URL for `state` on `path`. An empty state is the bare path.
    pub fn url_for(path: &str, state: &FormState) -> String {
        if state.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, Self::encode(state))
        }
    }

    /// Parses a query string. Keys that are not step slugs are ignored and
    /// the first value of a repeated key wins. The result follows authored
    /// step order.
    ///
    /// An empty value answers nothing and is dropped. A query that names a
    /// step only with empty values still counts as URL state, so it decodes
    /// to an empty state rather than to `None`.
    pub fn decode(&self, query: &str) -> Option<FormState> {
        let query = query.trim_start_matches('?');
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                log::warn!("Ignoring unreadable query string '{}': {}", query, e);
                return None;
            }
        };

        let mut state = FormState::new();
        let mut named = false;
        for slug in &self.step_slugs {
            if let Some((_, value)) = pairs.iter().find(|(k, _)| k == slug) {
                named = true;
                if !value.is_empty() {
                    state.insert(slug.clone(), value.clone());
                }
            }
        }
        if named { Some(state) } else { None }
    }

    pub fn decode_url(&self, url: &str) -> Option<FormState> {
        url.split_once('?').and_then(|(_, query)| self.decode(query))
    }
}

impl StateAdapter for UrlAdapter {
    fn write(&self, ctx: &mut BrowserContext, state: &FormState) {
        let url = Self::url_for(ctx.history.path(), state);
        if url != ctx.history.current() {
            log::debug!("History push: {}", url);
            ctx.history.push(url);
        }
    }

    fn read(&self, ctx: &BrowserContext) -> Option<FormState> {
        self.decode(ctx.history.query())
    }
}
