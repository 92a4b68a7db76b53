use std::sync::Arc;

use super::{Engine, Traversal};
use crate::persistence::{StateAdapter, StateSource, UrlAdapter};
use crate::state::FormState;

/// How far a replay got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    /// Slug of the step replay could not get past, if any.
    pub stopped_at: Option<String>,
}

impl Engine {
    /// Rebuilds the traversal from `target`, starting from the initial
    /// state and running every stored selection through the normal
    /// transition in authored step order.
    ///
    /// A step that is still hidden once all earlier selections are applied
    /// cannot be revealed by anything later, so replay stops there. So does
    /// a stored slug that no longer matches any option label. What was
    /// applied up to that point is kept.
    ///
    /// URL and cookie are written once, at the end. A replay of a URL only
    /// canonicalises the current history entry in place; it never pushes.
    pub fn replay(&mut self, target: &FormState, source: StateSource) -> ReplayReport {
        let document = Arc::clone(&self.document);
        self.traversal = Traversal::initial(&document);
        self.resolver.hide();
        self.suspended = true;

        let mut report = ReplayReport::default();
        for (index, step) in document.steps.iter().enumerate() {
            let slug = step.slug();
            let Some(option_slug) = target.get(&slug) else {
                continue;
            };
            if !self.traversal.is_visible(index) {
                log::debug!("Replay stops at hidden step '{}'.", slug);
                report.stopped_at = Some(slug);
                break;
            }
            let Some(option) = step.option_by_slug(option_slug) else {
                log::warn!(
                    "Stored answer '{}' for step '{}' matches no option; restoring stops here.",
                    option_slug, slug
                );
                report.stopped_at = Some(slug);
                break;
            };
            if let Err(e) = self.choose(index, option) {
                log::warn!("Replay stopped at step '{}': {}", slug, e);
                report.stopped_at = Some(slug);
                break;
            }
            report.applied += 1;
        }

        self.suspended = false;
        let state = self.form_state();
        match source {
            StateSource::Url => {
                let url = UrlAdapter::url_for(self.ctx.history.path(), &state);
                self.ctx.history.replace(url);
                self.persistence.cookie.write(&mut self.ctx, &state);
            }
            StateSource::Cookie => self.persistence.write(&mut self.ctx, &state),
        }
        report
    }
}
