use crate::errors::WizardError;
use crate::state::FormState;
use crate::wizard::{Target, WizardDocument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepState {
    pub visible: bool,
    pub selected: Option<usize>,
}

/// What the view should bring into focus after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Step(usize),
    Recommendation,
}

/// Where a selection led.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Step(usize),
    /// The recommendation panel opens. `fallback` is set when the path
    /// simply ran out (unknown target, or no target on the last step).
    Complete {
        recommendations: Vec<String>,
        fallback: bool,
    },
}

/// Visibility and selection for every step, plus focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    steps: Vec<StepState>,
    focus: Focus,
    completed: bool,
}

impl Traversal {
    /// First step visible, everything else hidden, nothing selected.
    pub fn initial(document: &WizardDocument) -> Self {
        let mut steps = vec![StepState::default(); document.steps.len()];
        if let Some(first) = steps.first_mut() {
            first.visible = true;
        }
        Self {
            steps,
            focus: Focus::Step(0),
            completed: false,
        }
    }

    pub fn check(&self, document: &WizardDocument, step: usize, option: usize) -> Result<(), WizardError> {
        let state = self
            .steps
            .get(step)
            .ok_or_else(|| WizardError::InvalidSelection(format!("there is no step #{}", step + 1)))?;
        if !state.visible {
            return Err(WizardError::InvalidSelection(format!(
                "step '{}' is not visible",
                document.steps[step].id
            )));
        }
        if option >= document.steps[step].options.len() {
            return Err(WizardError::InvalidSelection(format!(
                "step '{}' has no option #{}",
                document.steps[step].id,
                option + 1
            )));
        }
        Ok(())
    }

    /// Records the selection on `step` and hides and clears every step
    /// after it. The panel counts as closed until [`Traversal::advance`]
    /// says otherwise.
    pub fn begin(&mut self, document: &WizardDocument, step: usize, option: usize) -> Result<(), WizardError> {
        self.check(document, step, option)?;
        self.steps[step].selected = Some(option);
        for later in self.steps.iter_mut().skip(step + 1) {
            *later = StepState::default();
        }
        self.completed = false;
        self.focus = Focus::Step(step);
        Ok(())
    }

    /// Follows the target of the option selected by [`Traversal::begin`].
    pub fn advance(&mut self, document: &WizardDocument, step: usize, option: usize) -> Advance {
        let choice = &document.steps[step].options[option];
        let complete = |fallback| Advance::Complete {
            recommendations: choice.recommendations.clone(),
            fallback,
        };

        let advance = match &choice.target {
            Target::Recommendation => complete(false),
            Target::Step(id) => match document.step_index(id) {
                Some(index) => Advance::Step(index),
                None => {
                    log::warn!(
                        "Option '{}' on step '{}' targets unknown step '{}'; showing recommendations.",
                        choice.id, document.steps[step].id, id
                    );
                    complete(true)
                }
            },
            Target::Sequential if step + 1 < document.steps.len() => Advance::Step(step + 1),
            Target::Sequential => complete(true),
        };

        match &advance {
            Advance::Step(index) => {
                self.steps[*index].visible = true;
                self.focus = Focus::Step(*index);
            }
            Advance::Complete { .. } => {
                self.completed = true;
                self.focus = Focus::Recommendation;
            }
        }
        advance
    }

    pub fn steps(&self) -> &[StepState] {
        &self.steps
    }

    pub fn is_visible(&self, step: usize) -> bool {
        self.steps.get(step).map_or(false, |s| s.visible)
    }

    pub fn selected(&self, step: usize) -> Option<usize> {
        self.steps.get(step).and_then(|s| s.selected)
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn answered_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.visible && s.selected.is_some())
            .count()
    }

    /// Slugs of every visible answered step, in authored order.
    pub fn form_state(&self, document: &WizardDocument) -> FormState {
        let mut state = FormState::new();
        for (step, state_of_step) in document.steps.iter().zip(&self.steps) {
            if !state_of_step.visible {
                continue;
            }
            if let Some(option) = state_of_step.selected.and_then(|o| step.options.get(o)) {
                state.insert(step.slug(), option.slug());
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::fixtures::{self, choice, step};

    fn select(t: &mut Traversal, doc: &WizardDocument, s: usize, o: usize) -> Advance {
        t.begin(doc, s, o).unwrap();
        t.advance(doc, s, o)
    }

    #[test]
    fn test_initial_state() {
        let doc = fixtures::shoes();
        let t = Traversal::initial(&doc);
        assert!(t.is_visible(0));
        assert!(!t.is_visible(1));
        assert!(!t.is_visible(2));
        assert_eq!(t.focus(), Focus::Step(0));
        assert!(t.form_state(&doc).is_empty());
    }

    #[test]
    fn test_explicit_target_reveals_step() {
        let doc = fixtures::shoes();
        let mut t = Traversal::initial(&doc);
        assert_eq!(select(&mut t, &doc, 0, 0), Advance::Step(1));
        assert!(t.is_visible(1));
        assert_eq!(t.focus(), Focus::Step(1));
        assert_eq!(t.answered_count(), 1);
    }

    #[test]
    fn test_recommendation_target_completes() {
        let doc = fixtures::shoes();
        let mut t = Traversal::initial(&doc);
        select(&mut t, &doc, 0, 0);
        let advance = select(&mut t, &doc, 1, 0);
        assert_eq!(
            advance,
            Advance::Complete { recommendations: vec!["r1".into()], fallback: false }
        );
        assert!(t.is_completed());
        assert_eq!(t.focus(), Focus::Recommendation);
    }

    #[test]
    fn test_reselect_hides_and_clears_later_steps() {
        let doc = fixtures::shoes();
        let mut t = Traversal::initial(&doc);
        select(&mut t, &doc, 0, 0);
        select(&mut t, &doc, 1, 1);
        select(&mut t, &doc, 2, 0);
        assert_eq!(t.answered_count(), 3);

        select(&mut t, &doc, 0, 1);
        assert_eq!(t.selected(0), Some(1));
        assert!(t.is_visible(1));
        assert_eq!(t.selected(1), None);
        assert!(!t.is_visible(2));
        assert_eq!(t.selected(2), None);
        assert!(!t.is_completed());
    }

    #[test]
    fn test_hidden_step_and_unknown_option_are_rejected() {
        let doc = fixtures::shoes();
        let mut t = Traversal::initial(&doc);
        assert!(matches!(t.begin(&doc, 2, 0), Err(WizardError::InvalidSelection(_))));
        assert!(matches!(t.begin(&doc, 0, 9), Err(WizardError::InvalidSelection(_))));
        assert!(matches!(t.begin(&doc, 7, 0), Err(WizardError::InvalidSelection(_))));
        assert_eq!(t, Traversal::initial(&doc));
    }

    #[test]
    fn test_sequential_on_last_step_falls_back_to_completion() {
        let doc = fixtures::shoes();
        let mut t = Traversal::initial(&doc);
        select(&mut t, &doc, 0, 0);
        select(&mut t, &doc, 1, 1);
        let advance = select(&mut t, &doc, 2, 0);
        assert_eq!(advance, Advance::Complete { recommendations: vec![], fallback: true });
    }

    #[test]
    fn test_unknown_target_falls_back_to_completion() {
        let mut doc = fixtures::shoes();
        doc.steps[0].options[0].target = Target::Step("ghost".into());
        let mut t = Traversal::initial(&doc);
        let advance = select(&mut t, &doc, 0, 0);
        assert!(matches!(advance, Advance::Complete { fallback: true, .. }));
        assert!(!t.is_visible(1));
    }

    #[test]
    fn test_forward_jump_skips_steps() {
        let mut doc = fixtures::shoes();
        doc.steps[0].options[1].target = Target::Step("budget".into());
        let mut t = Traversal::initial(&doc);
        assert_eq!(select(&mut t, &doc, 0, 1), Advance::Step(2));
        assert!(!t.is_visible(1));
        assert!(t.is_visible(2));

        select(&mut t, &doc, 2, 0);
        let pairs: Vec<(String, String)> = t
            .form_state(&doc)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("size".into(), "large".into()), ("budget".into(), "low".into())]
        );
    }

    #[test]
    fn test_backward_jump_moves_focus() {
        let doc = WizardDocument {
            steps: vec![
                step("a", "A", vec![choice("x", "X", Target::Sequential, &[])]),
                step("b", "B", vec![choice("y", "Y", Target::Step("a".into()), &[])]),
            ],
            ..Default::default()
        };
        let mut t = Traversal::initial(&doc);
        select(&mut t, &doc, 0, 0);
        assert_eq!(select(&mut t, &doc, 1, 0), Advance::Step(0));
        assert_eq!(t.focus(), Focus::Step(0));
        assert_eq!(t.answered_count(), 2);
    }
}
