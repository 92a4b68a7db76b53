//! The wizard document: authored steps, their options and the
//! recommendation bundles they lead to.
//!
//! The document is read-only at traversal time. It is produced by
//! [`loader::parse_document`], which sanitizes ids and rejects documents
//! the traversal engine could not make sense of.

pub mod loader;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::slug::slugify;

pub const RECOMMENDATION_TARGET: &str = "RECOMMENDATION";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WizardDocument {
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub styles: Styles,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<Choice>,
}

/// One selectable answer on a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, rename = "target_step")]
    pub target: Target,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Where a selection leads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// No explicit target: the next step in authored order, or the
    /// recommendation panel when the option sits on the last step.
    #[default]
    Sequential,
    Recommendation,
    Step(String),
}

impl Target {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            Target::Sequential
        } else if raw == RECOMMENDATION_TARGET {
            Target::Recommendation
        } else {
            Target::Step(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Sequential => "",
            Target::Recommendation => RECOMMENDATION_TARGET,
            Target::Step(id) => id,
        }
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.map(|r| Target::parse(&r)).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Pre-rendered HTML shown above the bundle's content cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub content_ids: Vec<u64>,
}

/// Presentation settings. Only the results settings are interpreted
/// (by the card renderer); everything else is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Styles {
    #[serde(default = "default_excerpt_length")]
    pub results_excerpt_length: usize,
    #[serde(default = "default_true")]
    pub results_show_title: bool,
    #[serde(default = "default_true")]
    pub results_show_image: bool,
    #[serde(default = "default_true")]
    pub results_show_excerpt: bool,
    #[serde(flatten)]
    pub presentation: serde_json::Map<String, serde_json::Value>,
}

fn default_excerpt_length() -> usize {
    35
}

fn default_true() -> bool {
    true
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            results_excerpt_length: default_excerpt_length(),
            results_show_title: true,
            results_show_image: true,
            results_show_excerpt: true,
            presentation: serde_json::Map::new(),
        }
    }
}

impl Step {
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn option_index(&self, option_id: &str) -> Option<usize> {
        self.options.iter().position(|o| o.id == option_id)
    }

    /// First option, in authored order, whose label slugifies to `slug`.
    pub fn option_by_slug(&self, slug: &str) -> Option<usize> {
        self.options.iter().position(|o| o.slug() == slug)
    }
}

impl Choice {
    pub fn slug(&self) -> String {
        slugify(&self.label)
    }
}

impl WizardDocument {
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn step_slugs(&self) -> Vec<String> {
        self.steps.iter().map(Step::slug).collect()
    }

    pub fn recommendation(&self, id: &str) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
pub mod fixtures {
    //! Documents shared by the engine, persistence and resolver tests.
    use super::*;

    pub fn choice(id: &str, label: &str, target: Target, recs: &[&str]) -> Choice {
        Choice {
            id: id.to_string(),
            label: label.to_string(),
            description: None,
            image: None,
            target,
            recommendations: recs.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn step(id: &str, title: &str, options: Vec<Choice>) -> Step {
        Step {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            options,
        }
    }

    pub fn recommendation(id: &str, title: &str, content_ids: &[u64]) -> Recommendation {
        Recommendation {
            id: id.to_string(),
            title: Some(title.to_string()),
            content: Some(format!("<p>{}</p>", title)),
            content_ids: content_ids.to_vec(),
        }
    }

    /// Size -> Color -> RECOMMENDATION, with a sequential third step
    /// ("Budget") that only the "Red" option reaches.
    pub fn shoes() -> WizardDocument {
        WizardDocument {
            steps: vec![
                step(
                    "size",
                    "Size",
                    vec![
                        choice("small", "Small", Target::Step("color".into()), &[]),
                        choice("large", "Large", Target::Step("color".into()), &[]),
                    ],
                ),
                step(
                    "color",
                    "Color",
                    vec![
                        choice("blue", "Blue", Target::Recommendation, &["r1"]),
                        choice("red", "Red", Target::Sequential, &[]),
                    ],
                ),
                step(
                    "budget",
                    "Budget",
                    vec![
                        choice("low", "Low", Target::Sequential, &[]),
                        choice("high", "High", Target::Recommendation, &["r2"]),
                    ],
                ),
            ],
            recommendations: vec![
                recommendation("r1", "Blue runners", &[]),
                recommendation("r2", "Premium reds", &[]),
            ],
            styles: Styles::default(),
        }
    }
}
