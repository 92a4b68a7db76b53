//! The content items recommendations point at, as served to the card and
//! search endpoints.

use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::WizardError;

pub const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Content,
    Product,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub kind: EntryKind,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// HTML body; used for the excerpt when no excerpt is given.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// A missing file is an empty catalog: cards then simply fail to load.
    pub fn load(path: &Path) -> Result<Self, WizardError> {
        if !path.exists() {
            log::warn!("No catalog at {}; recommendation cards will be empty.", path.display());
            return Ok(Catalog::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, WizardError> {
        if content.trim().is_empty() {
            return Ok(Catalog::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Published entry `id`, if any.
    pub fn get(&self, id: u64) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id && e.published)
    }

    /// Published entries whose title contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Result<Vec<SearchHit>, WizardError> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Err(WizardError::BadRequest("please enter a search term".to_string()));
        }
        Ok(self
            .entries
            .iter()
            .filter(|e| e.published && e.title.to_lowercase().contains(&term))
            .take(SEARCH_LIMIT)
            .map(|e| SearchHit {
                id: e.id,
                title: e.title.clone(),
                url: e.url.clone(),
            })
            .collect())
    }
}

/// Visible text of an HTML fragment, whitespace collapsed.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment.root_element().text().collect();
    text.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The card excerpt: the entry's excerpt, or its body, without tags and
/// cut to `length` characters. Text that reaches the limit gets `...`.
/// A length of 0 keeps the whole text.
pub fn excerpt(entry: &CatalogEntry, length: usize) -> String {
    let source = entry
        .excerpt
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .or(entry.body.as_deref())
        .unwrap_or("");
    let text = strip_tags(source);
    if length == 0 || text.chars().count() < length {
        return text;
    }
    let mut cut: String = text.chars().take(length).collect();
    cut.push_str("...");
    cut
}
