use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Step slug -> option slug, for every visible answered step.
///
/// Always recomputed from the traversal state, never patched in place.
/// Entries keep the order they were inserted in, which the engine makes
/// the authored step order so URLs read in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    entries: Vec<(String, String)>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the selection for `step_slug`.
    pub fn insert(&mut self, step_slug: impl Into<String>, option_slug: impl Into<String>) {
        let step_slug = step_slug.into();
        let option_slug = option_slug.into();
        match self.entries.iter_mut().find(|(k, _)| *k == step_slug) {
            Some(entry) => entry.1 = option_slug,
            None => self.entries.push((step_slug, option_slug)),
        }
    }

    pub fn get(&self, step_slug: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == step_slug)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = FormState::new();
        for (k, v) in iter {
            state.insert(k, v);
        }
        state
    }
}

impl Serialize for FormState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FormState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormStateVisitor;

        impl<'de> Visitor<'de> for FormStateVisitor {
            type Value = FormState;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of step slugs to option slugs")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<FormState, M::Error> {
                let mut state = FormState::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    state.insert(k, v);
                }
                Ok(state)
            }
        }

        deserializer.deserialize_map(FormStateVisitor)
    }
}
