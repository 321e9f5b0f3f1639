//! The per-user set of tag names.
//!
//! Names are stored trimmed and lowercased. The sentinel [`OTHER_TAG`] is
//! always present and is kept at the end of the list; every other tag keeps
//! its insertion order.

use crate::error::CoreError;

/// Sentinel tag that receives tasks whose tag was deleted.
pub const OTHER_TAG: &str = "other";

/// Tags a brand-new user starts with.
pub const STARTER_TAGS: [&str; 8] = [
    "work",
    "personal",
    "health",
    "finance",
    "education",
    "social",
    "home",
    OTHER_TAG,
];

/// Trims and lowercases a tag name, rejecting names that end up empty.
pub fn normalize_tag(name: &str) -> Result<String, CoreError> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CoreError::InvalidInput("Tag name cannot be empty".to_string()));
    }
    Ok(normalized)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRegistry {
    tags: Vec<String>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self {
            tags: vec![OTHER_TAG.to_string()],
        }
    }
}

impl TagRegistry {
    /// Builds a registry from raw names, dropping blanks and duplicates and
    /// adding the sentinel if it is missing.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in names {
            if let Ok(name) = normalize_tag(name.as_ref()) {
                registry.insert(name);
            }
        }
        registry
    }

    pub fn starter() -> Self {
        Self::from_names(STARTER_TAGS)
    }

    /// Current tags in their stable display order, sentinel last.
    pub fn list(&self) -> Vec<String> {
        self.tags.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Membership test on the normalized form of `name`.
    pub fn contains(&self, name: &str) -> bool {
        let needle = name.trim().to_lowercase();
        self.tags.iter().any(|t| *t == needle)
    }

    /// Inserts an already-normalized name. Returns `false` if it was present.
    pub(crate) fn insert(&mut self, name: String) -> bool {
        if self.tags.contains(&name) {
            return false;
        }
        let at = self
            .tags
            .iter()
            .position(|t| t == OTHER_TAG)
            .unwrap_or(self.tags.len());
        self.tags.insert(at, name);
        true
    }

    /// Removes an already-normalized name and returns the index it held so a
    /// rollback can put it back in place.
    pub(crate) fn remove(&mut self, name: &str) -> Result<Option<usize>, CoreError> {
        if name == OTHER_TAG {
            return Err(CoreError::ProtectedTag(name.to_string()));
        }
        let index = self.tags.iter().position(|t| t == name);
        if let Some(index) = index {
            self.tags.remove(index);
        }
        Ok(index)
    }

    pub(crate) fn restore(&mut self, name: String, index: usize) {
        if self.tags.contains(&name) {
            return;
        }
        let index = index.min(self.tags.len());
        self.tags.insert(index, name);
    }
}
