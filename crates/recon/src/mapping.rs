use std::collections::BTreeMap;

use crate::error::ReconError;

/// Learned measurement aliases: `"dim1-dim2"` → replacement measurement text.
///
/// Persisted as a flat JSON object. Tracks whether anything was learned since
/// it was loaded so the caller can skip a pointless write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementMapping {
    entries: BTreeMap<String, String>,
    dirty: bool,
}

impl MeasurementMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        if input.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries: BTreeMap<String, String> =
            serde_json::from_str(input).map_err(|e| ReconError::Mapping(e.to_string()))?;
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    /// Pretty-printed JSON object, keys in sorted order.
    pub fn to_json(&self) -> Result<String, ReconError> {
        serde_json::to_string_pretty(&self.entries).map_err(|e| ReconError::Mapping(e.to_string()))
    }

    pub fn get(&self, measurement_key: &str) -> Option<&str> {
        self.entries.get(measurement_key).map(String::as_str)
    }

    /// Measurement text to use for a key: the alias if one is known, else the
    /// key itself.
    pub fn resolve<'a>(&'a self, measurement_key: &'a str) -> &'a str {
        self.get(measurement_key).unwrap_or(measurement_key)
    }

    /// Record an alias. Returns the previous value, if any.
    pub fn insert(&mut self, measurement_key: impl Into<String>, alias: impl Into<String>) -> Option<String> {
        let key = measurement_key.into();
        let alias = alias.into();
        if self.entries.get(&key) == Some(&alias) {
            return Some(alias);
        }
        self.dirty = true;
        self.entries.insert(key, alias)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Call after the mapping has been written out.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
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
}
