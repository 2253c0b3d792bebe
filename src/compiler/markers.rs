use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

impl MarkerPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Why a marker pair could not be added to a [`MarkerTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerConflict {
    /// The item already has markers.
    DuplicateItem,
    /// Another item already opens with the same start marker.
    SharedStart { owner: String },
}

/// Start/end markers of every item, with reverse indexes from marker text
/// back to the items using it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerTable {
    pairs: HashMap<String, MarkerPair>,
    items: Vec<String>,
    starts: HashMap<String, String>,
    ends: HashMap<String, Vec<String>>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: &str, pair: MarkerPair) -> Result<(), MarkerConflict> {
        if self.pairs.contains_key(item) {
            return Err(MarkerConflict::DuplicateItem);
        }
        if let Some(owner) = self.starts.get(&pair.start) {
            return Err(MarkerConflict::SharedStart {
                owner: owner.clone(),
            });
        }
        self.starts.insert(pair.start.clone(), item.to_string());
        self.ends
            .entry(pair.end.clone())
            .or_default()
            .push(item.to_string());
        self.items.push(item.to_string());
        self.pairs.insert(item.to_string(), pair);
        Ok(())
    }

    pub fn get(&self, item: &str) -> Option<&MarkerPair> {
        self.pairs.get(item)
    }

    /// The item opened by `marker`, if any. Start markers are unique.
    pub fn start_owner(&self, marker: &str) -> Option<&str> {
        self.starts.get(marker).map(String::as_str)
    }

    /// Every item closed by `marker`, in table order.
    pub fn end_owners(&self, marker: &str) -> &[String] {
        self.ends.get(marker).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items in the order their rows appeared.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
