/// Marker strings the scanner tests at one point of the scan.
///
/// Entries are kept in insertion order with duplicates removed, so two
/// distinct entries can never tie as longest match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchList {
    markers: Vec<String>,
}

impl SearchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, marker: &str) {
        if !self.contains(marker) {
            self.markers.push(marker.to_string());
        }
    }

    fn contains(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Longest entry that is a prefix of `rest`.
    pub fn longest_match(&self, rest: &str) -> Option<&str> {
        self.markers
            .iter()
            .filter(|marker| rest.starts_with(marker.as_str()))
            .max_by_key(|marker| marker.len())
            .map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for SearchList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = SearchList::new();
        for marker in iter {
            list.push(marker.as_ref());
        }
        list
    }
}

/// Base search lists shared by every scan over the same patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLists {
    /// Before the process opens: the process start and end markers.
    pub prelude: SearchList,
    /// Process open, no object: process end plus every object start and end.
    pub idle: SearchList,
    /// Inside an object: every object start and end plus every attribute start.
    pub in_object: SearchList,
}
