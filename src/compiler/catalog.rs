use std::collections::HashMap;

/// Position in the three level hierarchy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Outermost scope, exactly one item.
    Process,
    /// Named node types that carry attributes.
    Object,
    /// Leaf fields whose text is captured.
    Attribute,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Process, Level::Object, Level::Attribute];

    pub fn depth(self) -> usize {
        match self {
            Level::Process => 0,
            Level::Object => 1,
            Level::Attribute => 2,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        Level::ALL.get(depth).copied()
    }
}

/// The configured names of the three levels, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyOrder {
    names: [String; 3],
}

impl HierarchyOrder {
    pub fn new(
        process: impl Into<String>,
        object: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            names: [process.into(), object.into(), attribute.into()],
        }
    }

    pub fn name(&self, level: Level) -> &str {
        &self.names[level.depth()]
    }

    pub fn level_of(&self, name: &str) -> Option<Level> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .and_then(Level::from_depth)
    }
}

/// Which items belong to which level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    items: [Vec<String>; 3],
    levels: HashMap<String, Level>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `item` at `level`.
    ///
    /// Returns the level the item is already registered at when it differs,
    /// leaving the catalog unchanged. Re-adding an item at its own level is a
    /// no-op.
    pub fn insert(&mut self, level: Level, item: &str) -> Result<(), Level> {
        match self.levels.get(item) {
            Some(existing) if *existing != level => Err(*existing),
            Some(_) => Ok(()),
            None => {
                self.levels.insert(item.to_string(), level);
                self.items[level.depth()].push(item.to_string());
                Ok(())
            }
        }
    }

    /// Items of `level` in the order they were first listed.
    pub fn items(&self, level: Level) -> &[String] {
        &self.items[level.depth()]
    }

    pub fn level_of(&self, item: &str) -> Option<Level> {
        self.levels.get(item).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Level, &str)> {
        Level::ALL.into_iter().flat_map(move |level| {
            self.items(level)
                .iter()
                .map(move |item| (level, item.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_depth_round_trip() {
        for level in Level::ALL {
            assert_eq!(Level::from_depth(level.depth()), Some(level));
        }
        assert_eq!(Level::from_depth(3), None);
        assert_eq!(Level::Attribute.to_string(), "attribute");
    }

    #[test]
    fn test_order_lookup() {
        let order = HierarchyOrder::new("doc", "record", "field");
        assert_eq!(order.name(Level::Object), "record");
        assert_eq!(order.level_of("field"), Some(Level::Attribute));
        assert_eq!(order.level_of("process"), None);
    }

    #[test]
    fn test_catalog_keeps_encounter_order() {
        let mut catalog = ItemCatalog::new();
        catalog.insert(Level::Object, "Person").unwrap();
        catalog.insert(Level::Attribute, "Name").unwrap();
        catalog.insert(Level::Object, "Address").unwrap();
        catalog.insert(Level::Object, "Person").unwrap();

        assert_eq!(catalog.items(Level::Object), &["Person", "Address"]);
        assert_eq!(catalog.level_of("Name"), Some(Level::Attribute));
        assert_eq!(catalog.insert(Level::Attribute, "Person"), Err(Level::Object));
        assert_eq!(
            catalog.iter().collect::<Vec<_>>(),
            vec![
                (Level::Object, "Person"),
                (Level::Object, "Address"),
                (Level::Attribute, "Name"),
            ]
        );
    }
}
