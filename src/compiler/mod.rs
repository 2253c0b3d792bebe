//! # Pattern Compiler
//!
//! Turns a [`ConfigTable`] into [`CompiledPatterns`]: the hierarchy order, the
//! item catalog, the marker table, and the base search lists the lexer swaps
//! between as it moves through the hierarchy.
//!
//! ## Table layout
//!
//! * `order` row: the tag followed by the process, object and attribute level
//!   names.
//! * `items` section: `(level, item)` rows up to the next tag row.
//! * `markers` section: `(item, start, end)` rows up to the end of the table or
//!   the first row with fewer than three cells.
//!
//! Sections must appear in that order.
//!
//! ## Errors
//!
//! Compilation stops at the first inconsistency and returns a
//! [`ConfigurationError`] naming the row or item at fault. No partially compiled
//! patterns are ever returned.

pub mod catalog;
pub mod markers;
pub mod search;

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

pub use catalog::{HierarchyOrder, ItemCatalog, Level};
pub use markers::{MarkerConflict, MarkerPair, MarkerTable};
pub use search::{SearchList, SearchLists};

use crate::table::{ConfigTable, RowTag};

/// Lookup structures derived once from a [`ConfigTable`].
///
/// Immutable after construction, so one instance can back any number of
/// concurrent scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPatterns {
    order: HierarchyOrder,
    catalog: ItemCatalog,
    markers: MarkerTable,
    search: SearchLists,
}

impl CompiledPatterns {
    #[tracing::instrument(level = "debug", skip(table), fields(rows = table.len()))]
    pub fn compile(table: &ConfigTable) -> CompileResult<Self> {
        let sections = Sections::locate(table)?;
        let rows = table.rows();

        let order = extract_order(&rows[sections.order])?;
        let catalog = extract_items(rows, sections.items, &order)?;
        let markers = extract_markers(rows, sections.markers, &catalog)?;
        check_coverage(&catalog, &markers)?;
        let search = build_search_lists(&catalog, &markers)?;

        debug!(
            objects = catalog.items(Level::Object).len(),
            attributes = catalog.items(Level::Attribute).len(),
            "patterns compiled"
        );

        Ok(Self {
            order,
            catalog,
            markers,
            search,
        })
    }

    pub fn order(&self) -> &HierarchyOrder {
        &self.order
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    pub fn search_lists(&self) -> &SearchLists {
        &self.search
    }

    /// The single process item.
    pub fn process_item(&self) -> &str {
        &self.catalog.items(Level::Process)[0]
    }

    /// Search list used while `attribute` is open: its own end marker, then
    /// every object's end and start marker so an unterminated attribute cannot
    /// swallow the structure that follows it.
    pub fn attribute_search_list(&self, attribute: &str) -> CompileResult<SearchList> {
        let own = self
            .markers
            .get(attribute)
            .ok_or_else(|| ConfigurationError::MissingMarkers {
                item: attribute.to_string(),
            })?;
        let mut list = SearchList::new();
        list.push(&own.end);
        for object in self.catalog.items(Level::Object) {
            let pair = self.marker_pair(object)?;
            list.push(&pair.end);
            list.push(&pair.start);
        }
        Ok(list)
    }

    fn marker_pair(&self, item: &str) -> CompileResult<&MarkerPair> {
        self.markers
            .get(item)
            .ok_or_else(|| ConfigurationError::MissingMarkers {
                item: item.to_string(),
            })
    }
}

/// Row indexes of the three section header rows.
struct Sections {
    order: usize,
    items: usize,
    markers: usize,
}

impl Sections {
    fn locate(table: &ConfigTable) -> CompileResult<Self> {
        let mut found: HashMap<RowTag, usize> = HashMap::new();
        for (index, row) in table.rows().iter().enumerate() {
            if let Some(tag) = RowTag::of(row) {
                if let Some(first) = found.insert(tag, index) {
                    return Err(ConfigurationError::DuplicateSection {
                        section: tag,
                        first,
                        row: index,
                    });
                }
            }
        }

        let position = |tag: RowTag| {
            found
                .get(&tag)
                .copied()
                .ok_or(ConfigurationError::MissingSection { section: tag })
        };
        let sections = Self {
            order: position(RowTag::Order)?,
            items: position(RowTag::Items)?,
            markers: position(RowTag::Markers)?,
        };

        if sections.order > sections.items {
            return Err(ConfigurationError::SectionOrder {
                section: RowTag::Order,
                before: RowTag::Items,
            });
        }
        if sections.items > sections.markers {
            return Err(ConfigurationError::SectionOrder {
                section: RowTag::Items,
                before: RowTag::Markers,
            });
        }
        Ok(sections)
    }
}

/// Cells of `row` without trailing empty cells.
fn cells(row: &[String]) -> &[String] {
    let len = row
        .iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1);
    &row[..len]
}

fn extract_order(row: &[String]) -> CompileResult<HierarchyOrder> {
    let names: Vec<&str> = cells(row)[1..]
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect();
    match names.as_slice() {
        [process, object, attribute]
            if process != object && object != attribute && process != attribute =>
        {
            Ok(HierarchyOrder::new(*process, *object, *attribute))
        }
        _ => Err(ConfigurationError::InvalidOrder {
            names: names.iter().map(|name| name.to_string()).collect(),
        }),
    }
}

fn extract_items(
    rows: &[Vec<String>],
    header: usize,
    order: &HierarchyOrder,
) -> CompileResult<ItemCatalog> {
    let mut catalog = ItemCatalog::new();
    for (index, row) in rows.iter().enumerate().skip(header + 1) {
        if RowTag::of(row).is_some() {
            break;
        }
        let row_cells = cells(row);
        if row_cells.is_empty() {
            continue;
        }
        let (level_name, item) = match row_cells {
            [level, item, ..] if !item.trim().is_empty() => (level.trim(), item.trim()),
            _ => {
                return Err(ConfigurationError::MalformedRow {
                    row: index,
                    section: RowTag::Items,
                    expected: 2,
                })
            }
        };
        let level = order
            .level_of(level_name)
            .ok_or_else(|| ConfigurationError::UnknownLevel {
                row: index,
                level: level_name.to_string(),
            })?;
        catalog
            .insert(level, item)
            .map_err(|existing| ConfigurationError::DuplicateItem {
                row: index,
                item: item.to_string(),
                existing,
                level,
            })?;
    }
    Ok(catalog)
}

fn extract_markers(
    rows: &[Vec<String>],
    header: usize,
    catalog: &ItemCatalog,
) -> CompileResult<MarkerTable> {
    let mut markers = MarkerTable::new();
    for (index, row) in rows.iter().enumerate().skip(header + 1) {
        let row_cells = cells(row);
        let [item, start, end, ..] = row_cells else {
            debug!(row = index, "marker section ends at short row");
            break;
        };
        if RowTag::of(row).is_some() {
            break;
        }
        let item = item.trim();
        let Some(level) = catalog.level_of(item) else {
            return Err(ConfigurationError::UncatalogedItem {
                row: index,
                item: item.to_string(),
            });
        };
        if start.is_empty() || end.is_empty() {
            return Err(ConfigurationError::EmptyMarker {
                row: index,
                item: item.to_string(),
            });
        }
        // Items on one level never have two scopes open at once, so only a
        // cross-level end marker can be closed by two owners.
        if let Some(owner) = markers
            .end_owners(end)
            .iter()
            .find(|owner| catalog.level_of(owner) != Some(level))
        {
            return Err(ConfigurationError::SharedEnd {
                row: index,
                marker: end.clone(),
                first: owner.clone(),
                second: item.to_string(),
            });
        }
        markers
            .insert(item, MarkerPair::new(start.as_str(), end.as_str()))
            .map_err(|conflict| match conflict {
                MarkerConflict::DuplicateItem => ConfigurationError::DuplicateMarkers {
                    row: index,
                    item: item.to_string(),
                },
                MarkerConflict::SharedStart { owner } => ConfigurationError::AmbiguousMarker {
                    row: index,
                    marker: start.clone(),
                    first: owner,
                    second: item.to_string(),
                },
            })?;
    }
    Ok(markers)
}

fn check_coverage(catalog: &ItemCatalog, markers: &MarkerTable) -> CompileResult<()> {
    let processes = catalog.items(Level::Process).len();
    if processes != 1 {
        return Err(ConfigurationError::ProcessItemCount { found: processes });
    }
    if let Some((_, item)) = catalog.iter().find(|(_, item)| markers.get(item).is_none()) {
        return Err(ConfigurationError::MissingMarkers {
            item: item.to_string(),
        });
    }
    Ok(())
}

fn build_search_lists(catalog: &ItemCatalog, markers: &MarkerTable) -> CompileResult<SearchLists> {
    let pair_of = |item: &str| {
        markers
            .get(item)
            .ok_or_else(|| ConfigurationError::MissingMarkers {
                item: item.to_string(),
            })
    };
    let mut lists = SearchLists::default();

    for level in Level::ALL {
        for item in catalog.items(level) {
            let pair = pair_of(item)?;
            match level {
                Level::Process => {
                    lists.prelude.push(&pair.start);
                    lists.prelude.push(&pair.end);
                    lists.idle.push(&pair.end);
                }
                Level::Object => {
                    lists.idle.push(&pair.start);
                    lists.idle.push(&pair.end);
                    lists.in_object.push(&pair.start);
                    lists.in_object.push(&pair.end);
                }
                Level::Attribute => {
                    lists.in_object.push(&pair.start);
                }
            }
        }
    }
    Ok(lists)
}

pub type CompileResult<T> = Result<T, ConfigurationError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Pattern table has no `{section}` row")]
    MissingSection { section: RowTag },
    #[error("Pattern table repeats the `{section}` row (rows {first} and {row})")]
    DuplicateSection {
        section: RowTag,
        first: usize,
        row: usize,
    },
    #[error("The `{section}` section must come before `{before}`")]
    SectionOrder { section: RowTag, before: RowTag },
    #[error("The order row must name three distinct levels, found {names:?}")]
    InvalidOrder { names: Vec<String> },
    #[error("Row {row} in the `{section}` section needs at least {expected} cells")]
    MalformedRow {
        row: usize,
        section: RowTag,
        expected: usize,
    },
    #[error("Row {row} uses level `{level}` which is not in the order row")]
    UnknownLevel { row: usize, level: String },
    #[error("Row {row} puts item `{item}` at {level} level but it is already at {existing} level")]
    DuplicateItem {
        row: usize,
        item: String,
        existing: Level,
        level: Level,
    },
    #[error("Row {row} gives markers for `{item}` which is not listed under `items`")]
    UncatalogedItem { row: usize, item: String },
    #[error("Row {row} repeats the markers of `{item}`")]
    DuplicateMarkers { row: usize, item: String },
    #[error("Item `{item}` has no markers")]
    MissingMarkers { item: String },
    #[error("Row {row} gives `{item}` an empty marker")]
    EmptyMarker { row: usize, item: String },
    #[error("Row {row}: start marker {marker:?} of `{second}` is already the start of `{first}`")]
    AmbiguousMarker {
        row: usize,
        marker: String,
        first: String,
        second: String,
    },
    #[error("Row {row}: end marker {marker:?} of `{second}` also ends `{first}` on another level")]
    SharedEnd {
        row: usize,
        marker: String,
        first: String,
        second: String,
    },
    #[error("The process level must contain exactly one item, found {found}")]
    ProcessItemCount { found: usize },
}
