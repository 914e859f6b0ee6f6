//! Field selection (prefetch tree)
//!
//! Folds the requested field paths into a tree of segment names so record
//! sources load exactly the relation hops an export needs:
//!
//! ```text
//! ["name", "partner_id/country_id/name", "partner_id/email"]
//!
//! name
//! partner_id
//! ├── country_id
//! │   └── name
//! └── email
//! ```
//!
//! The tree is finite, so materializing it never loops on cyclic relations
//! such as `res.partner.parent_id`.

use crate::domain::ids::FieldPath;
use std::collections::BTreeMap;

/// Tree of field names to load, one level per relation hop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    children: BTreeMap<String, FieldSelection>,
}

impl FieldSelection {
    /// Creates an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from field paths
    ///
    /// # Examples
    ///
    /// ```
    /// use sheets_export::core::selection::FieldSelection;
    /// use sheets_export::domain::FieldPath;
    ///
    /// let paths = vec![
    ///     FieldPath::new("name").unwrap(),
    ///     FieldPath::new("partner_id/country_id/name").unwrap(),
    /// ];
    /// let selection = FieldSelection::from_paths(&paths);
    /// assert_eq!(selection.fields().collect::<Vec<_>>(), vec!["name", "partner_id"]);
    /// assert_eq!(selection.depth(), 3);
    /// ```
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a FieldPath>) -> Self {
        let mut selection = Self::new();
        for path in paths {
            selection.insert_path(path);
        }
        selection
    }

    /// Adds every segment of a path
    pub fn insert_path(&mut self, path: &FieldPath) {
        let mut node = self;
        for segment in path.segments().filter(|s| !s.is_empty()) {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    /// Adds a top-level field
    pub fn insert_field(&mut self, field: &str) {
        if !field.is_empty() {
            self.children.entry(field.to_string()).or_default();
        }
    }

    /// Field names selected at this level, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Sub-selection below a field, if that field was selected
    pub fn child(&self, field: &str) -> Option<&FieldSelection> {
        self.children.get(field)
    }

    /// Whether the field was selected at this level
    pub fn contains(&self, field: &str) -> bool {
        self.children.contains_key(field)
    }

    /// Whether nothing is selected at this level
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Longest chain of segments in the tree
    pub fn depth(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }
}
