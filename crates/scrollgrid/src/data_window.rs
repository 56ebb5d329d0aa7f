//! The ordered content sequence and its grid index mapping.

use crate::content::ContentHandle;
use crate::error::{GridError, Result};

/// A cell position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    pub section: usize,
    pub row: usize,
}

impl GridPosition {
    /// Create a new position.
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }
}

/// Ordered content handles, in display order.
///
/// Both mutations replace the structure wholesale; callers reload the grid
/// afterwards rather than applying incremental diffs.
#[derive(Debug, Default, Clone)]
pub struct DataWindow {
    handles: Vec<ContentHandle>,
}

impl DataWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence.
    pub fn replace_all(&mut self, handles: Vec<ContentHandle>) {
        self.handles = handles;
    }

    /// Append handles to the end of the sequence.
    pub fn append(&mut self, handles: impl IntoIterator<Item = ContentHandle>) {
        self.handles.extend(handles);
    }

    /// The handles in display order.
    pub fn handles(&self) -> &[ContentHandle] {
        &self.handles
    }

    /// Number of handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the window holds no handles.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of sections needed to show every handle.
    pub fn section_count(&self, items_per_section: usize) -> usize {
        if items_per_section == 0 {
            return 0;
        }
        self.handles.len().div_ceil(items_per_section)
    }

    /// Linear index of a grid position.
    #[inline]
    pub fn index_for(position: GridPosition, items_per_section: usize) -> usize {
        position.section * items_per_section + position.row
    }

    /// The handle at a linear index.
    pub fn handle_at(&self, index: usize) -> Result<&ContentHandle> {
        self.handles.get(index).ok_or(GridError::IndexOutOfRange {
            index,
            count: self.handles.len(),
        })
    }
}
