//! Arena of views shared by the grid and its content.
//!
//! Views live in a [`ViewTree`] keyed by [`ViewId`]. Each view has at most one
//! superview and an ordered list of subviews. Moving a view under a new
//! superview detaches it from the old one and drops its edge pins, so a view
//! can be reparented into and out of cells any number of times.
//!
//! Content controllers and grid cells share one tree through
//! [`SharedViewTree`].
//!
//! # Example
//!
//! ```
//! use scrollgrid::view_tree::{Edge, SharedViewTree};
//!
//! let tree = SharedViewTree::new();
//! let cell = tree.create_view("cell");
//! let content = tree.create_view("content");
//!
//! tree.add_subview(cell, content).unwrap();
//! tree.pin_edges_to_superview(content).unwrap();
//!
//! assert_eq!(tree.superview(content).unwrap(), Some(cell));
//! assert_eq!(tree.pinned_edges(content).unwrap(), Edge::ALL.to_vec());
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use scrollgrid_core::logging::targets;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A stable identifier for a view in a [`ViewTree`].
    ///
    /// Becomes invalid once the view is destroyed.
    pub struct ViewId;
}

/// Errors from view tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ViewTreeError {
    /// The view ID is invalid or has been destroyed.
    #[error("Invalid or destroyed view ID")]
    InvalidViewId,
    /// Attempted to add a view under itself or one of its descendants.
    #[error("Cannot add a view to itself or its own descendant")]
    CircularHierarchy,
    /// Edge pins need a superview to pin against.
    #[error("View has no superview to pin to")]
    NoSuperview,
}

/// Result type for view tree operations.
pub type ViewResult<T> = std::result::Result<T, ViewTreeError>;

/// An edge of a view, pinned flush to the same edge of its superview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Leading,
    Trailing,
    Top,
    Bottom,
}

impl Edge {
    /// Every edge, in pin order.
    pub const ALL: [Edge; 4] = [Edge::Leading, Edge::Trailing, Edge::Top, Edge::Bottom];
}

struct ViewData {
    name: String,
    superview: Option<ViewId>,
    subviews: Vec<ViewId>,
    pinned: Vec<Edge>,
}

impl ViewData {
    fn new(name: String) -> Self {
        Self {
            name,
            superview: None,
            subviews: Vec::new(),
            pinned: Vec::new(),
        }
    }
}

/// The view arena.
#[derive(Default)]
pub struct ViewTree {
    views: SlotMap<ViewId, ViewData>,
}

impl ViewTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached view.
    pub fn create_view(&mut self, name: impl Into<String>) -> ViewId {
        let id = self.views.insert(ViewData::new(name.into()));
        tracing::trace!(target: targets::VIEW_TREE, ?id, "created view");
        id
    }

    /// Remove a view and all its descendants.
    pub fn destroy(&mut self, id: ViewId) -> ViewResult<()> {
        let mut doomed = Vec::new();
        self.collect_descendants(id, &mut doomed)?;
        self.detach(id);
        for view in doomed {
            self.views.remove(view);
        }
        self.views.remove(id);
        Ok(())
    }

    fn collect_descendants(&self, id: ViewId, out: &mut Vec<ViewId>) -> ViewResult<()> {
        let data = self.views.get(id).ok_or(ViewTreeError::InvalidViewId)?;
        for &child in &data.subviews {
            self.collect_descendants(child, out)?;
            out.push(child);
        }
        Ok(())
    }

    /// Check if a view exists.
    pub fn contains(&self, id: ViewId) -> bool {
        self.views.contains_key(id)
    }

    /// Move `child` to the end of `parent`'s subviews.
    ///
    /// The child leaves its previous superview and loses its edge pins.
    pub fn add_subview(&mut self, parent: ViewId, child: ViewId) -> ViewResult<()> {
        if !self.views.contains_key(parent) || !self.views.contains_key(child) {
            return Err(ViewTreeError::InvalidViewId);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(ViewTreeError::CircularHierarchy);
        }

        self.detach(child);
        if let Some(data) = self.views.get_mut(child) {
            data.superview = Some(parent);
        }
        if let Some(data) = self.views.get_mut(parent) {
            data.subviews.push(child);
        }
        Ok(())
    }

    /// Detach a view from its superview. Does nothing for a root view.
    pub fn remove_from_superview(&mut self, id: ViewId) -> ViewResult<()> {
        if !self.views.contains_key(id) {
            return Err(ViewTreeError::InvalidViewId);
        }
        self.detach(id);
        Ok(())
    }

    fn detach(&mut self, id: ViewId) {
        let old_parent = self.views.get_mut(id).and_then(|data| {
            data.pinned.clear();
            data.superview.take()
        });
        if let Some(parent) = old_parent
            && let Some(parent_data) = self.views.get_mut(parent)
        {
            parent_data.subviews.retain(|&sub| sub != id);
        }
    }

    fn is_ancestor_of(&self, ancestor: ViewId, id: ViewId) -> bool {
        let mut current = Some(id);
        while let Some(view) = current {
            if view == ancestor {
                return true;
            }
            current = self.views.get(view).and_then(|d| d.superview);
        }
        false
    }

    /// Pin all four edges of a view to its superview.
    ///
    /// Pinning again replaces the previous pins.
    pub fn pin_edges_to_superview(&mut self, id: ViewId) -> ViewResult<()> {
        let data = self.views.get_mut(id).ok_or(ViewTreeError::InvalidViewId)?;
        if data.superview.is_none() {
            return Err(ViewTreeError::NoSuperview);
        }
        data.pinned = Edge::ALL.to_vec();
        Ok(())
    }

    /// Edges pinned to the superview.
    pub fn pinned_edges(&self, id: ViewId) -> ViewResult<&[Edge]> {
        self.views
            .get(id)
            .map(|d| d.pinned.as_slice())
            .ok_or(ViewTreeError::InvalidViewId)
    }

    /// The superview, if any.
    pub fn superview(&self, id: ViewId) -> ViewResult<Option<ViewId>> {
        self.views
            .get(id)
            .map(|d| d.superview)
            .ok_or(ViewTreeError::InvalidViewId)
    }

    /// Direct subviews in insertion order.
    pub fn subviews(&self, id: ViewId) -> ViewResult<&[ViewId]> {
        self.views
            .get(id)
            .map(|d| d.subviews.as_slice())
            .ok_or(ViewTreeError::InvalidViewId)
    }

    /// The view's debug name.
    pub fn name(&self, id: ViewId) -> ViewResult<&str> {
        self.views
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(ViewTreeError::InvalidViewId)
    }
}

/// A thread-safe, cloneable handle to a [`ViewTree`].
#[derive(Clone, Default)]
pub struct SharedViewTree {
    inner: Arc<RwLock<ViewTree>>,
}

impl SharedViewTree {
    /// Create a handle to a new, empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the tree.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut ViewTree) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Create a detached view.
    pub fn create_view(&self, name: impl Into<String>) -> ViewId {
        self.inner.write().create_view(name)
    }

    /// Remove a view and its descendants.
    pub fn destroy(&self, id: ViewId) -> ViewResult<()> {
        self.inner.write().destroy(id)
    }

    /// Check if a view exists.
    pub fn contains(&self, id: ViewId) -> bool {
        self.inner.read().contains(id)
    }

    /// Move `child` under `parent`.
    pub fn add_subview(&self, parent: ViewId, child: ViewId) -> ViewResult<()> {
        self.inner.write().add_subview(parent, child)
    }

    /// Detach a view from its superview.
    pub fn remove_from_superview(&self, id: ViewId) -> ViewResult<()> {
        self.inner.write().remove_from_superview(id)
    }

    /// Pin all four edges of a view to its superview.
    pub fn pin_edges_to_superview(&self, id: ViewId) -> ViewResult<()> {
        self.inner.write().pin_edges_to_superview(id)
    }

    /// Edges pinned to the superview (owned copy).
    pub fn pinned_edges(&self, id: ViewId) -> ViewResult<Vec<Edge>> {
        self.inner.read().pinned_edges(id).map(<[Edge]>::to_vec)
    }

    /// The superview, if any.
    pub fn superview(&self, id: ViewId) -> ViewResult<Option<ViewId>> {
        self.inner.read().superview(id)
    }

    /// Direct subviews (owned copy).
    pub fn subviews(&self, id: ViewId) -> ViewResult<Vec<ViewId>> {
        self.inner.read().subviews(id).map(<[ViewId]>::to_vec)
    }

    /// The view's debug name (owned copy).
    pub fn name(&self, id: ViewId) -> ViewResult<String> {
        self.inner.read().name(id).map(str::to_owned)
    }
}
