//! Attaching content views to reused cells.
//!
//! Every on-screen position moves through
//! `Detached -> Attaching -> Attached -> Detaching -> Detached`.
//! The manager keeps three invariants:
//!
//! - a cell hosts at most one content view,
//! - a position holds at most one handle,
//! - a handle is attached to at most one cell.
//!
//! Attaching first detaches whatever would break one of them, so repeated
//! attach/detach cycles at one position are idempotent.

use std::collections::HashMap;

use scrollgrid_core::logging::targets;

use crate::content::{ContentHandle, HostId};
use crate::data_window::GridPosition;
use crate::error::{GridError, Result};
use crate::view_tree::{SharedViewTree, ViewId};

/// Lifecycle state of one grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Detached,
    Attaching,
    Attached,
    Detaching,
}

#[derive(Debug)]
struct Slot {
    cell: ViewId,
    handle: ContentHandle,
    state: SlotState,
}

/// Tracks which content sits in which cell.
pub struct LifecycleManager {
    host: HostId,
    tree: SharedViewTree,
    slots: HashMap<GridPosition, Slot>,
    cell_positions: HashMap<ViewId, GridPosition>,
    children: Vec<ContentHandle>,
    stale_errors: Vec<GridError>,
}

impl LifecycleManager {
    /// Create a manager for `host`, moving views within `tree`.
    pub fn new(host: HostId, tree: SharedViewTree) -> Self {
        Self {
            host,
            tree,
            slots: HashMap::new(),
            cell_positions: HashMap::new(),
            children: Vec::new(),
            stale_errors: Vec::new(),
        }
    }

    /// The owning host.
    pub fn host(&self) -> HostId {
        self.host
    }

    /// Attach `handle` to `cell` at `position`.
    ///
    /// The cell's previous occupant, the position's previous handle and any
    /// other slot holding the same handle are detached first. A failure while
    /// detaching one of those does not stop the attach; the error is kept for
    /// [`take_stale_errors`](Self::take_stale_errors).
    pub fn attach(
        &mut self,
        cell: ViewId,
        position: GridPosition,
        handle: ContentHandle,
    ) -> Result<()> {
        if let Some(previous) = self.cell_positions.get(&cell).copied() {
            self.detach_stale(previous);
        }
        if self.slots.contains_key(&position) {
            self.detach_stale(position);
        }
        if let Some(elsewhere) = self.position_of(&handle) {
            self.detach_stale(elsewhere);
        }

        tracing::trace!(target: targets::LIFECYCLE, ?position, ?cell, "attaching content");
        self.slots.insert(
            position,
            Slot {
                cell,
                handle: handle.clone(),
                state: SlotState::Attaching,
            },
        );
        self.cell_positions.insert(cell, position);

        handle.controller().will_move_to_host(Some(self.host));
        if !self.children.iter().any(|child| child.ptr_eq(&handle)) {
            self.children.push(handle.clone());
        }

        let view = handle.view();
        let placed = self.tree.with_write(|tree| {
            tree.add_subview(cell, view)?;
            tree.pin_edges_to_superview(view)
        });
        if let Err(err) = placed {
            self.slots.remove(&position);
            self.cell_positions.remove(&cell);
            self.children.retain(|child| !child.ptr_eq(&handle));
            handle.controller().did_move_to_host(None);
            return Err(err.into());
        }

        if let Some(slot) = self.slots.get_mut(&position) {
            slot.state = SlotState::Attached;
        }
        handle.controller().did_move_to_host(Some(self.host));
        Ok(())
    }

    /// Detach whatever is attached at `position`.
    ///
    /// Returns `false` when the position was already empty.
    pub fn detach(&mut self, position: GridPosition) -> Result<bool> {
        let Some(slot) = self.slots.get_mut(&position) else {
            return Ok(false);
        };
        slot.state = SlotState::Detaching;
        let cell = slot.cell;
        let handle = slot.handle.clone();
        tracing::trace!(target: targets::LIFECYCLE, ?position, ?cell, "detaching content");

        handle.controller().will_move_to_host(None);
        let view = handle.view();
        // Only pull the view out if it is still in our cell.
        let removed = self.tree.with_write(|tree| match tree.superview(view) {
            Ok(Some(parent)) if parent == cell => tree.remove_from_superview(view),
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        });

        self.slots.remove(&position);
        if self.cell_positions.get(&cell) == Some(&position) {
            self.cell_positions.remove(&cell);
        }
        self.children.retain(|child| !child.ptr_eq(&handle));
        handle.controller().did_move_to_host(None);

        removed?;
        Ok(true)
    }

    // Bookkeeping is already clean when detach fails, so the caller can go on.
    fn detach_stale(&mut self, position: GridPosition) {
        if let Err(err) = self.detach(position) {
            tracing::warn!(target: targets::LIFECYCLE, ?position, %err, "stale occupant detach failed");
            self.stale_errors.push(err);
        }
    }

    /// Errors from detaching stale occupants during [`attach`](Self::attach),
    /// oldest first. Draining.
    pub fn take_stale_errors(&mut self) -> Vec<GridError> {
        std::mem::take(&mut self.stale_errors)
    }

    /// Lifecycle state of a position.
    pub fn state(&self, position: GridPosition) -> SlotState {
        self.slots
            .get(&position)
            .map_or(SlotState::Detached, |slot| slot.state)
    }

    /// The handle attached at a position.
    pub fn handle_at(&self, position: GridPosition) -> Option<&ContentHandle> {
        self.slots.get(&position).map(|slot| &slot.handle)
    }

    /// The handle whose view sits in `cell`.
    pub fn occupant(&self, cell: ViewId) -> Option<&ContentHandle> {
        self.cell_positions
            .get(&cell)
            .and_then(|position| self.handle_at(*position))
    }

    /// The position a handle is attached at.
    pub fn position_of(&self, handle: &ContentHandle) -> Option<GridPosition> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.handle.ptr_eq(handle))
            .map(|(position, _)| *position)
    }

    /// Number of attached positions.
    pub fn attached_count(&self) -> usize {
        self.slots.len()
    }

    /// Content currently registered as a logical child of the host.
    pub fn children(&self) -> &[ContentHandle] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentController;
    use crate::view_tree::Edge;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Recorder {
        view: ViewId,
        moves: Arc<Mutex<Vec<(&'static str, bool)>>>,
    }

    impl ContentController for Recorder {
        fn view(&self) -> ViewId {
            self.view
        }

        fn will_move_to_host(&self, host: Option<HostId>) {
            self.moves.lock().push(("will", host.is_some()));
        }

        fn did_move_to_host(&self, host: Option<HostId>) {
            self.moves.lock().push(("did", host.is_some()));
        }
    }

    fn setup() -> (SharedViewTree, LifecycleManager) {
        let tree = SharedViewTree::new();
        let manager = LifecycleManager::new(HostId::next(), tree.clone());
        (tree, manager)
    }

    fn recorder(tree: &SharedViewTree) -> (ContentHandle, Arc<Mutex<Vec<(&'static str, bool)>>>) {
        let moves = Arc::new(Mutex::new(Vec::new()));
        let handle = ContentHandle::new(Recorder {
            view: tree.create_view("content"),
            moves: moves.clone(),
        });
        (handle, moves)
    }

    #[test]
    fn test_attach_pins_view_into_cell() {
        let (tree, mut manager) = setup();
        let cell = tree.create_view("cell");
        let (handle, moves) = recorder(&tree);
        let position = GridPosition::new(0, 0);

        manager.attach(cell, position, handle.clone()).unwrap();

        assert_eq!(manager.state(position), SlotState::Attached);
        assert_eq!(tree.superview(handle.view()).unwrap(), Some(cell));
        assert_eq!(tree.pinned_edges(handle.view()).unwrap(), Edge::ALL.to_vec());
        assert_eq!(manager.children(), &[handle.clone()]);
        assert_eq!(manager.occupant(cell), Some(&handle));
        assert_eq!(*moves.lock(), vec![("will", true), ("did", true)]);
    }

    #[test]
    fn test_repeated_cycles_leave_no_duplicates() {
        let (tree, mut manager) = setup();
        let cell = tree.create_view("cell");
        let (handle, _) = recorder(&tree);
        let position = GridPosition::new(1, 2);

        for _ in 0..2 {
            manager.attach(cell, position, handle.clone()).unwrap();
            manager.attach(cell, position, handle.clone()).unwrap();
            assert_eq!(tree.subviews(cell).unwrap(), vec![handle.view()]);
            assert_eq!(manager.children().len(), 1);

            assert!(manager.detach(position).unwrap());
            assert!(!manager.detach(position).unwrap());
            assert!(tree.subviews(cell).unwrap().is_empty());
            assert!(manager.children().is_empty());
            assert_eq!(manager.state(position), SlotState::Detached);
        }
    }

    #[test]
    fn test_reused_cell_drops_previous_occupant() {
        let (tree, mut manager) = setup();
        let cell = tree.create_view("cell");
        let (first, first_moves) = recorder(&tree);
        let (second, _) = recorder(&tree);

        manager.attach(cell, GridPosition::new(0, 0), first.clone()).unwrap();
        manager.attach(cell, GridPosition::new(4, 0), second.clone()).unwrap();

        assert_eq!(tree.subviews(cell).unwrap(), vec![second.view()]);
        assert_eq!(tree.superview(first.view()).unwrap(), None);
        assert_eq!(manager.state(GridPosition::new(0, 0)), SlotState::Detached);
        assert_eq!(manager.attached_count(), 1);
        assert_eq!(
            *first_moves.lock(),
            vec![("will", true), ("did", true), ("will", false), ("did", false)]
        );
    }

    #[test]
    fn test_handle_never_in_two_cells() {
        let (tree, mut manager) = setup();
        let left = tree.create_view("left");
        let right = tree.create_view("right");
        let (handle, _) = recorder(&tree);

        manager.attach(left, GridPosition::new(0, 0), handle.clone()).unwrap();
        manager.attach(right, GridPosition::new(0, 1), handle.clone()).unwrap();

        assert!(tree.subviews(left).unwrap().is_empty());
        assert_eq!(tree.subviews(right).unwrap(), vec![handle.view()]);
        assert_eq!(manager.position_of(&handle), Some(GridPosition::new(0, 1)));
    }

    #[test]
    fn test_attach_survives_broken_previous_occupant() {
        let (tree, mut manager) = setup();
        let cell = tree.create_view("cell");
        let (first, _) = recorder(&tree);
        let (second, _) = recorder(&tree);

        manager.attach(cell, GridPosition::new(0, 0), first.clone()).unwrap();
        tree.destroy(first.view()).unwrap();
        manager.attach(cell, GridPosition::new(4, 0), second.clone()).unwrap();

        assert_eq!(tree.subviews(cell).unwrap(), vec![second.view()]);
        assert_eq!(manager.occupant(cell), Some(&second));
        assert_eq!(manager.state(GridPosition::new(0, 0)), SlotState::Detached);
        assert_eq!(manager.children(), &[second.clone()]);

        let errors = manager.take_stale_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], GridError::View(_)));
        assert!(manager.take_stale_errors().is_empty());
    }

    #[test]
    fn test_failed_attach_rolls_back() {
        let (tree, mut manager) = setup();
        let cell = tree.create_view("cell");
        let (handle, _) = recorder(&tree);
        tree.destroy(handle.view()).unwrap();

        assert!(manager.attach(cell, GridPosition::new(0, 0), handle).is_err());
        assert_eq!(manager.attached_count(), 0);
        assert!(manager.children().is_empty());
        assert!(manager.occupant(cell).is_none());
    }
}
