//! Signal/slot notifications for the UI loop.
//!
//! A [`Signal<Args>`] lives on the UI thread and notifies connected slots when
//! grid state changes. Slots are invoked either immediately during
//! [`emit`](Signal::emit) or deferred onto a [`UiLoop`](crate::UiLoop) pass.
//!
//! # Connection Types
//!
//! - **Direct**: Slot is called immediately inside `emit`.
//! - **Queued**: Slot is posted to the loop and runs on its next pass.
//!
//! # Example
//!
//! ```
//! use scrollgrid_core::Signal;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let count_changed = Signal::<usize>::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let sink = seen.clone();
//! let id = count_changed.connect(move |n| sink.set(*n));
//!
//! count_changed.emit(50);
//! assert_eq!(seen.get(), 50);
//!
//! count_changed.disconnect(id);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::event_loop::UiContext;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// Specifies how a connected slot is invoked when the signal is emitted.
#[derive(Clone, Default)]
pub enum ConnectionType {
    /// Invoke the slot immediately inside `emit`.
    #[default]
    Direct,
    /// Post the slot invocation to the given loop.
    Queued(UiContext),
}

impl std::fmt::Debug for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => f.write_str("Direct"),
            Self::Queued(_) => f.write_str("Queued"),
        }
    }
}

type Slot<Args> = Rc<dyn Fn(&Args)>;

struct Connection<Args> {
    slot: Slot<Args>,
    connection_type: ConnectionType,
}

/// A type-safe signal that can have multiple connected slots.
///
/// Use `()` for signals with no arguments.
pub struct Signal<Args> {
    connections: RefCell<SlotMap<ConnectionId, Connection<Args>>>,
}

impl<Args: Clone + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot that runs immediately when the signal is emitted.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Direct)
    }

    /// Connect a slot that runs on the next pass of the loop behind `ctx`.
    pub fn connect_queued<F>(&self, ctx: &UiContext, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Queued(ctx.clone()))
    }

    /// Connect a slot with a specific connection type.
    pub fn connect_with_type<F>(&self, slot: F, connection_type: ConnectionType) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.connections.borrow_mut().insert(Connection {
            slot: Rc::new(slot),
            connection_type,
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.borrow_mut().remove(id).is_some()
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// Slots may connect or disconnect other slots while running; such changes
    /// take effect from the next emission.
    #[tracing::instrument(skip_all, target = "scrollgrid_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        let snapshot: Vec<(Slot<Args>, ConnectionType)> = self
            .connections
            .borrow()
            .values()
            .map(|conn| (conn.slot.clone(), conn.connection_type.clone()))
            .collect();
        tracing::trace!(
            target: targets::SIGNAL,
            connection_count = snapshot.len(),
            "emitting signal"
        );

        for (slot, connection_type) in snapshot {
            match connection_type {
                ConnectionType::Direct => slot(&args),
                ConnectionType::Queued(ctx) => {
                    let args = args.clone();
                    if ctx.post(move || slot(&args)).is_err() {
                        tracing::warn!(
                            target: targets::SIGNAL,
                            "UI loop closed, dropping queued slot invocation"
                        );
                    }
                }
            }
        }
    }
}
