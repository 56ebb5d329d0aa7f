//! scrollgrid - a headless paging scroll grid.
//!
//! The grid lays out a list of content controllers in sections, creates cells
//! only for what is visible, and moves content views into and out of those
//! cells as the user scrolls. When few items remain past a cell that scrolled
//! away it asks the application for more, and a pull gesture runs an
//! application-supplied refresh.
//!
//! The pieces, bottom up:
//!
//! - [`layout`] computes item sizes and visible section ranges
//! - [`view_tree`] is the arena cells and content views live in
//! - [`GridView`] virtualizes cells over the content offset
//! - [`LifecycleManager`] attaches content to cells
//! - [`GridScrollController`] ties them to the UI loop
//!
//! Everything runs on the thread that owns a [`UiLoop`]. Only
//! [`UiSender`] and [`RefreshCompletion`] may cross threads.
//!
//! # Example
//!
//! ```
//! use scrollgrid::{
//!     ContentController, ContentHandle, ControllerOptions, GridScrollController, Size, UiLoop,
//!     view_tree::{SharedViewTree, ViewId},
//! };
//!
//! struct Tile(ViewId);
//!
//! impl ContentController for Tile {
//!     fn view(&self) -> ViewId {
//!         self.0
//!     }
//! }
//!
//! let ui = UiLoop::new();
//! let tree = SharedViewTree::new();
//! let tiles = (0..4)
//!     .map(|_| ContentHandle::new(Tile(tree.create_view("tile"))))
//!     .collect();
//!
//! let options = ControllerOptions::default().with_viewport(Size::new(320.0, 480.0));
//! let mut grid = GridScrollController::new(&ui.context(), tree, options, tiles);
//! grid.set_on_refresh(|done| done.complete());
//! grid.layout_if_needed();
//!
//! grid.on_pull_gesture();
//! ui.run_until_idle();
//! assert!(!grid.is_refreshing());
//! ```

mod config;
mod content;
mod controller;
mod data_window;
mod error;
mod geometry;
mod grid_view;
pub mod layout;
mod lifecycle;
pub mod pagination;
mod refresh;
pub mod view_tree;

pub use config::{DEFAULT_NEAR_END_THRESHOLD, GridConfig, ScrollAxis};
pub use content::{ContentController, ContentHandle, HostId, TextContent};
pub use controller::{ControllerOptions, GridScrollController, ScrollChange};
pub use data_window::{DataWindow, GridPosition};
pub use error::{Diagnostic, Diagnostics, GridError, MAX_DIAGNOSTICS, Result};
pub use geometry::{EdgeInsets, Point, Size};
pub use grid_view::{DisplayEvent, GridMetrics, GridView, ScrollPresentation};
pub use lifecycle::{LifecycleManager, SlotState};
pub use refresh::{PullOutcome, RefreshCompletion, RefreshIndicator, RefreshState};

pub use scrollgrid_core::{
    ConnectionId, ConnectionType, LoopError, Logger, Property, Signal, UiContext, UiLoop,
    UiSender,
};
