//! Core systems for scrollgrid.
//!
//! This crate provides the execution model the grid controller runs on:
//!
//! - **UI Loop**: A single-threaded loop that owns all grid state
//! - **Task Queue**: Deferred tasks that run on the next loop pass
//! - **Scheduler**: One-shot delayed tasks driven by explicit time
//! - **Signal/Slot System**: Direct and queued change notifications
//! - **Property System**: Settings cells with change detection
//! - **Logging**: Tracing targets and a tagged host [`Logger`]
//!
//! # Example
//!
//! ```
//! use scrollgrid_core::{Signal, UiLoop};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let ui = UiLoop::new();
//! let reached_end = Signal::<usize>::new();
//! let seen = Rc::new(Cell::new(None));
//!
//! let sink = seen.clone();
//! reached_end.connect_queued(&ui.context(), move |index| sink.set(Some(*index)));
//!
//! reached_end.emit(47);
//! assert_eq!(seen.get(), None);
//!
//! ui.run_until_idle();
//! assert_eq!(seen.get(), Some(47));
//! ```

#[doc(hidden)]
pub use tracing;

mod error;
mod event_loop;
pub mod logging;
pub mod property;
mod scheduler;
pub mod signal;
mod task;

pub use error::{LoopError, Result};
pub use event_loop::{UiContext, UiLoop, UiSender};
pub use logging::{Logger, PerfSpan};
pub use property::Property;
pub use scheduler::{ScheduledTaskId, Scheduler};
pub use signal::{ConnectionId, ConnectionType, Signal};
pub use task::{TaskId, TaskQueue};
