//! The single-threaded UI loop.
//!
//! A [`UiLoop`] owns the only execution context allowed to touch grid state.
//! Work reaches it three ways:
//!
//! - [`UiContext::post`] queues a task from the owning thread (no `Send` bound).
//! - [`UiContext::post_after`] schedules a task to become due after a delay.
//! - [`UiSender::post`] queues a `Send` task from any thread through a channel.
//!
//! Nothing runs until the owner calls one of the processing methods, which is
//! what lets callers defer work out of a display pass that is still in progress.
//!
//! # Example
//!
//! ```
//! use scrollgrid_core::UiLoop;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let ui = UiLoop::new();
//! let ran = Rc::new(Cell::new(false));
//!
//! let flag = ran.clone();
//! ui.context().post(move || flag.set(true)).unwrap();
//! assert!(!ran.get());
//!
//! ui.run_until_idle();
//! assert!(ran.get());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{LoopError, Result};
use crate::scheduler::{ScheduledTaskId, Scheduler};
use crate::task::{TaskId, TaskQueue};

/// A task posted from another thread.
type RemoteTask = Box<dyn FnOnce() + Send + 'static>;

/// Upper bound on a single blocking wait in [`UiLoop::run_until`].
const MAX_IDLE_WAIT: Duration = Duration::from_millis(250);

/// State shared between the loop and its contexts.
struct LoopState {
    tasks: RefCell<TaskQueue>,
    scheduler: RefCell<Scheduler>,
}

/// The UI-ownership execution context.
///
/// `UiLoop` is deliberately `!Send`: it and every [`UiContext`] stay on the
/// thread that created them.
pub struct UiLoop {
    state: Rc<LoopState>,
    remote_tx: Sender<RemoteTask>,
    remote_rx: Receiver<RemoteTask>,
}

impl Default for UiLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl UiLoop {
    /// Create a new loop bound to the current thread.
    pub fn new() -> Self {
        let (remote_tx, remote_rx) = crossbeam_channel::unbounded();
        Self {
            state: Rc::new(LoopState {
                tasks: RefCell::new(TaskQueue::new()),
                scheduler: RefCell::new(Scheduler::new()),
            }),
            remote_tx,
            remote_rx,
        }
    }

    /// Get a context for posting work from the owning thread.
    pub fn context(&self) -> UiContext {
        UiContext {
            state: Rc::downgrade(&self.state),
            remote_tx: self.remote_tx.clone(),
        }
    }

    /// Get a thread-safe sender for posting work from any thread.
    pub fn sender(&self) -> UiSender {
        UiSender {
            remote_tx: self.remote_tx.clone(),
        }
    }

    /// Number of tasks waiting to run now (local and remote).
    pub fn pending_count(&self) -> usize {
        self.state.tasks.borrow().pending_count() + self.remote_rx.len()
    }

    /// Number of delayed tasks that have not become due yet.
    pub fn scheduled_count(&self) -> usize {
        self.state.scheduler.borrow().active_count()
    }

    /// Run the tasks that are pending right now.
    ///
    /// Tasks posted while this pass runs are left for the next pass. Returns
    /// the number of tasks executed.
    #[tracing::instrument(skip(self), target = "scrollgrid_core::event_loop", level = "trace")]
    pub fn process_pending(&self) -> usize {
        self.drain_remote();
        let budget = self.state.tasks.borrow().pending_count();
        let mut executed = 0;
        while executed < budget {
            // Pop with the borrow released so the task can post more work.
            let next = self.state.tasks.borrow_mut().pop_front();
            let Some((id, task)) = next else {
                break;
            };
            crate::ui_trace!(task_id = id.as_u64(), "running deferred task");
            task();
            executed += 1;
        }
        executed
    }

    /// Run every delayed task due at or before `now`.
    ///
    /// Returns the number of tasks executed.
    pub fn process_due_at(&self, now: Instant) -> usize {
        let due = self.state.scheduler.borrow_mut().take_due(now);
        let count = due.len();
        if count > 0 {
            crate::ui_trace!(count, "running due scheduled tasks");
        }
        for task in due {
            task();
        }
        count
    }

    /// Process pending and due work until nothing is ready at `now`.
    ///
    /// Delayed tasks that are not yet due stay scheduled. Returns the total
    /// number of tasks executed.
    pub fn advance_to(&self, now: Instant) -> usize {
        let mut total = 0;
        loop {
            let ran = self.process_due_at(now) + self.process_pending();
            if ran == 0 {
                break total;
            }
            total += ran;
        }
    }

    /// Process everything that is ready at the current instant.
    pub fn run_until_idle(&self) -> usize {
        self.advance_to(Instant::now())
    }

    /// Keep processing, blocking between bursts of work, until `done` returns true.
    ///
    /// Blocking waits end early when a remote task arrives or a delayed task
    /// becomes due.
    pub fn run_until<F>(&self, mut done: F)
    where
        F: FnMut() -> bool,
    {
        crate::ui_debug!("entering UI loop");
        loop {
            self.run_until_idle();
            if done() {
                break;
            }

            let wait = self
                .state
                .scheduler
                .borrow()
                .time_until_next(Instant::now())
                .map_or(MAX_IDLE_WAIT, |d| d.min(MAX_IDLE_WAIT));

            match self.remote_rx.recv_timeout(wait) {
                Ok(task) => self.state.tasks.borrow_mut().post_boxed(task),
                Err(RecvTimeoutError::Timeout) => continue,
                // The loop holds a sender itself, so the channel cannot disconnect.
                Err(RecvTimeoutError::Disconnected) => break,
            };
        }
        crate::ui_debug!("leaving UI loop");
    }

    fn drain_remote(&self) {
        loop {
            match self.remote_rx.try_recv() {
                Ok(task) => {
                    self.state.tasks.borrow_mut().post_boxed(task);
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }
}

/// Posts work to a [`UiLoop`] from its owning thread.
///
/// Contexts hold a weak reference: once the loop is dropped, posting fails
/// with [`LoopError::LoopClosed`].
#[derive(Clone)]
pub struct UiContext {
    state: Weak<LoopState>,
    remote_tx: Sender<RemoteTask>,
}

impl UiContext {
    /// Queue a task to run on the next processing pass.
    pub fn post<F>(&self, task: F) -> Result<TaskId>
    where
        F: FnOnce() + 'static,
    {
        let state = self.state.upgrade().ok_or(LoopError::LoopClosed)?;
        let id = state.tasks.borrow_mut().post(task);
        crate::ui_trace!(task_id = id.as_u64(), "posted deferred task");
        Ok(id)
    }

    /// Schedule a task to run once `delay` has elapsed.
    pub fn post_after<F>(&self, delay: Duration, task: F) -> Result<ScheduledTaskId>
    where
        F: FnOnce() + 'static,
    {
        let state = self.state.upgrade().ok_or(LoopError::LoopClosed)?;
        let id = state.scheduler.borrow_mut().schedule_once(delay, task);
        crate::ui_trace!(?id, ?delay, "scheduled delayed task");
        Ok(id)
    }

    /// Cancel a task posted with [`post`](Self::post) that has not run yet.
    pub fn cancel(&self, id: TaskId) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.tasks.borrow_mut().cancel(id))
    }

    /// Get a thread-safe sender for the same loop.
    pub fn sender(&self) -> UiSender {
        UiSender {
            remote_tx: self.remote_tx.clone(),
        }
    }
}

/// Posts `Send` work to a [`UiLoop`] from any thread.
#[derive(Clone)]
pub struct UiSender {
    remote_tx: Sender<RemoteTask>,
}

impl UiSender {
    /// Queue a task to run on the loop's thread.
    pub fn post<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.remote_tx
            .send(Box::new(task))
            .map_err(|_| LoopError::LoopClosed)
    }
}

static_assertions::assert_impl_all!(UiSender: Send, Sync);
static_assertions::assert_not_impl_any!(UiLoop: Send, Sync);
static_assertions::assert_not_impl_any!(UiContext: Send, Sync);
