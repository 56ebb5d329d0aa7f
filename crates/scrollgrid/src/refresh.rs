//! Pull-to-refresh state.
//!
//! A pull gesture moves the [`RefreshIndicator`] to `Refreshing` and hands the
//! application a [`RefreshCompletion`]. The indicator stays active until that
//! completion is invoked. Nothing times it out.

use std::sync::Arc;

use parking_lot::Mutex;
use scrollgrid_core::logging::targets;
use scrollgrid_core::{Logger, UiSender};

/// State of the refresh affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing,
}

/// What a pull gesture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// A refresh started; the callback is queued on the UI loop.
    Started,
    /// Refresh is disabled for this grid.
    Disabled,
    /// A previous refresh has not completed yet.
    AlreadyRefreshing,
    /// The UI loop is gone, so the callback could not be queued.
    LoopClosed,
}

/// Shared refresh indicator.
#[derive(Debug, Default)]
pub struct RefreshIndicator {
    state: Mutex<RefreshState>,
}

impl RefreshIndicator {
    /// Create an idle indicator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RefreshState {
        *self.state.lock()
    }

    /// Whether a refresh is in progress.
    pub fn is_refreshing(&self) -> bool {
        self.state() == RefreshState::Refreshing
    }

    /// Move to `Refreshing`. Returns `false` if already refreshing.
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if *state == RefreshState::Refreshing {
            return false;
        }
        *state = RefreshState::Refreshing;
        true
    }

    /// Move to `Idle`. Returns `false` if nothing was refreshing.
    pub(crate) fn end(&self) -> bool {
        std::mem::replace(&mut *self.state.lock(), RefreshState::Idle) == RefreshState::Refreshing
    }
}

/// Ends a refresh. Hand it back by calling [`complete`](Self::complete).
///
/// The completion can be moved to and invoked from any thread; the indicator
/// is reset on the UI loop.
#[must_use = "the refresh indicator stays active until the completion is invoked"]
pub struct RefreshCompletion {
    sender: UiSender,
    indicator: Arc<RefreshIndicator>,
    logger: Logger,
}

impl RefreshCompletion {
    pub(crate) fn new(sender: UiSender, indicator: Arc<RefreshIndicator>, logger: Logger) -> Self {
        Self {
            sender,
            indicator,
            logger,
        }
    }

    /// Signal that the refresh finished.
    pub fn complete(self) {
        let Self {
            sender,
            indicator,
            logger,
        } = self;
        let posted = sender.post(move || {
            if indicator.end() {
                logger.debug("End refreshing.");
            }
        });
        if let Err(err) = posted {
            tracing::warn!(target: targets::CONTROLLER, %err, "refresh completed after the UI loop closed");
        }
    }
}

impl std::fmt::Debug for RefreshCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCompletion")
            .field("state", &self.indicator.state())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(RefreshCompletion: Send);
