//! Content hosted by the grid.
//!
//! Applications supply content as implementations of [`ContentController`]
//! wrapped in a [`ContentHandle`]. The grid never looks inside the content;
//! it only moves the content's view into and out of cells and tells the
//! controller when it joins or leaves a host.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::view_tree::ViewId;

/// Identifies the grid controller that logically owns attached content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(u64);

impl HostId {
    pub(crate) fn next() -> Self {
        static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value of this host ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A unit of displayable content.
///
/// The view returned by [`view`](Self::view) must live in the same
/// [`SharedViewTree`](crate::view_tree::SharedViewTree) as the grid and must
/// tolerate being attached and detached repeatedly.
pub trait ContentController: Send + Sync + 'static {
    /// The content's root view.
    fn view(&self) -> ViewId;

    /// Called before the content joins (`Some`) or leaves (`None`) a host.
    fn will_move_to_host(&self, _host: Option<HostId>) {}

    /// Called after the content joined (`Some`) or left (`None`) a host.
    fn did_move_to_host(&self, _host: Option<HostId>) {}

    /// Text capability, for content that displays a label.
    fn text_content(&self) -> Option<&dyn TextContent> {
        None
    }
}

/// Content that displays editable text.
pub trait TextContent: Send + Sync {
    /// Current text.
    fn text(&self) -> String;

    /// Replace the text.
    fn set_text(&self, text: &str);
}

/// A cheaply cloneable reference to a [`ContentController`].
///
/// Equality is identity: two handles are equal when they point at the same
/// controller.
#[derive(Clone)]
pub struct ContentHandle(Arc<dyn ContentController>);

impl ContentHandle {
    /// Wrap a controller.
    pub fn new<C: ContentController>(controller: C) -> Self {
        Self(Arc::new(controller))
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &dyn ContentController {
        self.0.as_ref()
    }

    /// The content's root view.
    pub fn view(&self) -> ViewId {
        self.0.view()
    }

    /// The text capability, if the content has one.
    pub fn text_content(&self) -> Option<&dyn TextContent> {
        self.0.text_content()
    }

    /// Whether both handles refer to the same controller.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl PartialEq for ContentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ContentHandle {}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContentHandle").field(&self.view()).finish()
    }
}
