//! The paging scroll grid controller.
//!
//! [`GridScrollController`] hosts a growing list of [`ContentHandle`]s inside
//! a [`GridView`]. It sizes items from the viewport and configuration,
//! attaches content as cells are displayed and detaches it as they leave,
//! asks for more content near the end, and drives pull-to-refresh.
//!
//! All work happens on the thread that owns the [`UiLoop`](scrollgrid_core::UiLoop).
//! The near-end and refresh callbacks are never called from inside a
//! display pass; they are posted to the loop and run on its next pass.
//!
//! # Example
//!
//! ```
//! use scrollgrid::{
//!     ContentController, ContentHandle, ControllerOptions, GridScrollController, Size,
//!     view_tree::{SharedViewTree, ViewId},
//! };
//! use scrollgrid_core::UiLoop;
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
//! let tiles = (0..10)
//!     .map(|_| ContentHandle::new(Tile(tree.create_view("tile"))))
//!     .collect();
//!
//! let options = ControllerOptions::default().with_viewport(Size::new(300.0, 600.0));
//! let mut grid = GridScrollController::new(&ui.context(), tree, options, tiles);
//! grid.set_items_per_section(2).unwrap();
//! grid.layout_if_needed();
//!
//! assert_eq!(grid.section_count(), 5);
//! assert_eq!(grid.last_item_size(), Size::new(150.0, 600.0));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use scrollgrid_core::logging::targets;
use scrollgrid_core::{Logger, PerfSpan, Property, Signal, TaskId, UiContext};

use crate::config::{self, GridConfig, ScrollAxis};
use crate::content::{ContentHandle, HostId};
use crate::data_window::{DataWindow, GridPosition};
use crate::error::{Diagnostics, GridError, Result};
use crate::geometry::{EdgeInsets, Point, Size};
use crate::grid_view::{DisplayEvent, GridMetrics, GridView, ScrollPresentation};
use crate::layout;
use crate::lifecycle::LifecycleManager;
use crate::pagination;
use crate::refresh::{PullOutcome, RefreshCompletion, RefreshIndicator, RefreshState};
use crate::view_tree::{SharedViewTree, ViewId, ViewResult};

/// Construction-time options.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Scroll direction. Fixed for the controller's lifetime.
    pub axis: ScrollAxis,
    /// Whether scrolling snaps to whole pages.
    pub paging_enabled: bool,
    /// Initial viewport size.
    pub viewport: Size,
    /// Where lifecycle messages go.
    pub logger: Logger,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            axis: ScrollAxis::Vertical,
            paging_enabled: true,
            viewport: Size::ZERO,
            logger: Logger::default(),
        }
    }
}

impl ControllerOptions {
    /// Set the scroll axis.
    pub fn with_axis(mut self, axis: ScrollAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Enable or disable paging.
    pub fn with_paging(mut self, enabled: bool) -> Self {
        self.paging_enabled = enabled;
        self
    }

    /// Set the initial viewport size.
    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

/// A change of the content offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollChange {
    pub from: Point,
    pub to: Point,
    pub animated: bool,
}

type RefreshCallback = Rc<dyn Fn(RefreshCompletion)>;
type NearEndCallback = Rc<dyn Fn()>;

/// Callbacks read by deferred tasks when they run, not when they are posted.
struct CallbackSlots {
    on_refresh: RefCell<RefreshCallback>,
    on_near_end: RefCell<NearEndCallback>,
}

impl CallbackSlots {
    fn new() -> Self {
        Self {
            on_refresh: RefCell::new(Rc::new(|completion: RefreshCompletion| {
                completion.complete()
            })),
            on_near_end: RefCell::new(Rc::new(|| {})),
        }
    }
}

/// A paging scroll grid that lazily hosts content controllers.
///
/// # Signals
///
/// - `controllers_changed(usize)`: the content list was replaced or extended
/// - `content_offset_changed(ScrollChange)`: the grid scrolled
pub struct GridScrollController {
    ctx: UiContext,
    logger: Logger,

    // Settings
    items_per_section: Property<usize>,
    rows_or_columns: Property<usize>,
    section_inset: Property<EdgeInsets>,
    inter_item_spacing: Property<f32>,
    line_spacing: Property<f32>,
    near_end_threshold: Property<usize>,
    refresh_enabled: Property<bool>,
    axis: ScrollAxis,
    paging_enabled: bool,
    applied_revision: Option<u64>,

    // Content
    window: DataWindow,
    lifecycle: LifecycleManager,
    grid: GridView,
    last_item_size: Cell<Size>,

    // Refresh and deferred callbacks
    indicator: Arc<RefreshIndicator>,
    callbacks: Rc<CallbackSlots>,
    pending_refresh: Option<TaskId>,

    diagnostics: Diagnostics,

    // Signals
    /// Emitted with the new content count after `update_controllers` or `add_controllers`.
    pub controllers_changed: Signal<usize>,
    /// Emitted when the content offset changes through a scroll call.
    pub content_offset_changed: Signal<ScrollChange>,
}

impl GridScrollController {
    /// Create a controller bound to the loop behind `ctx`.
    ///
    /// Nothing is displayed until the first layout pass, which happens on
    /// [`layout_if_needed`](Self::layout_if_needed) or any content or scroll
    /// operation.
    pub fn new(
        ctx: &UiContext,
        tree: SharedViewTree,
        options: ControllerOptions,
        controllers: Vec<ContentHandle>,
    ) -> Self {
        let defaults = GridConfig::for_axis(options.axis).with_paging(options.paging_enabled);
        let host = HostId::next();

        options.logger.debug("Registering collection view.");
        let mut diagnostics = Diagnostics::new();
        let viewport = match config::validate_viewport(options.viewport) {
            Ok(()) => options.viewport,
            Err(err) => {
                diagnostics.record("new", err);
                Size::ZERO
            }
        };
        let grid = GridView::new(tree.clone(), viewport, &defaults);

        let mut window = DataWindow::new();
        window.replace_all(controllers);

        Self {
            ctx: ctx.clone(),
            logger: options.logger,
            items_per_section: Property::new(defaults.items_per_section),
            rows_or_columns: Property::new(defaults.rows_or_columns),
            section_inset: Property::new(defaults.section_inset),
            inter_item_spacing: Property::new(defaults.inter_item_spacing),
            line_spacing: Property::new(defaults.line_spacing),
            near_end_threshold: Property::new(defaults.near_end_threshold),
            refresh_enabled: Property::new(defaults.refresh_enabled),
            axis: defaults.axis,
            paging_enabled: defaults.paging_enabled,
            applied_revision: None,
            window,
            lifecycle: LifecycleManager::new(host, tree),
            grid,
            last_item_size: Cell::new(Size::ZERO),
            indicator: Arc::new(RefreshIndicator::new()),
            callbacks: Rc::new(CallbackSlots::new()),
            pending_refresh: None,
            diagnostics,
            controllers_changed: Signal::new(),
            content_offset_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Snapshot of the current configuration.
    pub fn config(&self) -> GridConfig {
        GridConfig {
            items_per_section: self.items_per_section.get(),
            rows_or_columns: self.rows_or_columns.get(),
            section_inset: self.section_inset.get(),
            inter_item_spacing: self.inter_item_spacing.get(),
            line_spacing: self.line_spacing.get(),
            axis: self.axis,
            paging_enabled: self.paging_enabled,
            near_end_threshold: self.near_end_threshold.get(),
            refresh_enabled: self.refresh_enabled.get(),
        }
    }

    /// Set how many items share a section. Must be at least 1.
    pub fn set_items_per_section(&mut self, count: usize) -> Result<()> {
        config::validate_count("items_per_section", count)?;
        self.items_per_section.set(count);
        Ok(())
    }

    /// Set how many sections fit in one page. Must be at least 1.
    pub fn set_rows_or_columns(&mut self, count: usize) -> Result<()> {
        config::validate_count("rows_or_columns", count)?;
        self.rows_or_columns.set(count);
        Ok(())
    }

    /// Set the insets around each section.
    pub fn set_section_inset(&mut self, inset: EdgeInsets) -> Result<()> {
        config::validate_insets(&inset)?;
        self.section_inset.set(inset);
        Ok(())
    }

    /// Set the spacing between items of a section.
    pub fn set_inter_item_spacing(&mut self, spacing: f32) -> Result<()> {
        config::validate_length("inter_item_spacing", spacing)?;
        self.inter_item_spacing.set(spacing);
        Ok(())
    }

    /// Set the spacing between lines of items.
    pub fn set_line_spacing(&mut self, spacing: f32) -> Result<()> {
        config::validate_length("line_spacing", spacing)?;
        self.line_spacing.set(spacing);
        Ok(())
    }

    /// Set how few remaining items trigger a near-end request.
    pub fn set_near_end_threshold(&mut self, threshold: usize) {
        self.near_end_threshold.set(threshold);
    }

    /// Enable or disable pull-to-refresh.
    pub fn set_refresh_enabled(&mut self, enabled: bool) {
        self.refresh_enabled.set(enabled);
    }

    /// Apply a whole configuration. The axis and paging flag are fixed at
    /// construction and must match.
    pub fn apply_config(&mut self, config: &GridConfig) -> Result<()> {
        config.validate()?;
        if config.axis != self.axis {
            return Err(GridError::configuration("axis", "fixed at construction"));
        }
        if config.paging_enabled != self.paging_enabled {
            return Err(GridError::configuration("paging_enabled", "fixed at construction"));
        }
        self.items_per_section.set(config.items_per_section);
        self.rows_or_columns.set(config.rows_or_columns);
        self.section_inset.set(config.section_inset);
        self.inter_item_spacing.set(config.inter_item_spacing);
        self.line_spacing.set(config.line_spacing);
        self.near_end_threshold.set(config.near_end_threshold);
        self.refresh_enabled.set(config.refresh_enabled);
        Ok(())
    }

    /// Set the callback run when the user pulls to refresh.
    ///
    /// The callback must eventually call [`RefreshCompletion::complete`]; until
    /// then the refresh indicator stays active.
    pub fn set_on_refresh<F>(&mut self, callback: F)
    where
        F: Fn(RefreshCompletion) + 'static,
    {
        *self.callbacks.on_refresh.borrow_mut() = Rc::new(callback);
    }

    /// Set the callback run when few items remain past a cell that scrolled away.
    pub fn set_on_near_end<F>(&mut self, callback: F)
    where
        F: Fn() + 'static,
    {
        *self.callbacks.on_near_end.borrow_mut() = Rc::new(callback);
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Replace all content and reload.
    pub fn update_controllers(&mut self, controllers: Vec<ContentHandle>) {
        self.logger.debug("Updating controllers.");
        self.window.replace_all(controllers);
        self.reload();
        self.controllers_changed.emit(self.window.len());
    }

    /// Append content and reload.
    pub fn add_controllers(&mut self, controllers: Vec<ContentHandle>) {
        self.logger.debug("Adding controllers.");
        self.window.append(controllers);
        self.reload();
        self.controllers_changed.emit(self.window.len());
    }

    /// Current content, in display order.
    pub fn controllers(&self) -> &[ContentHandle] {
        self.window.handles()
    }

    /// Number of sections needed for the current content.
    pub fn section_count(&self) -> usize {
        self.window.section_count(self.items_per_section.get())
    }

    /// Items the grid shows in every section, including the last.
    pub fn number_of_items_in_section(&self, _section: usize) -> usize {
        self.items_per_section.get()
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Compute the item size for the current viewport and configuration.
    ///
    /// Recomputed on every call; the result is also remembered as
    /// [`last_item_size`](Self::last_item_size).
    pub fn item_size(&self) -> Result<Size> {
        let size = layout::compute_item_size(self.grid.viewport(), &self.config())?;
        self.last_item_size.set(size);
        Ok(size)
    }

    /// The item size from the most recent computation.
    pub fn last_item_size(&self) -> Size {
        self.last_item_size.get()
    }

    /// Apply pending setting changes, reloading the grid if any.
    ///
    /// Returns `true` if a reload happened.
    pub fn layout_if_needed(&mut self) -> bool {
        if self.applied_revision == Some(self.settings_revision()) {
            return false;
        }
        self.reload();
        true
    }

    fn settings_revision(&self) -> u64 {
        self.items_per_section.revision()
            + self.rows_or_columns.revision()
            + self.section_inset.revision()
            + self.inter_item_spacing.revision()
            + self.line_spacing.revision()
            + self.near_end_threshold.revision()
            + self.refresh_enabled.revision()
    }

    /// Resize the viewport, e.g. on rotation, and reload.
    ///
    /// Sizes with a negative or non-finite dimension are rejected and leave
    /// the grid untouched.
    pub fn view_will_transition(&mut self, size: Size) -> Result<()> {
        config::validate_viewport(size)?;
        tracing::debug!(target: targets::CONTROLLER, width = size.width, height = size.height, "viewport transition");
        self.grid.set_viewport(size);
        self.reload();
        Ok(())
    }

    fn apply_layout(&mut self) {
        let config = self.config();
        match self.item_size() {
            Ok(item_size) => {
                self.grid.set_metrics(GridMetrics {
                    item_size,
                    section_extent: layout::section_extent(item_size, &config),
                    section_count: self.window.section_count(config.items_per_section),
                    items_per_section: config.items_per_section,
                });
            }
            Err(err) => self.diagnostics.record("layout", err),
        }
        self.grid.set_presentation(ScrollPresentation::for_config(&config));
        self.applied_revision = Some(self.settings_revision());
    }

    fn reload(&mut self) {
        let _span = PerfSpan::new("reload");
        self.apply_layout();
        match self.grid.reload() {
            Ok(events) => self.handle_display_events(events, false),
            Err(err) => self.diagnostics.record("reload", err.into()),
        }
    }

    // =========================================================================
    // Scrolling
    // =========================================================================

    /// Current content offset.
    pub fn content_offset(&self) -> Point {
        self.grid.content_offset()
    }

    /// Scroll back to the origin.
    ///
    /// The grid jumps immediately; `animated` is passed through to
    /// `content_offset_changed` for hosts that animate.
    pub fn scroll_to_top(&mut self, animated: bool) {
        self.layout_if_needed();
        self.scroll_with(animated, |grid| grid.scroll_to_top());
    }

    /// Scroll to `offset` along the axis, snapping to pages when paging is on.
    ///
    /// Returns the resulting content offset.
    pub fn scroll_to(&mut self, offset: f32) -> Point {
        self.layout_if_needed();
        self.scroll_with(false, |grid| grid.scroll_to(offset));
        self.content_offset()
    }

    fn scroll_with<F>(&mut self, animated: bool, scroll: F)
    where
        F: FnOnce(&mut GridView) -> ViewResult<Vec<DisplayEvent>>,
    {
        let from = self.grid.content_offset();
        match scroll(&mut self.grid) {
            Ok(events) => self.handle_display_events(events, true),
            Err(err) => self.diagnostics.record("scroll", err.into()),
        }
        let to = self.grid.content_offset();
        if from != to {
            self.content_offset_changed.emit(ScrollChange { from, to, animated });
        }
    }

    // =========================================================================
    // Display
    // =========================================================================

    // A reload ends every displayed cell without anything scrolling away, so
    // only scroll passes run the near-end check.
    fn handle_display_events(&mut self, events: Vec<DisplayEvent>, scrolled: bool) {
        for event in events {
            match event {
                DisplayEvent::WillDisplay { cell, position } => self.will_display(cell, position),
                DisplayEvent::DidEndDisplaying { cell, position } => {
                    self.end_display(cell, position);
                    if scrolled {
                        self.check_near_end(position);
                    }
                }
            }
        }
    }

    /// Attach the content for `position` to `cell`.
    ///
    /// A position past the end of the content leaves the cell empty and
    /// records a diagnostic.
    pub fn will_display(&mut self, cell: ViewId, position: GridPosition) {
        let index = DataWindow::index_for(position, self.items_per_section.get());
        let handle = match self.window.handle_at(index) {
            Ok(handle) => handle.clone(),
            Err(err) => {
                self.logger.error("Failed to get controller for index path.");
                self.diagnostics.record("will_display", err);
                return;
            }
        };
        let attached = self.lifecycle.attach(cell, position, handle);
        for err in self.lifecycle.take_stale_errors() {
            self.diagnostics.record("will_display", err);
        }
        if let Err(err) = attached {
            self.diagnostics.record("will_display", err);
        }
    }

    /// Detach whatever `position` holds, then check for the near end.
    pub fn did_end_displaying(&mut self, cell: ViewId, position: GridPosition) {
        self.end_display(cell, position);
        self.check_near_end(position);
    }

    fn end_display(&mut self, cell: ViewId, position: GridPosition) {
        match self.lifecycle.detach(position) {
            Ok(detached) => {
                tracing::trace!(target: targets::CONTROLLER, ?cell, ?position, detached, "cell left viewport");
            }
            Err(err) => self.diagnostics.record("did_end_displaying", err),
        }
    }

    fn check_near_end(&mut self, position: GridPosition) {
        let index = DataWindow::index_for(position, self.items_per_section.get());
        let Some(remaining) = pagination::check_near_end(
            index,
            self.window.len(),
            self.near_end_threshold.get(),
        ) else {
            return;
        };

        self.logger
            .debug(&format!("Remaining controllers '{remaining}'."));
        let callbacks = Rc::downgrade(&self.callbacks);
        if let Err(err) = self.ctx.post(move || run_near_end(&callbacks)) {
            self.diagnostics.record("near_end", err.into());
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Handle a pull-to-refresh gesture.
    ///
    /// Ignored while refresh is disabled or a previous refresh is still
    /// running. Otherwise the indicator turns on and the refresh callback is
    /// posted to the UI loop.
    pub fn on_pull_gesture(&mut self) -> PullOutcome {
        if !self.refresh_enabled.get() {
            return PullOutcome::Disabled;
        }
        if !self.indicator.begin() {
            return PullOutcome::AlreadyRefreshing;
        }

        self.logger.debug("Start refreshing.");
        let completion = RefreshCompletion::new(
            self.ctx.sender(),
            self.indicator.clone(),
            self.logger.clone(),
        );
        let callbacks = Rc::downgrade(&self.callbacks);
        match self.ctx.post(move || run_refresh(&callbacks, completion)) {
            Ok(task) => {
                self.pending_refresh = Some(task);
                PullOutcome::Started
            }
            Err(err) => {
                self.indicator.end();
                self.diagnostics.record("refresh", err.into());
                PullOutcome::LoopClosed
            }
        }
    }

    /// Whether a refresh is in progress.
    pub fn is_refreshing(&self) -> bool {
        self.indicator.is_refreshing()
    }

    /// Current refresh state.
    pub fn refresh_state(&self) -> RefreshState {
        self.indicator.state()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Errors absorbed so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// The hosting grid.
    pub fn grid(&self) -> &GridView {
        &self.grid
    }

    /// Attachment bookkeeping.
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// The injected logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for GridScrollController {
    fn drop(&mut self) {
        // A refresh that has not started yet would only find the slots gone.
        if let Some(task) = self.pending_refresh.take() {
            self.ctx.cancel(task);
        }
    }
}

fn run_near_end(callbacks: &Weak<CallbackSlots>) {
    let Some(callbacks) = callbacks.upgrade() else {
        return;
    };
    let callback = callbacks.on_near_end.borrow().clone();
    callback();
}

fn run_refresh(callbacks: &Weak<CallbackSlots>, completion: RefreshCompletion) {
    let Some(callbacks) = callbacks.upgrade() else {
        tracing::debug!(target: targets::CONTROLLER, "controller dropped before refresh ran");
        return;
    };
    let callback = callbacks.on_refresh.borrow().clone();
    callback(completion);
}
