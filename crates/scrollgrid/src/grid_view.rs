//! A headless scrolling grid with cell reuse.
//!
//! [`GridView`] plays the part of the platform collection view: it owns the
//! content offset and a pool of reusable cells, works out which sections
//! intersect the viewport, and reports the cells that start or stop being
//! displayed. It never looks at content; the controller reacts to the
//! [`DisplayEvent`]s it returns.
//!
//! Within one batch of events every `DidEndDisplaying` comes before any
//! `WillDisplay`, so a reused cell is always vacated before it is filled.

use std::collections::BTreeMap;

use crate::config::{GridConfig, ScrollAxis};
use crate::data_window::GridPosition;
use crate::geometry::{EdgeInsets, Point, Size};
use crate::layout;
use crate::view_tree::{SharedViewTree, ViewId, ViewResult};

/// A change in what the grid displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// `cell` is about to show `position`.
    WillDisplay { cell: ViewId, position: GridPosition },
    /// `cell` stopped showing `position`.
    DidEndDisplaying { cell: ViewId, position: GridPosition },
}

impl DisplayEvent {
    /// The cell involved.
    pub fn cell(&self) -> ViewId {
        match *self {
            Self::WillDisplay { cell, .. } | Self::DidEndDisplaying { cell, .. } => cell,
        }
    }

    /// The grid position involved.
    pub fn position(&self) -> GridPosition {
        match *self {
            Self::WillDisplay { position, .. } | Self::DidEndDisplaying { position, .. } => {
                position
            }
        }
    }
}

/// Scroll view presentation settings derived from the grid configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPresentation {
    pub shows_horizontal_indicator: bool,
    pub shows_vertical_indicator: bool,
    pub always_bounce_horizontal: bool,
    pub always_bounce_vertical: bool,
    pub paging_enabled: bool,
    pub section_inset: EdgeInsets,
    pub inter_item_spacing: f32,
    pub line_spacing: f32,
}

impl ScrollPresentation {
    /// Indicators hidden, bouncing only along the scroll axis.
    pub fn for_config(config: &GridConfig) -> Self {
        Self {
            shows_horizontal_indicator: false,
            shows_vertical_indicator: false,
            always_bounce_horizontal: config.axis == ScrollAxis::Horizontal,
            always_bounce_vertical: config.axis == ScrollAxis::Vertical,
            paging_enabled: config.paging_enabled,
            section_inset: config.section_inset,
            inter_item_spacing: config.inter_item_spacing,
            line_spacing: config.line_spacing,
        }
    }
}

/// Geometry the grid needs to place sections.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridMetrics {
    pub item_size: Size,
    pub section_extent: f32,
    pub section_count: usize,
    pub items_per_section: usize,
}

/// The headless grid.
pub struct GridView {
    tree: SharedViewTree,
    root: ViewId,
    axis: ScrollAxis,
    viewport: Size,
    offset: f32,
    metrics: GridMetrics,
    presentation: ScrollPresentation,
    displayed: BTreeMap<GridPosition, ViewId>,
    reuse_pool: Vec<ViewId>,
    cells_created: usize,
}

impl GridView {
    /// Create a grid whose root view lives in `tree`.
    pub fn new(tree: SharedViewTree, viewport: Size, config: &GridConfig) -> Self {
        let root = tree.create_view("grid");
        Self {
            tree,
            root,
            axis: config.axis,
            viewport,
            offset: 0.0,
            metrics: GridMetrics::default(),
            presentation: ScrollPresentation::for_config(config),
            displayed: BTreeMap::new(),
            reuse_pool: Vec::new(),
            cells_created: 0,
        }
    }

    /// The grid's root view; cells are its subviews.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Scroll axis.
    pub fn axis(&self) -> ScrollAxis {
        self.axis
    }

    /// Current viewport size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Set the viewport size. Takes effect on the next reload or scroll.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Current geometry.
    pub fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    /// Replace the geometry. Takes effect on the next reload or scroll.
    pub fn set_metrics(&mut self, metrics: GridMetrics) {
        self.metrics = metrics;
    }

    /// Current presentation settings.
    pub fn presentation(&self) -> ScrollPresentation {
        self.presentation
    }

    /// Replace the presentation settings.
    pub fn set_presentation(&mut self, presentation: ScrollPresentation) {
        self.presentation = presentation;
    }

    /// The content offset as a point.
    pub fn content_offset(&self) -> Point {
        match self.axis {
            ScrollAxis::Vertical => Point::new(0.0, self.offset),
            ScrollAxis::Horizontal => Point::new(self.offset, 0.0),
        }
    }

    /// Total content length along the scroll axis.
    pub fn content_length(&self) -> f32 {
        self.metrics.section_count as f32 * self.metrics.section_extent
    }

    /// Largest reachable offset.
    pub fn max_offset(&self) -> f32 {
        (self.content_length() - self.page_length()).max(0.0)
    }

    fn page_length(&self) -> f32 {
        layout::axis_length(self.viewport, self.axis)
    }

    /// Positions currently displayed, with their cells, in position order.
    pub fn displayed(&self) -> impl Iterator<Item = (GridPosition, ViewId)> + '_ {
        self.displayed.iter().map(|(position, cell)| (*position, *cell))
    }

    /// The cell showing `position`, if displayed.
    pub fn cell_for(&self, position: GridPosition) -> Option<ViewId> {
        self.displayed.get(&position).copied()
    }

    /// Number of cells ever created (displayed plus pooled).
    pub fn cell_count(&self) -> usize {
        self.cells_created
    }

    /// Stop displaying everything, then display what is visible again.
    pub fn reload(&mut self) -> ViewResult<Vec<DisplayEvent>> {
        let mut events = Vec::with_capacity(self.displayed.len() * 2);
        for (position, cell) in std::mem::take(&mut self.displayed) {
            self.reuse_pool.push(cell);
            events.push(DisplayEvent::DidEndDisplaying { cell, position });
        }
        self.offset = self.offset.clamp(0.0, self.max_offset());
        self.display_visible(&mut events)?;
        Ok(events)
    }

    /// Scroll to `offset` along the axis, snapping to pages when paging is on.
    pub fn scroll_to(&mut self, offset: f32) -> ViewResult<Vec<DisplayEvent>> {
        let page = self.page_length();
        let target = if self.presentation.paging_enabled && page > 0.0 {
            (offset / page).round() * page
        } else {
            offset
        };
        self.offset = target.clamp(0.0, self.max_offset());
        self.update_visible()
    }

    /// Scroll back to the origin.
    pub fn scroll_to_top(&mut self) -> ViewResult<Vec<DisplayEvent>> {
        self.scroll_to(0.0)
    }

    /// Re-evaluate visibility without reloading displayed cells.
    pub fn update_visible(&mut self) -> ViewResult<Vec<DisplayEvent>> {
        let visible = self.visible_positions();
        let mut events = Vec::new();

        let gone: Vec<GridPosition> = self
            .displayed
            .keys()
            .filter(|position| visible.binary_search(position).is_err())
            .copied()
            .collect();
        for position in gone {
            if let Some(cell) = self.displayed.remove(&position) {
                self.reuse_pool.push(cell);
                events.push(DisplayEvent::DidEndDisplaying { cell, position });
            }
        }

        self.display_visible(&mut events)?;
        Ok(events)
    }

    fn display_visible(&mut self, events: &mut Vec<DisplayEvent>) -> ViewResult<()> {
        for position in self.visible_positions() {
            if self.displayed.contains_key(&position) {
                continue;
            }
            let cell = self.dequeue_cell()?;
            self.displayed.insert(position, cell);
            events.push(DisplayEvent::WillDisplay { cell, position });
        }
        Ok(())
    }

    /// Visible positions in ascending order.
    fn visible_positions(&self) -> Vec<GridPosition> {
        let sections = layout::visible_sections(
            self.offset,
            self.page_length(),
            self.metrics.section_extent,
            self.metrics.section_count,
        );
        sections
            .flat_map(|section| {
                (0..self.metrics.items_per_section).map(move |row| GridPosition::new(section, row))
            })
            .collect()
    }

    fn dequeue_cell(&mut self) -> ViewResult<ViewId> {
        if let Some(cell) = self.reuse_pool.pop() {
            return Ok(cell);
        }
        let cell = self.tree.create_view("cell");
        self.tree.add_subview(self.root, cell)?;
        self.cells_created += 1;
        Ok(cell)
    }
}
