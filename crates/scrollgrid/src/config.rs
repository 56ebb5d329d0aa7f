//! Grid configuration.
//!
//! [`GridConfig`] is a plain value describing geometry and behavior. Build one
//! with the `with_*` methods and check it with [`GridConfig::validate`]; the
//! controller and the layout engine both refuse configurations that fail it.
//!
//! # Example
//!
//! ```
//! use scrollgrid::{EdgeInsets, GridConfig};
//!
//! let config = GridConfig::default()
//!     .with_items_per_section(5)
//!     .with_rows_or_columns(3)
//!     .with_section_inset(EdgeInsets::new(5.0, 10.0, 5.0, 10.0))
//!     .with_inter_item_spacing(10.0);
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{GridError, Result};
use crate::geometry::{EdgeInsets, Size};

/// Default number of remaining items that triggers a near-end request.
pub const DEFAULT_NEAR_END_THRESHOLD: usize = 3;

/// Direction the grid scrolls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScrollAxis {
    /// Sections stack top to bottom.
    #[default]
    Vertical,
    /// Sections stack left to right.
    Horizontal,
}

impl ScrollAxis {
    /// Whether this is the vertical axis.
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }
}

/// Geometry and behavior of a scroll grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Items in one section. Must be at least 1.
    pub items_per_section: usize,
    /// Sections visible in one page. Must be at least 1.
    pub rows_or_columns: usize,
    /// Insets around every section.
    pub section_inset: EdgeInsets,
    /// Space between items of one section.
    pub inter_item_spacing: f32,
    /// Space between lines of items, forwarded to the hosting grid.
    pub line_spacing: f32,
    /// Scroll direction.
    pub axis: ScrollAxis,
    /// Whether scrolling snaps to whole pages.
    pub paging_enabled: bool,
    /// Remaining-item count at or below which more content is requested.
    pub near_end_threshold: usize,
    /// Whether the pull-to-refresh affordance is active.
    pub refresh_enabled: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::for_axis(ScrollAxis::Vertical)
    }
}

impl GridConfig {
    /// Default configuration for the given axis.
    ///
    /// Refresh is only enabled for vertical grids.
    pub fn for_axis(axis: ScrollAxis) -> Self {
        Self {
            items_per_section: 1,
            rows_or_columns: 1,
            section_inset: EdgeInsets::ZERO,
            inter_item_spacing: 0.0,
            line_spacing: 0.0,
            axis,
            paging_enabled: true,
            near_end_threshold: DEFAULT_NEAR_END_THRESHOLD,
            refresh_enabled: axis.is_vertical(),
        }
    }

    /// Set the number of items per section.
    pub fn with_items_per_section(mut self, count: usize) -> Self {
        self.items_per_section = count;
        self
    }

    /// Set the number of sections per page.
    pub fn with_rows_or_columns(mut self, count: usize) -> Self {
        self.rows_or_columns = count;
        self
    }

    /// Set the section insets.
    pub fn with_section_inset(mut self, inset: EdgeInsets) -> Self {
        self.section_inset = inset;
        self
    }

    /// Set the spacing between items.
    pub fn with_inter_item_spacing(mut self, spacing: f32) -> Self {
        self.inter_item_spacing = spacing;
        self
    }

    /// Set the spacing between lines.
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Set the scroll axis. Does not change `refresh_enabled`.
    pub fn with_axis(mut self, axis: ScrollAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Enable or disable paging.
    pub fn with_paging(mut self, enabled: bool) -> Self {
        self.paging_enabled = enabled;
        self
    }

    /// Set the near-end threshold.
    pub fn with_near_end_threshold(mut self, threshold: usize) -> Self {
        self.near_end_threshold = threshold;
        self
    }

    /// Enable or disable pull-to-refresh.
    pub fn with_refresh(mut self, enabled: bool) -> Self {
        self.refresh_enabled = enabled;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        validate_count("items_per_section", self.items_per_section)?;
        validate_count("rows_or_columns", self.rows_or_columns)?;
        validate_insets(&self.section_inset)?;
        validate_length("inter_item_spacing", self.inter_item_spacing)?;
        validate_length("line_spacing", self.line_spacing)?;
        Ok(())
    }
}

/// Reject counts that would divide by zero.
pub(crate) fn validate_count(field: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(GridError::configuration(field, "must be at least 1"));
    }
    Ok(())
}

/// Reject negative or non-finite lengths.
pub(crate) fn validate_length(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(GridError::configuration(field, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(GridError::configuration(field, format!("{value} is negative")));
    }
    Ok(())
}

pub(crate) fn validate_insets(inset: &EdgeInsets) -> Result<()> {
    for (edge, value) in inset.edges() {
        if !value.is_finite() || value < 0.0 {
            return Err(GridError::configuration(
                "section_inset",
                format!("{edge} inset {value} must be finite and non-negative"),
            ));
        }
    }
    Ok(())
}

/// Reject viewports with a negative or non-finite dimension.
pub(crate) fn validate_viewport(size: Size) -> Result<()> {
    validate_length("viewport", size.width)?;
    validate_length("viewport", size.height)
}
