//! Item sizing and section geometry.
//!
//! Every function here is pure. Item sizes are recomputed on each query so a
//! resized container or a changed configuration is always reflected.
//!
//! Along the scroll axis a section occupies its inset plus one item; a page
//! holds `rows_or_columns` sections.

use std::ops::Range;

use scrollgrid_core::logging::targets;

use crate::config::{GridConfig, ScrollAxis};
use crate::error::Result;
use crate::geometry::Size;

/// Tolerance when deciding whether a section edge reaches into the viewport.
const EDGE_EPSILON: f32 = 1e-3;

/// Compute the size of one item for the given container.
///
/// Vertical grids fit `items_per_section` items across the width and
/// `rows_or_columns` sections down the height. Horizontal grids divide the
/// height among `rows_or_columns` items separated by the inter-item spacing.
///
/// Fails with a configuration error when the config does not validate.
/// Negative results, from insets larger than the container, clamp to zero.
pub fn compute_item_size(container: Size, config: &GridConfig) -> Result<Size> {
    config.validate()?;

    let n = config.items_per_section as f32;
    let rows = config.rows_or_columns as f32;
    let inset = &config.section_inset;
    let spacing = config.inter_item_spacing;

    let (width, height) = match config.axis {
        ScrollAxis::Vertical => (
            (container.width - inset.horizontal() - (n - 1.0) * spacing) / n,
            (container.height - inset.vertical() * rows) / rows,
        ),
        ScrollAxis::Horizontal => (
            (container.width - inset.horizontal() * rows) / n,
            (container.height - inset.vertical() * rows - (rows - 1.0) * spacing) / rows,
        ),
    };

    Ok(Size::new(
        clamp_dimension("width", width, container),
        clamp_dimension("height", height, container),
    ))
}

fn clamp_dimension(dimension: &'static str, value: f32, container: Size) -> f32 {
    if value < 0.0 {
        tracing::warn!(
            target: targets::LAYOUT,
            dimension,
            value,
            container.width,
            container.height,
            "insets exceed container, clamping item size to zero"
        );
        0.0
    } else {
        value
    }
}

/// Length of one section along the scroll axis.
pub fn section_extent(item: Size, config: &GridConfig) -> f32 {
    let inset = &config.section_inset;
    match config.axis {
        ScrollAxis::Vertical => inset.top + item.height + inset.bottom,
        ScrollAxis::Horizontal => inset.left + item.width + inset.right,
    }
}

/// Length of a viewport along the scroll axis.
#[inline]
pub fn axis_length(size: Size, axis: ScrollAxis) -> f32 {
    match axis {
        ScrollAxis::Vertical => size.height,
        ScrollAxis::Horizontal => size.width,
    }
}

/// Sections whose extent intersects `[offset, offset + viewport_len)`.
///
/// Returns an empty range when there is nothing to show.
pub fn visible_sections(
    offset: f32,
    viewport_len: f32,
    extent: f32,
    section_count: usize,
) -> Range<usize> {
    if section_count == 0 || extent <= 0.0 || viewport_len <= 0.0 {
        return 0..0;
    }

    let offset = offset.max(0.0);
    let first = ((offset + EDGE_EPSILON) / extent).floor() as usize;
    let end = ((offset + viewport_len - EDGE_EPSILON) / extent).ceil() as usize;

    let first = first.min(section_count);
    let end = end.clamp(first, section_count);
    first..end
}
