//! Near-end detection for infinite scrolling.
//!
//! The check is stateless: it runs after every cell leaves the viewport and
//! only looks at the position's index and the live content count. Repeated
//! qualifying events fire repeatedly; consumers debounce themselves.

/// Items left after `index` in a sequence of `count`.
///
/// Negative when `index` lies past the end, as it does for the unused tail of
/// a partial last section.
#[inline]
pub fn remaining_after(index: usize, count: usize) -> i64 {
    (count as i64 - 1) - index as i64
}

/// Returns the remaining count when it is at or below `threshold`.
pub fn check_near_end(index: usize, count: usize, threshold: usize) -> Option<i64> {
    let remaining = remaining_after(index, count);
    (remaining <= threshold as i64).then_some(remaining)
}
