//! Observable settings cells.
//!
//! A [`Property<T>`] wraps a value and reports whether a write actually
//! changed it. Every effective change bumps a revision counter, which lets a
//! consumer compare against the revision it last applied instead of tracking
//! dirty flags by hand.
//!
//! # Example
//!
//! ```
//! use scrollgrid_core::Property;
//!
//! let rows = Property::new(1usize);
//! let applied = rows.revision();
//!
//! assert!(!rows.set(1));
//! assert_eq!(rows.revision(), applied);
//!
//! assert!(rows.set(3));
//! assert_ne!(rows.revision(), applied);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// A value cell with change detection.
pub struct Property<T> {
    value: RwLock<T>,
    revision: AtomicU64,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            revision: AtomicU64::new(0),
        }
    }

    /// Get a copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Revision counter, bumped on every effective change.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if it changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current == value {
            return false;
        }
        *current = value;
        self.revision.fetch_add(1, Ordering::AcqRel);
        true
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .field("revision", &self.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_property_set_detects_change() {
        let prop = Property::new(42);
        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
        assert_eq!(prop.revision(), 1);
    }

    #[test]
    fn test_property_revision_counts_changes_only() {
        let prop = Property::new(String::from("a"));
        for value in ["b", "b", "c", "c", "a"] {
            prop.set(value.into());
        }
        assert_eq!(prop.get(), "a");
        assert_eq!(prop.revision(), 3);
    }

    #[test]
    fn test_property_thread_safe() {
        let prop = Arc::new(Property::new(0u32));
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let prop = prop.clone();
                std::thread::spawn(move || {
                    prop.set(n);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!((1..=4).contains(&prop.get()));
        assert!(prop.revision() >= 1);
    }
}
