//! Identity-keyed wrapper for shared model objects.
//!
//! Atlases and sub-timelines are deduplicated by instance, not by value:
//! two pixel-identical atlases are still two atlases. `ByAddress` hashes
//! and compares the `Arc` pointer and never looks at the contents.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Borrowed `Arc` compared by pointer.
#[derive(Debug)]
pub struct ByAddress<'a, T>(pub &'a Arc<T>);

impl<T> Clone for ByAddress<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ByAddress<'_, T> {}

impl<T> PartialEq for ByAddress<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.0, other.0)
    }
}

impl<T> Eq for ByAddress<'_, T> {}

impl<T> Hash for ByAddress<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(self.0).hash(state);
    }
}
