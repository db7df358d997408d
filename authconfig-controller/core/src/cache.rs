use parking_lot::RwLock;
use std::{collections::BTreeSet, sync::Arc};

/// Looks up the keys the cache currently holds for an AuthConfig.
///
/// Implementations must be safe for concurrent readers. An identifier with
/// nothing indexed yields an empty set; lookups never fail.
pub trait FindKeys {
    fn find_keys(&self, id: &str) -> BTreeSet<String>;
}

impl<T: FindKeys + ?Sized> FindKeys for &T {
    #[inline]
    fn find_keys(&self, id: &str) -> BTreeSet<String> {
        (**self).find_keys(id)
    }
}

impl<T: FindKeys + ?Sized> FindKeys for Arc<T> {
    #[inline]
    fn find_keys(&self, id: &str) -> BTreeSet<String> {
        (**self).find_keys(id)
    }
}

impl<T: FindKeys> FindKeys for RwLock<T> {
    #[inline]
    fn find_keys(&self, id: &str) -> BTreeSet<String> {
        self.read().find_keys(id)
    }
}
