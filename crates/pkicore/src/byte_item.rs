//! `ByteItem` — a bytewise-comparable blob, the currency UIDs and encodings
//! are built from (`spec.md` §3, component A).

use pkicore_membrane::Arena;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An immutable byte buffer compared and hashed by content, never by
/// identity. An absent item is simply one of length zero.
#[derive(Clone)]
pub struct ByteItem(Arc<[u8]>);

impl Default for ByteItem {
    fn default() -> Self {
        Self::empty()
    }
}

impl ByteItem {
    /// The canonical "absent" item: zero length.
    pub fn empty() -> Self {
        Self(Arc::from(&[][..]))
    }

    /// Copy `bytes` into `arena` and wrap the result.
    pub fn from_arena(arena: &Arena, bytes: &[u8]) -> Self {
        Self(arena.alloc(bytes))
    }

    /// Build a `ByteItem` directly from owned bytes, with no arena backing.
    /// Useful for items that don't need savepoint rollback (e.g. ones handed
    /// in from outside a collection's dedup pass).
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self(Arc::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for ByteItem {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

impl Eq for ByteItem {}

impl Hash for ByteItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state);
    }
}

impl fmt::Debug for ByteItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteItem").field(&self.0.len()).finish()
    }
}
