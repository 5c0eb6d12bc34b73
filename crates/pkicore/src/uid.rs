//! `Uid` — the fixed two-slot byte-item array objects are deduplicated on
//! (`spec.md` §3: "MAX_ITEMS_FOR_UID = 2" in the source this was distilled
//! from; a certificate or CRL uses only the first slot for its DER
//! encoding, a key uses both for its two defining attributes).

use crate::byte_item::ByteItem;

/// Number of byte-item slots a UID carries, fixed by the source's
/// `MAX_ITEMS_FOR_UID`.
pub const UID_ITEMS: usize = 2;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Uid([ByteItem; UID_ITEMS]);

impl Uid {
    pub fn new(first: ByteItem, second: ByteItem) -> Self {
        Self([first, second])
    }

    /// A UID that only needs its first slot (certificates, CRLs).
    pub fn single(first: ByteItem) -> Self {
        Self::new(first, ByteItem::empty())
    }

    pub fn items(&self) -> &[ByteItem; UID_ITEMS] {
        &self.0
    }

    pub fn first(&self) -> &ByteItem {
        &self.0[0]
    }

    pub fn second(&self) -> &ByteItem {
        &self.0[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_uid_leaves_second_slot_empty() {
        let uid = Uid::single(ByteItem::copy_from_slice(b"der"));
        assert!(uid.second().is_empty());
    }

    #[test]
    fn equality_compares_both_slots() {
        let a = Uid::new(
            ByteItem::copy_from_slice(b"mod"),
            ByteItem::copy_from_slice(b"exp"),
        );
        let b = Uid::new(
            ByteItem::copy_from_slice(b"mod"),
            ByteItem::copy_from_slice(b"exp"),
        );
        let c = Uid::new(
            ByteItem::copy_from_slice(b"mod"),
            ByteItem::copy_from_slice(b"other"),
        );
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
