//! Error type and the process-scoped "last error" slot (`spec.md` §7),
//! grounded on the one thiserror usage already present in the source
//! workspace (`frankenlibc-harness::evidence_decode::EvidenceDecodeError`).

use std::sync::OnceLock;

use parking_lot::Mutex;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PkiError {
    #[error("object not found")]
    NotFound,

    #[error("token driver error: {0}")]
    Token(String),

    #[error("certificate or CRL decode error: {0}")]
    Decode(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Kept for parity with the source's allocation-failure status; Rust's
    /// global allocator aborts rather than returning a null arena block, so
    /// this variant is never constructed by this crate.
    #[error("allocation failure")]
    Allocation,
}

static LAST_ERROR: OnceLock<Mutex<Option<PkiError>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<PkiError>> {
    LAST_ERROR.get_or_init(|| Mutex::new(None))
}

/// Record `err` in the process-scoped error slot (`spec.md` §7's
/// dual-channel signaling: some bulk operations report "nothing found"
/// here rather than through their return value).
pub fn set_last_error(err: PkiError) {
    *slot().lock() = Some(err);
}

/// Read the most recently recorded error, if any.
pub fn last_error() -> Option<PkiError> {
    slot().lock().clone()
}

/// Clear the error slot.
pub fn clear_last_error() {
    *slot().lock() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn set_then_read_round_trips() {
        clear_last_error();
        set_last_error(PkiError::NotFound);
        assert_eq!(last_error(), Some(PkiError::NotFound));
        clear_last_error();
        assert_eq!(last_error(), None);
    }
}
