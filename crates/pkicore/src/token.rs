//! The token driver: the external collaborator that owns the on-token
//! storage an object's instances point into (`spec.md` §6). Everything a
//! `TokenInstance` needs from its token — deleting stored copies, reading
//! UID attributes — is reached through this trait rather than through the
//! instance destroying/cloning/comparing itself, which Rust's `Drop`/
//! `Clone`/`PartialEq` already give us for free (see DESIGN.md).

use std::sync::Arc;

use crate::error::PkiError;
use crate::kind::Kind;
use crate::instance::TokenInstance;
use crate::uid::Uid;
use pkicore_membrane::Arena;

pub trait TokenDriver: Send + Sync {
    /// Remove the stored copy of `instance` from the token.
    fn delete_stored_object(&self, instance: &TokenInstance) -> Result<(), PkiError>;

    /// Read the UID byte-items for `instance` as a `kind` object, allocating
    /// them out of `arena`. Stands in for the source's kind-specific
    /// attribute readers (`cert_attributes`, `key_attributes`, ...), which
    /// this crate collapses behind one dispatch point since the kind is
    /// already known from the collection doing the reading.
    fn read_uid(&self, instance: &TokenInstance, kind: Kind, arena: &Arena) -> Result<Uid, PkiError>;
}

pub type TokenHandle = Arc<dyn TokenDriver>;
