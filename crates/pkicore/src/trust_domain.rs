//! External collaborators a `PkiObject` only ever holds a non-owning
//! back-reference to (`spec.md` §3, component C: "trust_domain,
//! crypto_context (non-owning back references)").

use std::sync::Arc;

use crate::typed::Certificate;

/// The trust domain's certificate cache, consulted when a certificate
/// proto-object is promoted so that two promotions of the "same" logical
/// certificate collapse onto one `Arc<Certificate>` (`spec.md` §4.2's
/// "interning" step).
pub trait TrustDomain: Send + Sync {
    /// Offer freshly promoted certificates to the cache; returns, for each
    /// input, the `Arc<Certificate>` callers should actually keep (the
    /// input itself if it was newly cached, or a pre-existing entry for the
    /// same certificate).
    fn add_certs_to_cache(&self, certs: Vec<Arc<Certificate>>) -> Vec<Arc<Certificate>>;
}

/// Opaque back-reference to whatever cryptographic session context created
/// an object. This crate never calls into it; it exists purely so a
/// `PkiObject` can carry the reference the way the source does.
pub trait CryptoContext: Send + Sync {}
