//! `Kind` — the four artifact kinds a `PkiObject` can be, and the opaque
//! usage/policy descriptors best-match selection takes (`spec.md` §3, §4.5).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Certificate,
    Crl,
    PublicKey,
    PrivateKey,
}

/// A caller-defined usage bitmask (e.g. key-usage / extended-key-usage
/// bits). Opaque to this crate: only `DecodedCertificate` implementations
/// interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage(pub u32);

/// Reserved for a future certificate-policy OID list; carries no data yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Policies;
