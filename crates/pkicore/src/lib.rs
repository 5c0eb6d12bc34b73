//! An in-memory, reference-counted, multi-instance object model unifying
//! PKI artifacts (certificates, CRLs, public keys, private keys) across
//! however many cryptographic tokens expose copies of them.
//!
//! A [`PkiObject`](object::PkiObject) is the shared base every artifact is
//! built from: it tracks the set of (token, handle) pairs a given logical
//! object is known under, and is promoted into one of four typed façades
//! (`typed` module) once a [`Collection`](collection::Collection) has
//! enough information to know what it is. The collection is what performs
//! cross-token deduplication, matching instances against each other by a
//! kind-specific [`Uid`](uid::Uid) rather than by where they came from.
//!
//! Token storage, certificate decoding, and trust-domain caching are all
//! external collaborators this crate only calls through traits
//! ([`TokenDriver`](token::TokenDriver), [`CertificateDecoder`](decoded::CertificateDecoder),
//! [`TrustDomain`](trust_domain::TrustDomain)); nothing in this crate
//! parses ASN.1 or touches actual token storage.

#![deny(unsafe_code)]

pub mod array;
pub mod byte_item;
pub mod collection;
pub mod decoded;
pub mod error;
pub mod instance;
pub mod kind;
pub mod object;
pub mod time;
pub mod token;
pub mod trust_domain;
pub mod typed;
pub mod uid;
pub mod vtable;

pub use byte_item::ByteItem;
pub use collection::Collection;
pub use error::{last_error, set_last_error, PkiError};
pub use instance::{InstanceKey, TokenInstance};
pub use kind::{Kind, Policies, Usage};
pub use object::PkiObject;
pub use time::Time;
pub use token::TokenDriver;
pub use trust_domain::{CryptoContext, TrustDomain};
pub use typed::{Certificate, Crl, PrivateKey, PublicKey, TypedObject};
pub use uid::Uid;
pub use vtable::{CertificateOps, CrlOps, KindOps, PrivateKeyOps, PublicKeyOps};

pub use pkicore_membrane::{Arena, ArenaMark, Guarded, LockKind};
