//! The decoded-certificate collaborator (`spec.md` §4.5 / Non-goals:
//! "ASN.1/DER decoding of certificates and CRLs ... is an external
//! collaborator"). This crate never parses a DER blob itself; it only
//! asks a `DecodedCertificate` the four questions best-match selection
//! needs answered.

use std::sync::Arc;

use crate::error::PkiError;
use crate::kind::Usage;
use crate::time::Time;

/// The parsed form of one certificate's defining attributes, as needed by
/// `crate::array::best_certificate`.
pub trait DecodedCertificate: Send + Sync {
    fn matches_usage(&self, usage: &Usage) -> bool;
    fn is_valid_at(&self, time: Time) -> bool;
    fn is_trusted_for_usage(&self, usage: &Usage) -> bool;
    fn is_newer_than(&self, other: &dyn DecodedCertificate) -> bool;
}

/// Turns a raw DER encoding into a `DecodedCertificate`. Supplied by
/// whoever wires up a certificate collection; this crate has no opinion on
/// ASN.1.
pub trait CertificateDecoder: Send + Sync {
    fn decode(&self, der: &[u8]) -> Result<Arc<dyn DecodedCertificate>, PkiError>;
}
