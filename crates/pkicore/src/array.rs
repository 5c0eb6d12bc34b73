//! Array utilities and best-match certificate selection (`spec.md` §3
//! component F, §4.5).
//!
//! `destroy`/`join`/`traverse` exist mostly for parity with the source's
//! array helpers; in Rust, dropping and `Vec::append` already do what the
//! source needed manual reference-counting for.

use std::sync::Arc;

use crate::kind::{Policies, Usage};
use crate::time::Time;
use crate::typed::Certificate;

/// Drop every item in `items`.
pub fn destroy<T>(items: Vec<T>) {
    drop(items);
}

/// Concatenate two arrays, consuming both.
pub fn join<T>(mut first: Vec<T>, mut second: Vec<T>) -> Vec<T> {
    first.append(&mut second);
    first
}

/// Visit each item in order; stop early the first time `callback` returns
/// `false`. Returns whether every item was visited.
pub fn traverse<T>(items: &[T], mut callback: impl FnMut(&T) -> bool) -> bool {
    for item in items {
        if !callback(item) {
            return false;
        }
    }
    true
}

/// Pick the best certificate for `usage` at `time` out of `certs`
/// (`spec.md` §4.5): usage match beats mismatch, validity-at-time beats
/// expired/not-yet-valid, trust beats distrust, and among certificates
/// tied on all three, the newer one wins. `_policies` is accepted for
/// interface parity but not yet consulted by any `DecodedCertificate`
/// implementation.
pub fn best_certificate(
    certs: &[Arc<Certificate>],
    time: Option<Time>,
    usage: &Usage,
    _policies: Option<&Policies>,
) -> Option<Arc<Certificate>> {
    let time = time.unwrap_or_else(Time::now);
    let mut iter = certs.iter();
    let mut best = Arc::clone(iter.next()?);
    let mut best_matches = best.decoded().matches_usage(usage);
    let mut best_valid_at_time = false;
    let mut best_trusted = false;

    for cert in iter {
        let decoded = cert.decoded();
        let this_matches = decoded.matches_usage(usage);

        if best_matches && !this_matches {
            continue;
        } else if !best_matches && this_matches {
            best = Arc::clone(cert);
            best_matches = this_matches;
            best_valid_at_time = false;
            best_trusted = false;
            continue;
        }

        if best_valid_at_time || best.decoded().is_valid_at(time) {
            best_valid_at_time = true;
            if !decoded.is_valid_at(time) {
                continue;
            }
        } else if decoded.is_valid_at(time) {
            best = Arc::clone(cert);
            best_valid_at_time = true;
            continue;
        }

        if best_trusted || best.decoded().is_trusted_for_usage(usage) {
            best_trusted = true;
            if !decoded.is_trusted_for_usage(usage) {
                continue;
            }
        } else if decoded.is_trusted_for_usage(usage) {
            best = Arc::clone(cert);
            best_trusted = true;
            continue;
        }

        if !best.decoded().is_newer_than(decoded.as_ref()) {
            best = Arc::clone(cert);
        }
    }

    Some(best)
}
