//! Low-level primitives backing the PKI object core: a scoped byte arena
//! with mark/release savepoints, and the two per-object lock kinds
//! (`spec.md` §5 calls these "platform lock/monitor primitives" and treats
//! them as an external collaborator; this crate is the stand-in, since
//! nothing in the surrounding ecosystem already provides them).
//!
//! Kept unsafe-free: the arena hands out reference-counted byte buffers
//! instead of buffers borrowed from a bump region, so there is no raw
//! pointer bookkeeping to get wrong.

#![forbid(unsafe_code)]

pub mod arena;
pub mod lock;

pub use arena::{Arena, ArenaMark};
pub use lock::{Guarded, LockKind};
