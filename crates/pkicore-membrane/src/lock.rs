//! The two per-object lock kinds from `spec.md` §5: a plain, non-reentrant
//! mutual-exclusion lock and a reentrant monitor. Both are exposed behind a
//! single `Guarded<T>` enum so callers don't need to match on the kind to
//! reach the data it protects.

use parking_lot::{Mutex, ReentrantMutex};
use std::cell::RefCell;

/// Which lock kind a new `PkiObject` should use, chosen once at creation and
/// immutable for the object's lifetime (`spec.md` §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// Non-reentrant mutual exclusion, for objects whose operations never
    /// re-enter themselves (e.g. CRLs, public/private keys).
    Plain,
    /// Reentrant monitor, for objects whose operations may nest (e.g.
    /// certificates, whose decoded form invokes callbacks that re-acquire).
    Monitor,
}

/// Data guarded by one of the two lock kinds.
pub enum Guarded<T> {
    Plain(Mutex<T>),
    Monitor(ReentrantMutex<RefCell<T>>),
}

impl<T> Guarded<T> {
    /// Construct a guard of the given kind around `value`.
    pub fn new(kind: LockKind, value: T) -> Self {
        match kind {
            LockKind::Plain => Self::Plain(Mutex::new(value)),
            LockKind::Monitor => Self::Monitor(ReentrantMutex::new(RefCell::new(value))),
        }
    }

    /// Which kind this guard was constructed with.
    pub fn kind(&self) -> LockKind {
        match self {
            Self::Plain(_) => LockKind::Plain,
            Self::Monitor(_) => LockKind::Monitor,
        }
    }

    /// Run `f` with exclusive access to the guarded value.
    ///
    /// For a `Monitor`, the calling thread may call `with` again while
    /// already inside an outer `with` on the same thread (that's the point
    /// of reentrancy): the value is checked out of the `RefCell` before `f`
    /// runs and checked back in after, so no `RefMut` is ever held while `f`
    /// is executing and a nested call never double-borrows. A nested call
    /// that re-enters while the outer frame still has the value checked out
    /// finds the cell holding `T::default()`, not the outer frame's
    /// in-progress value — matching the source's assumption that re-entrant
    /// callers perform distinct, non-overlapping operations rather than
    /// cooperatively building up one shared value. Whichever frame checks
    /// its value back in last wins; a nested call's own result is only
    /// visible through its return value, not through the cell afterward.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Default,
    {
        match self {
            Self::Plain(mutex) => {
                let mut guard = mutex.lock();
                f(&mut guard)
            }
            Self::Monitor(reentrant) => {
                let guard = reentrant.lock();
                let mut value = guard.replace(T::default());
                let result = f(&mut value);
                guard.replace(value);
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn plain_lock_serializes_mutation() {
        let guarded = Arc::new(Guarded::new(LockKind::Plain, 0usize));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let guarded = Arc::clone(&guarded);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    guarded.with(|v| *v += 1);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        guarded.with(|v| assert_eq!(*v, 8000));
    }

    #[test]
    fn monitor_allows_reentrant_mutation_without_panicking() {
        let guarded = Guarded::new(LockKind::Monitor, vec![1, 2, 3]);
        let inner_result = guarded.with(|outer| {
            outer.push(4);
            // A nested `with` call on the same thread must not double-borrow
            // the `RefCell` and panic, even though it mutates.
            guarded.with(|inner| {
                inner.push(99);
                inner.clone()
            })
        });
        assert_eq!(inner_result, vec![99]);
        guarded.with(|outer| assert_eq!(*outer, vec![1, 2, 3, 4]));
    }

    #[test]
    fn kind_reports_constructed_variant() {
        assert_eq!(Guarded::new(LockKind::Plain, ()).kind(), LockKind::Plain);
        assert_eq!(
            Guarded::new(LockKind::Monitor, ()).kind(),
            LockKind::Monitor
        );
    }
}
