//! `PkiObject` — the reference-counted, multi-instance base every artifact
//! kind is built from (`spec.md` §3 component C, §4.1).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use pkicore_membrane::{Arena, Guarded, LockKind};
use tracing::debug;

use crate::error::PkiError;
use crate::instance::TokenInstance;
use crate::kind::Kind;
use crate::token::TokenDriver;
use crate::trust_domain::{CryptoContext, TrustDomain};

pub struct PkiObject {
    arena: Arc<Arena>,
    trust_domain: Option<Weak<dyn TrustDomain>>,
    crypto_context: Option<Weak<dyn CryptoContext>>,
    instances: Guarded<Vec<TokenInstance>>,
    ref_count: AtomicUsize,
    kind: Kind,
}

impl PkiObject {
    /// Create a new object, optionally seeded with its first instance and
    /// an arena shared with the caller (a fresh one is allocated otherwise).
    /// `ref_count` starts at 1, matching the single reference `create`'s
    /// caller holds on return.
    pub fn create(
        arena: Option<Arc<Arena>>,
        instance: Option<TokenInstance>,
        trust_domain: Option<Weak<dyn TrustDomain>>,
        crypto_context: Option<Weak<dyn CryptoContext>>,
        lock_kind: LockKind,
        kind: Kind,
    ) -> Result<Arc<Self>, PkiError> {
        let arena = arena.unwrap_or_else(|| Arc::new(Arena::new()));
        let object = Arc::new(Self {
            arena,
            trust_domain,
            crypto_context,
            instances: Guarded::new(lock_kind, Vec::new()),
            ref_count: AtomicUsize::new(1),
            kind,
        });
        if let Some(instance) = instance {
            object.add_instance(instance)?;
        }
        Ok(object)
    }

    /// Take an additional logical reference, returning a new `Arc` handle
    /// for the caller to hold. Pairs with `destroy`.
    pub fn add_ref(this: &Arc<Self>) -> Arc<Self> {
        this.ref_count.fetch_add(1, Ordering::AcqRel);
        Arc::clone(this)
    }

    /// Release a logical reference. Returns whether this was the final
    /// reference (i.e. whether the object is now torn down). Teardown of
    /// the instances, lock, and arena themselves happens through ordinary
    /// `Drop` once `this` goes out of scope at the end of this call.
    pub fn destroy(this: Arc<Self>) -> bool {
        let previous = this.ref_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous >= 1, "destroy called with ref_count already 0");
        previous == 1
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn arena(&self) -> &Arc<Arena> {
        &self.arena
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn trust_domain(&self) -> Option<Arc<dyn TrustDomain>> {
        self.trust_domain.as_ref().and_then(Weak::upgrade)
    }

    /// Add `candidate` to this object's instance list, or merge its label
    /// into an already-present instance for the same (token, handle).
    pub fn add_instance(&self, candidate: TokenInstance) -> Result<(), PkiError> {
        self.instances.with(|instances| {
            if let Some(existing) = instances.iter_mut().find(|i| **i == candidate) {
                existing.set_label(candidate.label().map(str::to_owned));
            } else {
                instances.push(candidate);
            }
        });
        Ok(())
    }

    pub fn has_instance(&self, candidate: &TokenInstance) -> bool {
        self.instances.with(|instances| instances.iter().any(|i| i == candidate))
    }

    /// Remove at most one instance whose token matches `token`, swapping it
    /// with the last element rather than shifting the tail. This preserves
    /// the source's own behavior of only ever removing the first match per
    /// call even when more than one instance shares the token.
    pub fn remove_instances_for_token(&self, token: &Arc<dyn TokenDriver>) {
        self.instances.with(|instances| {
            if let Some(pos) = instances.iter().position(|i| Arc::ptr_eq(i.token(), token)) {
                instances.swap_remove(pos);
            }
        });
    }

    /// Ask every instance's token to delete its stored copy. Instances
    /// whose deletion fails are retained (compacted to the front, in their
    /// original relative order); instances whose deletion succeeds are
    /// dropped. Returns the status of the last instance processed —
    /// matching the source's unconditional per-iteration assignment rather
    /// than a "last failure wins" accumulator (see DESIGN.md).
    pub fn delete_stored_object(&self) -> Result<(), PkiError> {
        self.instances.with(|instances| {
            let mut status = Ok(());
            let mut retained = Vec::new();
            for instance in instances.drain(..) {
                let result = instance.token().delete_stored_object(&instance);
                if result.is_err() {
                    retained.push(instance);
                }
                status = result;
            }
            *instances = retained;
            status
        })
    }

    pub fn tokens(&self) -> Vec<Arc<dyn TokenDriver>> {
        self.instances
            .with(|instances| instances.iter().map(|i| Arc::clone(i.token())).collect())
    }

    /// The nickname of the instance on `token`, or of the first instance
    /// carrying any nickname at all when `token` is `None`.
    pub fn nickname_for_token(&self, token: Option<&Arc<dyn TokenDriver>>) -> Option<String> {
        self.instances.with(|instances| {
            instances
                .iter()
                .find(|i| match token {
                    Some(t) => Arc::ptr_eq(i.token(), t),
                    None => i.label().is_some(),
                })
                .and_then(|i| i.label().map(str::to_owned))
        })
    }

    pub fn instances(&self) -> Vec<TokenInstance> {
        self.instances.with(|instances| instances.clone())
    }
}

impl Drop for PkiObject {
    fn drop(&mut self) {
        debug!(kind = ?self.kind, "destroying pki object");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uid::Uid;
    use std::thread;

    struct StubToken(u64);
    impl TokenDriver for StubToken {
        fn delete_stored_object(&self, _instance: &TokenInstance) -> Result<(), PkiError> {
            if self.0 == 2 {
                Err(PkiError::Token("locked".into()))
            } else {
                Ok(())
            }
        }
        fn read_uid(&self, _instance: &TokenInstance, _kind: Kind, _arena: &Arena) -> Result<Uid, PkiError> {
            Ok(Uid::default())
        }
    }

    fn object(kind: Kind) -> Arc<PkiObject> {
        PkiObject::create(None, None, None, None, LockKind::Plain, kind).unwrap()
    }

    #[test]
    fn create_starts_with_ref_count_one() {
        let obj = object(Kind::Crl);
        assert_eq!(obj.ref_count(), 1);
    }

    #[test]
    fn add_ref_then_destroy_is_balanced() {
        let obj = object(Kind::Crl);
        let handle = PkiObject::add_ref(&obj);
        assert_eq!(obj.ref_count(), 2);
        assert!(!PkiObject::destroy(handle));
        assert!(PkiObject::destroy(obj));
    }

    #[test]
    fn concurrent_add_ref_and_destroy_tears_down_exactly_once() {
        let obj = object(Kind::Crl);
        let destroyed_count = Arc::new(AtomicUsize::new(0));
        thread::scope(|scope| {
            for _ in 0..8 {
                let handle = PkiObject::add_ref(&obj);
                let destroyed_count = Arc::clone(&destroyed_count);
                scope.spawn(move || {
                    if PkiObject::destroy(handle) {
                        destroyed_count.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert!(PkiObject::destroy(obj));
        assert_eq!(
            destroyed_count.load(Ordering::SeqCst),
            0,
            "the original reference, not a spawned one, must be the final release"
        );
    }

    #[test]
    fn add_instance_merges_label_on_duplicate_key() {
        let obj = object(Kind::PrivateKey);
        let token: Arc<dyn TokenDriver> = Arc::new(StubToken(1));
        obj.add_instance(TokenInstance::new(Arc::clone(&token), 9, None)).unwrap();
        obj.add_instance(TokenInstance::new(Arc::clone(&token), 9, Some("label".into())))
            .unwrap();
        let instances = obj.instances();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].label(), Some("label"));
    }

    #[test]
    fn remove_instances_for_token_removes_at_most_one() {
        let obj = object(Kind::PrivateKey);
        let token: Arc<dyn TokenDriver> = Arc::new(StubToken(1));
        obj.add_instance(TokenInstance::new(Arc::clone(&token), 1, None)).unwrap();
        obj.add_instance(TokenInstance::new(Arc::clone(&token), 2, None)).unwrap();
        obj.remove_instances_for_token(&token);
        assert_eq!(obj.instances().len(), 1);
    }

    #[test]
    fn delete_stored_object_returns_status_of_last_instance() {
        let obj = object(Kind::PrivateKey);
        let ok_token: Arc<dyn TokenDriver> = Arc::new(StubToken(1));
        let failing_token: Arc<dyn TokenDriver> = Arc::new(StubToken(2));
        obj.add_instance(TokenInstance::new(ok_token, 1, None)).unwrap();
        obj.add_instance(TokenInstance::new(Arc::clone(&failing_token), 2, None))
            .unwrap();
        let result = obj.delete_stored_object();
        assert!(result.is_err());
        assert_eq!(obj.instances().len(), 1, "the failing instance is retained");
    }
}
