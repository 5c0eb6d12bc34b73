//! `Collection` — a single kind's UID-deduplicated object set, indexed both
//! by UID and by (token, handle) (`spec.md` §3 component E, §4.3, §4.4).
//!
//! The source gives the collection no internal lock and requires callers
//! to serialize mutation externally. Rather than wrap the two index maps
//! in a `Mutex` and document a "don't call this concurrently" rule that
//! nothing enforces, every mutating method here takes `&mut self`: the
//! borrow checker itself is the external-serialization contract.
//!
//! Both index maps store slab indices rather than sharing node ownership
//! through an `Rc`/`Arc`, so a stale `(token, handle)` entry left behind by
//! a removed node is simply a lookup miss, not a dangling reference.

use std::collections::HashMap;
use std::sync::Arc;

use pkicore_membrane::{Arena, LockKind};
use tracing::{debug, trace, warn};

use crate::error::{set_last_error, PkiError};
use crate::instance::{InstanceKey, TokenInstance};
use crate::kind::Kind;
use crate::trust_domain::TrustDomain;
use crate::typed::TypedObject;
use crate::uid::Uid;
use crate::vtable::KindOps;

enum NodeObject {
    Proto(Arc<crate::object::PkiObject>),
    Typed(TypedObject),
}

impl NodeObject {
    fn pki_object(&self) -> &Arc<crate::object::PkiObject> {
        match self {
            NodeObject::Proto(object) => object,
            NodeObject::Typed(typed) => typed.pki_object(),
        }
    }
}

struct CollectionNode {
    uid: Uid,
    object: NodeObject,
}

pub struct Collection {
    arena: Arc<Arena>,
    kind: Kind,
    ops: Arc<dyn KindOps>,
    lock_kind: LockKind,
    trust_domain: Option<Arc<dyn TrustDomain>>,
    nodes: Vec<Option<CollectionNode>>,
    by_uid: HashMap<Uid, usize>,
    by_instance: HashMap<InstanceKey, usize>,
}

impl Collection {
    pub fn new(
        kind: Kind,
        ops: Arc<dyn KindOps>,
        lock_kind: LockKind,
        trust_domain: Option<Arc<dyn TrustDomain>>,
    ) -> Self {
        Self {
            arena: Arc::new(Arena::new()),
            kind,
            ops,
            lock_kind,
            trust_domain,
            nodes: Vec::new(),
            by_uid: HashMap::new(),
            by_instance: HashMap::new(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Cardinality of the UID-keyed map. The (token, handle) map is allowed
    /// to grow independently of this (multiple instances can fold into one
    /// UID node), so it is deliberately not reflected here.
    pub fn count(&self) -> usize {
        self.by_uid.len()
    }

    fn push_node(&mut self, node: CollectionNode) -> usize {
        self.nodes.push(Some(node));
        self.nodes.len() - 1
    }

    fn remove_node(&mut self, index: usize) {
        if let Some(node) = self.nodes[index].take() {
            self.by_uid.remove(&node.uid);
        }
    }

    /// Insert an already-typed object directly, bypassing instance-based
    /// dedup. Indexed by UID only; not reachable through the (token,
    /// handle) map.
    pub fn add_object(&mut self, object: &TypedObject) -> Result<(), PkiError> {
        let uid = self.ops.uid_from_object(object)?;
        let index = self.push_node(CollectionNode {
            uid: uid.clone(),
            object: NodeObject::Typed(object.clone()),
        });
        self.by_uid.insert(uid, index);
        Ok(())
    }

    /// Core dedup algorithm (`spec.md` §4.4): look the instance up by
    /// (token, handle) first; on a miss, compute its UID and look that up;
    /// on a second miss, allocate a brand-new node. Returns the node's
    /// slab index together with whether the instance was an exact
    /// duplicate, and whether a new node was created.
    fn add_instance_internal(&mut self, instance: TokenInstance) -> Result<(usize, bool, bool), PkiError> {
        let key = instance.key();
        if let Some(&index) = self.by_instance.get(&key) {
            if let Some(node) = self.nodes[index].as_ref() {
                trace!(handle = instance.handle(), "exact duplicate instance, merging its label into the existing one");
                node.object.pki_object().add_instance(instance)?;
                return Ok((index, true, false));
            }
        }

        let mark = self.arena.mark();
        let uid = match self.ops.uid_from_instance(&instance, &self.arena) {
            Ok(uid) => uid,
            Err(e) => {
                self.arena.release(mark);
                return Err(e);
            }
        };

        if let Some(&index) = self.by_uid.get(&uid) {
            let node = self.nodes[index]
                .as_ref()
                .expect("a uid-indexed slot always points at a live node");
            node.object.pki_object().add_instance(instance)?;
            self.by_instance.insert(key, index);
            self.arena.unmark(mark);
            trace!(index, "appended instance to existing node");
            return Ok((index, false, false));
        }

        let object = match crate::object::PkiObject::create(
            None,
            Some(instance),
            self.trust_domain.as_ref().map(Arc::downgrade),
            None,
            self.lock_kind,
            self.kind,
        ) {
            Ok(object) => object,
            Err(e) => {
                self.arena.release(mark);
                return Err(e);
            }
        };
        let index = self.push_node(CollectionNode {
            uid: uid.clone(),
            object: NodeObject::Proto(object),
        });
        self.by_uid.insert(uid, index);
        self.by_instance.insert(key, index);
        self.arena.unmark(mark);
        trace!(index, "created new node");
        Ok((index, false, true))
    }

    pub fn add_instance(&mut self, instance: TokenInstance) -> Result<(), PkiError> {
        self.add_instance_internal(instance).map(|_| ())
    }

    /// Add each instance in turn; once one fails, the rest are still
    /// consumed (and thus dropped) but not processed, and the first error
    /// is what's returned (`spec.md` §7).
    pub fn add_instances(&mut self, instances: Vec<TokenInstance>) -> Result<(), PkiError> {
        let mut first_err = None;
        for instance in instances {
            if first_err.is_none() {
                if let Err(e) = self.add_instance(instance) {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Promote the node at `index` to its typed form if it isn't already,
    /// removing the node on a promotion failure. Returns the typed object
    /// together with whether it was already promoted on entry.
    fn ensure_promoted(&mut self, index: usize) -> Result<(TypedObject, bool), PkiError> {
        let already_typed = matches!(
            self.nodes[index].as_ref().expect("node exists").object,
            NodeObject::Typed(_)
        );
        if already_typed {
            let typed = match &self.nodes[index].as_ref().unwrap().object {
                NodeObject::Typed(t) => t.clone(),
                NodeObject::Proto(_) => unreachable!(),
            };
            return Ok((typed, true));
        }

        let node = self.nodes[index].take().expect("node exists");
        let proto = match node.object {
            NodeObject::Proto(p) => p,
            NodeObject::Typed(_) => unreachable!(),
        };
        match self.ops.create_from_proto(proto) {
            Ok(typed) => {
                debug!(index, "promoted proto-object to typed object");
                self.nodes[index] = Some(CollectionNode {
                    uid: node.uid,
                    object: NodeObject::Typed(typed.clone()),
                });
                Ok((typed, false))
            }
            Err(e) => {
                warn!(index, error = %e, "promotion failed, discarding node");
                self.by_uid.remove(&node.uid);
                Err(e)
            }
        }
    }

    /// Add an instance and return its node promoted to a typed object. If
    /// the instance landed on a node that was already promoted, the typed
    /// layer is given a chance to refresh any cached decoded state.
    pub fn add_instance_as_object(&mut self, instance: TokenInstance) -> Result<TypedObject, PkiError> {
        let (index, already_present, newly_created) = self.add_instance_internal(instance)?;
        let (typed, was_already_promoted) = self.ensure_promoted(index)?;
        if !newly_created && !already_present && was_already_promoted {
            self.ops.refresh(&typed);
        }
        Ok(typed)
    }

    /// Collect up to `max` objects (0 = unlimited), promoting proto-nodes
    /// along the way. Per the source's dual-channel signaling, this always
    /// returns successfully; if no promotion failed yet the result is
    /// still empty, the process-scoped error slot is set to `NotFound`
    /// instead (`spec.md` §7, §4.4).
    pub fn get_objects(&mut self, max: usize) -> Vec<TypedObject> {
        let mut result = Vec::new();
        let mut had_error = false;
        let indices: Vec<usize> = self.by_uid.values().copied().collect();
        for index in indices {
            if self.nodes[index].is_none() {
                continue;
            }
            match self.ensure_promoted(index) {
                Ok((typed, _)) => result.push(typed),
                Err(_) => {
                    had_error = true;
                    continue;
                }
            }
            if max != 0 && result.len() >= max {
                break;
            }
        }
        if !had_error && result.is_empty() {
            set_last_error(PkiError::NotFound);
        }
        result
    }

    /// Call `callback` once per object, promoting as needed. Nodes that
    /// fail to promote are skipped (and removed) rather than aborting the
    /// traversal.
    pub fn traverse(&mut self, mut callback: impl FnMut(&TypedObject)) {
        let indices: Vec<usize> = self.by_uid.values().copied().collect();
        for index in indices {
            if self.nodes[index].is_none() {
                continue;
            }
            if let Ok((typed, _)) = self.ensure_promoted(index) {
                callback(&typed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoded::{CertificateDecoder, DecodedCertificate};
    use crate::kind::Usage;
    use crate::time::Time;
    use crate::token::TokenDriver;
    use crate::vtable::{CertificateOps, PrivateKeyOps};

    struct FixedToken {
        uid_bytes: Vec<u8>,
    }

    impl TokenDriver for FixedToken {
        fn delete_stored_object(&self, _instance: &TokenInstance) -> Result<(), PkiError> {
            Ok(())
        }
        fn read_uid(&self, _instance: &TokenInstance, _kind: Kind, arena: &Arena) -> Result<Uid, PkiError> {
            Ok(Uid::single(crate::byte_item::ByteItem::from_arena(
                arena,
                &self.uid_bytes,
            )))
        }
    }

    struct StubDecoded;
    impl DecodedCertificate for StubDecoded {
        fn matches_usage(&self, _usage: &Usage) -> bool {
            true
        }
        fn is_valid_at(&self, _time: Time) -> bool {
            true
        }
        fn is_trusted_for_usage(&self, _usage: &Usage) -> bool {
            true
        }
        fn is_newer_than(&self, _other: &dyn DecodedCertificate) -> bool {
            true
        }
    }

    struct StubDecoder;
    impl CertificateDecoder for StubDecoder {
        fn decode(&self, _der: &[u8]) -> Result<Arc<dyn DecodedCertificate>, PkiError> {
            Ok(Arc::new(StubDecoded))
        }
    }

    fn private_key_collection() -> Collection {
        Collection::new(
            Kind::PrivateKey,
            Arc::new(PrivateKeyOps),
            LockKind::Plain,
            None,
        )
    }

    fn certificate_collection() -> Collection {
        Collection::new(
            Kind::Certificate,
            Arc::new(CertificateOps::new(Arc::new(StubDecoder), None)),
            LockKind::Monitor,
            None,
        )
    }

    #[test]
    fn two_tokens_with_same_attributes_dedup_to_one_node() {
        let mut collection = private_key_collection();
        let t1: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"same-key".to_vec(),
        });
        let t2: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"same-key".to_vec(),
        });
        collection
            .add_instance(TokenInstance::new(t1, 1, None))
            .unwrap();
        collection
            .add_instance(TokenInstance::new(t2, 1, None))
            .unwrap();
        assert_eq!(collection.count(), 1);
    }

    #[test]
    fn exact_duplicate_instance_is_a_no_op() {
        let mut collection = private_key_collection();
        let token: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"key".to_vec(),
        });
        collection
            .add_instance(TokenInstance::new(Arc::clone(&token), 1, None))
            .unwrap();
        collection
            .add_instance(TokenInstance::new(token, 1, None))
            .unwrap();
        assert_eq!(collection.count(), 1);
    }

    #[test]
    fn distinct_attributes_create_distinct_nodes() {
        let mut collection = private_key_collection();
        let t1: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"key-a".to_vec(),
        });
        let t2: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"key-b".to_vec(),
        });
        collection
            .add_instance(TokenInstance::new(t1, 1, None))
            .unwrap();
        collection
            .add_instance(TokenInstance::new(t2, 1, None))
            .unwrap();
        assert_eq!(collection.count(), 2);
    }

    #[test]
    #[serial_test::serial]
    fn get_objects_sets_not_found_only_when_empty_and_error_free() {
        let mut collection = private_key_collection();
        let objects = collection.get_objects(0);
        assert!(objects.is_empty());
        assert_eq!(crate::error::last_error(), Some(PkiError::NotFound));
        crate::error::clear_last_error();
    }

    #[test]
    fn add_instance_as_object_promotes_new_node() {
        let mut collection = certificate_collection();
        let token: Arc<dyn TokenDriver> = Arc::new(FixedToken {
            uid_bytes: b"der-bytes".to_vec(),
        });
        let typed = collection
            .add_instance_as_object(TokenInstance::new(token, 1, None))
            .unwrap();
        assert!(matches!(typed, TypedObject::Certificate(_)));
        assert_eq!(collection.count(), 1);
    }

    #[test]
    fn traverse_visits_every_node() {
        let mut collection = private_key_collection();
        for i in 0..3u64 {
            let token: Arc<dyn TokenDriver> = Arc::new(FixedToken {
                uid_bytes: format!("key-{i}").into_bytes(),
            });
            collection
                .add_instance(TokenInstance::new(token, i, None))
                .unwrap();
        }
        let mut seen = 0;
        collection.traverse(|_| seen += 1);
        assert_eq!(seen, 3);
    }
}
