//! Kind-dispatched object behavior (`spec.md` §3 component D, §4.2). The
//! source dispatches through a per-kind function-pointer struct installed
//! on the collection; here that's a trait object, one implementation per
//! artifact kind. `destroy` isn't part of the trait: promotion to a typed
//! façade hands ownership to an `Arc`, and ordinary `Drop` tears the object
//! down when the last clone goes away (see DESIGN.md).

use std::sync::Arc;

use tracing::debug;

use crate::decoded::CertificateDecoder;
use crate::error::PkiError;
use crate::instance::TokenInstance;
use crate::kind::Kind;
use crate::object::PkiObject;
use crate::trust_domain::TrustDomain;
use crate::typed::{Certificate, Crl, PrivateKey, PublicKey, TypedObject};
use crate::uid::Uid;

pub trait KindOps: Send + Sync {
    fn kind(&self) -> Kind;

    /// Recover the UID a promoted object was filed under, from the object
    /// itself (used when re-deriving a UID without a live instance).
    fn uid_from_object(&self, object: &TypedObject) -> Result<Uid, PkiError>;

    /// Compute the UID a candidate instance would promote to, without
    /// creating anything yet. `arena` is the collection's own scratch
    /// arena, marked by the caller around this call.
    fn uid_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError>;

    /// Promote a freshly collected proto-object into its concrete façade.
    fn create_from_proto(&self, proto: Arc<PkiObject>) -> Result<TypedObject, PkiError>;

    /// Re-derive any cached decoded state after a new instance was merged
    /// into an already-promoted object. A no-op for kinds with nothing to
    /// cache.
    fn refresh(&self, _object: &TypedObject) {}
}

fn first_instance(proto: &PkiObject) -> Result<TokenInstance, PkiError> {
    proto
        .instances()
        .into_iter()
        .next()
        .ok_or_else(|| PkiError::InvalidArgument("proto-object has no instances".into()))
}

pub struct CertificateOps {
    decoder: Arc<dyn CertificateDecoder>,
    trust_domain: Option<Arc<dyn TrustDomain>>,
}

impl CertificateOps {
    pub fn new(decoder: Arc<dyn CertificateDecoder>, trust_domain: Option<Arc<dyn TrustDomain>>) -> Self {
        Self {
            decoder,
            trust_domain,
        }
    }

    fn decode_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError> {
        instance.token().read_uid(instance, Kind::Certificate, arena)
    }
}

impl KindOps for CertificateOps {
    fn kind(&self) -> Kind {
        Kind::Certificate
    }

    fn uid_from_object(&self, object: &TypedObject) -> Result<Uid, PkiError> {
        match object {
            TypedObject::Certificate(cert) => Ok(Uid::single(cert.encoding().clone())),
            _ => Err(PkiError::InvalidArgument("not a certificate".into())),
        }
    }

    fn uid_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError> {
        self.decode_from_instance(instance, arena)
    }

    fn create_from_proto(&self, proto: Arc<PkiObject>) -> Result<TypedObject, PkiError> {
        let instance = first_instance(&proto)?;
        let mark = proto.arena().mark();
        let uid = self.decode_from_instance(&instance, proto.arena())?;
        proto.arena().unmark(mark);
        let encoding = uid.first().clone();
        let decoded = self.decoder.decode(encoding.as_bytes())?;
        let cert = Arc::new(Certificate::new(proto, encoding, decoded));
        let promoted = match &self.trust_domain {
            Some(trust_domain) => {
                let interned = trust_domain
                    .add_certs_to_cache(vec![Arc::clone(&cert)])
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| Arc::clone(&cert));
                if !Arc::ptr_eq(&interned, &cert) {
                    debug!("reused cached certificate from trust domain instead of the freshly decoded one");
                }
                interned
            }
            None => cert,
        };
        Ok(TypedObject::Certificate(promoted))
    }

    fn refresh(&self, object: &TypedObject) {
        if let TypedObject::Certificate(cert) = object {
            if let Ok(instance) = first_instance(cert.object()) {
                if let Ok(uid) = self.decode_from_instance(&instance, cert.object().arena()) {
                    if let Ok(decoded) = self.decoder.decode(uid.first().as_bytes()) {
                        cert.set_decoded(decoded);
                    }
                }
            }
        }
    }
}

pub struct CrlOps;

impl KindOps for CrlOps {
    fn kind(&self) -> Kind {
        Kind::Crl
    }

    fn uid_from_object(&self, object: &TypedObject) -> Result<Uid, PkiError> {
        match object {
            TypedObject::Crl(crl) => Ok(Uid::single(crl.encoding().clone())),
            _ => Err(PkiError::InvalidArgument("not a crl".into())),
        }
    }

    fn uid_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError> {
        instance.token().read_uid(instance, Kind::Crl, arena)
    }

    fn create_from_proto(&self, proto: Arc<PkiObject>) -> Result<TypedObject, PkiError> {
        let instance = first_instance(&proto)?;
        let mark = proto.arena().mark();
        let uid = instance.token().read_uid(&instance, Kind::Crl, proto.arena())?;
        proto.arena().unmark(mark);
        let encoding = uid.first().clone();
        Ok(TypedObject::Crl(Arc::new(Crl::new(proto, encoding))))
    }
}

pub struct PublicKeyOps;

impl KindOps for PublicKeyOps {
    fn kind(&self) -> Kind {
        Kind::PublicKey
    }

    fn uid_from_object(&self, object: &TypedObject) -> Result<Uid, PkiError> {
        match object {
            TypedObject::PublicKey(key) => Ok(Uid::new(
                key.modulus_or_point().clone(),
                key.exponent_or_curve().clone(),
            )),
            _ => Err(PkiError::InvalidArgument("not a public key".into())),
        }
    }

    fn uid_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError> {
        instance.token().read_uid(instance, Kind::PublicKey, arena)
    }

    fn create_from_proto(&self, proto: Arc<PkiObject>) -> Result<TypedObject, PkiError> {
        let instance = first_instance(&proto)?;
        let mark = proto.arena().mark();
        let uid = instance.token().read_uid(&instance, Kind::PublicKey, proto.arena())?;
        proto.arena().unmark(mark);
        Ok(TypedObject::PublicKey(Arc::new(PublicKey::new(
            proto,
            uid.first().clone(),
            uid.second().clone(),
        ))))
    }
}

pub struct PrivateKeyOps;

impl KindOps for PrivateKeyOps {
    fn kind(&self) -> Kind {
        Kind::PrivateKey
    }

    fn uid_from_object(&self, object: &TypedObject) -> Result<Uid, PkiError> {
        match object {
            TypedObject::PrivateKey(key) => Ok(Uid::new(key.id().clone(), key.label().clone())),
            _ => Err(PkiError::InvalidArgument("not a private key".into())),
        }
    }

    fn uid_from_instance(&self, instance: &TokenInstance, arena: &pkicore_membrane::Arena) -> Result<Uid, PkiError> {
        instance.token().read_uid(instance, Kind::PrivateKey, arena)
    }

    fn create_from_proto(&self, proto: Arc<PkiObject>) -> Result<TypedObject, PkiError> {
        let instance = first_instance(&proto)?;
        let mark = proto.arena().mark();
        let uid = instance.token().read_uid(&instance, Kind::PrivateKey, proto.arena())?;
        proto.arena().unmark(mark);
        Ok(TypedObject::PrivateKey(Arc::new(PrivateKey::new(
            proto,
            uid.first().clone(),
            uid.second().clone(),
        ))))
    }
}
