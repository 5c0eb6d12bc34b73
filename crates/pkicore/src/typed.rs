//! The four concrete artifact façades a `PkiObject` gets promoted into
//! (`spec.md` §4.2's "typed object"). Each is a thin wrapper around the
//! shared `PkiObject`; a certificate additionally caches its decoded form.
//!
//! In the source, the typed structs embed `nssPKIObject` as their literal
//! first field and the decoded form can hold a back-reference to the
//! owning certificate, which the source calls out as a reference cycle to
//! break. That cycle doesn't exist here: a `Certificate` owns its decoded
//! form outright, and the decoded form never needs to point back, so there
//! is nothing to break (see DESIGN.md).

use std::sync::Arc;
use parking_lot::Mutex;

use crate::byte_item::ByteItem;
use crate::decoded::DecodedCertificate;
use crate::object::PkiObject;

pub struct Certificate {
    object: Arc<PkiObject>,
    encoding: ByteItem,
    decoded: Mutex<Arc<dyn DecodedCertificate>>,
}

impl Certificate {
    pub fn new(object: Arc<PkiObject>, encoding: ByteItem, decoded: Arc<dyn DecodedCertificate>) -> Self {
        Self {
            object,
            encoding,
            decoded: Mutex::new(decoded),
        }
    }

    pub fn object(&self) -> &Arc<PkiObject> {
        &self.object
    }

    pub fn encoding(&self) -> &ByteItem {
        &self.encoding
    }

    pub fn decoded(&self) -> Arc<dyn DecodedCertificate> {
        Arc::clone(&self.decoded.lock())
    }

    pub fn set_decoded(&self, decoded: Arc<dyn DecodedCertificate>) {
        *self.decoded.lock() = decoded;
    }
}

pub struct Crl {
    object: Arc<PkiObject>,
    encoding: ByteItem,
}

impl Crl {
    pub fn new(object: Arc<PkiObject>, encoding: ByteItem) -> Self {
        Self { object, encoding }
    }

    pub fn object(&self) -> &Arc<PkiObject> {
        &self.object
    }

    pub fn encoding(&self) -> &ByteItem {
        &self.encoding
    }
}

pub struct PublicKey {
    object: Arc<PkiObject>,
    modulus_or_point: ByteItem,
    exponent_or_curve: ByteItem,
}

impl PublicKey {
    pub fn new(object: Arc<PkiObject>, modulus_or_point: ByteItem, exponent_or_curve: ByteItem) -> Self {
        Self {
            object,
            modulus_or_point,
            exponent_or_curve,
        }
    }

    pub fn object(&self) -> &Arc<PkiObject> {
        &self.object
    }

    pub fn modulus_or_point(&self) -> &ByteItem {
        &self.modulus_or_point
    }

    pub fn exponent_or_curve(&self) -> &ByteItem {
        &self.exponent_or_curve
    }
}

pub struct PrivateKey {
    object: Arc<PkiObject>,
    id: ByteItem,
    label: ByteItem,
}

impl PrivateKey {
    pub fn new(object: Arc<PkiObject>, id: ByteItem, label: ByteItem) -> Self {
        Self { object, id, label }
    }

    pub fn object(&self) -> &Arc<PkiObject> {
        &self.object
    }

    pub fn id(&self) -> &ByteItem {
        &self.id
    }

    pub fn label(&self) -> &ByteItem {
        &self.label
    }
}

/// Any one of the four promoted kinds, as stored in a collection node once
/// its proto-object has been promoted.
#[derive(Clone)]
pub enum TypedObject {
    Certificate(Arc<Certificate>),
    Crl(Arc<Crl>),
    PublicKey(Arc<PublicKey>),
    PrivateKey(Arc<PrivateKey>),
}

impl TypedObject {
    pub fn pki_object(&self) -> &Arc<PkiObject> {
        match self {
            Self::Certificate(c) => c.object(),
            Self::Crl(c) => c.object(),
            Self::PublicKey(k) => k.object(),
            Self::PrivateKey(k) => k.object(),
        }
    }
}
