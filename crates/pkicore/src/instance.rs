//! `TokenInstance` — a (token, handle) pair naming where one copy of an
//! object's material lives (`spec.md` §3, component B). Two instances are
//! equal iff they name the same token and the same handle on it; that pair
//! also keys the collection's secondary index.

use std::sync::Arc;

use crate::token::TokenDriver;

#[derive(Clone)]
pub struct TokenInstance {
    token: Arc<dyn TokenDriver>,
    handle: u64,
    label: Option<String>,
}

impl TokenInstance {
    pub fn new(token: Arc<dyn TokenDriver>, handle: u64, label: Option<String>) -> Self {
        Self {
            token,
            handle,
            label,
        }
    }

    pub fn token(&self) -> &Arc<dyn TokenDriver> {
        &self.token
    }

    pub fn handle(&self) -> u64 {
        self.handle
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// The key this instance occupies in a collection's (token, handle)
    /// index. Token identity is the `Arc`'s address: two `TokenInstance`s
    /// only collide here if they share the very same token driver.
    pub fn key(&self) -> InstanceKey {
        InstanceKey(Arc::as_ptr(&self.token) as *const () as usize, self.handle)
    }
}

impl PartialEq for TokenInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.token, &other.token) && self.handle == other.handle
    }
}

impl Eq for TokenInstance {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey(usize, u64);
