//! Thread safe handle to an [AddressIndex].

use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{AddressIndex, Registration, Verdict};
use crate::common::Handler;
use crate::Result;

#[derive(Debug, Clone, Default)]
/// Cloneable handle to an [AddressIndex] behind a single read-write lock.
///
/// Matching takes the read lock, so queries run concurrently, while a
/// registration holds the write lock for the whole path it creates and
/// rebalances. Every operation is bounded by a few dozen key comparisons
/// per level, so the lock is never held for long.
pub struct SharedIndex {
    inner: Arc<RwLock<AddressIndex>>,
}

impl SharedIndex {
    pub fn new(index: AddressIndex) -> Self {
        SharedIndex {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    // === Public Methods ===

    /// See [AddressIndex::add_address].
    pub fn add_address<H: Handler + 'static>(
        &self,
        ip: &str,
        name: &str,
        handler: H,
    ) -> Result<Registration> {
        self.write().add_address(ip, name, handler)
    }

    /// See [AddressIndex::add_subnet].
    pub fn add_subnet<H: Handler + 'static>(
        &self,
        cidr: &str,
        name: &str,
        handler: H,
    ) -> Result<Registration> {
        self.write().add_subnet(cidr, name, handler)
    }

    /// See [AddressIndex::match_addr].
    pub fn match_addr(&self, address: impl Into<Ipv4Addr>) -> u32 {
        self.read().match_addr(address)
    }

    /// See [AddressIndex::classify].
    pub fn classify(&self, address: impl Into<Ipv4Addr>) -> Option<Verdict> {
        self.read().classify(address)
    }

    /// See [AddressIndex::to_json].
    pub fn to_json(&self) -> Result<String> {
        self.read().to_json()
    }

    /// Lock the index for reading.
    ///
    /// Only a panic while a [Self::write] guard is held poisons the lock.
    /// Registration never calls handlers and validates before mutating, so
    /// such a panic comes from the caller and the index stays consistent;
    /// a poisoned lock is recovered rather than propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, AddressIndex> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the index for writing, see [Self::read] about poisoning.
    pub fn write(&self) -> RwLockWriteGuard<'_, AddressIndex> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<AddressIndex> for SharedIndex {
    fn from(index: AddressIndex) -> Self {
        SharedIndex::new(index)
    }
}
