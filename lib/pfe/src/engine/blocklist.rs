// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The source-address blocklist.
//!
//! The filter only ever asks one question of the blocklist: is this
//! address in it? That question is the [`BlocklistQuery`] trait, and
//! it is all the filter depends on. Ownership of the entries, along
//! with the policy for adding and removing them, belongs to whoever
//! supplies the implementation; in a std context that is usually
//! [`Blocklist`], driven by the control plane in [`super::ctl`].

use crate::api::BLOCKLIST_MAX_ENTRIES;
use crate::api::Ipv4Addr;
use alloc::sync::Arc;
use heapless::FnvIndexSet;

cfg_if! {
    if #[cfg(any(feature = "std", test))] {
        use crate::api::PfeError;
        use crate::ddi::sync::KRwLock;
        use alloc::vec::Vec;
    }
}

/// The number of hash slots backing an [`AddrSet`]. The table is kept
/// at most half full so lookups stay short.
pub const ADDR_SET_SLOTS: usize = 2 * BLOCKLIST_MAX_ENTRIES;

/// A fixed-capacity set of addresses with constant-time lookup.
pub type AddrSet = FnvIndexSet<Ipv4Addr, ADDR_SET_SLOTS>;

/// Insert `addr` unless that would take `set` past
/// [`BLOCKLIST_MAX_ENTRIES`]. Return `Ok(true)` if it was added.
pub fn insert_bounded(
    set: &mut AddrSet,
    addr: Ipv4Addr,
) -> Result<bool, Ipv4Addr> {
    if set.contains(&addr) {
        return Ok(false);
    }

    if set.len() >= BLOCKLIST_MAX_ENTRIES {
        return Err(addr);
    }

    set.insert(addr)
}

/// Answer membership queries on behalf of the filter.
///
/// Implementations must answer in bounded time, must not block for
/// longer than a concurrent writer takes to swap its data, and must be
/// callable from many threads at once.
pub trait BlocklistQuery {
    fn contains(&self, addr: Ipv4Addr) -> bool;
}

impl<T: BlocklistQuery + ?Sized> BlocklistQuery for &T {
    fn contains(&self, addr: Ipv4Addr) -> bool {
        (**self).contains(addr)
    }
}

impl<T: BlocklistQuery + ?Sized> BlocklistQuery for Arc<T> {
    fn contains(&self, addr: Ipv4Addr) -> bool {
        (**self).contains(addr)
    }
}

impl BlocklistQuery for AddrSet {
    fn contains(&self, addr: Ipv4Addr) -> bool {
        FnvIndexSet::contains(self, &addr)
    }
}

/// The control-plane owned blocklist.
///
/// Lookups take the read side of the lock. Every mutation takes the
/// write side for its whole duration, so a lookup sees the list as it
/// was before or after a given change, never partway through one.
#[cfg(any(feature = "std", test))]
pub struct Blocklist {
    inner: KRwLock<AddrSet>,
}

#[cfg(any(feature = "std", test))]
impl Default for Blocklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(feature = "std", test))]
impl Blocklist {
    pub fn new() -> Self {
        Self { inner: KRwLock::new(AddrSet::new()) }
    }

    pub fn capacity(&self) -> usize {
        BLOCKLIST_MAX_ENTRIES
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Add `addr` to the list.
    ///
    /// Return `true` if the address was not already present. Adding
    /// an address that is already present succeeds without change,
    /// even when the list is full.
    pub fn add(&self, addr: Ipv4Addr) -> Result<bool, PfeError> {
        insert_bounded(&mut self.inner.write(), addr)
            .map_err(|_| PfeError::MaxCapacity(BLOCKLIST_MAX_ENTRIES as u64))
    }

    /// Remove `addr` from the list.
    pub fn remove(&self, addr: Ipv4Addr) -> Result<(), PfeError> {
        if self.inner.write().remove(&addr) {
            Ok(())
        } else {
            Err(PfeError::AddrNotFound(addr))
        }
    }

    /// Replace the entire list with `addrs`.
    ///
    /// Duplicates in `addrs` are collapsed. If the distinct addresses
    /// do not fit, the current list is left untouched.
    pub fn set(&self, addrs: &[Ipv4Addr]) -> Result<(), PfeError> {
        let mut new_set = AddrSet::new();
        for addr in addrs {
            insert_bounded(&mut new_set, *addr).map_err(|_| {
                PfeError::MaxCapacity(BLOCKLIST_MAX_ENTRIES as u64)
            })?;
        }

        *self.inner.write() = new_set;
        Ok(())
    }

    /// Remove every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut set = self.inner.write();
        let n = set.len();
        set.clear();
        n
    }

    /// Copy out the current entries.
    pub fn list(&self) -> Vec<Ipv4Addr> {
        self.inner.read().iter().copied().collect()
    }
}

#[cfg(any(feature = "std", test))]
impl BlocklistQuery for Blocklist {
    fn contains(&self, addr: Ipv4Addr) -> bool {
        self.inner.read().contains(&addr)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ip(n: u32) -> Ipv4Addr {
        Ipv4Addr::from(n)
    }

    #[test]
    fn add_remove_contains() {
        let bl = Blocklist::new();
        let addr: Ipv4Addr = "192.168.1.100".parse().unwrap();
        assert!(!bl.contains(addr));
        assert_eq!(bl.add(addr), Ok(true));
        assert!(bl.contains(addr));
        assert_eq!(bl.add(addr), Ok(false));
        assert_eq!(bl.len(), 1);
        assert_eq!(bl.remove(addr), Ok(()));
        assert!(!bl.contains(addr));
        assert_eq!(bl.remove(addr), Err(PfeError::AddrNotFound(addr)));
    }

    #[test]
    fn full_list_rejects_new_addresses() {
        let bl = Blocklist::new();
        for i in 0..BLOCKLIST_MAX_ENTRIES as u32 {
            assert_eq!(bl.add(ip(0x0A00_0000 + i)), Ok(true));
        }
        assert_eq!(bl.len(), bl.capacity());
        assert_eq!(
            bl.add(ip(0x0B00_0000)),
            Err(PfeError::MaxCapacity(BLOCKLIST_MAX_ENTRIES as u64))
        );
        // Re-adding a present entry is still fine.
        assert_eq!(bl.add(ip(0x0A00_0000)), Ok(false));
        assert!(!bl.contains(ip(0x0B00_0000)));
    }

    #[test]
    fn set_is_all_or_nothing() {
        let bl = Blocklist::new();
        bl.set(&[ip(1), ip(2), ip(2)]).unwrap();
        assert_eq!(bl.len(), 2);

        let too_many: Vec<Ipv4Addr> =
            (0..=BLOCKLIST_MAX_ENTRIES as u32).map(|i| ip(100 + i)).collect();
        assert!(bl.set(&too_many).is_err());
        assert_eq!(bl.len(), 2);
        assert!(bl.contains(ip(1)));
        assert!(!bl.contains(ip(100)));
    }

    #[test]
    fn clear_reports_count() {
        let bl = Blocklist::new();
        bl.set(&[ip(1), ip(2), ip(3)]).unwrap();
        assert_eq!(bl.clear(), 3);
        assert_eq!(bl.clear(), 0);
        assert!(bl.list().is_empty());
    }

    #[test]
    fn insert_bounded_on_a_plain_set() {
        let mut set = AddrSet::new();
        assert_eq!(insert_bounded(&mut set, ip(7)), Ok(true));
        assert_eq!(insert_bounded(&mut set, ip(7)), Ok(false));

        for i in 1..BLOCKLIST_MAX_ENTRIES as u32 {
            assert_eq!(insert_bounded(&mut set, ip(0x0A00_0000 + i)), Ok(true));
        }
        assert_eq!(set.len(), BLOCKLIST_MAX_ENTRIES);
        assert_eq!(insert_bounded(&mut set, ip(8)), Err(ip(8)));
        assert_eq!(insert_bounded(&mut set, ip(7)), Ok(false));
    }

    #[test]
    fn query_through_wrappers() {
        let mut set = AddrSet::new();
        insert_bounded(&mut set, ip(7)).unwrap();
        assert!(BlocklistQuery::contains(&set, ip(7)));
        assert!(BlocklistQuery::contains(&&set, ip(7)));

        let shared = Arc::new(Blocklist::new());
        shared.add(ip(9)).unwrap();
        assert!(BlocklistQuery::contains(&shared, ip(9)));
        assert!(!BlocklistQuery::contains(&shared, ip(7)));
    }
}
