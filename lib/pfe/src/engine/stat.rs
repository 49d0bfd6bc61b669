// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The filter's counter table.

use crate::api::CounterId;
use crate::api::FilterStatsSnap;
use crate::ddi::kstat::KStatProvider;
use crate::ddi::kstat::KStatU64;

/// The two counters maintained by the filter.
///
/// One instance is shared, usually behind an `Arc`, by every
/// invocation of the filter and by whatever exports the values. The
/// counters only ever increase.
#[derive(Debug, Default)]
pub struct FilterStats {
    /// Frames whose IPv4 source passed the blocklist gate. This counts
    /// frames later discarded by the port rule too.
    pub allowed: KStatU64,
    /// Frames discarded because their IPv4 source is blocklisted.
    pub blocked: KStatU64,
}

impl KStatProvider for FilterStats {
    const NUM_FIELDS: u32 = 2;
    type Snap = FilterStatsSnap;

    fn new() -> Self {
        Self { allowed: KStatU64::new(), blocked: KStatU64::new() }
    }

    fn snapshot(&self) -> FilterStatsSnap {
        FilterStatsSnap {
            allowed: self.allowed.val(),
            blocked: self.blocked.val(),
        }
    }
}

impl FilterStats {
    pub fn stat(&self, id: CounterId) -> &KStatU64 {
        match id {
            CounterId::Allowed => &self.allowed,
            CounterId::Blocked => &self.blocked,
        }
    }

    #[inline]
    pub fn incr(&self, id: CounterId) {
        self.stat(id).incr(1);
    }

    pub fn val(&self, id: CounterId) -> u64 {
        self.stat(id).val()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn incr_by_id() {
        let stats = <FilterStats as KStatProvider>::new();
        assert_eq!(stats.num_fields(), 2);
        stats.incr(CounterId::Allowed);
        stats.incr(CounterId::Allowed);
        stats.incr(CounterId::Blocked);
        assert_eq!(
            stats.snapshot(),
            FilterStatsSnap { allowed: 2, blocked: 1 }
        );
    }
}
