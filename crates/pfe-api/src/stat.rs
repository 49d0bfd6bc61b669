// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Types for exporting the filter counters.

use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The key space of the counter table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[repr(u32)]
pub enum CounterId {
    /// Frames whose source passed the blocklist gate.
    Allowed = 0,
    /// Frames discarded because their source is blocklisted.
    Blocked = 1,
}

impl CounterId {
    pub const ALL: [CounterId; 2] = [CounterId::Allowed, CounterId::Blocked];

    pub fn name(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Blocked => "blocked",
        }
    }
}

impl Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A point-in-time copy of the counter table.
///
/// The two values are read independently; a snapshot taken while
/// frames are in flight may reflect a frame in one counter and not
/// yet in the other.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
pub struct FilterStatsSnap {
    pub allowed: u64,
    pub blocked: u64,
}

impl FilterStatsSnap {
    pub fn get(&self, id: CounterId) -> u64 {
        match id {
            CounterId::Allowed => self.allowed,
            CounterId::Blocked => self.blocked,
        }
    }
}
