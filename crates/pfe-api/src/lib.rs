// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

#![no_std]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

#[macro_use]
extern crate alloc;

use core::fmt;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

pub mod cmd;
pub mod ip;
pub mod stat;

pub use cmd::*;
pub use ip::*;
pub use stat::*;

/// The overall version of the API. Anytime an API is added, removed,
/// or modified, this number should increment. Currently we attach no
/// semantic meaning to the number other than as a means to verify
/// that the admin client and the engine are compiled for the same API.
pub const API_VERSION: u64 = 3;

/// Major version of the PFE package.
pub const MAJOR_VERSION: u64 = 0;

/// The TCP destination port denied by the static transport rule
/// unless configured otherwise.
pub const DEFAULT_DENY_PORT: u16 = 8080;

/// The verdict reached for a single frame.
///
/// The engine does not define how the hosting framework encodes this
/// value; [`Verdict::xdp_action()`] provides the conventional XDP
/// mapping.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Verdict {
    Admit,
    Discard,
}

impl Verdict {
    /// `XDP_DROP`
    pub const XDP_DROP: u32 = 1;
    /// `XDP_PASS`
    pub const XDP_PASS: u32 = 2;

    pub fn xdp_action(self) -> u32 {
        match self {
            Self::Admit => Self::XDP_PASS,
            Self::Discard => Self::XDP_DROP,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Admit => "ADMIT",
            Self::Discard => "DISCARD",
        };
        write!(f, "{s}")
    }
}

/// Engine configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterCfg {
    /// TCP destination port discarded for sources that pass the
    /// blocklist.
    pub deny_port: u16,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self { deny_port: DEFAULT_DENY_PORT }
    }
}
