// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The engine: frame access, header views, and the per-frame filter.
pub mod blocklist;
#[cfg(any(feature = "std", test))]
pub mod ctl;
pub mod ether;
pub mod filter;
pub mod frame;
pub mod ip4;
pub mod stat;
pub mod tcp;

pub use blocklist::BlocklistQuery;
pub use filter::Decision;
pub use filter::Filter;
pub use filter::Reason;
pub use frame::Frame;
pub use frame::Truncated;
