// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

pub use pfe_api::*;

use alloc::vec::Vec;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a command body for the control boundary.
pub fn encode<T: Serialize>(val: &T) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(val)
}

/// Decode a command body received over the control boundary.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, postcard::Error> {
    postcard::from_bytes(bytes)
}
