// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! A bounds-checked, read-only view over the bytes of one frame.
//!
//! Every header the engine looks at is obtained through
//! [`Frame::extract()`], which is the only place frame bytes are
//! reinterpreted. A header is handed out only when all of its bytes
//! lie inside the frame; otherwise the caller gets [`Truncated`] and no
//! byte past the end has been touched.

use core::fmt;
use core::fmt::Display;
use core::mem::size_of;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;

/// The frame ended before the header did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Truncated {
    /// Where the header was to start.
    pub offset: usize,
    /// The size of the header.
    pub needed: usize,
    /// The length of the frame.
    pub len: usize,
}

impl Display for Truncated {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "truncated: need {} bytes at offset {}, frame is {} bytes",
            self.needed, self.offset, self.len
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Project a header of type `H` onto `[offset, offset + size)`.
    ///
    /// The header types are all `Unaligned` and contain no padding, so
    /// once the window is in bounds the cast cannot fail.
    pub fn extract<H>(&self, offset: usize) -> Result<&'a H, Truncated>
    where
        H: FromBytes + KnownLayout + Immutable + Unaligned,
    {
        let needed = size_of::<H>();
        let trunc = Truncated { offset, needed, len: self.bytes.len() };
        let bytes: &'a [u8] = self.bytes;
        let window = offset
            .checked_add(needed)
            .and_then(|end| bytes.get(offset..end))
            .ok_or(trunc)?;
        H::ref_from_bytes(window).map_err(|_| trunc)
    }
}
