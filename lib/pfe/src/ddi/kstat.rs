// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Named 64-bit statistics shared between concurrent engine
//! invocations.
use core::sync::atomic::AtomicU64;
use core::sync::atomic::Ordering;

/// A provider of named statistics.
///
/// An implementation of this trait is a struct of named
/// [`KStatU64`] fields. The provider is shared by reference between
/// every invocation of the engine, so each field must be updatable
/// through `&self`.
///
/// ```ignore
/// struct SomeStats {
///     frames_in: KStatU64,
///     frames_out: KStatU64,
/// }
/// ```
///
/// To update a value call [`KStatU64::incr()`].
///
/// ```ignore
/// some_val.stats.frames_in.incr(1);
/// ```
pub trait KStatProvider {
    const NUM_FIELDS: u32;
    type Snap;

    fn new() -> Self;

    fn num_fields(&self) -> u32 {
        Self::NUM_FIELDS
    }

    /// Return a snapshot of the stats. This is how you obtain a copy,
    /// as opposed to the traditional clone().
    fn snapshot(&self) -> Self::Snap;
}

/// A 64-bit unsigned named statistic.
///
/// Updates are a relaxed atomic fetch-and-add: no update is ever lost,
/// but no ordering is implied relative to any other memory access.
/// Readers see each value uncorrupted; a group of values read one
/// after another may reflect a frame that is only partially counted.
/// Wraparound is the only overflow behavior.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct KStatU64 {
    value: AtomicU64,
}

impl KStatU64 {
    pub const fn new() -> Self {
        Self { value: AtomicU64::new(0) }
    }

    #[inline]
    pub fn incr(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn set(&self, val: u64) {
        self.value.store(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn val(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
