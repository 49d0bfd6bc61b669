// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! A counting global allocator, exposed to `criterion` as a pair of
//! measurements: allocations made and bytes allocated.
//!
//! The filter's per-frame path must not allocate, so both should read
//! zero for every classify benchmark.

use super::MeasurementInfo;
use criterion::Criterion;
use criterion::Throughput;
use criterion::measurement::Measurement;
use criterion::measurement::ValueFormatter;
use std::alloc::GlobalAlloc;
use std::alloc::Layout;
use std::alloc::System;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[global_allocator]
static COUNTING_ALLOC: CountingAlloc = CountingAlloc::new();

// Criterion runs one benchmark at a time, so global counts are
// attributable to the case being measured.
struct CountingAlloc {
    allocs: AtomicU64,
    bytes: AtomicU64,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self { allocs: AtomicU64::new(0), bytes: AtomicU64::new(0) }
    }

    fn record(&self, layout: Layout) {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size() as u64, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.record(layout);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.record(layout);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(
        &self,
        ptr: *mut u8,
        layout: Layout,
        new_size: usize,
    ) -> *mut u8 {
        self.record(layout);
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

/// A counter read from the allocator.
pub trait AllocCounter {
    fn read() -> u64;
    fn unit() -> &'static str;
    fn label() -> &'static str;
}

/// Number of allocations (including reallocations).
pub struct Allocs;

/// Number of bytes requested.
pub struct BytesAlloced;

impl AllocCounter for Allocs {
    fn read() -> u64 {
        COUNTING_ALLOC.allocs.load(Ordering::Relaxed)
    }

    fn unit() -> &'static str {
        ""
    }

    fn label() -> &'static str {
        "alloc_ct"
    }
}

impl AllocCounter for BytesAlloced {
    fn read() -> u64 {
        COUNTING_ALLOC.bytes.load(Ordering::Relaxed)
    }

    fn unit() -> &'static str {
        "B"
    }

    fn label() -> &'static str {
        "alloc_sz"
    }
}

// Per-frame counts are small, so values are never rescaled.
struct UnitFormatter(&'static str);

impl ValueFormatter for UnitFormatter {
    fn scale_values(&self, _typical: f64, _values: &mut [f64]) -> &'static str {
        self.0
    }

    fn scale_throughputs(
        &self,
        _typical: f64,
        _throughput: &Throughput,
        _values: &mut [f64],
    ) -> &'static str {
        self.0
    }

    fn scale_for_machines(&self, _values: &mut [f64]) -> &'static str {
        self.0
    }
}

/// Adapts an [`AllocCounter`] into a criterion [`Measurement`].
pub struct AllocMeasure<T> {
    fmt: UnitFormatter,
    _counter: T,
}

impl<T: AllocCounter> AllocMeasure<T> {
    pub fn new(counter: T) -> Self {
        Self { fmt: UnitFormatter(T::unit()), _counter: counter }
    }
}

impl<T: AllocCounter> Measurement for AllocMeasure<T> {
    type Intermediate = u64;
    type Value = u64;

    fn start(&self) -> Self::Intermediate {
        T::read()
    }

    fn end(&self, i: Self::Intermediate) -> Self::Value {
        T::read() - i
    }

    fn add(&self, v1: &Self::Value, v2: &Self::Value) -> Self::Value {
        v1 + v2
    }

    fn zero(&self) -> Self::Value {
        0
    }

    fn to_f64(&self, value: &Self::Value) -> f64 {
        *value as f64
    }

    fn formatter(&self) -> &dyn ValueFormatter {
        &self.fmt
    }
}

impl<T: AllocCounter> MeasurementInfo for AllocMeasure<T> {
    fn label() -> &'static str {
        T::label()
    }
}

/// Create a [`Criterion`] instance tuned for counting allocations.
pub fn new_crit<T: AllocCounter>(counter: T) -> Criterion<AllocMeasure<T>> {
    Criterion::default()
        .with_measurement(AllocMeasure::new(counter))
        .sample_size(10)
        .warm_up_time(Duration::from_nanos(1))
        .measurement_time(Duration::from_micros(10))
        .nresamples(1)
        // Identical samples trip up the plotting backend.
        .without_plots()
}
