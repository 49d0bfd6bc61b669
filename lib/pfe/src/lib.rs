// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The Packet Filter Engine.
//!
//! A per-frame admit/discard classifier meant to sit on the receive
//! hot path. The `engine` feature provides the classifier itself
//! (`no_std`, allocation-free per frame); the `std` feature adds the
//! blocklist collaborator, the control-plane command handler, and the
//! printing routines used by `pfeadm`.

#![cfg_attr(not(feature = "std"), no_std)]
#![allow(clippy::len_without_is_empty)]
#![deny(unreachable_patterns)]
#![deny(unused_must_use)]

extern crate alloc;

#[cfg(feature = "engine")]
#[macro_use]
extern crate cfg_if;

#[cfg(any(feature = "api", test))]
pub mod api;
#[cfg(any(feature = "engine", test))]
pub mod ddi;
#[cfg(any(feature = "engine", test))]
pub mod engine;
#[cfg(any(feature = "std", test))]
pub mod print;
#[cfg(any(feature = "engine", test))]
pub mod provider;
