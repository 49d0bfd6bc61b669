// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use super::API_VERSION;
use super::ip::Ipv4Addr;
use super::stat::FilterStatsSnap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use serde::Deserialize;
use serde::Serialize;

/// The maximum number of entries the blocklist will hold.
pub const BLOCKLIST_MAX_ENTRIES: usize = 1024;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[repr(C)]
pub enum PfeCmd {
    AddBlock = 1,      // add an address to the blocklist
    RemBlock = 2,      // remove an address from the blocklist
    SetBlocklist = 3,  // set/replace the whole blocklist at once
    ListBlocked = 4,   // list the blocklist
    ClearBlocked = 5,  // remove every blocklist entry
    DumpStats = 10,    // dump the allowed/blocked counters
}

/// The envelope carrying a [`PfeCmd`] across the control boundary.
///
/// The command's actual request data is serialized separately into
/// `req`, so that the engine can validate the version and command
/// before it attempts to decode a body.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PfeCmdReq {
    pub api_version: u64,
    pub cmd: PfeCmd,
    pub req: Vec<u8>,
}

impl PfeCmdReq {
    pub fn new(cmd: PfeCmd, req: Vec<u8>) -> Self {
        Self { api_version: API_VERSION, cmd, req }
    }

    /// Is this the expected API version?
    ///
    /// NOTE: This function is compiled twice: once for the admin
    /// client, again for the engine. As long as we remember to update
    /// the `API_VERSION` value when making API changes, this method
    /// will return `false` when the two disagree.
    pub fn check_version(&self) -> bool {
        self.api_version == API_VERSION
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PfeError {
    AddrNotFound(Ipv4Addr),
    BadApiVersion {
        user: u64,
        engine: u64,
    },
    DeserCmdReq(String),
    MaxCapacity(u64),

    /// The request has an empty body but the specified `cmd` expects
    /// one.
    NoRequestBody,

    SerCmdResp(String),
}

impl Display for PfeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AddrNotFound(ip) => write!(f, "address not in blocklist: {ip}"),
            Self::BadApiVersion { user, engine } => write!(
                f,
                "API version mismatch: client {user}, engine {engine}"
            ),
            Self::DeserCmdReq(msg) => {
                write!(f, "failed to deserialize request: {msg}")
            }
            Self::MaxCapacity(max) => {
                write!(f, "blocklist is at capacity ({max} entries)")
            }
            Self::NoRequestBody => write!(f, "command requires a request body"),
            Self::SerCmdResp(msg) => {
                write!(f, "failed to serialize response: {msg}")
            }
        }
    }
}

/// A marker trait indicating a success response type that is returned
/// from a command and may be passed across the control boundary.
pub trait CmdOk: Debug + Serialize {}

impl CmdOk for () {}

/// Indicates no meaningful response value on success.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NoResp {
    pub unused: u64,
}

impl CmdOk for NoResp {}

#[derive(Debug, Deserialize, Serialize)]
pub struct AddBlockReq {
    pub addr: Ipv4Addr,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RemBlockReq {
    pub addr: Ipv4Addr,
}

/// Replace the entire blocklist. Either all of `addrs` take effect or,
/// on error, none do.
#[derive(Debug, Deserialize, Serialize)]
pub struct SetBlocklistReq {
    pub addrs: Vec<Ipv4Addr>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListBlockedResp {
    /// The blocklist entries, in no particular order.
    pub addrs: Vec<Ipv4Addr>,
    /// The maximum number of entries.
    pub capacity: u64,
}

impl CmdOk for ListBlockedResp {}

#[derive(Debug, Deserialize, Serialize)]
pub struct ClearBlockedResp {
    /// The number of entries removed.
    pub cleared: u64,
}

impl CmdOk for ClearBlockedResp {}

#[derive(Debug, Deserialize, Serialize)]
pub struct DumpStatsResp {
    pub stats: FilterStatsSnap,
}

impl CmdOk for DumpStatsResp {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_survives_the_boundary() {
        let err = PfeError::AddrNotFound("10.0.0.1".parse().unwrap());
        let bytes = postcard::to_allocvec(&err).unwrap();
        let back: PfeError = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn stale_client_is_detected() {
        let mut req = PfeCmdReq::new(PfeCmd::DumpStats, vec![]);
        assert!(req.check_version());
        req.api_version = API_VERSION - 1;
        assert!(!req.check_version());
    }
}
