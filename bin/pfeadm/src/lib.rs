// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! PFE administration library

use pcap_parser::Linktype;
use pcap_parser::pcap;
use pfe::api;
use pfe::api::AddBlockReq;
use pfe::api::ClearBlockedResp;
use pfe::api::CmdOk;
use pfe::api::DumpStatsResp;
use pfe::api::FilterCfg;
use pfe::api::Ipv4Addr;
use pfe::api::ListBlockedResp;
use pfe::api::NoResp;
use pfe::api::PfeCmd;
use pfe::api::PfeCmdReq;
pub use pfe::api::PfeError;
use pfe::api::RemBlockReq;
use pfe::api::SetBlocklistReq;
use pfe::engine::Decision;
use pfe::engine::Filter;
use pfe::engine::blocklist::Blocklist;
use pfe::engine::ctl::FilterCtl;
use pfe::engine::stat::FilterStats;
use pfe::provider::NullLog;
use pfe::provider::PrintlnLog;
use pfe::provider::Providers;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Where the blocklist is kept between invocations when no other
/// file is named.
pub const DEFAULT_BLOCKLIST_PATH: &str = "/tmp/pfe-blocklist.txt";

/// Errors related to administering the packet filter engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading or writing {0}: {1}")]
    Io(String, std::io::Error),

    #[error("invalid argument {0}")]
    InvalidArgument(String),

    #[error("bad capture file: {0}")]
    Capture(String),

    #[error("request serialization failed for command {0:?}: {1}")]
    ReqSer(PfeCmd, postcard::Error),

    #[error("response deserialization failed for command {0:?}: {1}")]
    RespDeser(PfeCmd, postcard::Error),

    #[error("command {0:?} failed: {1}")]
    CommandError(PfeCmd, PfeError),
}

fn providers(trace: bool) -> Providers {
    if trace {
        Providers { log: Box::new(PrintlnLog) }
    } else {
        Providers { log: Box::new(NullLog) }
    }
}

/// The handle used to send administration commands to a filter, and
/// to feed it frames.
///
/// Every command crosses a serialized boundary to reach the engine,
/// the same as it would if the engine lived in another context.
pub struct PfeHdl {
    ctl: FilterCtl,
    filter: Filter<Arc<Blocklist>>,
}

impl PfeHdl {
    /// Stand up a filter with an empty blocklist and zeroed counters.
    ///
    /// With `trace` set, discard events and blocklist changes are
    /// printed to stdout.
    pub fn new(cfg: FilterCfg, trace: bool) -> Self {
        let blocklist = Arc::new(Blocklist::new());
        let stats = Arc::new(FilterStats::default());
        let filter =
            Filter::new(cfg, blocklist.clone(), stats.clone(), providers(trace));
        let ctl = FilterCtl::new(blocklist, stats, providers(trace));
        Self { ctl, filter }
    }

    /// Block all traffic from `addr`.
    pub fn add_block(&self, addr: Ipv4Addr) -> Result<NoResp, Error> {
        run_cmd(&self.ctl, PfeCmd::AddBlock, Some(&AddBlockReq { addr }))
    }

    /// Stop blocking traffic from `addr`.
    pub fn rem_block(&self, addr: Ipv4Addr) -> Result<NoResp, Error> {
        run_cmd(&self.ctl, PfeCmd::RemBlock, Some(&RemBlockReq { addr }))
    }

    /// Set/replace the whole blocklist atomically.
    pub fn set_blocklist(&self, addrs: Vec<Ipv4Addr>) -> Result<NoResp, Error> {
        let req = SetBlocklistReq { addrs };
        run_cmd(&self.ctl, PfeCmd::SetBlocklist, Some(&req))
    }

    pub fn list_blocked(&self) -> Result<ListBlockedResp, Error> {
        run_cmd(&self.ctl, PfeCmd::ListBlocked, None::<&()>)
    }

    /// Remove every blocklist entry.
    pub fn clear_blocked(&self) -> Result<ClearBlockedResp, Error> {
        run_cmd(&self.ctl, PfeCmd::ClearBlocked, None::<&()>)
    }

    pub fn dump_stats(&self) -> Result<DumpStatsResp, Error> {
        run_cmd(&self.ctl, PfeCmd::DumpStats, None::<&()>)
    }

    /// Run one frame through the filter.
    pub fn classify(&self, frame: &[u8]) -> Decision {
        self.filter.classify(frame)
    }
}

/// Run every frame of a capture through the filter, pairing each
/// decision with the frame's length.
pub fn classify_frames(
    hdl: &PfeHdl,
    frames: &[&[u8]],
) -> Vec<(usize, Decision)> {
    frames.iter().map(|f| (f.len(), hdl.classify(f))).collect()
}

/// Send a command across the control boundary and decode its reply.
pub fn run_cmd<T, R>(
    ctl: &FilterCtl,
    cmd: PfeCmd,
    req: Option<&R>,
) -> Result<T, Error>
where
    T: CmdOk + DeserializeOwned,
    R: Serialize,
{
    let body = match req {
        Some(req) => api::encode(req).map_err(|e| Error::ReqSer(cmd, e))?,
        None => vec![],
    };

    let env = api::encode(&PfeCmdReq::new(cmd, body))
        .map_err(|e| Error::ReqSer(cmd, e))?;
    let resp_bytes = ctl.handle_cmd(&env);

    let resp: Result<T, PfeError> =
        api::decode(&resp_bytes).map_err(|e| Error::RespDeser(cmd, e))?;
    resp.map_err(|e| Error::CommandError(cmd, e))
}

/// Parse blocklist file contents: one IPv4 address per line, with
/// blank lines and `#` comments ignored.
pub fn parse_blocklist(text: &str) -> Result<Vec<Ipv4Addr>, Error> {
    let mut addrs = vec![];
    for (i, line) in text.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        let addr = line.parse::<Ipv4Addr>().map_err(|e| {
            Error::InvalidArgument(format!("line {}: {e}", i + 1))
        })?;
        addrs.push(addr);
    }
    Ok(addrs)
}

/// Read a blocklist file. A file that does not exist yet is an empty
/// blocklist.
pub fn read_blocklist(path: &Path) -> Result<Vec<Ipv4Addr>, Error> {
    match fs::read_to_string(path) {
        Ok(text) => parse_blocklist(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(Error::Io(path.display().to_string(), e)),
    }
}

// The sibling file a new blocklist is staged in before it replaces
// the old one.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `addrs` to a blocklist file, sorted, one per line.
///
/// The new contents are staged in a sibling file and renamed over
/// `path`, so a failed write leaves the previous blocklist in place.
pub fn write_blocklist(path: &Path, addrs: &[Ipv4Addr]) -> Result<(), Error> {
    let mut sorted = addrs.to_vec();
    sorted.sort();
    sorted.dedup();

    let staging = staging_path(path);
    let io_err = |e| Error::Io(staging.display().to_string(), e);
    let res = fs::File::create(&staging).map_err(io_err).and_then(|mut f| {
        writeln!(f, "# pfe blocklist").map_err(io_err)?;
        for addr in &sorted {
            writeln!(f, "{addr}").map_err(io_err)?;
        }
        f.flush().map_err(io_err)?;
        f.sync_all().map_err(io_err)
    });

    if let Err(e) = res {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    fs::rename(&staging, path)
        .map_err(|e| Error::Io(path.display().to_string(), e))
}

/// Split an Ethernet pcap capture into its frames.
pub fn read_capture(bytes: &[u8]) -> Result<Vec<&[u8]>, Error> {
    let (mut rest, hdr) = pcap::parse_pcap_header(bytes)
        .map_err(|e| Error::Capture(format!("bad header: {e:?}")))?;

    if hdr.network != Linktype::ETHERNET {
        return Err(Error::Capture(format!(
            "unsupported link type {:?}",
            hdr.network
        )));
    }

    let mut frames = vec![];
    while !rest.is_empty() {
        let res = if hdr.is_bigendian() {
            pcap::parse_pcap_frame_be(rest)
        } else {
            pcap::parse_pcap_frame(rest)
        };

        let (next, block) = res.map_err(|e| {
            Error::Capture(format!("bad frame {}: {e:?}", frames.len()))
        })?;
        frames.push(block.data);
        rest = next;
    }

    Ok(frames)
}
