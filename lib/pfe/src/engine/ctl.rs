// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The engine side of the control boundary.
//!
//! A command arrives as a serialized [`PfeCmdReq`] and leaves as a
//! serialized `Result<T, PfeError>`, where `T` is the command's
//! response type. Nothing crosses the boundary except those bytes; the
//! client side lives in `pfeadm`.

use super::blocklist::Blocklist;
use super::stat::FilterStats;
use crate::api;
use crate::api::AddBlockReq;
use crate::api::BLOCKLIST_MAX_ENTRIES;
use crate::api::ClearBlockedResp;
use crate::api::CmdOk;
use crate::api::DumpStatsResp;
use crate::api::ListBlockedResp;
use crate::api::NoResp;
use crate::api::PfeCmd;
use crate::api::PfeCmdReq;
use crate::api::PfeError;
use crate::api::RemBlockReq;
use crate::api::SetBlocklistReq;
use crate::api::API_VERSION;
use crate::ddi::kstat::KStatProvider;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use crate::provider::Providers;
use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::sync::Arc;
use alloc::vec::Vec;
use serde::de::DeserializeOwned;

/// A decoded command envelope, ready to be dispatched.
pub struct CmdEnvelope {
    req: PfeCmdReq,
}

impl CmdEnvelope {
    /// Decode and validate an envelope.
    ///
    /// On failure the returned error is what should be sent back to
    /// the client.
    pub fn wrap(bytes: &[u8]) -> Result<Self, PfeError> {
        let req: PfeCmdReq = api::decode(bytes)
            .map_err(|e| PfeError::DeserCmdReq(e.to_string()))?;

        if !req.check_version() {
            return Err(PfeError::BadApiVersion {
                user: req.api_version,
                engine: API_VERSION,
            });
        }

        Ok(Self { req })
    }

    pub fn cmd(&self) -> PfeCmd {
        self.req.cmd
    }

    /// Return the deserialized command request.
    pub fn copy_in_req<T: DeserializeOwned>(&self) -> Result<T, PfeError> {
        if self.req.req.is_empty() {
            return Err(PfeError::NoRequestBody);
        }

        api::decode(&self.req.req)
            .map_err(|e| PfeError::DeserCmdReq(e.to_string()))
    }
}

/// Serialize a command result for the trip back to the client.
pub fn copy_out_resp<T: CmdOk>(resp: &Result<T, PfeError>) -> Vec<u8> {
    let ser = match resp {
        Ok(v) => api::encode(&Ok::<&T, PfeError>(v))
            .map_err(|e| PfeError::SerCmdResp(e.to_string())),
        Err(e) => api::encode(&Err::<(), &PfeError>(e))
            .map_err(|e| PfeError::SerCmdResp(e.to_string())),
    };

    match ser {
        Ok(bytes) => bytes,
        // An error always serializes; an empty buffer tells the client
        // the response was lost.
        Err(e) => api::encode(&Err::<(), PfeError>(e)).unwrap_or_default(),
    }
}

/// The control-plane handle onto a running filter's shared state.
pub struct FilterCtl {
    blocklist: Arc<Blocklist>,
    stats: Arc<FilterStats>,
    log: Box<dyn LogProvider>,
}

impl FilterCtl {
    pub fn new(
        blocklist: Arc<Blocklist>,
        stats: Arc<FilterStats>,
        providers: Providers,
    ) -> Self {
        Self { blocklist, stats, log: providers.log }
    }

    pub fn blocklist(&self) -> &Arc<Blocklist> {
        &self.blocklist
    }

    pub fn stats(&self) -> &Arc<FilterStats> {
        &self.stats
    }

    /// This is the entry point for all commands. It verifies the API
    /// version and then multiplexes the command to its handler.
    pub fn handle_cmd(&self, bytes: &[u8]) -> Vec<u8> {
        let env = match CmdEnvelope::wrap(bytes) {
            Ok(env) => env,
            Err(e) => return copy_out_resp::<NoResp>(&Err(e)),
        };

        match env.cmd() {
            PfeCmd::AddBlock => copy_out_resp(&self.add_block_hdlr(&env)),
            PfeCmd::RemBlock => copy_out_resp(&self.rem_block_hdlr(&env)),
            PfeCmd::SetBlocklist => {
                copy_out_resp(&self.set_blocklist_hdlr(&env))
            }
            PfeCmd::ListBlocked => copy_out_resp(&self.list_blocked_hdlr()),
            PfeCmd::ClearBlocked => {
                copy_out_resp(&self.clear_blocked_hdlr())
            }
            PfeCmd::DumpStats => copy_out_resp(&self.dump_stats_hdlr()),
        }
    }

    fn add_block_hdlr(&self, env: &CmdEnvelope) -> Result<NoResp, PfeError> {
        let req: AddBlockReq = env.copy_in_req()?;
        if self.blocklist.add(req.addr)? {
            self.log.log(
                LogLevel::Note,
                format_args!("added {} to blocklist", req.addr),
            );
        }
        Ok(NoResp::default())
    }

    fn rem_block_hdlr(&self, env: &CmdEnvelope) -> Result<NoResp, PfeError> {
        let req: RemBlockReq = env.copy_in_req()?;
        self.blocklist.remove(req.addr)?;
        self.log.log(
            LogLevel::Note,
            format_args!("removed {} from blocklist", req.addr),
        );
        Ok(NoResp::default())
    }

    fn set_blocklist_hdlr(
        &self,
        env: &CmdEnvelope,
    ) -> Result<NoResp, PfeError> {
        let req: SetBlocklistReq = env.copy_in_req()?;
        self.blocklist.set(&req.addrs)?;
        Ok(NoResp::default())
    }

    fn list_blocked_hdlr(&self) -> Result<ListBlockedResp, PfeError> {
        Ok(ListBlockedResp {
            addrs: self.blocklist.list(),
            capacity: BLOCKLIST_MAX_ENTRIES as u64,
        })
    }

    fn clear_blocked_hdlr(&self) -> Result<ClearBlockedResp, PfeError> {
        let cleared = self.blocklist.clear() as u64;
        if cleared > 0 {
            self.log.log(
                LogLevel::Note,
                format_args!("cleared {cleared} blocklist entries"),
            );
        }
        Ok(ClearBlockedResp { cleared })
    }

    fn dump_stats_hdlr(&self) -> Result<DumpStatsResp, PfeError> {
        Ok(DumpStatsResp { stats: self.stats.snapshot() })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::Ipv4Addr;
    use crate::engine::blocklist::BlocklistQuery;
    use crate::provider::NullLog;
    use serde::Serialize;

    fn ctl() -> FilterCtl {
        FilterCtl::new(
            Arc::new(Blocklist::new()),
            Arc::new(FilterStats::default()),
            Providers { log: Box::new(NullLog) },
        )
    }

    fn run<T: DeserializeOwned, R: Serialize>(
        ctl: &FilterCtl,
        cmd: PfeCmd,
        req: Option<&R>,
    ) -> Result<T, PfeError> {
        let body = match req {
            Some(r) => postcard::to_allocvec(r).unwrap(),
            None => vec![],
        };
        let bytes =
            postcard::to_allocvec(&PfeCmdReq::new(cmd, body)).unwrap();
        postcard::from_bytes(&ctl.handle_cmd(&bytes)).unwrap()
    }

    #[test]
    fn add_list_remove() {
        let ctl = ctl();
        let addr: Ipv4Addr = "10.1.1.1".parse().unwrap();

        let _: NoResp =
            run(&ctl, PfeCmd::AddBlock, Some(&AddBlockReq { addr })).unwrap();
        assert!(ctl.blocklist().contains(addr));

        let list: ListBlockedResp =
            run::<_, ()>(&ctl, PfeCmd::ListBlocked, None).unwrap();
        assert_eq!(list.addrs, vec![addr]);
        assert_eq!(list.capacity, 1024);

        let _: NoResp =
            run(&ctl, PfeCmd::RemBlock, Some(&RemBlockReq { addr })).unwrap();
        let res: Result<NoResp, _> =
            run(&ctl, PfeCmd::RemBlock, Some(&RemBlockReq { addr }));
        assert_eq!(res.unwrap_err(), PfeError::AddrNotFound(addr));
    }

    #[test]
    fn missing_body() {
        let ctl = ctl();
        let res: Result<NoResp, _> = run::<_, ()>(&ctl, PfeCmd::AddBlock, None);
        assert_eq!(res.unwrap_err(), PfeError::NoRequestBody);
    }

    #[test]
    fn stale_client() {
        let ctl = ctl();
        let mut req = PfeCmdReq::new(PfeCmd::DumpStats, vec![]);
        req.api_version = API_VERSION + 1;
        let bytes = postcard::to_allocvec(&req).unwrap();
        let res: Result<DumpStatsResp, PfeError> =
            postcard::from_bytes(&ctl.handle_cmd(&bytes)).unwrap();
        assert_eq!(
            res.unwrap_err(),
            PfeError::BadApiVersion { user: API_VERSION + 1, engine: API_VERSION }
        );
    }

    #[test]
    fn garbage_envelope() {
        let ctl = ctl();
        let res: Result<NoResp, PfeError> =
            postcard::from_bytes(&ctl.handle_cmd(&[0xFF; 3])).unwrap();
        assert!(matches!(res, Err(PfeError::DeserCmdReq(_))));
    }

    #[test]
    fn clear_and_dump() {
        let ctl = ctl();
        ctl.blocklist().set(&[Ipv4Addr::from(1), Ipv4Addr::from(2)]).unwrap();
        ctl.stats().allowed.incr(3);

        let resp: ClearBlockedResp =
            run::<_, ()>(&ctl, PfeCmd::ClearBlocked, None).unwrap();
        assert_eq!(resp.cleared, 2);
        assert_eq!(ctl.blocklist().len(), 0);

        let resp: DumpStatsResp =
            run::<_, ()>(&ctl, PfeCmd::DumpStats, None).unwrap();
        assert_eq!(resp.stats.allowed, 3);
        assert_eq!(resp.stats.blocked, 0);
    }
}
