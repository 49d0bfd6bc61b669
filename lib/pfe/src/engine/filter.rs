// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! The per-frame filter.
//!
//! Each frame moves through a fixed sequence of steps, never
//! revisiting one:
//!
//! ```text
//! Ethernet -> ethertype -> IPv4 -> source lookup -+-> blocked: DISCARD
//!                                                 |
//!                                                 +-> allowed -> TCP -> port
//! ```
//!
//! Truncation at any layer admits the frame. The engine never discards
//! a frame because it could not read all of it.
//!
//! The `allowed` counter records frames whose source passed the
//! blocklist. A frame discarded afterwards by the port rule stays
//! counted as `allowed` and does not count as `blocked`.
//!
//! Processing a frame takes a bounded number of steps, performs no
//! allocation, and never blocks for longer than a blocklist writer
//! holds its lock.

use super::blocklist::BlocklistQuery;
use super::ether::ETHER_HDR_SZ;
use super::ether::EtherHdr;
use super::ether::EtherType;
use super::frame::Frame;
use super::ip4::IPV4_HDR_SZ;
use super::ip4::Ipv4Hdr;
use super::ip4::Protocol;
use super::stat::FilterStats;
use super::tcp::TcpHdr;
use crate::api::CounterId;
use crate::api::FilterCfg;
use crate::api::Ipv4Addr;
use crate::api::Verdict;
use crate::provider::LogLevel;
use crate::provider::LogProvider;
use crate::provider::Providers;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::fmt::Display;

/// The offset of the IPv4 header within a frame.
pub const IPV4_OFFSET: usize = ETHER_HDR_SZ;

/// The offset of the transport header within a frame. IPv4 options are
/// not accounted for.
pub const ULP_OFFSET: usize = ETHER_HDR_SZ + IPV4_HDR_SZ;

/// The header a frame ran out before.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layer {
    Ether,
    Ipv4,
    Tcp,
}

impl Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Ether => "Ethernet",
            Self::Ipv4 => "IPv4",
            Self::Tcp => "TCP",
        };
        write!(f, "{s}")
    }
}

/// Why a frame received its verdict.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    /// The frame ended inside this header.
    Truncated(Layer),
    /// Not an IPv4 frame; policy does not apply.
    NotIpv4(EtherType),
    /// The IPv4 source address is blocklisted.
    Blocklisted(Ipv4Addr),
    /// TCP to the denied destination port.
    DenyPort(u16),
    /// Nothing matched.
    Pass,
}

impl Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Truncated(layer) => write!(f, "truncated {layer} header"),
            Self::NotIpv4(et) => write!(f, "not IPv4 (ethertype {et})"),
            Self::Blocklisted(ip) => write!(f, "blocklisted source {ip}"),
            Self::DenyPort(port) => write!(f, "denied TCP port {port}"),
            Self::Pass => write!(f, "pass"),
        }
    }
}

/// The verdict for one frame along with the reason for it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Reason,
}

impl Decision {
    fn admit(reason: Reason) -> Self {
        Self { verdict: Verdict::Admit, reason }
    }

    fn discard(reason: Reason) -> Self {
        Self { verdict: Verdict::Discard, reason }
    }
}

pub struct Filter<B> {
    cfg: FilterCfg,
    blocklist: B,
    stats: Arc<FilterStats>,
    log: Box<dyn LogProvider>,
}

impl<B: BlocklistQuery> Filter<B> {
    /// Create a filter consulting `blocklist` and counting into
    /// `stats`.
    ///
    /// The filter holds no per-frame state, so one instance may be
    /// shared by any number of threads.
    pub fn new(
        cfg: FilterCfg,
        blocklist: B,
        stats: Arc<FilterStats>,
        providers: Providers,
    ) -> Self {
        Self { cfg, blocklist, stats, log: providers.log }
    }

    pub fn cfg(&self) -> &FilterCfg {
        &self.cfg
    }

    pub fn blocklist(&self) -> &B {
        &self.blocklist
    }

    pub fn stats(&self) -> &Arc<FilterStats> {
        &self.stats
    }

    /// Process a single frame and return its verdict.
    #[inline]
    pub fn process(&self, bytes: &[u8]) -> Verdict {
        self.classify(bytes).verdict
    }

    /// Process a single frame, returning the verdict and its reason.
    pub fn classify(&self, bytes: &[u8]) -> Decision {
        let frame = Frame::new(bytes);

        let eth = match frame.extract::<EtherHdr>(0) {
            Ok(eth) => eth,
            Err(_) => return Decision::admit(Reason::Truncated(Layer::Ether)),
        };

        let et = eth.ether_type();
        if et != EtherType::Ipv4 {
            return Decision::admit(Reason::NotIpv4(et));
        }

        let ip = match frame.extract::<Ipv4Hdr>(IPV4_OFFSET) {
            Ok(ip) => ip,
            Err(_) => return Decision::admit(Reason::Truncated(Layer::Ipv4)),
        };

        let src = ip.src();
        if self.blocklist.contains(src) {
            self.stats.incr(CounterId::Blocked);
            self.log.log(
                LogLevel::Note,
                format_args!("blocked packet from IP: {src}"),
            );
            return Decision::discard(Reason::Blocklisted(src));
        }

        self.stats.incr(CounterId::Allowed);

        if ip.proto() != Protocol::TCP {
            return Decision::admit(Reason::Pass);
        }

        let tcp = match frame.extract::<TcpHdr>(ULP_OFFSET) {
            Ok(tcp) => tcp,
            Err(_) => return Decision::admit(Reason::Truncated(Layer::Tcp)),
        };

        let dst_port = tcp.dst_port();
        if dst_port == self.cfg.deny_port {
            self.log.log(
                LogLevel::Note,
                format_args!("blocked TCP packet to port {dst_port}"),
            );
            return Decision::discard(Reason::DenyPort(dst_port));
        }

        Decision::admit(Reason::Pass)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::FilterStatsSnap;
    use crate::engine::blocklist::AddrSet;
    use crate::engine::blocklist::insert_bounded;
    use crate::provider::RecordLog;

    // Ethernet + IPv4(TCP, 1.2.3.4 -> 10.0.0.1) + TCP(49152 -> dst).
    fn tcp_frame(dst_port: u16) -> [u8; 54] {
        let mut f = [0u8; 54];
        f[12..14].copy_from_slice(&[0x08, 0x00]);
        f[14] = 0x45;
        f[16..18].copy_from_slice(&[0x00, 0x28]);
        f[22] = 64;
        f[23] = 6;
        f[26..30].copy_from_slice(&[1, 2, 3, 4]);
        f[30..34].copy_from_slice(&[10, 0, 0, 1]);
        f[34..36].copy_from_slice(&49152u16.to_be_bytes());
        f[36..38].copy_from_slice(&dst_port.to_be_bytes());
        f[46] = 0x50;
        f
    }

    fn filter(blocked: &[Ipv4Addr]) -> (Filter<AddrSet>, RecordLog) {
        let mut set = AddrSet::new();
        for addr in blocked {
            insert_bounded(&mut set, *addr).unwrap();
        }
        let log = RecordLog::new();
        let handle = log.handle();
        let filter = Filter::new(
            FilterCfg::default(),
            set,
            Arc::new(FilterStats::default()),
            Providers { log: Box::new(log) },
        );
        (filter, handle)
    }

    fn snap(f: &Filter<AddrSet>) -> FilterStatsSnap {
        use crate::ddi::kstat::KStatProvider;
        f.stats().snapshot()
    }

    #[test]
    fn blocked_source() {
        let (f, log) = filter(&[Ipv4Addr::from([1, 2, 3, 4])]);
        let d = f.classify(&tcp_frame(80));
        assert_eq!(d.verdict, Verdict::Discard);
        assert_eq!(d.reason, Reason::Blocklisted(Ipv4Addr::from([1, 2, 3, 4])));
        assert_eq!(snap(&f), FilterStatsSnap { allowed: 0, blocked: 1 });
        assert_eq!(log.messages(), vec!["blocked packet from IP: 1.2.3.4"]);
    }

    #[test]
    fn denied_port() {
        let (f, log) = filter(&[]);
        let d = f.classify(&tcp_frame(8080));
        assert_eq!(d, Decision::discard(Reason::DenyPort(8080)));
        assert_eq!(snap(&f), FilterStatsSnap { allowed: 1, blocked: 0 });
        assert_eq!(log.messages(), vec!["blocked TCP packet to port 8080"]);
    }

    #[test]
    fn other_port() {
        let (f, log) = filter(&[]);
        assert_eq!(f.process(&tcp_frame(80)), Verdict::Admit);
        assert_eq!(snap(&f), FilterStatsSnap { allowed: 1, blocked: 0 });
        assert!(log.messages().is_empty());
    }

    #[test]
    fn configured_deny_port() {
        let (f, _) = filter(&[]);
        let f = Filter::new(
            FilterCfg { deny_port: 22 },
            f.blocklist,
            f.stats,
            Providers { log: Box::new(crate::provider::NullLog) },
        );
        assert_eq!(f.process(&tcp_frame(8080)), Verdict::Admit);
        assert_eq!(f.process(&tcp_frame(22)), Verdict::Discard);
    }

    #[test]
    fn truncation_at_each_layer() {
        let (f, _) = filter(&[]);
        let frame = tcp_frame(8080);

        let d = f.classify(&frame[..13]);
        assert_eq!(d, Decision::admit(Reason::Truncated(Layer::Ether)));
        let d = f.classify(&frame[..33]);
        assert_eq!(d, Decision::admit(Reason::Truncated(Layer::Ipv4)));
        assert_eq!(snap(&f), FilterStatsSnap::default());

        // The source already passed the blocklist; the count stands.
        let d = f.classify(&frame[..53]);
        assert_eq!(d, Decision::admit(Reason::Truncated(Layer::Tcp)));
        assert_eq!(snap(&f), FilterStatsSnap { allowed: 1, blocked: 0 });
    }

    #[test]
    fn non_ipv4() {
        let (f, _) = filter(&[]);
        let mut frame = tcp_frame(8080);
        frame[12..14].copy_from_slice(&[0x86, 0xDD]);
        let d = f.classify(&frame);
        assert_eq!(d, Decision::admit(Reason::NotIpv4(EtherType::Ipv6)));
        assert_eq!(snap(&f), FilterStatsSnap::default());
    }

    #[test]
    fn non_tcp_ignores_port_rule() {
        let (f, _) = filter(&[]);
        let mut frame = tcp_frame(8080);
        frame[23] = 17;
        assert_eq!(f.classify(&frame), Decision::admit(Reason::Pass));
        assert_eq!(snap(&f), FilterStatsSnap { allowed: 1, blocked: 0 });
    }
}
