// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Common routines for integration tests.
//!
//! Frames are built with smoltcp's wire types, independently of the
//! engine's own header views, so the tests check the engine against
//! a second reading of the wire format.

// This type of pedantry is more trouble than it's worth here.
#![allow(dead_code)]

pub mod pcap;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use smoltcp::wire::EthernetAddress;
use smoltcp::wire::EthernetFrame;
use smoltcp::wire::EthernetProtocol;
use smoltcp::wire::IpAddress;
use smoltcp::wire::IpProtocol;
use smoltcp::wire::Ipv4Address;
use smoltcp::wire::Ipv4Packet;
use smoltcp::wire::TcpPacket;
use smoltcp::wire::TcpSeqNumber;
use smoltcp::wire::UdpPacket;
use std::sync::Arc;

// Let's make our lives easier and pub use a bunch of stuff.
pub use pfe::api::CounterId;
pub use pfe::api::FilterCfg;
pub use pfe::api::FilterStatsSnap;
pub use pfe::api::Ipv4Addr;
pub use pfe::api::Verdict;
pub use pfe::ddi::kstat::KStatProvider;
pub use pfe::engine::Decision;
pub use pfe::engine::Filter;
pub use pfe::engine::Reason;
pub use pfe::engine::blocklist::Blocklist;
pub use pfe::engine::blocklist::BlocklistQuery;
pub use pfe::engine::ether::EtherType;
pub use pfe::engine::filter::Layer;
pub use pfe::engine::stat::FilterStats;
pub use pfe::provider::NullLog;
pub use pfe::provider::Providers;
pub use pfe::provider::RecordLog;

pub const ETHER_HDR_SZ: usize = 14;
pub const IPV4_HDR_SZ: usize = 20;
pub const TCP_HDR_SZ: usize = 20;
pub const UDP_HDR_SZ: usize = 8;

pub const GW_MAC: [u8; 6] = [0xA8, 0x40, 0x25, 0x77, 0x77, 0x77];
pub const HOST_MAC: [u8; 6] = [0xA8, 0x40, 0x25, 0xF0, 0x00, 0x01];

pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_IPV6: u16 = 0x86DD;

/// The address frames are sent to unless a test says otherwise.
pub fn host_ip() -> Ipv4Addr {
    Ipv4Addr::from([10, 0, 0, 1])
}

fn smol_ip(ip: Ipv4Addr) -> Ipv4Address {
    Ipv4Address::from_bytes(&ip.bytes())
}

/// Build an Ethernet frame carrying `payload` with the given
/// ethertype.
pub fn ether_frame(ether_type: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; ETHER_HDR_SZ + payload.len()];
    let mut eth = EthernetFrame::new_unchecked(&mut buf[..]);
    eth.set_dst_addr(EthernetAddress(HOST_MAC));
    eth.set_src_addr(EthernetAddress(GW_MAC));
    eth.set_ethertype(EthernetProtocol::from(ether_type));
    eth.payload_mut().copy_from_slice(payload);
    buf
}

/// Build an IPv4 packet, header checksum included, around `ulp`.
pub fn ipv4_packet(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    proto: IpProtocol,
    ulp: &[u8],
) -> Vec<u8> {
    let total = IPV4_HDR_SZ + ulp.len();
    let mut buf = vec![0u8; total];
    let mut ip = Ipv4Packet::new_unchecked(&mut buf[..]);
    ip.set_version(4);
    ip.set_header_len(IPV4_HDR_SZ as u8);
    ip.set_total_len(total as u16);
    ip.set_ident(0x1234);
    ip.clear_flags();
    ip.set_dont_frag(true);
    ip.set_hop_limit(64);
    ip.set_next_header(proto);
    ip.set_src_addr(smol_ip(src));
    ip.set_dst_addr(smol_ip(dst));
    ip.payload_mut().copy_from_slice(ulp);
    ip.fill_checksum();
    buf
}

/// Build a TCP SYN segment from port 49152 to `dst_port`.
pub fn tcp_segment(src: Ipv4Addr, dst: Ipv4Addr, dst_port: u16) -> Vec<u8> {
    let mut buf = vec![0u8; TCP_HDR_SZ];
    let mut tcp = TcpPacket::new_unchecked(&mut buf[..]);
    tcp.set_src_port(49152);
    tcp.set_dst_port(dst_port);
    tcp.set_seq_number(TcpSeqNumber(4224));
    tcp.set_ack_number(TcpSeqNumber(0));
    tcp.set_header_len(TCP_HDR_SZ as u8);
    tcp.clear_flags();
    tcp.set_syn(true);
    tcp.set_window_len(64240);
    tcp.set_urgent_at(0);
    tcp.fill_checksum(
        &IpAddress::Ipv4(smol_ip(src)),
        &IpAddress::Ipv4(smol_ip(dst)),
    );
    buf
}

/// Build a UDP datagram with an empty payload.
pub fn udp_datagram(src: Ipv4Addr, dst: Ipv4Addr, dst_port: u16) -> Vec<u8> {
    let mut buf = vec![0u8; UDP_HDR_SZ];
    let mut udp = UdpPacket::new_unchecked(&mut buf[..]);
    udp.set_src_port(49152);
    udp.set_dst_port(dst_port);
    udp.set_len(UDP_HDR_SZ as u16);
    udp.fill_checksum(
        &IpAddress::Ipv4(smol_ip(src)),
        &IpAddress::Ipv4(smol_ip(dst)),
    );
    buf
}

/// A complete Ethernet/IPv4/TCP frame from `src` to the host.
pub fn tcp_frame(src: Ipv4Addr, dst_port: u16) -> Vec<u8> {
    let dst = host_ip();
    let tcp = tcp_segment(src, dst, dst_port);
    let ip = ipv4_packet(src, dst, IpProtocol::Tcp, &tcp);
    ether_frame(0x0800, &ip)
}

/// A complete Ethernet/IPv4/UDP frame from `src` to the host.
pub fn udp_frame(src: Ipv4Addr, dst_port: u16) -> Vec<u8> {
    let dst = host_ip();
    let udp = udp_datagram(src, dst, dst_port);
    let ip = ipv4_packet(src, dst, IpProtocol::Udp, &udp);
    ether_frame(0x0800, &ip)
}

/// An Ethernet/IPv4 frame from `src` carrying ICMP echo bytes.
pub fn icmp_frame(src: Ipv4Addr) -> Vec<u8> {
    let icmp = [8u8, 0, 0xF7, 0xFF, 0, 0, 0, 0];
    let ip = ipv4_packet(src, host_ip(), IpProtocol::Icmp, &icmp);
    ether_frame(0x0800, &ip)
}

/// An ARP frame followed by `trailing` bytes of filler.
pub fn arp_frame(trailing: usize) -> Vec<u8> {
    ether_frame(ETHER_TYPE_ARP, &vec![0xAB; trailing])
}

/// Return `frame` cut down to its first `len` bytes.
pub fn truncate(frame: &[u8], len: usize) -> Vec<u8> {
    frame[..len.min(frame.len())].to_vec()
}

/// A deterministic source of random frames.
pub struct FrameGen {
    rng: StdRng,
}

impl FrameGen {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Entirely random bytes, up to `max_len` of them.
    pub fn garbage(&mut self, max_len: usize) -> Vec<u8> {
        let len = self.rng.random_range(0..=max_len);
        let mut buf = vec![0u8; len];
        self.rng.fill(&mut buf[..]);
        buf
    }

    /// Random bytes behind an IPv4 ethertype, so that the filter gets
    /// past the first check more often than not.
    pub fn ipv4_garbage(&mut self, max_len: usize) -> Vec<u8> {
        let mut buf = self.garbage(max_len);
        if buf.len() >= ETHER_HDR_SZ {
            buf[12..14].copy_from_slice(&[0x08, 0x00]);
        }
        buf
    }

    /// A well-formed TCP frame from a random source to a random port,
    /// the deny port included now and then.
    pub fn tcp(&mut self, deny_port: u16) -> Vec<u8> {
        let src = Ipv4Addr::from(self.rng.random::<u32>());
        let port = if self.rng.random_bool(0.25) {
            deny_port
        } else {
            self.rng.random_range(1..=u16::MAX)
        };
        tcp_frame(src, port)
    }
}

/// A filter bundle for tests: the filter, a handle on its log, and the
/// shared blocklist and counters.
pub struct TestFilter {
    pub filter: Filter<Arc<Blocklist>>,
    pub blocklist: Arc<Blocklist>,
    pub stats: Arc<FilterStats>,
    pub log: RecordLog,
}

impl TestFilter {
    pub fn new(cfg: FilterCfg, blocked: &[Ipv4Addr]) -> Self {
        let blocklist = Arc::new(Blocklist::new());
        blocklist.set(blocked).unwrap();
        let stats = Arc::new(FilterStats::default());
        let log = RecordLog::new();
        let filter = Filter::new(
            cfg,
            blocklist.clone(),
            stats.clone(),
            Providers { log: Box::new(log.handle()) },
        );
        Self { filter, blocklist, stats, log }
    }

    pub fn snap(&self) -> FilterStatsSnap {
        self.stats.snapshot()
    }
}

/// Assert the value of both counters.
#[macro_export]
macro_rules! assert_counters {
    ($tf:expr, allowed = $allowed:expr, blocked = $blocked:expr) => {
        assert_eq!(
            $tf.snap(),
            $crate::FilterStatsSnap { allowed: $allowed, blocked: $blocked },
            "counter mismatch"
        )
    };
}
