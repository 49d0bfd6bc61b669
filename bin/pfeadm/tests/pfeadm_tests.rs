// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Drive the admin handle the way the `pfeadm` binary does.

use pfe::api::BLOCKLIST_MAX_ENTRIES;
use pfe::print::print_decisions_into;
use pfe_test_utils::*;
use pfe_test_utils::pcap::PcapBuilder;
use pfe_test_utils::pcap::pcap_bytes;
use pfeadm::Error;
use pfeadm::PfeError;
use pfeadm::PfeHdl;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("pfeadm-test-{}-{name}", std::process::id()))
}

fn bad_actor() -> Ipv4Addr {
    Ipv4Addr::from([192, 168, 1, 100])
}

#[test]
fn blocklist_survives_a_file_round_trip() {
    let path = temp_path("roundtrip.txt");
    let addrs = vec![
        Ipv4Addr::from([10, 0, 0, 9]),
        bad_actor(),
        Ipv4Addr::from([10, 0, 0, 9]),
        Ipv4Addr::from([1, 2, 3, 4]),
    ];

    pfeadm::write_blocklist(&path, &addrs).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> =
        text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, vec!["1.2.3.4", "10.0.0.9", "192.168.1.100"]);

    let read = pfeadm::read_blocklist(&path).unwrap();
    assert_eq!(read.len(), 3);
    assert!(read.contains(&bad_actor()));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_blocklist_file_is_empty() {
    let path = temp_path("does-not-exist.txt");
    assert_eq!(pfeadm::read_blocklist(&path).unwrap(), vec![]);
}

#[test]
fn set_blocklist_then_classify() {
    let hdl = PfeHdl::new(FilterCfg::default(), false);
    hdl.set_blocklist(vec![bad_actor()]).unwrap();

    let d = hdl.classify(&tcp_frame(bad_actor(), 443));
    assert_eq!(d.verdict, Verdict::Discard);
    assert_eq!(d.reason, Reason::Blocklisted(bad_actor()));

    let d = hdl.classify(&tcp_frame(Ipv4Addr::from([10, 0, 0, 5]), 8080));
    assert_eq!(d.reason, Reason::DenyPort(8080));

    let d = hdl.classify(&tcp_frame(Ipv4Addr::from([10, 0, 0, 5]), 80));
    assert_eq!(d.verdict, Verdict::Admit);

    let stats = hdl.dump_stats().unwrap().stats;
    assert_eq!(stats, FilterStatsSnap { allowed: 2, blocked: 1 });
}

#[test]
fn removal_unblocks_the_source() {
    let hdl = PfeHdl::new(FilterCfg::default(), false);
    hdl.add_block(bad_actor()).unwrap();
    let frame = tcp_frame(bad_actor(), 22);
    assert_eq!(hdl.classify(&frame).verdict, Verdict::Discard);

    hdl.rem_block(bad_actor()).unwrap();
    assert_eq!(hdl.classify(&frame).verdict, Verdict::Admit);
}

#[test]
fn oversized_blocklist_is_rejected_whole() {
    let hdl = PfeHdl::new(FilterCfg::default(), false);
    hdl.add_block(bad_actor()).unwrap();

    let too_many: Vec<Ipv4Addr> = (0..=BLOCKLIST_MAX_ENTRIES as u32)
        .map(|i| Ipv4Addr::from(0x0A00_0000 + i))
        .collect();

    match hdl.set_blocklist(too_many) {
        Err(Error::CommandError(_, PfeError::MaxCapacity(max))) => {
            assert_eq!(max, BLOCKLIST_MAX_ENTRIES as u64);
        }
        res => panic!("unexpected result: {res:?}"),
    }

    assert_eq!(hdl.list_blocked().unwrap().addrs, vec![bad_actor()]);
}

#[test]
fn classify_a_capture_file() {
    let path = temp_path("capture.pcap");
    let frames = vec![
        tcp_frame(Ipv4Addr::from([10, 0, 0, 5]), 80),
        tcp_frame(bad_actor(), 80),
        tcp_frame(Ipv4Addr::from([10, 0, 0, 5]), 8080),
        arp_frame(28),
        truncate(&tcp_frame(Ipv4Addr::from([10, 0, 0, 5]), 80), 20),
    ];

    let mut builder = PcapBuilder::new(&path);
    for f in &frames {
        builder.add_frame(f);
    }
    drop(builder);

    let bytes = std::fs::read(&path).unwrap();
    let read = pfeadm::read_capture(&bytes).unwrap();
    assert_eq!(read.len(), frames.len());

    let hdl = PfeHdl::new(FilterCfg::default(), false);
    hdl.set_blocklist(vec![bad_actor()]).unwrap();
    let decisions = pfeadm::classify_frames(&hdl, &read);
    let verdicts: Vec<Verdict> =
        decisions.iter().map(|(_, d)| d.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Admit,
            Verdict::Discard,
            Verdict::Discard,
            Verdict::Admit,
            Verdict::Admit,
        ]
    );

    // The denied port still counts as allowed; the ARP and truncated
    // frames are not counted at all.
    let stats = hdl.dump_stats().unwrap().stats;
    assert_eq!(stats, FilterStatsSnap { allowed: 2, blocked: 1 });

    // The verbose listing: a header, then one row per frame in capture
    // order with its length.
    let mut out = vec![];
    print_decisions_into(&mut out, &decisions).unwrap();
    let out = String::from_utf8(out).unwrap();
    let rows: Vec<Vec<&str>> =
        out.lines().map(|l| l.split_whitespace().collect()).collect();
    assert_eq!(rows.len(), frames.len() + 1);
    assert_eq!(rows[0][..3], ["FRAME", "LEN", "VERDICT"]);
    assert_eq!(rows[2][..3], ["1", "54", "DISCARD"]);
    assert_eq!(rows[5][..3], ["4", "20", "ADMIT"]);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn truncated_capture_is_an_error() {
    let frame = tcp_frame(bad_actor(), 80);
    let mut bytes = pcap_bytes([&frame[..]]);
    bytes.truncate(bytes.len() - 10);
    assert!(matches!(pfeadm::read_capture(&bytes), Err(Error::Capture(_))));
}

#[test]
fn not_a_capture_is_an_error() {
    assert!(matches!(
        pfeadm::read_capture(b"definitely not pcap data"),
        Err(Error::Capture(_))
    ));
}
