// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Routines for building packet capture files.

use pcap_parser::Linktype;
use pcap_parser::ToVec;
use pcap_parser::pcap;
use pcap_parser::pcap::LegacyPcapBlock;
use pcap_parser::pcap::PcapHeader;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const PCAP_MAGIC: u32 = 0xa1b2c3d4;

fn header() -> PcapHeader {
    PcapHeader {
        magic_number: PCAP_MAGIC,
        version_major: 2,
        version_minor: 4,
        thiszone: 0,
        sigfigs: 0,
        snaplen: 1500,
        network: Linktype::ETHERNET,
    }
}

fn block(frame: &[u8]) -> Vec<u8> {
    let mut block = LegacyPcapBlock {
        ts_sec: 7777,
        ts_usec: 7777,
        caplen: frame.len() as u32,
        origlen: frame.len() as u32,
        data: frame,
    };
    block.to_vec().unwrap()
}

/// Build a packet capture file from a series of frames.
pub struct PcapBuilder {
    file: File,
}

impl PcapBuilder {
    /// Create a new pcap builder, writing all captures to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut file = File::create(path).unwrap();
        file.write_all(&header().to_vec().unwrap()).unwrap();
        Self { file }
    }

    /// Add a frame to the capture.
    pub fn add_frame(&mut self, frame: &[u8]) {
        self.file.write_all(&block(frame)).unwrap();
    }
}

/// Produce an in-memory capture of `frames`.
pub fn pcap_bytes<'a>(frames: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
    let mut out = header().to_vec().unwrap();
    for frame in frames {
        out.extend_from_slice(&block(frame));
    }
    out
}

/// Read every frame back out of a capture.
pub fn read_frames(mut bytes: &[u8]) -> Vec<Vec<u8>> {
    let (rest, _hdr) = match pcap::parse_pcap_header(bytes) {
        Ok(v) => v,
        Err(e) => panic!("failed to get header: {e:?}"),
    };
    bytes = rest;

    let mut frames = vec![];
    while !bytes.is_empty() {
        match pcap::parse_pcap_frame(bytes) {
            Ok((rest, block)) => {
                // We always want access to the entire frame.
                assert_eq!(block.origlen, block.caplen);
                frames.push(block.data.to_vec());
                bytes = rest;
            }

            Err(e) => panic!("failed to get next block: {e:?}"),
        }
    }
    frames
}
