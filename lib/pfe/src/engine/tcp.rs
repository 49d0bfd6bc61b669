// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! TCP headers.

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;
use zerocopy::byteorder::network_endian::U32;

pub const TCP_HDR_SZ: usize = 20;

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct TcpHdr {
    pub src_port: U16,
    pub dst_port: U16,
    pub seq: U32,
    pub ack: U32,
    pub offset: u8,
    pub flags: u8,
    pub window: U16,
    pub csum: [u8; 2],
    pub urg: [u8; 2],
}

const _: () = assert!(core::mem::size_of::<TcpHdr>() == TCP_HDR_SZ);

impl TcpHdr {
    pub fn src_port(&self) -> u16 {
        self.src_port.get()
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port.get()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::frame::Frame;

    #[test]
    fn ports_are_network_order() {
        let mut bytes = [0u8; TCP_HDR_SZ];
        bytes[0..2].copy_from_slice(&[0xC0, 0x00]);
        bytes[2..4].copy_from_slice(&[0x1F, 0x90]);
        let tcp = Frame::new(&bytes).extract::<TcpHdr>(0).unwrap();
        assert_eq!(tcp.src_port(), 49152);
        assert_eq!(tcp.dst_port(), 8080);
    }
}
