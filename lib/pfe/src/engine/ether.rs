// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Ethernet frames.

use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::Unaligned;
use zerocopy::byteorder::network_endian::U16;

pub const ETHER_TYPE_IPV4: u16 = 0x0800;
pub const ETHER_TYPE_ARP: u16 = 0x0806;
pub const ETHER_TYPE_IPV6: u16 = 0x86DD;

pub const ETHER_ADDR_LEN: usize = 6;
pub const ETHER_HDR_SZ: usize = 14;

/// The fixed Ethernet II header: destination, source, ethertype.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct EtherHdr {
    pub dst: [u8; ETHER_ADDR_LEN],
    pub src: [u8; ETHER_ADDR_LEN],
    pub ether_type: U16,
}

const _: () = assert!(core::mem::size_of::<EtherHdr>() == ETHER_HDR_SZ);

impl EtherHdr {
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(self.ether_type.get())
    }
}

#[repr(u16)]
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum EtherType {
    Ipv4,
    Arp,
    Ipv6,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(raw: u16) -> Self {
        match raw {
            ETHER_TYPE_ARP => Self::Arp,
            ETHER_TYPE_IPV4 => Self::Ipv4,
            ETHER_TYPE_IPV6 => Self::Ipv6,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<EtherType> for u16 {
    fn from(et: EtherType) -> Self {
        use EtherType::*;

        match et {
            Ipv4 => ETHER_TYPE_IPV4,
            Arp => ETHER_TYPE_ARP,
            Ipv6 => ETHER_TYPE_IPV6,
            Unknown(val) => val,
        }
    }
}

impl Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04X}", u16::from(*self))
    }
}

/// We are never really interested in internal representation of
/// [`EtherType`].
impl Debug for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::frame::Frame;

    #[test]
    fn ether_fields() {
        let mut bytes = [0u8; 16];
        bytes[0..6].copy_from_slice(&[0xA8, 0x40, 0x25, 0xFF, 0x00, 0x01]);
        bytes[6..12].copy_from_slice(&[0xA8, 0x40, 0x25, 0xFF, 0x00, 0x02]);
        bytes[12..14].copy_from_slice(&[0x08, 0x06]);
        let eth = Frame::new(&bytes).extract::<EtherHdr>(0).unwrap();
        assert_eq!(eth.dst[5], 0x01);
        assert_eq!(eth.src[5], 0x02);
        assert_eq!(eth.ether_type(), EtherType::Arp);
        assert_eq!(eth.as_bytes(), &bytes[..ETHER_HDR_SZ]);
    }

    #[test]
    fn unknown_ether_type_round_trips() {
        let et = EtherType::from(0x88CC);
        assert_eq!(et, EtherType::Unknown(0x88CC));
        assert_eq!(u16::from(et), 0x88CC);
        assert_eq!(format!("{et}"), "0x88CC");
    }

    #[test]
    fn bridged_ethernet_is_just_another_ether_type() {
        assert_eq!(EtherType::from(0x6558), EtherType::Unknown(0x6558));
        assert_eq!(EtherType::from(ETHER_TYPE_IPV4), EtherType::Ipv4);
    }
}
