// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Display;
use core::result;
use core::str::FromStr;
use serde::Deserialize;
use serde::Serialize;

/// An IPv4 address, stored in network byte order.
///
/// This is the key type of the blocklist: equality and hashing are
/// over the raw four bytes exactly as they appear on the wire.
#[derive(
    Clone,
    Copy,
    Default,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[repr(C)]
pub struct Ipv4Addr {
    inner: [u8; 4],
}

impl Ipv4Addr {
    /// Return the bytes of the address.
    #[inline]
    pub fn bytes(&self) -> [u8; 4] {
        self.inner
    }
}

/// Host-order value of the address, i.e. `1.2.3.4` is `0x01020304`.
impl From<Ipv4Addr> for u32 {
    fn from(ip: Ipv4Addr) -> u32 {
        u32::from_be_bytes(ip.bytes())
    }
}

impl From<u32> for Ipv4Addr {
    fn from(val: u32) -> Self {
        Self { inner: val.to_be_bytes() }
    }
}

impl From<[u8; 4]> for Ipv4Addr {
    fn from(bytes: [u8; 4]) -> Self {
        Self { inner: bytes }
    }
}

impl FromStr for Ipv4Addr {
    type Err = String;

    fn from_str(val: &str) -> result::Result<Self, Self::Err> {
        let octets: Vec<u8> = val
            .split('.')
            .map(|s| {
                // `u8::from_str` alone would also take a leading `+`.
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(format!("malformed octet {s:?}: {val}"));
                }
                s.parse().map_err(|e| format!("{e}: {val}"))
            })
            .collect::<result::Result<Vec<u8>, _>>()?;

        if octets.len() != 4 {
            return Err(format!("malformed ip: {val}"));
        }

        Ok(Self { inner: [octets[0], octets[1], octets[2], octets[3]] })
    }
}

impl Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.inner[0], self.inner[1], self.inner[2], self.inner[3],
        )
    }
}

// There's no reason to view an Ipv4Addr as its raw array, so just
// present it in a human-friendly manner.
impl Debug for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ipv4Addr {{ inner: {self} }}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let ip: Ipv4Addr = "192.168.1.100".parse().unwrap();
        assert_eq!(ip.bytes(), [192, 168, 1, 100]);
        assert_eq!(std::format!("{ip}"), "192.168.1.100");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("192.168.1".parse::<Ipv4Addr>().is_err());
        assert!("192.168.1.256".parse::<Ipv4Addr>().is_err());
        assert!("a.b.c.d".parse::<Ipv4Addr>().is_err());
        assert!("1.2.3.4.5".parse::<Ipv4Addr>().is_err());
    }

    #[test]
    fn parse_rejects_signed_and_spaced_octets() {
        assert!("+1.2.3.4".parse::<Ipv4Addr>().is_err());
        assert!("1.+2.3.4".parse::<Ipv4Addr>().is_err());
        assert!("1.2.3.-4".parse::<Ipv4Addr>().is_err());
        assert!("1. 2.3.4".parse::<Ipv4Addr>().is_err());
        assert!("1..3.4".parse::<Ipv4Addr>().is_err());
        assert_eq!(
            "001.2.3.4".parse::<Ipv4Addr>(),
            Ok(Ipv4Addr::from([1, 2, 3, 4]))
        );
    }

    #[test]
    fn u32_is_host_order() {
        let ip = Ipv4Addr::from([1, 2, 3, 4]);
        assert_eq!(u32::from(ip), 0x0102_0304);
        assert_eq!(Ipv4Addr::from(0x0102_0304), ip);
    }
}
