// src/ethernet.rs
use crate::cursor::CursorMut;
use crate::error::{NetError, Result};
use byteorder::{ByteOrder, NetworkEndian};
use core::fmt;
use core::str::FromStr;

pub const ETH_ADDR_LEN: usize = 6;
pub const ETH_HDR_LEN: usize = 14;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct MacAddress(pub [u8; ETH_ADDR_LEN]);

impl MacAddress {
    pub const BROADCAST: Self = MacAddress([0xff; 6]);
    pub const ZERO: Self = MacAddress([0; 6]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = NetError;

    /// Parses `aa:bb:cc:dd:ee:ff` (also accepts `-` separators).
    fn from_str(s: &str) -> Result<Self> {
        let mut addr = [0u8; ETH_ADDR_LEN];
        let mut parts = s.split(|c| c == ':' || c == '-');
        for byte in addr.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| NetError::Config(format!("MAC address too short: {}", s)))?;
            if part.len() != 2 {
                return Err(NetError::Config(format!("bad MAC address octet: {}", part)));
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| NetError::Config(format!("bad MAC address octet: {}", part)))?;
        }
        if parts.next().is_some() {
            return Err(NetError::Config(format!("MAC address too long: {}", s)));
        }
        Ok(MacAddress(addr))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EtherType {
    IPv4,
    ARP,
    IPv6,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(val: u16) -> Self {
        match val {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x86DD => EtherType::IPv6,
            other => EtherType::Unknown(other),
        }
    }
}

impl From<EtherType> for u16 {
    fn from(val: EtherType) -> u16 {
        match val {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::IPv6 => 0x86DD,
            EtherType::Unknown(val) => val,
        }
    }
}

pub struct EthernetFrame<'a> {
    pub data: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < ETH_HDR_LEN {
            return None;
        }
        Some(Self { data })
    }

    pub fn destination(&self) -> MacAddress {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.data[0..6]);
        MacAddress(addr)
    }

    pub fn source(&self) -> MacAddress {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.data[6..12]);
        MacAddress(addr)
    }

    pub fn ether_type(&self) -> EtherType {
        EtherType::from(NetworkEndian::read_u16(&self.data[12..14]))
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.data[ETH_HDR_LEN..]
    }

    pub fn write_header(
        cur: &mut CursorMut<'_>,
        dest: MacAddress,
        src: MacAddress,
        eth_type: EtherType,
    ) -> Result<()> {
        cur.write_bytes(&dest.0)?;
        cur.write_bytes(&src.0)?;
        cur.write_u16(eth_type.into())
    }
}
