// src/ipv4.rs
use crate::cursor::CursorMut;
use crate::error::{NetError, Result};
use crate::utils::checksum;
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

pub const IPV4_HDR_LEN: usize = 20;
pub const DEFAULT_TTL: u8 = 64;
const VERSION_IHL: u8 = 0x45;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IpProtocol {
    ICMP,
    TCP,
    UDP,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(val: u8) -> Self {
        match val {
            1 => IpProtocol::ICMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl From<IpProtocol> for u8 {
    fn from(proto: IpProtocol) -> u8 {
        match proto {
            IpProtocol::ICMP => 1,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::Unknown(p) => p,
        }
    }
}

/// IPv4 packet view. `data` is cut to the header's total length, so
/// Ethernet padding never shows up in `payload()`.
pub struct Ipv4Packet<'a> {
    pub data: &'a [u8],
}

impl<'a> Ipv4Packet<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < IPV4_HDR_LEN || data[0] >> 4 != 4 {
            return None;
        }
        let header_len = ((data[0] & 0x0F) as usize) * 4;
        let total_len = NetworkEndian::read_u16(&data[2..4]) as usize;
        if header_len < IPV4_HDR_LEN || total_len < header_len || total_len > data.len() {
            return None;
        }
        Some(Self { data: &data[..total_len] })
    }

    pub fn header_length(&self) -> usize {
        ((self.data[0] & 0x0F) as usize) * 4
    }

    pub fn total_length(&self) -> usize {
        self.data.len()
    }

    pub fn ttl(&self) -> u8 {
        self.data[8]
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    pub fn source_ip(&self) -> Ipv4Addr {
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&self.data[12..16]);
        Ipv4Addr::from(addr)
    }

    pub fn dest_ip(&self) -> Ipv4Addr {
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&self.data[16..20]);
        Ipv4Addr::from(addr)
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.header_length()..]
    }

    /// Writes a 20-byte IPv4 header.
    ///
    /// With `offload` set the checksum field stays zero for the interface
    /// to fill in; otherwise it is computed here.
    pub fn write_header(
        cur: &mut CursorMut<'_>,
        src_ip: Ipv4Addr,
        dest_ip: Ipv4Addr,
        protocol: IpProtocol,
        payload_len: usize,
        offload: bool,
    ) -> Result<()> {
        let total_len = IPV4_HDR_LEN + payload_len;
        if total_len > u16::MAX as usize {
            return Err(NetError::FrameTooLarge(total_len));
        }
        let start = cur.position();
        cur.write_u8(VERSION_IHL)?;
        cur.write_u8(0)?; // DSCP/ECN
        cur.write_u16(total_len as u16)?;
        cur.write_u16(0)?; // Identification
        cur.write_u16(0)?; // Flags/Fragment offset
        cur.write_u8(DEFAULT_TTL)?;
        cur.write_u8(protocol.into())?;
        cur.write_u16(0)?; // Checksum placeholder
        cur.write_ipv4(src_ip)?;
        cur.write_ipv4(dest_ip)?;

        if !offload {
            let csum = checksum(&cur.written()[start..start + IPV4_HDR_LEN]);
            cur.patch_u16(start + 10, csum)?;
        }
        Ok(())
    }
}
