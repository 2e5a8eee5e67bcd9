// src/udp.rs
use crate::cursor::CursorMut;
use crate::error::{NetError, Result};
use crate::utils::udp_checksum;
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

pub const UDP_HDR_LEN: usize = 8;

/// UDP datagram view, cut to the header's length field.
pub struct UdpHeader<'a> {
    pub data: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < UDP_HDR_LEN {
            return None;
        }
        let length = NetworkEndian::read_u16(&data[4..6]) as usize;
        if length < UDP_HDR_LEN || length > data.len() {
            return None;
        }
        Some(Self { data: &data[..length] })
    }

    pub fn src_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[0..2])
    }

    pub fn dest_port(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[2..4])
    }

    pub fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[4..6])
    }

    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[6..8])
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.data[UDP_HDR_LEN..]
    }

    /// Writes the UDP header followed by `payload`.
    ///
    /// With `offload` set the checksum is left zero, which IPv4 allows.
    pub fn write(
        cur: &mut CursorMut<'_>,
        src_port: u16,
        dest_port: u16,
        src_ip: Ipv4Addr,
        dest_ip: Ipv4Addr,
        payload: &[u8],
        offload: bool,
    ) -> Result<()> {
        let total_len = UDP_HDR_LEN + payload.len();
        if total_len > u16::MAX as usize {
            return Err(NetError::FrameTooLarge(total_len));
        }
        let start = cur.position();
        cur.write_u16(src_port)?;
        cur.write_u16(dest_port)?;
        cur.write_u16(total_len as u16)?;
        cur.write_u16(0)?; // Checksum placeholder
        cur.write_bytes(payload)?;

        if !offload {
            let csum = udp_checksum(src_ip, dest_ip, &cur.written()[start..start + total_len]);
            cur.patch_u16(start + 6, csum)?;
        }
        Ok(())
    }
}
