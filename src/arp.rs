// src/arp.rs
use crate::cursor::CursorMut;
use crate::error::Result;
use crate::ethernet::MacAddress;
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

pub const ARP_HDR_LEN: usize = 28;
pub const HTYPE_ETHERNET: u16 = 1;
pub const PTYPE_IPV4: u16 = 0x0800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOp {
    Request,
    Reply,
    Unknown(u16),
}

impl From<u16> for ArpOp {
    fn from(val: u16) -> Self {
        match val {
            1 => ArpOp::Request,
            2 => ArpOp::Reply,
            other => ArpOp::Unknown(other),
        }
    }
}

impl From<ArpOp> for u16 {
    fn from(op: ArpOp) -> u16 {
        match op {
            ArpOp::Request => 1,
            ArpOp::Reply => 2,
            ArpOp::Unknown(val) => val,
        }
    }
}

pub struct ArpPacket<'a> {
    pub data: &'a [u8],
}

impl<'a> ArpPacket<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < ARP_HDR_LEN {
            return None;
        }
        Some(Self { data })
    }

    pub fn hardware_type(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[0..2])
    }

    pub fn protocol_type(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[2..4])
    }

    /// Ethernet hardware addresses resolving IPv4 protocol addresses.
    pub fn is_ethernet_ipv4(&self) -> bool {
        self.hardware_type() == HTYPE_ETHERNET
            && self.protocol_type() == PTYPE_IPV4
            && self.data[4] == 6
            && self.data[5] == 4
    }

    pub fn operation(&self) -> ArpOp {
        ArpOp::from(NetworkEndian::read_u16(&self.data[6..8]))
    }

    pub fn sender_mac(&self) -> MacAddress {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.data[8..14]);
        MacAddress(addr)
    }

    pub fn sender_ip(&self) -> Ipv4Addr {
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&self.data[14..18]);
        Ipv4Addr::from(addr)
    }

    pub fn target_mac(&self) -> MacAddress {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.data[18..24]);
        MacAddress(addr)
    }

    pub fn target_ip(&self) -> Ipv4Addr {
        let mut addr = [0u8; 4];
        addr.copy_from_slice(&self.data[24..28]);
        Ipv4Addr::from(addr)
    }

    /// Writes an Ethernet/IPv4 ARP packet.
    pub fn write(
        cur: &mut CursorMut<'_>,
        op: ArpOp,
        sender_mac: MacAddress,
        sender_ip: Ipv4Addr,
        target_mac: MacAddress,
        target_ip: Ipv4Addr,
    ) -> Result<()> {
        cur.write_u16(HTYPE_ETHERNET)?;
        cur.write_u16(PTYPE_IPV4)?;
        cur.write_u8(6)?; // Hardware Size
        cur.write_u8(4)?; // Protocol Size
        cur.write_u16(op.into())?;
        cur.write_bytes(&sender_mac.0)?;
        cur.write_ipv4(sender_ip)?;
        cur.write_bytes(&target_mac.0)?;
        cur.write_ipv4(target_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let mut buf = [0u8; ARP_HDR_LEN];
        let mut cur = CursorMut::new(&mut buf);
        let mac = MacAddress([2, 0, 0, 0, 0, 1]);
        ArpPacket::write(
            &mut cur,
            ArpOp::Request,
            mac,
            Ipv4Addr::new(192, 0, 2, 50),
            MacAddress::ZERO,
            Ipv4Addr::new(192, 0, 2, 1),
        )
        .unwrap();
        assert_eq!(cur.position(), ARP_HDR_LEN);
        assert_eq!(&buf[0..8], &[0x00, 0x01, 0x08, 0x00, 6, 4, 0x00, 0x01]);

        let pkt = ArpPacket::new(&buf).unwrap();
        assert!(pkt.is_ethernet_ipv4());
        assert_eq!(pkt.operation(), ArpOp::Request);
        assert_eq!(pkt.sender_mac(), mac);
        assert_eq!(pkt.sender_ip(), Ipv4Addr::new(192, 0, 2, 50));
        assert_eq!(pkt.target_mac(), MacAddress::ZERO);
        assert_eq!(pkt.target_ip(), Ipv4Addr::new(192, 0, 2, 1));
    }

    #[test]
    fn test_non_ipv4_arp_detected() {
        let mut buf = [0u8; ARP_HDR_LEN];
        buf[0..2].copy_from_slice(&[0x00, 0x06]); // IEEE 802
        buf[2..4].copy_from_slice(&[0x08, 0x00]);
        buf[4] = 6;
        buf[5] = 4;
        assert!(!ArpPacket::new(&buf).unwrap().is_ethernet_ipv4());
        assert!(ArpPacket::new(&buf[..27]).is_none());
    }
}
