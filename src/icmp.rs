// src/icmp.rs
use crate::cursor::CursorMut;
use crate::error::Result;
use crate::utils::checksum;
use byteorder::{ByteOrder, NetworkEndian};

pub const ICMP_HDR_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply,
    EchoRequest,
    Unknown(u8),
}

impl From<u8> for IcmpType {
    fn from(val: u8) -> Self {
        match val {
            0 => IcmpType::EchoReply,
            8 => IcmpType::EchoRequest,
            other => IcmpType::Unknown(other),
        }
    }
}

impl From<IcmpType> for u8 {
    fn from(ty: IcmpType) -> u8 {
        match ty {
            IcmpType::EchoReply => 0,
            IcmpType::EchoRequest => 8,
            IcmpType::Unknown(val) => val,
        }
    }
}

pub struct IcmpPacket<'a> {
    pub data: &'a [u8],
}

impl<'a> IcmpPacket<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        if data.len() < ICMP_HDR_LEN {
            return None;
        }
        Some(Self { data })
    }

    pub fn icmp_type(&self) -> IcmpType {
        IcmpType::from(self.data[0])
    }

    pub fn code(&self) -> u8 {
        self.data[1]
    }

    pub fn checksum(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[2..4])
    }

    pub fn identifier(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[4..6])
    }

    pub fn sequence(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[6..8])
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.data[ICMP_HDR_LEN..]
    }

    /// Writes an echo message. The checksum is always computed in software.
    pub fn write_echo(
        cur: &mut CursorMut<'_>,
        icmp_type: IcmpType,
        identifier: u16,
        seq_num: u16,
        payload: &[u8],
    ) -> Result<()> {
        let start = cur.position();
        cur.write_u8(icmp_type.into())?;
        cur.write_u8(0)?; // Code
        cur.write_u16(0)?; // Checksum placeholder
        cur.write_u16(identifier)?;
        cur.write_u16(seq_num)?;
        cur.write_bytes(payload)?;

        let csum = checksum(&cur.written()[start..start + ICMP_HDR_LEN + payload.len()]);
        cur.patch_u16(start + 2, csum)
    }
}
