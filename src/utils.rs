// src/utils.rs
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

/// Internet one's-complement checksum (RFC 1071) over `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = Checksum::new();
    sum.add_bytes(data);
    sum.finish()
}

/// Incremental Internet checksum.
///
/// Words are summed in network byte order. Only the last chunk passed to
/// `add_bytes` may have odd length; its trailing byte is the high byte of
/// a zero-padded word.
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksum {
    sum: u32,
}

impl Checksum {
    pub fn new() -> Self {
        Self { sum: 0 }
    }

    pub fn add_bytes(&mut self, data: &[u8]) -> &mut Self {
        let mut words = data.chunks_exact(2);
        for word in &mut words {
            self.sum = self.sum.wrapping_add(NetworkEndian::read_u16(word) as u32);
        }
        if let [last] = words.remainder() {
            self.sum = self.sum.wrapping_add((*last as u32) << 8);
        }
        self
    }

    pub fn add_u16(&mut self, word: u16) -> &mut Self {
        self.sum = self.sum.wrapping_add(word as u32);
        self
    }

    /// Folds the carries twice and complements.
    pub fn finish(&self) -> u16 {
        let mut sum = (self.sum >> 16) + (self.sum & 0xFFFF);
        sum += sum >> 16;
        !(sum as u16)
    }
}

/// UDP checksum over the IPv4 pseudo-header and the whole datagram.
/// A computed zero is sent as 0xFFFF, zero meaning "no checksum".
pub fn udp_checksum(src_ip: Ipv4Addr, dest_ip: Ipv4Addr, datagram: &[u8]) -> u16 {
    let mut sum = Checksum::new();
    sum.add_bytes(&src_ip.octets())
        .add_bytes(&dest_ip.octets())
        .add_u16(17)
        .add_u16(datagram.len() as u16)
        .add_bytes(datagram);
    match sum.finish() {
        0 => 0xFFFF,
        csum => csum,
    }
}
