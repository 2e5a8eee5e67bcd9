// src/cursor.rs
use crate::error::{NetError, Result};
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

/// Bounds-checked reader over a byte slice.
///
/// Every read checks the remaining length first, so a lying length field
/// in a header or option turns into `NetError::Truncated` instead of an
/// out-of-bounds access.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(NetError::Truncated { needed: n, remaining: self.remaining() });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(NetworkEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(NetworkEndian::read_u32(self.take(4)?))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_ipv4(&mut self) -> Result<Ipv4Addr> {
        let mut oct = [0u8; 4];
        oct.copy_from_slice(self.take(4)?);
        Ok(Ipv4Addr::from(oct))
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Everything not yet consumed.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

/// Bounds-checked writer over a mutable byte slice.
#[derive(Debug)]
pub struct CursorMut<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> CursorMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.remaining() {
            return Err(NetError::Truncated { needed: n, remaining: self.remaining() });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&mut self.buf[start..start + n])
    }

    pub fn write_u8(&mut self, val: u8) -> Result<()> {
        self.reserve(1)?[0] = val;
        Ok(())
    }

    pub fn write_u16(&mut self, val: u16) -> Result<()> {
        NetworkEndian::write_u16(self.reserve(2)?, val);
        Ok(())
    }

    pub fn write_u32(&mut self, val: u32) -> Result<()> {
        NetworkEndian::write_u32(self.reserve(4)?, val);
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_ipv4(&mut self, addr: Ipv4Addr) -> Result<()> {
        self.write_bytes(&addr.octets())
    }

    /// Writes `n` zero bytes.
    pub fn write_zeros(&mut self, n: usize) -> Result<()> {
        self.reserve(n)?.fill(0);
        Ok(())
    }

    /// Overwrites a 16-bit field that was already written.
    pub fn patch_u16(&mut self, offset: usize, val: u16) -> Result<()> {
        if offset + 2 > self.pos {
            return Err(NetError::Truncated { needed: offset + 2, remaining: self.pos });
        }
        NetworkEndian::write_u16(&mut self.buf[offset..offset + 2], val);
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_network_order() {
        let data = [0x08, 0x00, 0xc0, 0xa8, 0x00, 0x01, 0xff];
        let mut cur = Cursor::new(&data);
        assert_eq!(cur.read_u16().unwrap(), 0x0800);
        assert_eq!(cur.read_ipv4().unwrap(), Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(cur.remaining(), 1);
        assert_eq!(cur.read_u8().unwrap(), 0xff);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_read_past_end_is_rejected() {
        let data = [1u8, 2, 3];
        let mut cur = Cursor::new(&data);
        cur.skip(2).unwrap();
        match cur.read_u32() {
            Err(NetError::Truncated { needed, remaining }) => {
                assert_eq!(needed, 4);
                assert_eq!(remaining, 1);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
        // A failed read does not move the cursor.
        assert_eq!(cur.position(), 2);
    }

    #[test]
    fn test_write_and_patch() {
        let mut buf = [0u8; 8];
        let mut cur = CursorMut::new(&mut buf);
        cur.write_u16(0x4500).unwrap();
        cur.write_u16(0).unwrap();
        cur.write_u32(0xdead_beef).unwrap();
        cur.patch_u16(2, 0x1234).unwrap();
        assert_eq!(cur.written(), &[0x45, 0x00, 0x12, 0x34, 0xde, 0xad, 0xbe, 0xef]);
        assert!(cur.write_u8(0).is_err());
    }

    #[test]
    fn test_patch_beyond_written_is_rejected() {
        let mut buf = [0u8; 8];
        let mut cur = CursorMut::new(&mut buf);
        cur.write_u16(1).unwrap();
        assert!(cur.patch_u16(1, 0xffff).is_err());
    }
}
