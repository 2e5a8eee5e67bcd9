// src/frame.rs
use crate::cursor::CursorMut;
use crate::error::{NetError, Result};
use core::fmt;

/// Largest Ethernet frame handled, without FCS.
pub const MTU: usize = 1514;

/// One Ethernet frame: fixed storage plus the used length.
#[derive(Clone)]
pub struct Frame {
    len: usize,
    data: [u8; MTU],
}

impl Frame {
    pub fn new() -> Self {
        Self { len: 0, data: [0u8; MTU] }
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() > MTU {
            return Err(NetError::FrameTooLarge(slice.len()));
        }
        let mut frame = Self::new();
        frame.len = slice.len();
        frame.data[..slice.len()].copy_from_slice(slice);
        Ok(frame)
    }

    /// Builds a frame in place; the frame ends where `f` stops writing.
    pub fn build<F>(f: F) -> Result<Self>
    where
        F: FnOnce(&mut CursorMut<'_>) -> Result<()>,
    {
        let mut frame = Self::new();
        let mut cur = CursorMut::new(&mut frame.data);
        f(&mut cur)?;
        frame.len = cur.position();
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Whole backing buffer, for receiving into. Follow with `set_len`.
    pub fn buffer_mut(&mut self) -> &mut [u8; MTU] {
        &mut self.data
    }

    pub fn set_len(&mut self, len: usize) -> Result<()> {
        if len > MTU {
            return Err(NetError::FrameTooLarge(len));
        }
        self.len = len;
        Ok(())
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sets_length() {
        let frame = Frame::build(|cur| {
            cur.write_u16(0xabcd)?;
            cur.write_bytes(b"xyz")
        })
        .unwrap();
        assert_eq!(frame.len(), 5);
        assert_eq!(frame.as_bytes(), &[0xab, 0xcd, b'x', b'y', b'z']);
    }

    #[test]
    fn test_build_cannot_exceed_mtu() {
        let res = Frame::build(|cur| cur.write_zeros(MTU + 1));
        assert!(matches!(res, Err(NetError::Truncated { .. })));
    }

    #[test]
    fn test_from_slice_bounds() {
        assert_eq!(Frame::from_slice(&[1, 2, 3]).unwrap().as_bytes(), &[1, 2, 3]);
        assert!(Frame::from_slice(&[0u8; MTU + 1]).is_err());
        assert!(Frame::new().is_empty());
    }

    #[test]
    fn test_receive_into_buffer() {
        let mut frame = Frame::new();
        frame.buffer_mut()[..2].copy_from_slice(&[9, 9]);
        frame.set_len(2).unwrap();
        assert_eq!(frame.as_bytes(), &[9, 9]);
        assert!(frame.set_len(MTU + 1).is_err());
    }
}
