// src/interface.rs
use crate::error::{NetError, Result};
use crate::ethernet::MacAddress;
use crate::frame::Frame;
use std::collections::VecDeque;

/// Transmit side of a network interface.
pub trait FrameSink {
    /// Hands one frame to the interface. Failure is fatal to the caller.
    fn send(&mut self, frame: Frame) -> Result<()>;

    /// Whether the interface fills in IPv4 header and UDP checksums itself.
    fn offloads_checksums(&self) -> bool {
        false
    }
}

/// A poll-mode network interface.
pub trait NetworkInterface: FrameSink {
    /// Returns up to `max` frames in arrival order without blocking.
    fn receive_batch(&mut self, max: usize) -> Result<Vec<Frame>>;

    fn mac_address(&self) -> MacAddress;

    fn link_is_up(&self) -> bool;
}

/// In-memory interface: frames pushed with `inject` are received, frames
/// sent are captured in `sent`.
#[derive(Debug)]
pub struct MemoryInterface {
    mac: MacAddress,
    inbound: VecDeque<Frame>,
    pub sent: Vec<Frame>,
    pub link_up: bool,
    pub offload: bool,
    /// When set, every `send` fails.
    pub fail_sends: bool,
}

impl MemoryInterface {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            inbound: VecDeque::new(),
            sent: Vec::new(),
            link_up: true,
            offload: false,
            fail_sends: false,
        }
    }

    pub fn inject(&mut self, frame: Frame) {
        self.inbound.push_back(frame);
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Drains and returns everything sent so far.
    pub fn take_sent(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.sent)
    }
}

impl FrameSink for MemoryInterface {
    fn send(&mut self, frame: Frame) -> Result<()> {
        if self.fail_sends {
            return Err(NetError::TransmitFailed("transmit ring full".into()));
        }
        self.sent.push(frame);
        Ok(())
    }

    fn offloads_checksums(&self) -> bool {
        self.offload
    }
}

impl NetworkInterface for MemoryInterface {
    fn receive_batch(&mut self, max: usize) -> Result<Vec<Frame>> {
        let n = max.min(self.inbound.len());
        Ok(self.inbound.drain(..n).collect())
    }

    fn mac_address(&self) -> MacAddress {
        self.mac
    }

    fn link_is_up(&self) -> bool {
        self.link_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_preserve_order_and_limit() {
        let mut iface = MemoryInterface::new(MacAddress::ZERO);
        for i in 0..5u8 {
            iface.inject(Frame::from_slice(&[i]).unwrap());
        }
        let first = iface.receive_batch(3).unwrap();
        assert_eq!(first.iter().map(|f| f.as_bytes()[0]).collect::<Vec<_>>(), vec![0, 1, 2]);
        let rest = iface.receive_batch(32).unwrap();
        assert_eq!(rest.len(), 2);
        assert!(iface.receive_batch(32).unwrap().is_empty());
    }

    #[test]
    fn test_send_capture_and_failure() {
        let mut iface = MemoryInterface::new(MacAddress::ZERO);
        iface.send(Frame::new()).unwrap();
        assert_eq!(iface.take_sent().len(), 1);
        assert!(iface.sent.is_empty());

        iface.fail_sends = true;
        assert!(matches!(iface.send(Frame::new()), Err(NetError::TransmitFailed(_))));
    }
}
