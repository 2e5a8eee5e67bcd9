// src/tasks/udp_send.rs
use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::MacAddress;
use crate::interface::FrameSink;
use crate::packets::{build_udp, UdpEndpoints};
use crate::task::Task;
use log::debug;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

/// Sends a fixed message to one destination every `interval`.
///
/// The first datagram leaves one full interval after creation.
pub struct UdpSender {
    name: String,
    src_port: u16,
    dst_ip: Ipv4Addr,
    dst_port: u16,
    dst_mac: MacAddress,
    interval: Duration,
    message: Vec<u8>,
    last_sent: Instant,
    sent: u64,
}

impl UdpSender {
    pub fn new(
        src_port: u16,
        dst_ip: Ipv4Addr,
        dst_port: u16,
        dst_mac: MacAddress,
        interval: Duration,
        message: impl Into<Vec<u8>>,
        now: Instant,
    ) -> Self {
        Self {
            name: format!("UDPSend:{}:{}", dst_ip, dst_port),
            src_port,
            dst_ip,
            dst_port,
            dst_mac,
            interval,
            message: message.into(),
            last_sent: now,
            sent: 0,
        }
    }

    /// Datagrams sent so far.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }
}

impl Task for UdpSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, now: Instant, ctx: &NetworkContext, tx: &mut dyn FrameSink) -> Result<()> {
        if now.saturating_duration_since(self.last_sent) < self.interval {
            return Ok(());
        }
        let ep = UdpEndpoints {
            src_mac: ctx.mac,
            dst_mac: self.dst_mac,
            src_ip: ctx.ip,
            dst_ip: self.dst_ip,
            src_port: self.src_port,
            dst_port: self.dst_port,
        };
        let frame = build_udp(&ep, &self.message, tx.offloads_checksums())?;
        tx.send(frame)?;
        self.last_sent = now;
        self.sent += 1;
        debug!("[UDP] Sent {} bytes to {}:{}", self.message.len(), self.dst_ip, self.dst_port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethernet::EthernetFrame;
    use crate::ipv4::Ipv4Packet;
    use crate::tasks::testing::*;
    use crate::udp::UdpHeader;

    const WAN: Ipv4Addr = Ipv4Addr::new(39, 107, 102, 23);
    const GATEWAY_MAC: MacAddress = MacAddress([0x02, 0, 0, 0, 0, 0x01]);

    fn sender(now: Instant) -> UdpSender {
        UdpSender::new(8080, WAN, 8080, GATEWAY_MAC, Duration::from_secs(1), "Hello pollnet\n", now)
    }

    #[test]
    fn test_ticks_within_interval_send_nothing() {
        let (ctx, mut iface) = configured();
        let start = Instant::now();
        let mut task = sender(start);
        task.tick(start + Duration::from_millis(200), &ctx, &mut iface).unwrap();
        task.tick(start + Duration::from_millis(900), &ctx, &mut iface).unwrap();
        assert!(iface.sent.is_empty());
        assert!(task.is_alive());
    }

    #[test]
    fn test_sends_once_per_interval_and_resets() {
        let (ctx, mut iface) = configured();
        let start = Instant::now();
        let mut task = sender(start);

        let t1 = start + Duration::from_millis(1000);
        task.tick(t1, &ctx, &mut iface).unwrap();
        assert_eq!(iface.sent.len(), 1);

        // Timer restarted at t1.
        task.tick(t1 + Duration::from_millis(500), &ctx, &mut iface).unwrap();
        assert_eq!(iface.sent.len(), 1);
        task.tick(t1 + Duration::from_millis(1001), &ctx, &mut iface).unwrap();
        assert_eq!(iface.sent.len(), 2);
        assert_eq!(task.sent_count(), 2);

        let eth = EthernetFrame::new(iface.sent[0].as_bytes()).unwrap();
        assert_eq!(eth.destination(), GATEWAY_MAC);
        assert_eq!(eth.source(), OWN_MAC);
        let ip = Ipv4Packet::new(eth.payload()).unwrap();
        assert_eq!(ip.source_ip(), OWN_IP);
        assert_eq!(ip.dest_ip(), WAN);
        let udp = UdpHeader::new(ip.payload()).unwrap();
        assert_eq!(udp.src_port(), 8080);
        assert_eq!(udp.dest_port(), 8080);
        assert_eq!(udp.payload(), b"Hello pollnet\n");
    }

    #[test]
    fn test_never_consumes_frames() {
        let (ctx, mut iface) = configured();
        let mut task = sender(Instant::now());
        let frame = crate::packets::build_arp_request(PEER_MAC, PEER_IP, OWN_IP).unwrap();
        assert_eq!(
            task.try_process(&frame, &ctx, &mut iface).unwrap(),
            crate::task::ProcessResult::NotProcessed
        );
    }

    #[test]
    fn test_transmit_failure_is_returned() {
        let (ctx, mut iface) = configured();
        let start = Instant::now();
        let mut task = sender(start);
        iface.fail_sends = true;
        assert!(task.tick(start + Duration::from_secs(2), &ctx, &mut iface).is_err());
    }
}
