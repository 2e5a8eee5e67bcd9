// src/tasks/ping_reply.rs
use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::{EtherType, EthernetFrame};
use crate::frame::Frame;
use crate::icmp::{IcmpPacket, IcmpType};
use crate::interface::FrameSink;
use crate::ipv4::{IpProtocol, Ipv4Packet};
use crate::packets::build_icmp_echo_reply;
use crate::task::{ProcessResult, Task};
use log::info;

/// Answers ICMP echo requests addressed to us.
#[derive(Debug, Default)]
pub struct PingReplier;

impl PingReplier {
    pub fn new() -> Self {
        Self
    }
}

impl Task for PingReplier {
    fn name(&self) -> &str {
        "PingReply"
    }

    fn try_process(
        &mut self,
        frame: &Frame,
        ctx: &NetworkContext,
        tx: &mut dyn FrameSink,
    ) -> Result<ProcessResult> {
        let Some(eth) = EthernetFrame::new(frame.as_bytes()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if eth.ether_type() != EtherType::IPv4 {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(ip) = Ipv4Packet::new(eth.payload()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if ip.protocol() != IpProtocol::ICMP || ip.dest_ip() != ctx.ip {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(icmp) = IcmpPacket::new(ip.payload()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if icmp.icmp_type() != IcmpType::EchoRequest {
            return Ok(ProcessResult::NotProcessed);
        }

        let reply = build_icmp_echo_reply(
            ctx.mac,
            eth.source(),
            ctx.ip,
            ip.source_ip(),
            icmp.identifier(),
            icmp.sequence(),
            icmp.payload(),
            tx.offloads_checksums(),
        )?;
        tx.send(reply)?;
        info!("[PING] Reply Ping Request from {} seq={}", ip.source_ip(), icmp.sequence());
        Ok(ProcessResult::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethernet::MacAddress;
    use crate::icmp::ICMP_HDR_LEN;
    use crate::tasks::testing::*;
    use crate::utils::checksum;
    use std::net::Ipv4Addr;

    fn echo_request(dst_ip: Ipv4Addr, payload: &[u8]) -> Frame {
        Frame::build(|cur| {
            EthernetFrame::write_header(cur, OWN_MAC, PEER_MAC, EtherType::IPv4)?;
            Ipv4Packet::write_header(cur, PEER_IP, dst_ip, IpProtocol::ICMP, ICMP_HDR_LEN + payload.len(), false)?;
            IcmpPacket::write_echo(cur, IcmpType::EchoRequest, 7, 3, payload)
        })
        .unwrap()
    }

    #[test]
    fn test_echo_reply_mirrors_request() {
        let (ctx, mut iface) = configured();
        let mut task = PingReplier::new();
        let payload: Vec<u8> = (0..32).collect();

        let res = task.try_process(&echo_request(OWN_IP, &payload), &ctx, &mut iface).unwrap();
        assert_eq!(res, ProcessResult::Processed);
        assert_eq!(iface.sent.len(), 1);

        let eth = EthernetFrame::new(iface.sent[0].as_bytes()).unwrap();
        assert_eq!(eth.destination(), PEER_MAC);
        assert_eq!(eth.source(), OWN_MAC);
        let ip = Ipv4Packet::new(eth.payload()).unwrap();
        assert_eq!(ip.source_ip(), OWN_IP);
        assert_eq!(ip.dest_ip(), PEER_IP);
        assert_eq!(ip.ttl(), 64);
        let icmp = IcmpPacket::new(ip.payload()).unwrap();
        assert_eq!(icmp.icmp_type(), IcmpType::EchoReply);
        assert_eq!(icmp.identifier(), 7);
        assert_eq!(icmp.sequence(), 3);
        assert_eq!(icmp.payload(), &payload[..]);
        assert_eq!(checksum(ip.payload()), 0);
    }

    #[test]
    fn test_ignores_echo_for_other_hosts_and_replies() {
        let (ctx, mut iface) = configured();
        let mut task = PingReplier::new();
        let other = echo_request(Ipv4Addr::new(192, 0, 2, 99), b"abc");
        assert_eq!(task.try_process(&other, &ctx, &mut iface).unwrap(), ProcessResult::NotProcessed);

        let reply = build_icmp_echo_reply(PEER_MAC, OWN_MAC, PEER_IP, OWN_IP, 1, 1, b"x", false).unwrap();
        assert_eq!(task.try_process(&reply, &ctx, &mut iface).unwrap(), ProcessResult::NotProcessed);
        assert!(iface.sent.is_empty());
    }

    #[test]
    fn test_ignores_non_ip() {
        let (ctx, mut iface) = configured();
        let mut task = PingReplier::new();
        let frame = Frame::build(|cur| {
            EthernetFrame::write_header(cur, MacAddress::BROADCAST, PEER_MAC, EtherType::IPv6)?;
            cur.write_zeros(40)
        })
        .unwrap();
        assert_eq!(task.try_process(&frame, &ctx, &mut iface).unwrap(), ProcessResult::NotProcessed);
    }
}
