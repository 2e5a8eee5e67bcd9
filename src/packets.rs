// src/packets.rs
// Complete frames: Ethernet header plus the protocol stack above it

use crate::arp::{ArpOp, ArpPacket, ARP_HDR_LEN};
use crate::cursor::CursorMut;
use crate::dhcp::{DhcpPacket, DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
use crate::error::Result;
use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::frame::Frame;
use crate::icmp::{IcmpPacket, IcmpType, ICMP_HDR_LEN};
use crate::ipv4::{IpProtocol, Ipv4Packet};
use crate::udp::{UdpHeader, UDP_HDR_LEN};
use std::net::Ipv4Addr;

/// Broadcast ARP request asking who has `target_ip`.
pub fn build_arp_request(
    src_mac: MacAddress,
    src_ip: Ipv4Addr,
    target_ip: Ipv4Addr,
) -> Result<Frame> {
    Frame::build(|cur| {
        EthernetFrame::write_header(cur, MacAddress::BROADCAST, src_mac, EtherType::ARP)?;
        ArpPacket::write(cur, ArpOp::Request, src_mac, src_ip, MacAddress::ZERO, target_ip)
    })
}

/// ARP reply telling `dst_mac`/`dst_ip` that `src_ip` is at `src_mac`.
pub fn build_arp_reply(
    src_mac: MacAddress,
    src_ip: Ipv4Addr,
    dst_mac: MacAddress,
    dst_ip: Ipv4Addr,
) -> Result<Frame> {
    Frame::build(|cur| {
        EthernetFrame::write_header(cur, dst_mac, src_mac, EtherType::ARP)?;
        ArpPacket::write(cur, ArpOp::Reply, src_mac, src_ip, dst_mac, dst_ip)
    })
}

pub struct UdpEndpoints {
    pub src_mac: MacAddress,
    pub dst_mac: MacAddress,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
}

pub fn build_udp(ep: &UdpEndpoints, payload: &[u8], offload: bool) -> Result<Frame> {
    Frame::build(|cur| {
        EthernetFrame::write_header(cur, ep.dst_mac, ep.src_mac, EtherType::IPv4)?;
        Ipv4Packet::write_header(
            cur,
            ep.src_ip,
            ep.dst_ip,
            IpProtocol::UDP,
            UDP_HDR_LEN + payload.len(),
            offload,
        )?;
        UdpHeader::write(cur, ep.src_port, ep.dst_port, ep.src_ip, ep.dst_ip, payload, offload)
    })
}

#[allow(clippy::too_many_arguments)]
pub fn build_icmp_echo_reply(
    src_mac: MacAddress,
    dst_mac: MacAddress,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    identifier: u16,
    seq_num: u16,
    payload: &[u8],
    offload: bool,
) -> Result<Frame> {
    Frame::build(|cur| {
        EthernetFrame::write_header(cur, dst_mac, src_mac, EtherType::IPv4)?;
        Ipv4Packet::write_header(
            cur,
            src_ip,
            dst_ip,
            IpProtocol::ICMP,
            ICMP_HDR_LEN + payload.len(),
            offload,
        )?;
        IcmpPacket::write_echo(cur, IcmpType::EchoReply, identifier, seq_num, payload)
    })
}

/// DHCPDISCOVER from 0.0.0.0:68 to 255.255.255.255:67, Ethernet broadcast.
pub fn build_dhcp_discover(
    src_mac: MacAddress,
    xid: u32,
    hostname: &str,
    offload: bool,
) -> Result<Frame> {
    let mut payload = [0u8; 576];
    let len = DhcpPacket::discover_len(hostname);
    {
        let mut cur = CursorMut::new(&mut payload);
        DhcpPacket::write_discover(&mut cur, xid, src_mac, hostname)?;
    }
    let ep = UdpEndpoints {
        src_mac,
        dst_mac: MacAddress::BROADCAST,
        src_ip: Ipv4Addr::UNSPECIFIED,
        dst_ip: Ipv4Addr::BROADCAST,
        src_port: DHCP_CLIENT_PORT,
        dst_port: DHCP_SERVER_PORT,
    };
    build_udp(&ep, &payload[..len], offload)
}

/// Length of an Ethernet + ARP frame.
pub const ARP_FRAME_LEN: usize = crate::ethernet::ETH_HDR_LEN + ARP_HDR_LEN;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dhcp::{DhcpMessageType, BOOTREQUEST};
    use crate::ethernet::ETH_HDR_LEN;
    use crate::utils::checksum;

    const MAC: MacAddress = MacAddress([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);

    #[test]
    fn test_arp_request_frame() {
        let frame = build_arp_request(MAC, Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        assert_eq!(frame.len(), ARP_FRAME_LEN);
        let eth = EthernetFrame::new(frame.as_bytes()).unwrap();
        assert_eq!(eth.destination(), MacAddress::BROADCAST);
        assert_eq!(eth.source(), MAC);
        let arp = ArpPacket::new(eth.payload()).unwrap();
        assert_eq!(arp.operation(), ArpOp::Request);
        assert_eq!(arp.target_mac(), MacAddress::ZERO);
        assert_eq!(arp.target_ip(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_dhcp_discover_frame() {
        let frame = build_dhcp_discover(MAC, 42, "pollnet-dev", false).unwrap();
        let eth = EthernetFrame::new(frame.as_bytes()).unwrap();
        assert_eq!(eth.destination(), MacAddress::BROADCAST);
        assert_eq!(eth.ether_type(), EtherType::IPv4);

        let ip = Ipv4Packet::new(eth.payload()).unwrap();
        assert_eq!(ip.source_ip(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(ip.dest_ip(), Ipv4Addr::BROADCAST);
        assert_eq!(ip.protocol(), IpProtocol::UDP);
        assert_eq!(checksum(&eth.payload()[..20]), 0);

        let udp = UdpHeader::new(ip.payload()).unwrap();
        assert_eq!(udp.src_port(), 68);
        assert_eq!(udp.dest_port(), 67);

        let dhcp = DhcpPacket::new(udp.payload()).unwrap();
        assert_eq!(dhcp.op(), BOOTREQUEST);
        assert_eq!(dhcp.xid(), 42);
        assert_eq!(dhcp.client_mac(), MAC);
        let first = dhcp.options().next().unwrap().unwrap();
        assert_eq!(first.value, &[u8::from(DhcpMessageType::Discover)]);
        assert_eq!(frame.len(), ETH_HDR_LEN + 20 + 8 + DhcpPacket::discover_len("pollnet-dev"));
    }
}
