// src/bootstrap.rs
// DHCP bootstrap: DISCOVER, then take the first BOOTREPLY as final

use crate::cancel::CancelToken;
use crate::context::NetworkContext;
use crate::dhcp::{DhcpPacket, OfferedConfig, DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
use crate::error::{NetError, Result};
use crate::ethernet::{EtherType, EthernetFrame};
use crate::frame::Frame;
use crate::interface::NetworkInterface;
use crate::ipv4::{IpProtocol, Ipv4Packet};
use crate::packets::build_dhcp_discover;
use crate::udp::UdpHeader;
use log::{debug, info, warn};
use rand::Rng;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpState {
    Start,
    SendDiscover,
    AwaitReply,
    Done,
}

/// One-shot DHCP client run before any task is registered.
///
/// Never sends a REQUEST: the first BOOTREPLY with a valid cookie is applied
/// to the context as the final configuration, whether it is an OFFER or an ACK.
pub struct DhcpBootstrap {
    state: DhcpState,
    hostname: String,
    burst: usize,
    timeout: Option<Duration>,
    fixed_xid: Option<u32>,
    started: Option<Instant>,
}

impl DhcpBootstrap {
    pub fn new(hostname: impl Into<String>, burst: usize) -> Self {
        Self {
            state: DhcpState::Start,
            hostname: hostname.into(),
            burst: burst.max(1),
            timeout: None,
            fixed_xid: None,
            started: None,
        }
    }

    /// Fail with `DhcpTimeout` when no reply arrives within `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use `xid` instead of a random transaction id.
    pub fn with_xid(mut self, xid: u32) -> Self {
        self.fixed_xid = Some(xid);
        self
    }

    pub fn state(&self) -> DhcpState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == DhcpState::Done
    }

    /// Advances the machine by one state. A round that receives nothing
    /// leaves it in `AwaitReply`.
    pub fn step<I: NetworkInterface>(
        &mut self,
        ctx: &mut NetworkContext,
        iface: &mut I,
        now: Instant,
    ) -> Result<DhcpState> {
        match self.state {
            DhcpState::Start => {
                ctx.dhcp_xid = self.fixed_xid.unwrap_or_else(|| rand::thread_rng().gen());
                self.started = Some(now);
                self.state = DhcpState::SendDiscover;
            }
            DhcpState::SendDiscover => {
                let frame = build_dhcp_discover(ctx.mac, ctx.dhcp_xid, &self.hostname, iface.offloads_checksums())?;
                iface.send(frame)?;
                info!("[DHCP] Sent DHCPDISCOVER xid=0x{:08x} hostname={}", ctx.dhcp_xid, self.hostname);
                self.state = DhcpState::AwaitReply;
            }
            DhcpState::AwaitReply => {
                if let (Some(timeout), Some(started)) = (self.timeout, self.started) {
                    if now.saturating_duration_since(started) >= timeout {
                        return Err(NetError::DhcpTimeout(timeout));
                    }
                }
                for frame in iface.receive_batch(self.burst)? {
                    if let Some(offer) = Self::accept(&frame, ctx.dhcp_xid) {
                        ctx.apply(&offer);
                        Self::report(&offer, ctx);
                        self.state = DhcpState::Done;
                        // The rest of the batch is dropped with the state change.
                        break;
                    }
                }
            }
            DhcpState::Done => {}
        }
        Ok(self.state)
    }

    /// Steps until `Done`, pacing empty polls with `idle`. Returns false if
    /// cancelled first.
    pub fn run<I, F>(
        &mut self,
        ctx: &mut NetworkContext,
        iface: &mut I,
        token: &CancelToken,
        mut idle: F,
    ) -> Result<bool>
    where
        I: NetworkInterface,
        F: FnMut(),
    {
        while !self.is_done() {
            if token.is_cancelled() {
                return Ok(false);
            }
            if self.step(ctx, iface, Instant::now())? == DhcpState::AwaitReply {
                idle();
            }
        }
        Ok(true)
    }

    fn accept(frame: &Frame, xid: u32) -> Option<OfferedConfig> {
        let eth = EthernetFrame::new(frame.as_bytes())?;
        if eth.ether_type() != EtherType::IPv4 {
            return None;
        }
        let ip = Ipv4Packet::new(eth.payload())?;
        if ip.protocol() != IpProtocol::UDP {
            return None;
        }
        let udp = UdpHeader::new(ip.payload())?;
        if udp.src_port() != DHCP_SERVER_PORT || udp.dest_port() != DHCP_CLIENT_PORT {
            return None;
        }
        let Some(dhcp) = DhcpPacket::new(udp.payload()) else {
            debug!("[DHCP] Discarded short reply from {}", ip.source_ip());
            return None;
        };
        if !dhcp.is_boot_reply() {
            debug!("[DHCP] Discarded non-BOOTREPLY from {}", ip.source_ip());
            return None;
        }
        let offer = match dhcp.offered_config() {
            Ok(offer) => offer,
            Err(e) => {
                debug!("[DHCP] Discarded reply from {}: {}", ip.source_ip(), e);
                return None;
            }
        };
        if dhcp.xid() != xid {
            warn!("[DHCP] Reply xid 0x{:08x} does not match 0x{:08x}, accepting anyway", dhcp.xid(), xid);
        }
        Some(offer)
    }

    fn report(offer: &OfferedConfig, ctx: &NetworkContext) {
        info!("[DHCP] Got ip address {} from server {}", ctx.ip, offer.server);
        if let Some(kind) = offer.message_type {
            debug!("[DHCP] Reply message type {:?}", kind);
        }
        info!("[DHCP] Subnet mask: {}", ctx.netmask);
        info!("[DHCP] Router: {}", ctx.gateway);
        info!("[DHCP] Broadcast: {}", ctx.broadcast);
        info!("[DHCP] DNS: {}", ctx.dns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dhcp::{options, DhcpMessageType, BOOTREQUEST, DHCP_OPTIONS_OFFSET, MAGIC_COOKIE};
    use crate::ethernet::MacAddress;
    use crate::interface::MemoryInterface;
    use crate::packets::{build_udp, UdpEndpoints};
    use byteorder::{ByteOrder, NetworkEndian};
    use std::net::Ipv4Addr;

    const MAC: MacAddress = MacAddress([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
    const SERVER_MAC: MacAddress = MacAddress([0x02, 0, 0, 0, 0, 0x01]);

    fn reply(op: u8, xid: u32, opts: &[u8]) -> Frame {
        let mut dhcp = vec![0u8; DHCP_OPTIONS_OFFSET];
        dhcp[0] = op;
        dhcp[1] = 1;
        dhcp[2] = 6;
        NetworkEndian::write_u32(&mut dhcp[4..8], xid);
        dhcp[16..20].copy_from_slice(&[192, 0, 2, 50]);
        dhcp[20..24].copy_from_slice(&[192, 0, 2, 1]);
        dhcp[28..34].copy_from_slice(&MAC.0);
        NetworkEndian::write_u32(&mut dhcp[236..240], MAGIC_COOKIE);
        dhcp.extend_from_slice(opts);
        let ep = UdpEndpoints {
            src_mac: SERVER_MAC,
            dst_mac: MacAddress::BROADCAST,
            src_ip: Ipv4Addr::new(192, 0, 2, 1),
            dst_ip: Ipv4Addr::BROADCAST,
            src_port: DHCP_SERVER_PORT,
            dst_port: DHCP_CLIENT_PORT,
        };
        build_udp(&ep, &dhcp, false).unwrap()
    }

    fn full_options() -> Vec<u8> {
        vec![
            options::MESSAGE_TYPE, 1, u8::from(DhcpMessageType::Offer),
            options::SUBNET_MASK, 4, 255, 255, 255, 0,
            options::ROUTER, 4, 192, 0, 2, 1,
            options::BROADCAST, 4, 192, 0, 2, 255,
            options::END,
        ]
    }

    fn until_awaiting(boot: &mut DhcpBootstrap, ctx: &mut NetworkContext, iface: &mut MemoryInterface) {
        let now = Instant::now();
        assert_eq!(boot.step(ctx, iface, now).unwrap(), DhcpState::SendDiscover);
        assert_eq!(boot.step(ctx, iface, now).unwrap(), DhcpState::AwaitReply);
    }

    #[test]
    fn test_discover_then_reply_configures_context() {
        let mut ctx = NetworkContext::new(MAC);
        let mut iface = MemoryInterface::new(MAC);
        let mut boot = DhcpBootstrap::new("pollnet-dev", 32).with_xid(0xcafe_f00d);
        until_awaiting(&mut boot, &mut ctx, &mut iface);
        assert_eq!(ctx.dhcp_xid, 0xcafe_f00d);

        let sent = iface.take_sent();
        assert_eq!(sent.len(), 1);
        let eth = EthernetFrame::new(sent[0].as_bytes()).unwrap();
        assert_eq!(eth.destination(), MacAddress::BROADCAST);
        let ip = Ipv4Packet::new(eth.payload()).unwrap();
        assert_eq!(ip.source_ip(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(ip.dest_ip(), Ipv4Addr::BROADCAST);
        let udp = UdpHeader::new(ip.payload()).unwrap();
        assert_eq!((udp.src_port(), udp.dest_port()), (68, 67));
        let discover = DhcpPacket::new(udp.payload()).unwrap();
        assert_eq!(discover.op(), BOOTREQUEST);
        assert_eq!(discover.xid(), 0xcafe_f00d);
        assert_eq!(discover.client_mac(), MAC);

        // Nothing received: still waiting.
        assert_eq!(boot.step(&mut ctx, &mut iface, Instant::now()).unwrap(), DhcpState::AwaitReply);

        iface.inject(reply(2, 0xcafe_f00d, &full_options()));
        assert_eq!(boot.step(&mut ctx, &mut iface, Instant::now()).unwrap(), DhcpState::Done);
        assert_eq!(ctx.ip, Ipv4Addr::new(192, 0, 2, 50));
        assert_eq!(ctx.netmask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(ctx.gateway, Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(ctx.broadcast, Ipv4Addr::new(192, 0, 2, 255));
        assert!(iface.sent.is_empty(), "no DHCPREQUEST is ever sent");
    }

    #[test]
    fn test_malformed_and_foreign_frames_discarded() {
        let mut ctx = NetworkContext::new(MAC);
        let mut iface = MemoryInterface::new(MAC);
        let mut boot = DhcpBootstrap::new("pollnet-dev", 32).with_xid(7);
        until_awaiting(&mut boot, &mut ctx, &mut iface);

        // Option claims 200 bytes but the buffer ends first.
        iface.inject(reply(2, 7, &[options::SUBNET_MASK, 200, 255, 255]));
        // No END tag.
        iface.inject(reply(2, 7, &[options::SUBNET_MASK, 4, 255, 255, 255, 0]));
        // A BOOTREQUEST from another client.
        iface.inject(reply(1, 7, &full_options()));
        iface.inject(Frame::from_slice(&[0xaa; 30]).unwrap());

        assert_eq!(boot.step(&mut ctx, &mut iface, Instant::now()).unwrap(), DhcpState::AwaitReply);
        assert!(!ctx.is_configured());
        assert_eq!(iface.pending(), 0);
    }

    #[test]
    fn test_foreign_xid_still_accepted() {
        let mut ctx = NetworkContext::new(MAC);
        let mut iface = MemoryInterface::new(MAC);
        let mut boot = DhcpBootstrap::new("pollnet-dev", 32).with_xid(1);
        until_awaiting(&mut boot, &mut ctx, &mut iface);
        iface.inject(reply(2, 0x9999, &full_options()));
        assert_eq!(boot.step(&mut ctx, &mut iface, Instant::now()).unwrap(), DhcpState::Done);
        assert_eq!(ctx.ip, Ipv4Addr::new(192, 0, 2, 50));
    }

    #[test]
    fn test_timeout_is_fatal() {
        let mut ctx = NetworkContext::new(MAC);
        let mut iface = MemoryInterface::new(MAC);
        let mut boot = DhcpBootstrap::new("pollnet-dev", 32).with_timeout(Some(Duration::from_secs(5)));
        let start = Instant::now();
        boot.step(&mut ctx, &mut iface, start).unwrap();
        boot.step(&mut ctx, &mut iface, start).unwrap();
        assert!(boot.step(&mut ctx, &mut iface, start + Duration::from_secs(4)).is_ok());
        assert!(matches!(
            boot.step(&mut ctx, &mut iface, start + Duration::from_secs(5)),
            Err(NetError::DhcpTimeout(_))
        ));
    }

    #[test]
    fn test_run_stops_when_cancelled() {
        let mut ctx = NetworkContext::new(MAC);
        let mut iface = MemoryInterface::new(MAC);
        let mut boot = DhcpBootstrap::new("pollnet-dev", 32);
        let token = CancelToken::new();
        let canceller = token.clone();
        let mut polls = 0;
        let finished = boot
            .run(&mut ctx, &mut iface, &token, || {
                polls += 1;
                if polls == 3 {
                    canceller.cancel();
                }
            })
            .unwrap();
        assert!(!finished);
        assert_eq!(boot.state(), DhcpState::AwaitReply);
    }
}
