// src/context.rs
use crate::dhcp::OfferedConfig;
use crate::ethernet::MacAddress;
use std::net::Ipv4Addr;

/// This endpoint's identity and learned configuration.
///
/// Addresses are `UNSPECIFIED` until the DHCP bootstrap sets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkContext {
    pub mac: MacAddress,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub dhcp_xid: u32,
}

impl NetworkContext {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            ip: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            broadcast: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            dns: Ipv4Addr::UNSPECIFIED,
            dhcp_xid: 0,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.ip.is_unspecified()
    }

    pub fn has_gateway(&self) -> bool {
        !self.gateway.is_unspecified()
    }

    /// Copies every field the reply carried. Fields the reply left unset
    /// keep their current value.
    pub fn apply(&mut self, offer: &OfferedConfig) {
        self.ip = offer.address;
        if !offer.netmask.is_unspecified() {
            self.netmask = offer.netmask;
        }
        if !offer.gateway.is_unspecified() {
            self.gateway = offer.gateway;
        }
        if !offer.broadcast.is_unspecified() {
            self.broadcast = offer.broadcast;
        }
        if !offer.dns.is_unspecified() {
            self.dns = offer.dns;
        }
    }

    /// True when `addr` lies in our subnet. Without a netmask nothing is local.
    pub fn is_local(&self, addr: Ipv4Addr) -> bool {
        if self.netmask.is_unspecified() {
            return false;
        }
        let mask = u32::from(self.netmask);
        u32::from(addr) & mask == u32::from(self.ip) & mask
    }
}
