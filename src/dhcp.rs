// src/dhcp.rs
use crate::cursor::{Cursor, CursorMut};
use crate::error::{NetError, Result};
use crate::ethernet::MacAddress;
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;
/// 99.130.83.99 on the wire.
pub const MAGIC_COOKIE: u32 = 0x63825363;

pub const BOOTREQUEST: u8 = 1;
pub const BOOTREPLY: u8 = 2;
pub const HTYPE_ETHERNET: u8 = 1;

/// Fixed BOOTP header, before the magic cookie.
pub const DHCP_HDR_LEN: usize = 236;
pub const DHCP_OPTIONS_OFFSET: usize = DHCP_HDR_LEN + 4;

/// Option tags (RFC 1533 / RFC 2132).
pub mod options {
    pub const PAD: u8 = 0;
    pub const SUBNET_MASK: u8 = 1;
    pub const ROUTER: u8 = 3;
    pub const DNS_SERVER: u8 = 6;
    pub const HOSTNAME: u8 = 12;
    pub const BROADCAST: u8 = 28;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const SERVER_ID: u8 = 54;
    pub const CLIENT_ID: u8 = 61;
    pub const END: u8 = 255;
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum DhcpMessageType {
    Discover,
    Offer,
    Request,
    Decline,
    Ack,
    Nak,
    Release,
    Unknown(u8),
}

impl From<u8> for DhcpMessageType {
    fn from(val: u8) -> Self {
        match val {
            1 => DhcpMessageType::Discover,
            2 => DhcpMessageType::Offer,
            3 => DhcpMessageType::Request,
            4 => DhcpMessageType::Decline,
            5 => DhcpMessageType::Ack,
            6 => DhcpMessageType::Nak,
            7 => DhcpMessageType::Release,
            other => DhcpMessageType::Unknown(other),
        }
    }
}

impl From<DhcpMessageType> for u8 {
    fn from(ty: DhcpMessageType) -> u8 {
        match ty {
            DhcpMessageType::Discover => 1,
            DhcpMessageType::Offer => 2,
            DhcpMessageType::Request => 3,
            DhcpMessageType::Decline => 4,
            DhcpMessageType::Ack => 5,
            DhcpMessageType::Nak => 6,
            DhcpMessageType::Release => 7,
            DhcpMessageType::Unknown(val) => val,
        }
    }
}

/// One tag/length/value option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DhcpOption<'a> {
    pub tag: u8,
    pub value: &'a [u8],
}

impl<'a> DhcpOption<'a> {
    /// The value as one address, for options with exact length 4.
    fn exact_addr(&self) -> Option<Ipv4Addr> {
        if self.value.len() != 4 {
            return None;
        }
        Some(Ipv4Addr::new(self.value[0], self.value[1], self.value[2], self.value[3]))
    }

    /// First address of an address list (length a positive multiple of 4).
    fn first_addr(&self) -> Option<Ipv4Addr> {
        if self.value.is_empty() || self.value.len() % 4 != 0 {
            return None;
        }
        Some(Ipv4Addr::new(self.value[0], self.value[1], self.value[2], self.value[3]))
    }
}

/// Walks the option area up to the END tag.
///
/// Yields `Err` once and then stops if an option runs past the buffer or
/// the buffer ends before END.
pub struct OptionIter<'a> {
    cur: Cursor<'a>,
    done: bool,
}

impl<'a> OptionIter<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { cur: Cursor::new(data), done: false }
    }

    fn next_option(&mut self) -> Result<Option<DhcpOption<'a>>> {
        loop {
            if self.cur.is_empty() {
                return Err(NetError::Malformed("DHCP options without END tag"));
            }
            match self.cur.read_u8()? {
                options::END => return Ok(None),
                options::PAD => continue,
                tag => {
                    let len = self.cur.read_u8()? as usize;
                    let value = self.cur.read_bytes(len)?;
                    return Ok(Some(DhcpOption { tag, value }));
                }
            }
        }
    }
}

impl<'a> Iterator for OptionIter<'a> {
    type Item = Result<DhcpOption<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_option() {
            Ok(Some(opt)) => Some(Ok(opt)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Configuration carried by a BOOTREPLY. Unset fields stay `UNSPECIFIED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferedConfig {
    pub address: Ipv4Addr,
    pub server: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub message_type: Option<DhcpMessageType>,
}

pub struct DhcpPacket<'a> {
    pub data: &'a [u8],
}

impl<'a> DhcpPacket<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        // Fixed header + cookie
        if data.len() < DHCP_OPTIONS_OFFSET {
            return None;
        }
        Some(Self { data })
    }

    pub fn op(&self) -> u8 {
        self.data[0]
    }
    pub fn htype(&self) -> u8 {
        self.data[1]
    }
    pub fn hlen(&self) -> u8 {
        self.data[2]
    }
    pub fn xid(&self) -> u32 {
        NetworkEndian::read_u32(&self.data[4..8])
    }
    pub fn secs(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[8..10])
    }
    pub fn flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.data[10..12])
    }

    fn addr_at(&self, offset: usize) -> Ipv4Addr {
        let mut oct = [0u8; 4];
        oct.copy_from_slice(&self.data[offset..offset + 4]);
        Ipv4Addr::from(oct)
    }

    pub fn client_ip(&self) -> Ipv4Addr {
        self.addr_at(12)
    }
    pub fn your_ip(&self) -> Ipv4Addr {
        self.addr_at(16)
    }
    pub fn server_ip(&self) -> Ipv4Addr {
        self.addr_at(20)
    }
    pub fn relay_ip(&self) -> Ipv4Addr {
        self.addr_at(24)
    }

    pub fn client_mac(&self) -> MacAddress {
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&self.data[28..34]);
        MacAddress(addr)
    }

    pub fn magic_cookie(&self) -> u32 {
        NetworkEndian::read_u32(&self.data[DHCP_HDR_LEN..DHCP_OPTIONS_OFFSET])
    }

    pub fn is_boot_reply(&self) -> bool {
        self.op() == BOOTREPLY && self.magic_cookie() == MAGIC_COOKIE
    }

    pub fn options(&self) -> OptionIter<'a> {
        OptionIter::new(&self.data[DHCP_OPTIONS_OFFSET..])
    }

    /// Extracts address, netmask, gateway, broadcast and DNS.
    ///
    /// Options with the wrong length for their tag are ignored; a broken
    /// option area fails the whole message.
    pub fn offered_config(&self) -> Result<OfferedConfig> {
        let mut config = OfferedConfig {
            address: self.your_ip(),
            server: self.server_ip(),
            netmask: Ipv4Addr::UNSPECIFIED,
            gateway: Ipv4Addr::UNSPECIFIED,
            broadcast: Ipv4Addr::UNSPECIFIED,
            dns: Ipv4Addr::UNSPECIFIED,
            message_type: None,
        };
        for opt in self.options() {
            let opt = opt?;
            match opt.tag {
                options::SUBNET_MASK => {
                    if let Some(mask) = opt.exact_addr() {
                        config.netmask = mask;
                    }
                }
                options::ROUTER => {
                    if let Some(router) = opt.first_addr() {
                        config.gateway = router;
                    }
                }
                options::BROADCAST => {
                    if let Some(bcast) = opt.exact_addr() {
                        config.broadcast = bcast;
                    }
                }
                options::DNS_SERVER => {
                    if let Some(dns) = opt.first_addr() {
                        config.dns = dns;
                    }
                }
                options::MESSAGE_TYPE if opt.value.len() == 1 => {
                    config.message_type = Some(DhcpMessageType::from(opt.value[0]));
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Writes the fixed BOOTREQUEST header and magic cookie.
    pub fn write_request_header(cur: &mut CursorMut<'_>, xid: u32, mac: MacAddress) -> Result<()> {
        cur.write_u8(BOOTREQUEST)?;
        cur.write_u8(HTYPE_ETHERNET)?;
        cur.write_u8(6)?; // Hardware Addr Len
        cur.write_u8(0)?; // Hops
        cur.write_u32(xid)?;
        cur.write_u16(1)?; // Secs
        cur.write_u16(0x8000)?; // Flags: Broadcast (so relay agents can return replies)
        cur.write_zeros(16)?; // ciaddr, yiaddr, siaddr, giaddr
        cur.write_bytes(&mac.0)?;
        cur.write_zeros(10)?; // chaddr padding
        cur.write_zeros(64 + 128)?; // sname, file
        cur.write_u32(MAGIC_COOKIE)
    }

    pub fn write_option(cur: &mut CursorMut<'_>, tag: u8, value: &[u8]) -> Result<()> {
        if value.len() > u8::MAX as usize {
            return Err(NetError::Config(format!("DHCP option {} too long: {} bytes", tag, value.len())));
        }
        cur.write_u8(tag)?;
        cur.write_u8(value.len() as u8)?;
        cur.write_bytes(value)
    }

    /// Writes a complete DHCPDISCOVER: message type, client identifier,
    /// hostname, END.
    pub fn write_discover(
        cur: &mut CursorMut<'_>,
        xid: u32,
        mac: MacAddress,
        hostname: &str,
    ) -> Result<()> {
        Self::write_request_header(cur, xid, mac)?;
        Self::write_option(cur, options::MESSAGE_TYPE, &[DhcpMessageType::Discover.into()])?;

        let mut client_id = [0u8; 7];
        client_id[0] = HTYPE_ETHERNET;
        client_id[1..].copy_from_slice(&mac.0);
        Self::write_option(cur, options::CLIENT_ID, &client_id)?;

        Self::write_option(cur, options::HOSTNAME, hostname.as_bytes())?;
        cur.write_u8(options::END)
    }

    /// Length of a DISCOVER built by `write_discover`.
    pub fn discover_len(hostname: &str) -> usize {
        DHCP_OPTIONS_OFFSET + 3 + 9 + 2 + hostname.len() + 1
    }
}
