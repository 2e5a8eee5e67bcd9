// src/tasks/udp_listen.rs
use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::{EtherType, EthernetFrame, MacAddress};
use crate::frame::Frame;
use crate::interface::FrameSink;
use crate::ipv4::{IpProtocol, Ipv4Packet};
use crate::task::{ProcessResult, Task};
use crate::udp::UdpHeader;
use log::info;
use std::net::Ipv4Addr;

/// A datagram consumed by a `UdpListener`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub src_mac: MacAddress,
    pub src_ip: Ipv4Addr,
    pub src_port: u16,
    pub dst_ip: Ipv4Addr,
    pub dst_port: u16,
    pub payload: Vec<u8>,
}

type DatagramHandler = Box<dyn FnMut(&Datagram)>;

/// Consumes UDP datagrams sent to our address on one port and logs them.
pub struct UdpListener {
    name: String,
    port: u16,
    handler: Option<DatagramHandler>,
}

impl UdpListener {
    pub fn new(port: u16) -> Self {
        Self { name: format!("UDP:{}", port), port, handler: None }
    }

    /// Also hands every consumed datagram to `handler`.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&Datagram) + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Task for UdpListener {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_process(
        &mut self,
        frame: &Frame,
        ctx: &NetworkContext,
        _tx: &mut dyn FrameSink,
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
        if ip.dest_ip() != ctx.ip || ip.protocol() != IpProtocol::UDP {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(udp) = UdpHeader::new(ip.payload()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if udp.dest_port() != self.port {
            return Ok(ProcessResult::NotProcessed);
        }

        info!(
            "[UDP] Received from {}:{} to {}:{} with message = `{}`",
            ip.source_ip(),
            udp.src_port(),
            ip.dest_ip(),
            udp.dest_port(),
            String::from_utf8_lossy(udp.payload())
        );
        if let Some(handler) = self.handler.as_mut() {
            handler(&Datagram {
                src_mac: eth.source(),
                src_ip: ip.source_ip(),
                src_port: udp.src_port(),
                dst_ip: ip.dest_ip(),
                dst_port: udp.dest_port(),
                payload: udp.payload().to_vec(),
            });
        }
        Ok(ProcessResult::Processed)
    }
}
