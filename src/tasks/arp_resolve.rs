// src/tasks/arp_resolve.rs
use crate::arp::{ArpOp, ArpPacket};
use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::{EtherType, EthernetFrame};
use crate::frame::Frame;
use crate::interface::FrameSink;
use crate::packets::build_arp_request;
use crate::resolve::MacSender;
use crate::task::{ProcessResult, Task};
use log::info;
use std::net::Ipv4Addr;

/// Sends one ARP request on setup and waits for the matching reply.
///
/// Alive exactly while its result cell is empty.
pub struct ArpResolver {
    name: String,
    query_ip: Ipv4Addr,
    result: MacSender,
}

impl ArpResolver {
    pub fn new(name: impl Into<String>, query_ip: Ipv4Addr, result: MacSender) -> Self {
        Self { name: name.into(), query_ip, result }
    }

    pub fn query_ip(&self) -> Ipv4Addr {
        self.query_ip
    }
}

impl Task for ArpResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, ctx: &NetworkContext, tx: &mut dyn FrameSink) -> Result<()> {
        tx.send(build_arp_request(ctx.mac, ctx.ip, self.query_ip)?)?;
        info!("[ARP] Sent ARP request for {}", self.query_ip);
        Ok(())
    }

    fn try_process(
        &mut self,
        frame: &Frame,
        _ctx: &NetworkContext,
        _tx: &mut dyn FrameSink,
    ) -> Result<ProcessResult> {
        if !self.is_alive() {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(eth) = EthernetFrame::new(frame.as_bytes()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if eth.ether_type() != EtherType::ARP {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(arp) = ArpPacket::new(eth.payload()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if !arp.is_ethernet_ipv4() || arp.operation() != ArpOp::Reply || arp.sender_ip() != self.query_ip {
            return Ok(ProcessResult::NotProcessed);
        }
        // An all-zero MAC would leave the cell looking unresolved downstream.
        if arp.sender_mac().is_zero() {
            return Ok(ProcessResult::NotProcessed);
        }

        self.result.resolve(arp.sender_mac());
        info!("[ARP] MAC address for {} is {}", self.query_ip, arp.sender_mac());
        Ok(ProcessResult::Processed)
    }

    fn is_alive(&self) -> bool {
        !self.result.is_resolved()
    }
}
