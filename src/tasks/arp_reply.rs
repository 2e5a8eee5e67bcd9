// src/tasks/arp_reply.rs
use crate::arp::{ArpOp, ArpPacket};
use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::{EtherType, EthernetFrame};
use crate::frame::Frame;
use crate::interface::FrameSink;
use crate::packets::build_arp_reply;
use crate::task::{ProcessResult, Task};
use log::info;

/// Answers ARP requests for our own address. Runs for the process lifetime.
#[derive(Debug, Default)]
pub struct ArpReplier;

impl ArpReplier {
    pub fn new() -> Self {
        Self
    }
}

impl Task for ArpReplier {
    fn name(&self) -> &str {
        "ARPReply"
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
        if eth.ether_type() != EtherType::ARP {
            return Ok(ProcessResult::NotProcessed);
        }
        let Some(arp) = ArpPacket::new(eth.payload()) else {
            return Ok(ProcessResult::NotProcessed);
        };
        if !arp.is_ethernet_ipv4() || arp.operation() != ArpOp::Request || arp.target_ip() != ctx.ip {
            return Ok(ProcessResult::NotProcessed);
        }

        tx.send(build_arp_reply(ctx.mac, ctx.ip, arp.sender_mac(), arp.sender_ip())?)?;
        info!("[ARP] Reply ARP Request from {} ({})", arp.sender_ip(), arp.sender_mac());
        Ok(ProcessResult::Processed)
    }
}
