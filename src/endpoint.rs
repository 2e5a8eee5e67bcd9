// src/endpoint.rs
// Task set registered once the bootstrap has configured the context

use crate::config::{EndpointConfig, Route, SendTarget};
use crate::context::NetworkContext;
use crate::error::Result;
use crate::interface::NetworkInterface;
use crate::resolve::{mac_slot, MacReceiver};
use crate::scheduler::{PendingActivation, Scheduler};
use crate::task::Task;
use crate::tasks::{ArpReplier, ArpResolver, PingReplier, UdpListener, UdpSender};
use log::warn;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Address whose MAC must be known before sending to `target`.
pub fn next_hop(target: &SendTarget, ctx: &NetworkContext) -> Option<Ipv4Addr> {
    match target.route {
        Route::Gateway if ctx.has_gateway() => Some(ctx.gateway),
        Route::Gateway => None,
        Route::Direct => Some(target.ip),
    }
}

/// Registers the responders, one resolver per distinct next hop, and a
/// pending sender per target.
pub fn install_tasks<I: NetworkInterface>(
    sched: &mut Scheduler,
    ctx: &NetworkContext,
    iface: &mut I,
    config: &EndpointConfig,
) -> Result<()> {
    sched.register(Box::new(ArpReplier::new()), ctx, iface)?;
    sched.register(Box::new(PingReplier::new()), ctx, iface)?;
    sched.register(Box::new(UdpListener::new(config.udp_listen_port)), ctx, iface)?;

    let mut resolutions: HashMap<Ipv4Addr, MacReceiver> = HashMap::new();
    for target in &config.send_targets {
        let Some(hop) = next_hop(target, ctx) else {
            warn!("[TASK] No gateway learned, not sending to {}:{}", target.ip, target.port);
            continue;
        };
        let mac = match resolutions.get(&hop) {
            Some(rx) => rx.clone(),
            None => {
                let (tx, rx) = mac_slot();
                let label = if hop == ctx.gateway { "gateway".to_string() } else { hop.to_string() };
                sched.register(Box::new(ArpResolver::new(format!("ARPRequest:{}", label), hop, tx)), ctx, iface)?;
                resolutions.insert(hop, rx.clone());
                rx
            }
        };

        let target = target.clone();
        let interval = config.send_interval();
        let message = config.message.clone().into_bytes();
        sched.defer(PendingActivation::when_resolved(
            format!("UDPSend:{}:{}", target.ip, target.port),
            mac,
            move |dst_mac, now| {
                Box::new(UdpSender::new(target.src_port, target.ip, target.port, dst_mac, interval, message, now))
                    as Box<dyn Task>
            },
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::*;

    fn target(ip: Ipv4Addr, route: Route) -> SendTarget {
        SendTarget { ip, port: 8080, src_port: 8080, route }
    }

    #[test]
    fn test_next_hop() {
        let (mut ctx, _) = configured();
        let wan = Ipv4Addr::new(39, 107, 102, 23);
        assert_eq!(next_hop(&target(wan, Route::Gateway), &ctx), Some(Ipv4Addr::new(192, 0, 2, 1)));
        assert_eq!(next_hop(&target(PEER_IP, Route::Direct), &ctx), Some(PEER_IP));
        ctx.gateway = Ipv4Addr::UNSPECIFIED;
        assert_eq!(next_hop(&target(wan, Route::Gateway), &ctx), None);
    }

    #[test]
    fn test_gateway_resolved_once_for_all_targets() {
        let (ctx, mut iface) = configured();
        let config = EndpointConfig {
            send_targets: vec![
                target(Ipv4Addr::new(39, 107, 102, 23), Route::Gateway),
                target(Ipv4Addr::new(198, 51, 100, 4), Route::Gateway),
                target(PEER_IP, Route::Direct),
            ],
            ..EndpointConfig::default()
        };
        let mut sched = Scheduler::new(32);
        install_tasks(&mut sched, &ctx, &mut iface, &config).unwrap();

        assert_eq!(
            sched.task_names(),
            vec!["ARPReply", "PingReply", "UDP:8080", "ARPRequest:gateway", "ARPRequest:192.0.2.7"]
        );
        assert_eq!(sched.pending_len(), 3);
        // One ARP request per resolver.
        assert_eq!(iface.sent.len(), 2);
    }
}
