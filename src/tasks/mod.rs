// src/tasks/mod.rs
// Concrete tasks hosted by the scheduler

mod arp_reply;
mod arp_resolve;
mod ping_reply;
mod udp_listen;
mod udp_send;

pub use arp_reply::ArpReplier;
pub use arp_resolve::ArpResolver;
pub use ping_reply::PingReplier;
pub use udp_listen::{Datagram, UdpListener};
pub use udp_send::UdpSender;
