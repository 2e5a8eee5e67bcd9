// src/lib.rs
//! User-space network endpoint over a poll-mode Ethernet interface.
//!
//! A DHCP bootstrap acquires the address, then a cooperative scheduler hands
//! every received frame to a small set of protocol tasks.

pub mod cursor;
pub mod error;
pub mod frame;
pub mod utils;

pub mod ethernet;
pub mod arp;
pub mod ipv4;
pub mod icmp;
pub mod udp;
pub mod dhcp;
pub mod packets;

pub mod cancel;
pub mod config;
pub mod context;
pub mod interface;
pub mod resolve;

pub mod bootstrap;
pub mod endpoint;
pub mod scheduler;
pub mod task;
pub mod tasks;

pub use bootstrap::{DhcpBootstrap, DhcpState};
pub use cancel::CancelToken;
pub use config::EndpointConfig;
pub use context::NetworkContext;
pub use error::{NetError, Result};
pub use frame::{Frame, MTU};
pub use interface::{FrameSink, MemoryInterface, NetworkInterface};
pub use scheduler::{PendingActivation, Scheduler};
pub use task::{ProcessResult, Task};
