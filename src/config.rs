// src/config.rs
//! Endpoint configuration.
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object (or no file at all) yields a working endpoint.

use crate::error::{NetError, Result};
use crate::ethernet::MacAddress;
use crate::frame::MTU;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

/// Largest UDP payload that fits in one frame (Ethernet + IPv4 + UDP = 42).
pub const MAX_MESSAGE_LEN: usize = MTU - 42;

/// How the destination MAC of a send target is found.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// ARP-resolve the DHCP gateway and send through it.
    Gateway,
    /// ARP-resolve the target itself on the local segment.
    Direct,
}

/// Destination of the periodic UDP sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendTarget {
    pub ip: Ipv4Addr,
    pub port: u16,
    #[serde(default = "default_src_port")]
    pub src_port: u16,
    #[serde(default = "default_route")]
    pub route: Route,
}

fn default_src_port() -> u16 {
    8080
}

fn default_route() -> Route {
    Route::Gateway
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// TAP device name
    pub interface: String,
    /// Endpoint MAC, `aa:bb:cc:dd:ee:ff`
    pub mac: String,
    /// Sent as DHCP option 12
    pub hostname: String,
    /// Max frames taken per receive batch
    pub burst: usize,
    pub udp_listen_port: u16,
    pub send_interval_ms: u64,
    pub message: String,
    pub send_targets: Vec<SendTarget>,
    /// None waits for a DHCP reply forever
    pub dhcp_timeout_secs: Option<u64>,
    pub link_timeout_ms: u64,
    pub link_check_interval_ms: u64,
    /// Leave IPv4 header and UDP checksums to the interface
    pub checksum_offload: bool,
    pub log_level: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            interface: "pollnet0".to_string(),
            mac: "de:ad:be:ef:00:01".to_string(),
            hostname: "pollnet-dev".to_string(),
            burst: 32,
            udp_listen_port: 8080,
            send_interval_ms: 1000,
            message: "Hello pollnet\n".to_string(),
            send_targets: vec![SendTarget {
                ip: Ipv4Addr::new(39, 107, 102, 23),
                port: 8080,
                src_port: 8080,
                route: Route::Gateway,
            }],
            dhcp_timeout_secs: None,
            link_timeout_ms: 9000,
            link_check_interval_ms: 100,
            checksum_offload: false,
            log_level: "info".to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| NetError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&data)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: EndpointConfig = serde_json::from_str(json)
            .map_err(|e| NetError::Config(format!("JSON parse error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NetError::Config(format!("JSON serialization error: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        // IFNAMSIZ includes the trailing NUL.
        if self.interface.is_empty() || self.interface.len() > 15 {
            return Err(NetError::Config("interface must be 1 to 15 bytes".to_string()));
        }
        self.mac_address()?;
        if self.hostname.is_empty() || self.hostname.len() > 255 {
            return Err(NetError::Config("hostname must be 1 to 255 bytes".to_string()));
        }
        if self.burst == 0 || self.burst > 1024 {
            return Err(NetError::Config("burst must be between 1 and 1024".to_string()));
        }
        if self.send_interval_ms == 0 {
            return Err(NetError::Config("send_interval_ms must be at least 1".to_string()));
        }
        if self.message.len() > MAX_MESSAGE_LEN {
            return Err(NetError::Config(format!(
                "message must be at most {} bytes",
                MAX_MESSAGE_LEN
            )));
        }
        for target in &self.send_targets {
            if target.port == 0 || target.src_port == 0 {
                return Err(NetError::Config(format!("send target {} has a zero port", target.ip)));
            }
            if target.ip.is_unspecified() || target.ip.is_broadcast() {
                return Err(NetError::Config(format!("send target {} is not a unicast address", target.ip)));
            }
        }
        if self.dhcp_timeout_secs == Some(0) {
            return Err(NetError::Config("dhcp_timeout_secs must be at least 1".to_string()));
        }
        if self.link_check_interval_ms == 0 {
            return Err(NetError::Config("link_check_interval_ms must be at least 1".to_string()));
        }
        self.log_level_filter()?;
        Ok(())
    }

    pub fn mac_address(&self) -> Result<MacAddress> {
        self.mac.parse()
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| NetError::Config(format!("unknown log_level '{}'", self.log_level)))
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    pub fn dhcp_timeout(&self) -> Option<Duration> {
        self.dhcp_timeout_secs.map(Duration::from_secs)
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_millis(self.link_timeout_ms)
    }

    pub fn link_check_interval(&self) -> Duration {
        Duration::from_millis(self.link_check_interval_ms)
    }
}
