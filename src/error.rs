// src/error.rs
// Error types for the endpoint

use std::time::Duration;
use thiserror::Error;

/// Endpoint errors.
///
/// Frame-level variants (`Truncated`, `Malformed`) are expected under normal
/// operation and never leave the task or bootstrap step that observed them.
/// Everything else is fatal to the process.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("Truncated buffer: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Malformed frame: {0}")]
    Malformed(&'static str),

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Transmit failed: {0}")]
    TransmitFailed(String),

    #[error("Interface error: {0}")]
    Interface(#[from] std::io::Error),

    #[error("DHCP timeout after {0:?}")]
    DhcpTimeout(Duration),

    #[error("Link is not up after {0:?}")]
    LinkDown(Duration),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NetError {
    /// True for errors that only concern a single frame and must be
    /// converted into a silent discard.
    pub fn is_frame_level(&self) -> bool {
        matches!(self, NetError::Truncated { .. } | NetError::Malformed(_))
    }
}

pub type Result<T> = core::result::Result<T, NetError>;
