// src/signal.rs
use log::{error, info};
use nix::errno::Errno;
use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};
use pollnet::{CancelToken, Result};
use std::thread::{self, JoinHandle};

/// Blocks SIGINT and SIGTERM for the calling thread and spawns a watcher
/// that cancels `token` when either arrives.
///
/// Must run on the main thread before any other thread is started so the
/// mask is inherited everywhere.
pub fn spawn_watcher(token: CancelToken) -> Result<JoinHandle<()>> {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask.thread_block().map_err(std::io::Error::from)?;
    let mut sfd = SignalFd::with_flags(&mask, SfdFlags::SFD_CLOEXEC).map_err(std::io::Error::from)?;

    let handle = thread::Builder::new().name("signals".to_string()).spawn(move || loop {
        match sfd.read_signal() {
            Ok(Some(info)) => {
                let name = Signal::try_from(info.ssi_signo as i32)
                    .map(|s| s.as_str())
                    .unwrap_or("unknown");
                info!("[SYSTEM] Signal {} received, preparing to exit...", name);
                token.cancel();
                break;
            }
            Ok(None) | Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("[SYSTEM] signalfd read failed: {}", e);
                token.cancel();
                break;
            }
        }
    })?;
    Ok(handle)
}
