// src/tap.rs
use log::debug;
use nix::libc;
use pollnet::ethernet::MacAddress;
use pollnet::{Frame, FrameSink, NetError, NetworkInterface, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd};

/// A Linux TAP device driven as a poll-mode interface.
pub struct TapDevice {
    file: File,
    name: String,
    mac: MacAddress,
    offload: bool,
}

impl TapDevice {
    /// Creates (or attaches to) the TAP device `name` in non-blocking mode.
    /// This requires the binary to have CAP_NET_ADMIN privileges.
    pub fn open(name: &str, mac: MacAddress, offload: bool) -> Result<Self> {
        let file = File::options().read(true).write(true).open("/dev/net/tun")?;
        let fd = file.as_raw_fd();

        // IFF_TAP (Layer 2) and IFF_NO_PI (No extra packet information)
        let mut ifr = ifreq_for(name);
        unsafe {
            ifr.ifr_ifru.ifru_flags = (libc::IFF_TAP | libc::IFF_NO_PI) as i16;
            if libc::ioctl(fd, libc::TUNSETIFF as _, &ifr) < 0 {
                return Err(std::io::Error::last_os_error().into());
            }
        }

        let actual_name = unsafe {
            std::ffi::CStr::from_ptr(ifr.ifr_name.as_ptr())
                .to_string_lossy()
                .into_owned()
        };

        let device = TapDevice { file, name: actual_name, mac, offload };
        device.set_non_blocking()?;
        Ok(device)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn set_non_blocking(&self) -> std::io::Result<()> {
        let fd = self.file.as_raw_fd();
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFL);
            if flags < 0 {
                return Err(std::io::Error::last_os_error());
            }
            if libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
                return Err(std::io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// Interface flags via SIOCGIFFLAGS on a throwaway datagram socket.
    fn interface_flags(&self) -> std::io::Result<i32> {
        let raw = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
        if raw < 0 {
            return Err(std::io::Error::last_os_error());
        }
        let sock = unsafe { OwnedFd::from_raw_fd(raw) };
        let mut ifr = ifreq_for(&self.name);
        unsafe {
            if libc::ioctl(sock.as_raw_fd(), libc::SIOCGIFFLAGS as _, &mut ifr) < 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(ifr.ifr_ifru.ifru_flags as i32)
        }
    }
}

fn ifreq_for(name: &str) -> libc::ifreq {
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    let bytes = name.as_bytes();
    let len = std::cmp::min(bytes.len(), libc::IFNAMSIZ - 1);
    for (dst, src) in ifr.ifr_name.iter_mut().zip(&bytes[..len]) {
        *dst = *src as libc::c_char;
    }
    ifr
}

impl FrameSink for TapDevice {
    fn send(&mut self, frame: Frame) -> Result<()> {
        let written = self
            .file
            .write(frame.as_bytes())
            .map_err(|e| NetError::TransmitFailed(e.to_string()))?;
        if written != frame.len() {
            return Err(NetError::TransmitFailed(format!(
                "short write: {} of {} bytes",
                written,
                frame.len()
            )));
        }
        Ok(())
    }

    fn offloads_checksums(&self) -> bool {
        self.offload
    }
}

impl NetworkInterface for TapDevice {
    fn receive_batch(&mut self, max: usize) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        while frames.len() < max {
            let mut frame = Frame::new();
            match self.file.read(frame.buffer_mut()) {
                Ok(0) => break,
                Ok(n) => {
                    frame.set_len(n)?;
                    frames.push(frame);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(frames)
    }

    fn mac_address(&self) -> MacAddress {
        self.mac
    }

    fn link_is_up(&self) -> bool {
        match self.interface_flags() {
            Ok(flags) => {
                let wanted = libc::IFF_UP | libc::IFF_RUNNING;
                flags & wanted == wanted
            }
            Err(e) => {
                debug!("[LINK] SIOCGIFFLAGS on {} failed: {}", self.name, e);
                false
            }
        }
    }
}
