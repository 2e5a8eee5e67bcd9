// src/engine.rs
use log::info;
use pollnet::{CancelToken, NetError, NetworkContext, NetworkInterface, Result, Scheduler};
use std::hint;
use std::thread;
use std::time::{Duration, Instant};

/// Idle strategy between empty polls: spin, then yield, then sleep with
/// doubling intervals. Any activity resets it.
pub struct AdaptiveBackoff {
    idle_cycles: u32,
    current_sleep: Duration,
    min_sleep: Duration,
    max_sleep: Duration,
}

impl AdaptiveBackoff {
    pub fn new() -> Self {
        Self {
            idle_cycles: 0,
            current_sleep: Duration::from_micros(100),
            min_sleep: Duration::from_micros(100),
            max_sleep: Duration::from_millis(50),
        }
    }

    pub fn step(&mut self, activity: bool) {
        if activity {
            self.idle_cycles = 0;
            self.current_sleep = self.min_sleep;
        } else {
            self.idle_cycles = self.idle_cycles.saturating_add(1);
            if self.idle_cycles < 100 {
                hint::spin_loop();
            } else if self.idle_cycles < 500 {
                thread::yield_now();
            } else {
                thread::sleep(self.current_sleep);
                self.current_sleep = (self.current_sleep * 2).min(self.max_sleep);
            }
        }
    }
}

/// Polls the link every `interval` until it is up. Returns false when
/// cancelled first.
pub fn wait_for_link<I: NetworkInterface>(
    iface: &I,
    timeout: Duration,
    interval: Duration,
    token: &CancelToken,
) -> Result<bool> {
    info!("[LINK] Checking link status");
    let start = Instant::now();
    loop {
        if token.is_cancelled() {
            return Ok(false);
        }
        if iface.link_is_up() {
            info!("[LINK] Link up after {:?}", start.elapsed());
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Err(NetError::LinkDown(timeout));
        }
        thread::sleep(interval);
    }
}

/// Runs scheduler iterations until `token` is cancelled.
pub fn run<I: NetworkInterface>(
    iface: &mut I,
    sched: &mut Scheduler,
    ctx: &NetworkContext,
    token: &CancelToken,
) -> Result<()> {
    info!("[ENGINE] Running {} tasks on {}", sched.len(), ctx.ip);
    let mut backoff = AdaptiveBackoff::new();
    while !token.is_cancelled() {
        let received = sched.run_once(iface, ctx, Instant::now())?;
        backoff.step(received > 0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollnet::ethernet::MacAddress;
    use pollnet::MemoryInterface;

    #[test]
    fn test_backoff_resets_on_activity() {
        let mut backoff = AdaptiveBackoff::new();
        for _ in 0..505 {
            backoff.step(false);
        }
        assert!(backoff.current_sleep > backoff.min_sleep);
        backoff.step(true);
        assert_eq!(backoff.idle_cycles, 0);
        assert_eq!(backoff.current_sleep, backoff.min_sleep);
    }

    #[test]
    fn test_wait_for_link() {
        let token = CancelToken::new();
        let mut iface = MemoryInterface::new(MacAddress::ZERO);
        assert!(wait_for_link(&iface, Duration::from_millis(50), Duration::from_millis(5), &token).unwrap());

        iface.link_up = false;
        assert!(matches!(
            wait_for_link(&iface, Duration::from_millis(20), Duration::from_millis(5), &token),
            Err(NetError::LinkDown(_))
        ));

        token.cancel();
        assert!(!wait_for_link(&iface, Duration::from_millis(20), Duration::from_millis(5), &token).unwrap());
    }

    #[test]
    fn test_run_returns_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let mut iface = MemoryInterface::new(MacAddress::ZERO);
        let mut sched = Scheduler::new(32);
        let ctx = NetworkContext::new(MacAddress::ZERO);
        assert!(run(&mut iface, &mut sched, &ctx, &token).is_ok());
    }
}
