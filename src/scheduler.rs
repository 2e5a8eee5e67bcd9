// src/scheduler.rs
// Frame-driven cooperative scheduler

use crate::context::NetworkContext;
use crate::error::Result;
use crate::ethernet::MacAddress;
use crate::frame::Frame;
use crate::interface::{FrameSink, NetworkInterface};
use crate::resolve::MacReceiver;
use crate::task::{ProcessResult, Task};
use log::{debug, info};
use std::time::Instant;

type Activation = Box<dyn FnMut(Instant) -> Option<Box<dyn Task>>>;

/// A task constructor waiting for a condition.
///
/// Polled once per iteration after ticking; the first `Some` registers the
/// task and drops the slot for good.
pub struct PendingActivation {
    name: String,
    poll: Activation,
}

impl PendingActivation {
    pub fn new<F>(name: impl Into<String>, poll: F) -> Self
    where
        F: FnMut(Instant) -> Option<Box<dyn Task>> + 'static,
    {
        Self { name: name.into(), poll: Box::new(poll) }
    }

    /// Builds the task once `mac` has been resolved.
    pub fn when_resolved<F>(name: impl Into<String>, mac: MacReceiver, build: F) -> Self
    where
        F: FnOnce(MacAddress, Instant) -> Box<dyn Task> + 'static,
    {
        let mut build = Some(build);
        Self::new(name, move |now| {
            let resolved = mac.get()?;
            let build = build.take()?;
            Some(build(resolved, now))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct Scheduler {
    tasks: Vec<Box<dyn Task>>,
    pending: Vec<PendingActivation>,
    burst: usize,
}

impl Scheduler {
    /// `burst` caps the frames taken from the interface per iteration.
    pub fn new(burst: usize) -> Self {
        Self { tasks: Vec::new(), pending: Vec::new(), burst: burst.max(1) }
    }

    /// Appends `task` and runs its setup immediately.
    pub fn register(
        &mut self,
        mut task: Box<dyn Task>,
        ctx: &NetworkContext,
        tx: &mut dyn FrameSink,
    ) -> Result<()> {
        task.setup(ctx, tx)?;
        info!("[TASK] Created {}", task.name());
        self.tasks.push(task);
        Ok(())
    }

    pub fn defer(&mut self, activation: PendingActivation) {
        debug!("[TASK] Waiting to activate {}", activation.name());
        self.pending.push(activation);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Drops every task that reports itself dead.
    pub fn retire_dead(&mut self) {
        self.tasks.retain(|task| {
            let alive = task.is_alive();
            if !alive {
                info!("[TASK] task {} ended", task.name());
            }
            alive
        });
    }

    /// Offers `frame` to each task in registration order; the first to
    /// claim it ends the scan. Unclaimed frames are dropped.
    pub fn dispatch(
        &mut self,
        frame: &Frame,
        ctx: &NetworkContext,
        tx: &mut dyn FrameSink,
    ) -> Result<ProcessResult> {
        for task in self.tasks.iter_mut() {
            match task.try_process(frame, ctx, tx) {
                Ok(ProcessResult::Processed) => return Ok(ProcessResult::Processed),
                Ok(ProcessResult::NotProcessed) => {}
                Err(e) if e.is_frame_level() => {
                    debug!("[TASK] {} skipped frame: {}", task.name(), e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ProcessResult::NotProcessed)
    }

    pub fn tick(&mut self, now: Instant, ctx: &NetworkContext, tx: &mut dyn FrameSink) -> Result<()> {
        for task in self.tasks.iter_mut() {
            task.tick(now, ctx, tx)?;
        }
        Ok(())
    }

    /// Registers every pending task whose condition now holds. Returns how
    /// many were activated.
    pub fn activate_pending(
        &mut self,
        now: Instant,
        ctx: &NetworkContext,
        tx: &mut dyn FrameSink,
    ) -> Result<usize> {
        let mut activated = 0;
        let mut i = 0;
        while i < self.pending.len() {
            match (self.pending[i].poll)(now) {
                Some(task) => {
                    let slot = self.pending.remove(i);
                    debug!("[TASK] Activating {}", slot.name);
                    self.register(task, ctx, tx)?;
                    activated += 1;
                }
                None => i += 1,
            }
        }
        Ok(activated)
    }

    /// One scheduling iteration: poll, retire, dispatch, tick, activate.
    /// Returns the number of frames received.
    pub fn run_once<I: NetworkInterface>(
        &mut self,
        iface: &mut I,
        ctx: &NetworkContext,
        now: Instant,
    ) -> Result<usize> {
        let frames = iface.receive_batch(self.burst)?;
        self.retire_dead();
        for frame in &frames {
            if self.dispatch(frame, ctx, iface)? == ProcessResult::NotProcessed {
                debug!("[TASK] Discarded unclaimed frame ({} bytes)", frame.len());
            }
        }
        self.tick(now, ctx, iface)?;
        self.activate_pending(now, ctx, iface)?;
        Ok(frames.len())
    }
}
