// src/task.rs
use crate::context::NetworkContext;
use crate::error::Result;
use crate::frame::Frame;
use crate::interface::FrameSink;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    NotProcessed,
    Processed,
}

/// A unit of behaviour hosted by the scheduler.
///
/// Each inbound frame is offered to tasks in registration order until one
/// returns `Processed`. Frame-level parse failures must be reported as
/// `NotProcessed`; an `Err` is reserved for fatal conditions such as a
/// failed transmit.
pub trait Task {
    fn name(&self) -> &str;

    /// Runs once, right after registration. May transmit.
    fn setup(&mut self, _ctx: &NetworkContext, _tx: &mut dyn FrameSink) -> Result<()> {
        Ok(())
    }

    /// Runs once per scheduling iteration.
    fn tick(&mut self, _now: Instant, _ctx: &NetworkContext, _tx: &mut dyn FrameSink) -> Result<()> {
        Ok(())
    }

    fn try_process(
        &mut self,
        _frame: &Frame,
        _ctx: &NetworkContext,
        _tx: &mut dyn FrameSink,
    ) -> Result<ProcessResult> {
        Ok(ProcessResult::NotProcessed)
    }

    /// A task reporting false is removed before the next receive batch.
    fn is_alive(&self) -> bool {
        true
    }
}
