//! Command admission, ordering, and cycle synchronization (spec.md §4.6)

use mediacore_types::{CommandOutcome, Ticks};
use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;

/// Begin/complete gate for one worker's cycle (spec.md §9: "timed
/// wait-events are reader-writer gates with begin/complete semantics").
#[derive(Debug, Default)]
pub struct CycleGate {
    in_progress: Mutex<bool>,
    condvar: Condvar,
}

impl CycleGate {
    /// Builds a gate that starts idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the cycle as started.
    pub fn begin(&self) {
        *self.in_progress.lock() = true;
    }

    /// Marks the cycle as finished and wakes any waiter.
    pub fn end(&self) {
        let mut guard = self.in_progress.lock();
        *guard = false;
        self.condvar.notify_all();
    }

    /// True while a cycle is in progress.
    pub fn is_in_progress(&self) -> bool {
        *self.in_progress.lock()
    }

    /// Blocks the caller until the cycle is idle.
    pub fn wait_idle(&self) {
        let mut guard = self.in_progress.lock();
        while *guard {
            self.condvar.wait(&mut guard);
        }
    }
}

/// Direct commands: mutually exclusive, pause every worker while in flight
/// (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectCommandKind {
    /// Open a new source.
    Open,
    /// Close the current source.
    Close,
    /// Change to a different source.
    Change,
}

/// Priority commands: queued depth 1, newest wins, consumed at decode-cycle
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityCommand {
    /// Resume/start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Stop playback, rewinding state to the start.
    Stop,
}

/// Seek target specification (spec.md §4.7 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Seek to an absolute position.
    Absolute(Ticks),
    /// Step to the next block of the main stream.
    StepForward,
    /// Step to the previous block of the main stream.
    StepBackward,
}

/// A coalesced, pending seek request.
#[derive(Debug, Clone, Copy)]
pub struct SeekRequest {
    /// The requested target mode.
    pub mode: SeekMode,
}

struct PendingPriority {
    command: PriorityCommand,
    completion: Option<oneshot::Sender<CommandOutcome>>,
}

struct PendingSeek {
    request: SeekRequest,
    completion: Option<oneshot::Sender<CommandOutcome>>,
}

/// Admits, orders, and cancels commands across the three priority classes,
/// and gates direct commands against the three worker cycles via
/// [`CycleGate`] (spec.md §4.6).
///
/// Ordering rules: (1) a direct command cancels any pending priority or
/// seek command; (2) a priority command cancels any pending seek; (3) a
/// seek is rejected (resolved `Cancelled`) while a direct or priority
/// command is pending.
#[derive(Debug, Default)]
pub struct CommandCoordinator {
    is_executing_direct: Mutex<bool>,
    has_pending_direct: Mutex<bool>,
    is_closing: Mutex<bool>,
    is_changing: Mutex<bool>,
    pending_priority: Mutex<Option<PendingPriority>>,
    pending_seek: Mutex<Option<PendingSeek>>,
    read_gate: CycleGate,
    decode_gate: CycleGate,
    render_gate: CycleGate,
}

impl CommandCoordinator {
    /// Builds an idle coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate bracketing the reader worker's cycle.
    pub fn read_gate(&self) -> &CycleGate {
        &self.read_gate
    }

    /// Gate bracketing the decode worker's cycle.
    pub fn decode_gate(&self) -> &CycleGate {
        &self.decode_gate
    }

    /// Gate bracketing the render worker's cycle.
    pub fn render_gate(&self) -> &CycleGate {
        &self.render_gate
    }

    /// True while a direct command is queued or executing.
    pub fn has_pending_direct_commands(&self) -> bool {
        *self.has_pending_direct.lock() || *self.is_executing_direct.lock()
    }

    /// True while a direct command is actively executing.
    pub fn is_executing_direct(&self) -> bool {
        *self.is_executing_direct.lock()
    }

    /// True while a `Close` direct command is in flight.
    pub fn is_closing(&self) -> bool {
        *self.is_closing.lock()
    }

    /// True while a `Change` direct command is in flight.
    pub fn is_changing(&self) -> bool {
        *self.is_changing.lock()
    }

    /// Begins a direct command: cancels any pending priority/seek command
    /// (rule 1), waits for all three worker cycles to go idle, and returns
    /// a guard that clears the in-flight flags on drop.
    pub fn begin_direct(&self, kind: DirectCommandKind) -> DirectCommandGuard<'_> {
        *self.has_pending_direct.lock() = true;
        self.cancel_priority();
        self.cancel_seek();

        self.read_gate.wait_idle();
        self.decode_gate.wait_idle();
        self.render_gate.wait_idle();

        *self.is_executing_direct.lock() = true;
        *self.has_pending_direct.lock() = false;
        match kind {
            DirectCommandKind::Close => *self.is_closing.lock() = true,
            DirectCommandKind::Change => *self.is_changing.lock() = true,
            DirectCommandKind::Open => {}
        }

        DirectCommandGuard { coordinator: self }
    }

    /// Submits a priority command, cancelling and replacing any previously
    /// pending one and cancelling any pending seek (rule 2). Rejected
    /// outright (resolved `Cancelled`) while a direct command is pending.
    pub fn submit_priority(&self, command: PriorityCommand, completion: Option<oneshot::Sender<CommandOutcome>>) {
        if self.has_pending_direct_commands() {
            Self::complete(completion, CommandOutcome::Cancelled);
            return;
        }
        self.cancel_priority();
        self.cancel_seek();
        *self.pending_priority.lock() = Some(PendingPriority { command, completion });
    }

    /// Takes the pending priority command, if any, clearing it (consumed at
    /// most once per decode cycle).
    pub fn take_priority_command(&self) -> Option<(PriorityCommand, Option<oneshot::Sender<CommandOutcome>>)> {
        self.pending_priority
            .lock()
            .take()
            .map(|pending| (pending.command, pending.completion))
    }

    fn cancel_priority(&self) {
        if let Some(pending) = self.pending_priority.lock().take() {
            Self::complete(pending.completion, CommandOutcome::Cancelled);
        }
    }

    /// Submits (coalesces) a seek request. Rejected as `Cancelled` while a
    /// direct or priority command is pending (rule 3).
    pub fn submit_seek(&self, request: SeekRequest, completion: Option<oneshot::Sender<CommandOutcome>>) {
        if self.has_pending_direct_commands() || self.pending_priority.lock().is_some() {
            Self::complete(completion, CommandOutcome::Cancelled);
            return;
        }
        self.cancel_seek();
        *self.pending_seek.lock() = Some(PendingSeek { request, completion });
    }

    /// Takes the pending seek request, if any, clearing it.
    pub fn take_seek_command(&self) -> Option<(SeekRequest, Option<oneshot::Sender<CommandOutcome>>)> {
        self.pending_seek
            .lock()
            .take()
            .map(|pending| (pending.request, pending.completion))
    }

    /// True while a seek request is queued.
    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.lock().is_some()
    }

    fn cancel_seek(&self) {
        if let Some(pending) = self.pending_seek.lock().take() {
            Self::complete(pending.completion, CommandOutcome::Cancelled);
        }
    }

    fn complete(completion: Option<oneshot::Sender<CommandOutcome>>, outcome: CommandOutcome) {
        if let Some(sender) = completion {
            let _ = sender.send(outcome);
        }
    }
}

/// RAII guard returned by [`CommandCoordinator::begin_direct`]; clears the
/// direct-command in-flight flags when dropped, including on early return
/// or panic, so a failed direct command never wedges the coordinator.
pub struct DirectCommandGuard<'a> {
    coordinator: &'a CommandCoordinator,
}

impl Drop for DirectCommandGuard<'_> {
    fn drop(&mut self) {
        *self.coordinator.is_executing_direct.lock() = false;
        *self.coordinator.has_pending_direct.lock() = false;
        *self.coordinator.is_closing.lock() = false;
        *self.coordinator.is_changing.lock() = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_command_cancels_pending_seek() {
        let coordinator = CommandCoordinator::new();
        let (tx, rx) = oneshot::channel();
        coordinator.submit_seek(
            SeekRequest {
                mode: SeekMode::Absolute(Ticks::ZERO),
            },
            Some(tx),
        );
        coordinator.submit_priority(PriorityCommand::Play, None);

        assert!(!coordinator.has_pending_seek());
        assert_eq!(rx.try_recv().unwrap(), CommandOutcome::Cancelled);
    }

    #[test]
    fn seek_rejected_while_priority_command_pending() {
        let coordinator = CommandCoordinator::new();
        coordinator.submit_priority(PriorityCommand::Play, None);

        let (tx, rx) = oneshot::channel();
        coordinator.submit_seek(
            SeekRequest {
                mode: SeekMode::Absolute(Ticks::ZERO),
            },
            Some(tx),
        );

        assert!(!coordinator.has_pending_seek());
        assert_eq!(rx.try_recv().unwrap(), CommandOutcome::Cancelled);
    }

    #[test]
    fn begin_direct_clears_flags_on_drop() {
        let coordinator = CommandCoordinator::new();
        {
            let _guard = coordinator.begin_direct(DirectCommandKind::Close);
            assert!(coordinator.is_executing_direct());
            assert!(coordinator.is_closing());
        }
        assert!(!coordinator.is_executing_direct());
        assert!(!coordinator.is_closing());
    }

    #[test]
    fn cycle_gate_wait_idle_returns_immediately_when_idle() {
        let gate = CycleGate::new();
        gate.wait_idle();
        assert!(!gate.is_in_progress());
    }
}
