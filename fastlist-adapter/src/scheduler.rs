use alloc::vec::Vec;

/// Opaque handle for a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimerToken(pub u64);

/// Host-provided deferred execution.
///
/// The engine never runs timers itself. It asks the scheduler to arm one and remembers the
/// returned token; when the timer elapses the host calls `ListEngine::on_timer(token)`. Tokens
/// that are no longer current (cancelled or replaced) are ignored by the engine, so a scheduler
/// that fires late is harmless.
pub trait Scheduler {
    fn schedule(&mut self, delay_ms: u64) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// A deterministic scheduler driven by an explicit clock.
///
/// Useful in tests and in hosts that already run a frame loop: call
/// [`ManualScheduler::advance_to`] every tick and forward the returned tokens to the engine.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_token: u64,
    /// `(due_ms, token)`, unordered.
    pending: Vec<(u64, TimerToken)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|(_, t)| *t == token)
    }

    /// Moves the clock forward and returns every timer that became due, in due order.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<TimerToken> {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        let mut due: Vec<(u64, TimerToken)> = Vec::new();
        self.pending.retain(|&(at, token)| {
            if at <= now {
                due.push((at, token));
                false
            } else {
                true
            }
        });
        due.sort_unstable();
        due.into_iter().map(|(_, token)| token).collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay_ms: u64) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending.push((self.now_ms.saturating_add(delay_ms), token));
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(_, t)| *t != token);
    }
}

/// A single-slot timer: arming it cancels whatever it held before.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TimerSlot(Option<TimerToken>);

impl TimerSlot {
    pub(crate) fn arm(&mut self, scheduler: &mut dyn Scheduler, delay_ms: u64) {
        self.cancel(scheduler);
        self.0 = Some(scheduler.schedule(delay_ms));
    }

    pub(crate) fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(token) = self.0.take() {
            scheduler.cancel(token);
        }
    }

    /// Clears the slot if `token` is the one it holds. Returns whether it did.
    pub(crate) fn fire(&mut self, token: TimerToken) -> bool {
        if self.0 == Some(token) {
            self.0 = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}
