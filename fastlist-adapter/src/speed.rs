use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::fmt;

use crate::scheduler::{Scheduler, TimerSlot, TimerToken};

/// Number of recent speed samples averaged.
pub const SAMPLE_WINDOW: usize = 10;
/// Quiet period after the last position report before scrolling is considered settled.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 300;
/// Average speed (px/ms) above which the list counts as fast scrolling.
pub const DEFAULT_MIN_VELOCITY: f64 = 0.5;

/// Handle returned by [`ScrollSpeedTracker::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Subscriber = Box<dyn FnMut(bool) + Send>;

/// Derives a boolean "fast scrolling" signal from sampled scroll positions.
///
/// Sampling only happens while somebody is subscribed. Each report re-arms a single settle
/// timer; when it fires, the samples are dropped and the state returns to `false`.
pub struct ScrollSpeedTracker {
    min_velocity: f64,
    settle_delay_ms: u64,
    samples: VecDeque<f64>,
    average: f64,
    last: Option<(u64, u64)>,
    is_scrolling: bool,
    settle: TimerSlot,
    subscribers: Vec<(Subscription, Subscriber)>,
    next_subscription: u64,
}

impl Default for ScrollSpeedTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VELOCITY, DEFAULT_SETTLE_DELAY_MS)
    }
}

impl ScrollSpeedTracker {
    pub fn new(min_velocity: f64, settle_delay_ms: u64) -> Self {
        Self {
            min_velocity,
            settle_delay_ms,
            samples: VecDeque::with_capacity(SAMPLE_WINDOW),
            average: 0.0,
            last: None,
            is_scrolling: false,
            settle: TimerSlot::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn set_thresholds(&mut self, min_velocity: f64, settle_delay_ms: u64) {
        self.min_velocity = min_velocity;
        self.settle_delay_ms = settle_delay_ms;
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    /// Average of the buffered samples, in px/ms.
    pub fn average_speed(&self) -> f64 {
        self.average
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(bool) + Send + 'static) -> Subscription {
        let sub = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((sub, Box::new(callback)));
        sub
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != subscription);
        self.subscribers.len() != before
    }

    pub fn report_position(&mut self, position: u64, now_ms: u64, scheduler: &mut dyn Scheduler) {
        if self.subscribers.is_empty() {
            return;
        }

        if let Some((prev_position, prev_ms)) = self.last {
            let dt = now_ms.saturating_sub(prev_ms).max(1);
            let speed = position.abs_diff(prev_position) as f64 / dt as f64;
            if self.samples.len() == SAMPLE_WINDOW {
                self.samples.pop_front();
            }
            self.samples.push_back(speed);
            self.average = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            vtrace!(speed, average = self.average, "ScrollSpeedTracker::report_position");
            self.set_scrolling(self.average > self.min_velocity);
        }
        self.last = Some((position, now_ms));
        self.settle.arm(scheduler, self.settle_delay_ms);
    }

    /// Handles a fired timer. Returns `true` if it was this tracker's settle timer.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        if !self.settle.fire(token) {
            return false;
        }
        self.reset_samples();
        self.set_scrolling(false);
        true
    }

    /// Cancels the settle timer and drops every subscriber.
    pub fn teardown(&mut self, scheduler: &mut dyn Scheduler) {
        self.settle.cancel(scheduler);
        self.subscribers.clear();
        self.reset_samples();
        self.is_scrolling = false;
    }

    fn reset_samples(&mut self) {
        self.samples.clear();
        self.average = 0.0;
        self.last = None;
    }

    fn set_scrolling(&mut self, is_scrolling: bool) {
        if self.is_scrolling == is_scrolling {
            return;
        }
        self.is_scrolling = is_scrolling;
        vdebug!(is_scrolling, "scrolling state changed");
        for (_, callback) in &mut self.subscribers {
            callback(is_scrolling);
        }
    }
}

impl fmt::Debug for ScrollSpeedTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollSpeedTracker")
            .field("min_velocity", &self.min_velocity)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("samples", &self.samples.len())
            .field("average", &self.average)
            .field("is_scrolling", &self.is_scrolling)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}
