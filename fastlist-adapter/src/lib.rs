//! Host-event orchestration for the `fastlist` crate.
//!
//! `fastlist` only does geometry. This crate turns host events (viewport layout, scroll
//! positions, drag and momentum notifications, timers) into recomputed windows and scroll
//! commands:
//!
//! - [`ListEngine`]: batch-bounded render window, end-reached detection, scroll-to-location
//! - [`ScrollSpeedTracker`]: a debounced "fast scrolling" signal with explicit subscriptions
//! - [`ScrollAnchor`]: keeps the visible content in place when items are inserted above it
//!
//! Deferred work goes through a host-provided [`Scheduler`]; [`ManualScheduler`] is a
//! deterministic implementation driven by an explicit clock.
//!
//! This crate is framework-agnostic: it holds no UI objects and never scrolls anything itself.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod engine;
mod scheduler;
mod speed;


pub use anchor::{Anchor, AnchorTarget, ScrollAnchor};
pub use engine::{
    DEFAULT_ANCHOR_PAUSE_MS, DEFAULT_BATCHES_TO_RENDER, EngineOptions, IdFromIndex, ListEngine,
    ListState, MIN_BATCHES_TO_RENDER, OnEndReached, ScrollCommand, ScrollRequest,
};
pub use fastlist::ConfigError;
pub use scheduler::{ManualScheduler, Scheduler, TimerToken};
pub use speed::{
    DEFAULT_MIN_VELOCITY, DEFAULT_SETTLE_DELAY_MS, SAMPLE_WINDOW, ScrollSpeedTracker,
    Subscription,
};
