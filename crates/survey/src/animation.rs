//! Cosmetic frame-cycling effect shown next to the survey.
//!
//! Unrelated to survey state; it only tells the page which frame to show and
//! which to hide on every tick.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use storefront_core::{DomainError, DomainResult};

pub const FRAME_COUNT: usize = 8;
pub const FRAME_PERIOD: Duration = Duration::from_millis(75);

/// One tick's worth of visibility changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameTransition {
    pub show: usize,
    pub hide: usize,
}

/// Wrapping frame counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameCycle {
    frame_count: usize,
    current: usize,
}

impl FrameCycle {
    pub fn new(frame_count: usize) -> DomainResult<Self> {
        if frame_count == 0 {
            return Err(DomainError::validation("frame cycle needs at least one frame"));
        }
        Ok(Self {
            frame_count,
            current: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Show the current frame, hide its predecessor, then move on.
    pub fn advance(&mut self) -> FrameTransition {
        let n = self.frame_count;
        let transition = FrameTransition {
            show: self.current,
            hide: (self.current + n - 1) % n,
        };
        self.current = (self.current + 1) % n;
        transition
    }
}

impl Default for FrameCycle {
    fn default() -> Self {
        Self {
            frame_count: FRAME_COUNT,
            current: 0,
        }
    }
}

/// Background task driving a [`FrameCycle`] on a fixed interval.
///
/// The task lives exactly as long as this handle: dropping it (or calling
/// [`FrameTicker::stop`]) aborts the task. Must be started inside a tokio
/// runtime.
pub struct FrameTicker {
    rx: watch::Receiver<Option<FrameTransition>>,
    handle: JoinHandle<()>,
}

impl FrameTicker {
    pub fn start(mut cycle: FrameCycle, period: Duration) -> DomainResult<Self> {
        if period.is_zero() {
            return Err(DomainError::validation("frame period must be greater than zero"));
        }

        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                if tx.send(Some(cycle.advance())).is_err() {
                    // every receiver is gone
                    break;
                }
            }
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "frame ticker started");
        Ok(Self { rx, handle })
    }

    /// A receiver that is notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<Option<FrameTransition>> {
        self.rx.clone()
    }

    /// The most recent transition, `None` before the first tick.
    pub fn latest(&self) -> Option<FrameTransition> {
        *self.rx.borrow()
    }

    pub fn stop(self) {
        // Drop aborts the task.
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
