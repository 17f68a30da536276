// Tickpress Sync Engine
// Waits for the next sync boundary and presses the pickup key

use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use crossbeam_channel::{bounded, never, select, Receiver, Sender};

use super::schedule::{wait_until, ArmPlan};
use crate::output::{KeyPresser, PressError};
use crate::state::RuntimeState;

/// Source of wall-clock readings
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// How many times to press once the boundary is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    pub count: u32,
    /// Pause between consecutive presses
    pub interval: Duration,
}

impl Burst {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(40);

    /// A single press
    pub fn single() -> Self {
        Self {
            count: 1,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    /// `count` presses spaced by `interval`; a count of zero is treated as one.
    pub fn new(count: u32, interval: Duration) -> Self {
        Self {
            count: count.max(1),
            interval,
        }
    }
}

impl Default for Burst {
    fn default() -> Self {
        Self::single()
    }
}

/// Result of a cancellable wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Sending half of the cancellation channel
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: Sender<()>,
}

impl Canceller {
    /// Resolve the in-flight wait and every later one. Repeated calls
    /// collapse into one.
    pub fn cancel(&self) {
        let _ = self.tx.try_send(());
    }
}

/// Receiving half of the cancellation channel, owned by the engine.
///
/// Cancellation latches: quit and interrupt always end the run, so any
/// wait queued behind the cancelled one must not fire either.
#[derive(Debug)]
pub struct CancelToken {
    rx: Receiver<()>,
    cancelled: Cell<bool>,
}

/// Create a linked canceller and token
pub fn cancel_pair() -> (Canceller, CancelToken) {
    let (tx, rx) = bounded(1);
    (
        Canceller { tx },
        CancelToken {
            rx,
            cancelled: Cell::new(false),
        },
    )
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn never() -> Self {
        Self {
            rx: never(),
            cancelled: Cell::new(false),
        }
    }

    /// Block for `duration` unless cancelled first.
    pub fn wait(&self, duration: Duration) -> WaitOutcome {
        if self.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        let deadline = Instant::now() + duration;
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(()) => {
                    self.cancelled.set(true);
                    WaitOutcome::Cancelled
                }
                Err(_) => {
                    // every canceller is gone; nothing can interrupt us now
                    std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    WaitOutcome::Elapsed
                }
            },
            default(duration) => WaitOutcome::Elapsed,
        }
    }

    /// True once a cancellation has been received
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// How an armed cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum ArmOutcome {
    /// Every press of the burst was delivered
    Fired { presses: u32 },
    /// Quit or interrupt arrived first
    Cancelled { presses: u32 },
    /// The injection layer rejected a press
    PressFailed { presses: u32, error: PressError },
}

/// Everything that happened during one armed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ArmReport {
    pub plan: ArmPlan,
    pub key: String,
    pub outcome: ArmOutcome,
}

/// Single-shot timer that presses the pickup key on a sync boundary.
///
/// `fire` takes `&mut self`, so a second arm cannot start while one is
/// waiting. Settings are read once when the plan is made; later changes
/// apply from the next arm.
pub struct SyncEngine {
    clock: Box<dyn Clock>,
    presser: Box<dyn KeyPresser>,
    cancel: CancelToken,
    burst: Burst,
}

impl SyncEngine {
    pub fn new(clock: Box<dyn Clock>, presser: Box<dyn KeyPresser>, cancel: CancelToken) -> Self {
        Self {
            clock,
            presser,
            cancel,
            burst: Burst::single(),
        }
    }

    /// Press `burst.count` times per cycle instead of once
    pub fn with_burst(mut self, burst: Burst) -> Self {
        self.burst = burst;
        self
    }

    pub fn burst(&self) -> Burst {
        self.burst
    }

    /// Compute the next cycle from the current settings without waiting
    pub fn plan(&self, runtime: &RuntimeState) -> ArmPlan {
        let armed_at = self.clock.now();
        ArmPlan::compute(
            armed_at,
            self.clock.now(),
            runtime.sync_interval,
            runtime.lag(),
        )
    }

    /// Wait out `plan` and press `key`.
    ///
    /// The clock is read again here so any time spent between planning and
    /// firing (reporting the plan, for instance) comes out of the wait.
    pub fn fire(&mut self, plan: &ArmPlan, key: &str) -> ArmOutcome {
        let wait = wait_until(plan.target, self.clock.now(), plan.lag);
        log::debug!("Waiting {:?} for boundary {}", wait, plan.target);
        if self.cancel.wait(wait) == WaitOutcome::Cancelled {
            return ArmOutcome::Cancelled { presses: 0 };
        }

        let mut presses = 0;
        for i in 0..self.burst.count {
            if i > 0 && self.cancel.wait(self.burst.interval) == WaitOutcome::Cancelled {
                return ArmOutcome::Cancelled { presses };
            }
            if let Err(error) = self.presser.press_and_release(key) {
                log::warn!("Press of '{}' failed: {}", key, error);
                return ArmOutcome::PressFailed { presses, error };
            }
            presses += 1;
        }
        log::debug!("Pressed '{}' {} time(s)", key, presses);
        ArmOutcome::Fired { presses }
    }

    /// Plan and run one full wait-then-press cycle
    pub fn arm(&mut self, runtime: &RuntimeState) -> ArmReport {
        let plan = self.plan(runtime);
        let outcome = self.fire(&plan, &runtime.pickup_key);
        ArmReport {
            plan,
            key: runtime.pickup_key.clone(),
            outcome,
        }
    }
}
