// Tickpress Sync Engine
// Boundary scheduling, cancellable waiting and the timed key press

pub mod engine;
pub mod schedule;

pub use engine::{
    cancel_pair, ArmOutcome, ArmReport, Burst, CancelToken, Canceller, Clock, SyncEngine,
    SystemClock, WaitOutcome,
};
pub use schedule::{lag_compensation, next_boundary, top_of_minute, wait_until, ArmPlan};
