//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Every function takes the current `Instant` from the caller, so nothing here
//! reads the system clock on its own.
//! - `FrameScheduler` decides when the next tick is due
//! - `FrameClock` turns tick timestamps into `FrameTime` snapshots

mod frame_clock;
mod scheduler;

pub use frame_clock::{FrameClock, FrameTime};
pub use scheduler::{interval_for, FrameScheduler};
