//! Frame timing for host loops.
//!
//! Call `tick()` once per presented frame; `FrameTime::elapsed` drives the
//! GPU-animated draws.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
