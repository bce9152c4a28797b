//! Native window + host-driven event pump.
//!
//! The host owns the frame loop, so the `winit` event loop is pumped on demand
//! instead of being handed control via `run_app`.

mod native;

pub use native::{NativeWindow, WindowConfig};
