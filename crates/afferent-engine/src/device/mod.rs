//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for a native window
//! - creating & configuring the Surface (swapchain), including drawable scaling
//! - mapping surface errors onto frame-level actions

mod error;
mod gpu;
mod surface;

pub use error::SurfaceErrorAction;
pub use gpu::{Gpu, GpuInit};
pub use surface::drawable_size;
