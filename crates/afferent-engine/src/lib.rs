//! Afferent native renderer.
//!
//! A wgpu renderer for hosts that drive their own frame loop, exposed both as
//! a Rust API and through the `afferent_*` C ABI in [`ffi`].

pub mod config;
pub mod device;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod render;
pub mod text;
pub mod time;
pub mod window;

mod float_buffer;
mod texture;

pub use config::{AtlasConfig, PoolConfig, RendererConfig};
pub use error::{AfferentError, AfferentResult, Result};
pub use float_buffer::FloatBuffer;
pub use render::{GpuBuffer, OceanUniforms, Renderer, Scene3DUniforms, Vertex};
pub use text::{Affine, Font, FontMetrics};
pub use texture::Texture;
pub use window::{NativeWindow, WindowConfig};
