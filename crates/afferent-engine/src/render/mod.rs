//! GPU rendering subsystem.
//!
//! One [`Renderer`] owns every pipeline and per-frame resource. Draw families
//! live in their own files as `impl Renderer` blocks.
//!
//! Convention:
//! - Pixel-space inputs use a top-left origin with +Y down.
//! - Generic instances and triangle vertices are already in NDC.
//! - Every pipeline renders into a pass with a depth attachment; 2D modes
//!   ignore it.

mod animated;
mod draw2d;
mod draw3d;
pub mod layout;
mod pipeline;
pub mod pool;
mod renderer;
mod targets;
mod text;

pub use layout::{OceanUniforms, Scene3DUniforms, Vertex};
pub use pipeline::{BindingKind, DepthMode, DrawMode, PipelineTable};
pub use pool::{BufferAllocator, BufferKind, BufferPool, PoolStats, WrapperRing};
pub use renderer::{GpuBuffer, GpuTexture, Renderer};
pub use targets::{TargetCache, TargetSpec};
