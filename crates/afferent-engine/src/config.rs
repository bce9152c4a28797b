//! Configuration structures for the renderer and its caches.
//!
//! All structures implement `Default` with the values the C ABI uses when the
//! host does not supply its own.

use crate::device::GpuInit;

/// Sizing policy for [`crate::render::BufferPool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum pooled slots per buffer kind.
    pub max_slots: usize,

    /// Requests above this size (bytes) bypass the pool entirely.
    pub max_buffer_size: u64,

    /// Smallest size class handed out (bytes). Must be a power of two.
    pub min_buffer_size: u64,

    /// Number of reusable buffer-handle records per frame.
    pub wrapper_slots: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_slots: 64,
            max_buffer_size: 1024 * 1024,
            min_buffer_size: 256,
            wrapper_slots: 256,
        }
    }
}

/// Glyph atlas dimensions and the supported codepoint range.
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    pub width: u32,
    pub height: u32,

    /// Codepoints at or above this value are never cached.
    pub max_codepoint: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            max_codepoint: 256,
        }
    }
}

/// Top-level renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub gpu: GpuInit,
    pub pool: PoolConfig,

    /// Sample count used for the MSAA pipeline variants.
    ///
    /// Must be 2, 4 or 8. Falls back to single-sampled rendering when the
    /// adapter cannot multisample the surface format.
    pub msaa_samples: u32,

    /// Whether MSAA starts enabled.
    pub msaa_enabled: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gpu: GpuInit::default(),
            pool: PoolConfig::default(),
            msaa_samples: 4,
            msaa_enabled: true,
        }
    }
}
