//! Sprite textures decoded on the CPU and uploaded lazily.

use std::cell::OnceCell;
use std::path::Path;

use crate::error::{AfferentError, Result};
use crate::render::GpuTexture;

/// An RGBA8 image usable by the sprite draw paths.
///
/// The GPU copy is created the first time the texture is drawn and lives
/// exactly as long as the `Texture`.
pub struct Texture {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    pub(crate) gpu: OnceCell<GpuTexture>,
}

impl Texture {
    /// Decodes an image file into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| AfferentError::Init(format!("texture {}: {e}", path.display())))?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, img.into_raw())
    }

    /// Wraps already-decoded RGBA8 pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AfferentError::Init("texture has zero size".into()));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AfferentError::Init(format!(
                "texture data is {} bytes, expected {expected}",
                rgba.len()
            )));
        }

        Ok(Self {
            width,
            height,
            rgba,
            gpu: OnceCell::new(),
        })
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Whether the GPU copy has been created yet.
    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_checks_length() {
        assert!(Texture::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Texture::from_rgba(2, 2, vec![0; 15]),
            Err(AfferentError::Init(_))
        ));
    }

    #[test]
    fn zero_sized_textures_are_rejected() {
        assert!(Texture::from_rgba(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn new_texture_is_not_uploaded() {
        let t = Texture::from_rgba(1, 1, vec![255; 4]).unwrap();
        assert_eq!(t.size(), (1, 1));
        assert!(!t.is_uploaded());
    }

    #[test]
    fn missing_file_fails_to_load() {
        assert!(Texture::load("/nonexistent/afferent/sprite.png").is_err());
    }
}
