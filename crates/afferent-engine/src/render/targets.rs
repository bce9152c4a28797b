//! Per-frame render targets (MSAA color + depth).

use super::pipeline::DEPTH_FORMAT;

/// Size and sample count the frame's attachments must match.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

impl TargetSpec {
    #[inline]
    pub fn is_msaa(&self) -> bool {
        self.sample_count > 1
    }
}

/// Holds targets built for one [`TargetSpec`] and rebuilds them whenever
/// the target spec changes, so nothing of a previous size or sample count survives.
pub struct TargetCache<T> {
    current: Option<(TargetSpec, T)>,
}

impl<T> Default for TargetCache<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T> TargetCache<T> {
    pub fn ensure(&mut self, spec: TargetSpec, create: impl FnOnce(TargetSpec) -> T) -> &T {
        if self.current.as_ref().is_some_and(|(s, _)| *s != spec) {
            self.current = None;
        }
        let (_, targets) = self.current.get_or_insert_with(|| {
            log::debug!(
                "creating frame targets {}x{} x{}",
                spec.width,
                spec.height,
                spec.sample_count
            );
            (spec, create(spec))
        });
        targets
    }

    pub fn spec(&self) -> Option<TargetSpec> {
        self.current.as_ref().map(|(s, _)| *s)
    }
}

/// GPU attachments for one frame.
pub(crate) struct FrameTargets {
    /// Multisampled color target resolved into the surface; `None` at 1x.
    pub msaa_color: Option<wgpu::TextureView>,
    pub depth: wgpu::TextureView,
}

impl FrameTargets {
    pub(crate) fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        spec: TargetSpec,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: spec.width,
            height: spec.height,
            depth_or_array_layers: 1,
        };

        let attachment = |label: &'static str, format: wgpu::TextureFormat| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: spec.sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        let msaa_color = spec
            .is_msaa()
            .then(|| attachment("afferent msaa color", color_format));
        let depth = attachment("afferent depth", DEPTH_FORMAT);

        Self { msaa_color, depth }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32, sample_count: u32) -> TargetSpec {
        TargetSpec { width, height, sample_count }
    }

    #[test]
    fn same_spec_reuses_targets() {
        let mut cache = TargetCache::default();
        let mut created = 0;
        for _ in 0..3 {
            cache.ensure(spec(800, 600, 4), |_| {
                created += 1;
                created
            });
        }
        assert_eq!(created, 1);
    }

    #[test]
    fn msaa_toggle_rebuilds_targets() {
        let mut cache = TargetCache::default();
        assert_eq!(*cache.ensure(spec(800, 600, 4), |s| s.sample_count), 4);
        assert_eq!(*cache.ensure(spec(800, 600, 1), |s| s.sample_count), 1);
        assert_eq!(cache.spec(), Some(spec(800, 600, 1)));
    }

    #[test]
    fn resize_does_not_carry_over_old_size() {
        let mut cache = TargetCache::default();
        cache.ensure(spec(800, 600, 4), |s| (s.width, s.height));
        let now = *cache.ensure(spec(1024, 768, 4), |s| (s.width, s.height));
        assert_eq!(now, (1024, 768));
    }

    #[test]
    fn only_multisampled_specs_are_msaa() {
        assert!(spec(1, 1, 4).is_msaa());
        assert!(!spec(1, 1, 1).is_msaa());
    }
}
