use super::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Computes the drawable size in pixels for a window.
///
/// `override_scale == 0.0` keeps the native backing scale (the physical size).
/// A positive override renders at `logical size * override_scale`, which lets
/// hosts trade resolution for fill rate on high-DPI displays.
pub fn drawable_size(physical: (u32, u32), scale_factor: f64, override_scale: f32) -> (u32, u32) {
    if override_scale <= 0.0 || !override_scale.is_finite() || scale_factor <= 0.0 {
        return physical;
    }

    let ratio = f64::from(override_scale) / scale_factor;
    let w = (f64::from(physical.0) * ratio).round() as u32;
    let h = (f64::from(physical.1) * ratio).round() as u32;

    // A non-zero window never collapses to zero through scaling.
    let w = if physical.0 > 0 { w.max(1) } else { 0 };
    let h = if physical.1 > 0 { h.max(1) } else { 0 };
    (w, h)
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface<'_>,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if config.width > 0 && config.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_override_keeps_physical_size() {
        assert_eq!(drawable_size((2560, 1440), 2.0, 0.0), (2560, 1440));
    }

    #[test]
    fn override_rescales_from_logical_size() {
        // 2560x1440 at 2x is 1280x720 logical; 1.0 renders at logical size.
        assert_eq!(drawable_size((2560, 1440), 2.0, 1.0), (1280, 720));
        assert_eq!(drawable_size((2560, 1440), 2.0, 1.5), (1920, 1080));
    }

    #[test]
    fn zero_window_stays_zero() {
        assert_eq!(drawable_size((0, 0), 2.0, 1.0), (0, 0));
    }

    #[test]
    fn tiny_window_never_rounds_to_zero() {
        assert_eq!(drawable_size((1, 1), 2.0, 0.25), (1, 1));
    }
}
