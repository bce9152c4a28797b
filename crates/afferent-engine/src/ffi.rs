//! The `afferent_*` C ABI.
//!
//! Handles are boxed Rust owners passed around as raw pointers. `*_create`
//! functions write the handle through an out pointer and return an
//! [`AfferentResult`]; `*_destroy` frees it. Destroying a handle twice is the
//! caller's bug and is not detected.
//!
//! Null handles are tolerated everywhere: draws and setters become no-ops and
//! calls that return a result report an error code. Instance arrays are
//! `count` records of the fixed stride documented in [`crate::render::layout`].
//!
//! # Safety
//! Every non-null pointer must be valid for the access implied by its
//! parameter, and handles must come from the matching `*_create` function.
//! All calls happen on one thread.

use std::ffi::{CStr, c_char};
use std::ptr;

use crate::config::RendererConfig;
use crate::error::{AfferentError, AfferentResult, Result};
use crate::float_buffer::FloatBuffer;
use crate::logging::{LoggingConfig, init_logging};
use crate::render::layout::{
    ANIMATED_FLOATS, DYNAMIC_CIRCLE_FLOATS, DYNAMIC_SHAPE_FLOATS, INSTANCE_FLOATS,
    MESH_VERTEX_FLOATS, ORBITAL_FLOATS, SPRITE_FLOATS, TEXTURED_MESH_VERTEX_FLOATS,
};
use crate::render::{GpuBuffer, OceanUniforms, Renderer, Scene3DUniforms, Vertex};
use crate::text::{Affine, Font};
use crate::texture::Texture;
use crate::window::{NativeWindow, WindowConfig};

// ── marshaling helpers ───────────────────────────────────────────────────

fn into_handle<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

unsafe fn destroy_handle<T>(handle: *mut T) {
    if !handle.is_null() {
        // SAFETY: the handle came from `into_handle` and is freed once.
        drop(unsafe { Box::from_raw(handle) });
    }
}

/// Runs `create` and stores the value behind `out`, or nulls `out` and
/// reports the error's code. A null `out` returns `null_out` without
/// creating anything.
unsafe fn write_handle<T>(
    out: *mut *mut T,
    null_out: AfferentResult,
    create: impl FnOnce() -> Result<T>,
) -> AfferentResult {
    if out.is_null() {
        log::error!("null out pointer passed to a create call");
        return null_out;
    }
    match create() {
        Ok(value) => {
            // SAFETY: `out` is non-null and writable per the module contract.
            unsafe { *out = into_handle(value) };
            AfferentResult::Ok
        }
        Err(e) => {
            log::error!("{e}");
            // SAFETY: as above.
            unsafe { *out = ptr::null_mut() };
            e.code()
        }
    }
}

/// `len` elements at `data`, or an empty slice for a null pointer.
unsafe fn slice<'a, T>(data: *const T, len: usize) -> &'a [T] {
    if data.is_null() || len == 0 {
        return &[];
    }
    // SAFETY: the caller guarantees `len` readable elements at `data`.
    unsafe { std::slice::from_raw_parts(data, len) }
}

/// `count` records of `stride` floats.
unsafe fn records<'a>(data: *const f32, count: u32, stride: usize) -> &'a [f32] {
    match (count as usize).checked_mul(stride) {
        // SAFETY: forwarded from the caller.
        Some(len) => unsafe { slice(data, len) },
        None => &[],
    }
}

unsafe fn utf8<'a>(text: *const c_char) -> Option<&'a str> {
    if text.is_null() {
        return None;
    }
    // SAFETY: the caller passes a NUL-terminated string.
    unsafe { CStr::from_ptr(text) }.to_str().ok()
}

unsafe fn write_out<T>(out: *mut T, value: T) {
    if !out.is_null() {
        // SAFETY: non-null out pointers are writable per the module contract.
        unsafe { *out = value };
    }
}

// ── logging ──────────────────────────────────────────────────────────────

/// Installs the logger. Safe to call more than once.
#[unsafe(no_mangle)]
pub extern "C" fn afferent_init_logging() {
    init_logging(LoggingConfig::default());
}

// ── window ───────────────────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_create(
    width: u32,
    height: u32,
    title: *const c_char,
    out_window: *mut *mut NativeWindow,
) -> AfferentResult {
    let mut config = WindowConfig {
        initial_size: winit::dpi::LogicalSize::new(f64::from(width), f64::from(height)),
        ..WindowConfig::default()
    };
    // SAFETY: forwarded from the caller.
    if let Some(title) = unsafe { utf8(title) } {
        config.title = title.to_owned();
    }
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_window, AfferentResult::WindowFailed, || {
            NativeWindow::new(config)
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_destroy(window: *mut NativeWindow) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(window) }
}

/// A null window reports `true` so host loops terminate.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_should_close(window: *const NativeWindow) -> bool {
    // SAFETY: forwarded from the caller.
    unsafe { window.as_ref() }.is_none_or(NativeWindow::should_close)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_poll_events(window: *mut NativeWindow) {
    // SAFETY: forwarded from the caller.
    if let Some(window) = unsafe { window.as_mut() } {
        window.poll_events();
    }
}

/// Inner size in physical pixels.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_get_size(
    window: *const NativeWindow,
    width: *mut u32,
    height: *mut u32,
) {
    // SAFETY: forwarded from the caller.
    let (w, h) = unsafe { window.as_ref() }.map_or((0, 0), NativeWindow::size);
    // SAFETY: forwarded from the caller.
    unsafe {
        write_out(width, w);
        write_out(height, h);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_window_get_scale_factor(window: *const NativeWindow) -> f64 {
    // SAFETY: forwarded from the caller.
    unsafe { window.as_ref() }.map_or(1.0, NativeWindow::scale_factor)
}

// ── renderer ─────────────────────────────────────────────────────────────

/// Creates a renderer for `window` with the default configuration.
///
/// The window must outlive the renderer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_create(
    window: *const NativeWindow,
    out_renderer: *mut *mut Renderer,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let window = unsafe { window.as_ref() };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_renderer, AfferentResult::DeviceFailed, || match window {
            Some(window) => Renderer::new(window, RendererConfig::default()),
            None => Err(AfferentError::Init("null window handle".into())),
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_destroy(renderer: *mut Renderer) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(renderer) }
}

/// Starts a frame cleared to `(r, g, b, a)`.
///
/// A non-OK result means "skip this frame"; it is not fatal.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_begin_frame(
    renderer: *mut Renderer,
    r: f32,
    g: f32,
    b: f32,
    a: f32,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    match unsafe { renderer.as_mut() } {
        Some(renderer) => renderer.begin_frame([r, g, b, a]).into(),
        None => AfferentResult::DeviceFailed,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_end_frame(renderer: *mut Renderer) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    match unsafe { renderer.as_mut() } {
        Some(renderer) => renderer.end_frame().into(),
        None => AfferentResult::DeviceFailed,
    }
}

/// Takes effect at the next `begin_frame`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_set_msaa(renderer: *mut Renderer, enabled: bool) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.set_msaa(enabled);
    }
}

/// Overrides the backing scale; `0` restores the window's own factor.
/// Takes effect at the next `begin_frame`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_set_drawable_scale(renderer: *mut Renderer, scale: f32) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.set_drawable_scale(scale);
    }
}

// ── retained buffers ─────────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_buffer_create_vertex(
    renderer: *const Renderer,
    vertices: *const Vertex,
    vertex_count: u32,
    out_buffer: *mut *mut GpuBuffer,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let (renderer, vertices) = unsafe { (renderer.as_ref(), slice(vertices, vertex_count as usize)) };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_buffer, AfferentResult::BufferFailed, || match renderer {
            Some(renderer) => renderer.create_vertex_buffer(vertices),
            None => Err(AfferentError::Buffer("null renderer handle".into())),
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_buffer_create_index(
    renderer: *const Renderer,
    indices: *const u32,
    index_count: u32,
    out_buffer: *mut *mut GpuBuffer,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let (renderer, indices) = unsafe { (renderer.as_ref(), slice(indices, index_count as usize)) };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_buffer, AfferentResult::BufferFailed, || match renderer {
            Some(renderer) => renderer.create_index_buffer(indices),
            None => Err(AfferentError::Buffer("null renderer handle".into())),
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_buffer_destroy(buffer: *mut GpuBuffer) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(buffer) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_triangles(
    renderer: *mut Renderer,
    vertex_buffer: *const GpuBuffer,
    index_buffer: *const GpuBuffer,
    index_count: u32,
) {
    // SAFETY: forwarded from the caller.
    let handles = unsafe { (renderer.as_mut(), vertex_buffer.as_ref(), index_buffer.as_ref()) };
    if let (Some(renderer), Some(vertices), Some(indices)) = handles {
        renderer.draw_triangles(vertices, indices, index_count);
    }
}

/// Uploads and draws one batch of triangles through the frame's buffer pool.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_triangles_immediate(
    renderer: *mut Renderer,
    vertices: *const Vertex,
    vertex_count: u32,
    indices: *const u32,
    index_count: u32,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let Some(renderer) = (unsafe { renderer.as_mut() }) else {
        return AfferentResult::BufferFailed;
    };
    // SAFETY: forwarded from the caller.
    let (vertices, indices) = unsafe {
        (
            slice(vertices, vertex_count as usize),
            slice(indices, index_count as usize),
        )
    };
    renderer.draw_triangles_immediate(vertices, indices).into()
}

// ── float buffers ────────────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_create(
    capacity: usize,
    out_buffer: *mut *mut FloatBuffer,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_buffer, AfferentResult::BufferFailed, || {
            FloatBuffer::new(capacity)
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_destroy(buffer: *mut FloatBuffer) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(buffer) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_capacity(buffer: *const FloatBuffer) -> usize {
    // SAFETY: forwarded from the caller.
    unsafe { buffer.as_ref() }.map_or(0, FloatBuffer::capacity)
}

/// Unchecked: `index < capacity` is the caller's responsibility.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_set(buffer: *mut FloatBuffer, index: usize, value: f32) {
    // SAFETY: forwarded from the caller, including the index bound.
    if let Some(buffer) = unsafe { buffer.as_mut() } {
        unsafe { buffer.set_unchecked(index, value) };
    }
}

/// Unchecked: `index < capacity` is the caller's responsibility.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_get(buffer: *const FloatBuffer, index: usize) -> f32 {
    // SAFETY: forwarded from the caller, including the index bound.
    match unsafe { buffer.as_ref() } {
        Some(buffer) => unsafe { buffer.get_unchecked(index) },
        None => 0.0,
    }
}

/// Writes one sprite or dynamic-shape record at `index`. Unchecked.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_set_vec5(
    buffer: *mut FloatBuffer,
    index: usize,
    v0: f32,
    v1: f32,
    v2: f32,
    v3: f32,
    v4: f32,
) {
    // SAFETY: forwarded from the caller, including `index + 5 <= capacity`.
    if let Some(buffer) = unsafe { buffer.as_mut() } {
        unsafe { buffer.set_vec_unchecked(index, [v0, v1, v2, v3, v4]) };
    }
}

/// Writes one generic or orbital instance record at `index`. Unchecked.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn afferent_float_buffer_set_vec8(
    buffer: *mut FloatBuffer,
    index: usize,
    v0: f32,
    v1: f32,
    v2: f32,
    v3: f32,
    v4: f32,
    v5: f32,
    v6: f32,
    v7: f32,
) {
    // SAFETY: forwarded from the caller, including `index + 8 <= capacity`.
    if let Some(buffer) = unsafe { buffer.as_mut() } {
        unsafe { buffer.set_vec_unchecked(index, [v0, v1, v2, v3, v4, v5, v6, v7]) };
    }
}

/// Backing storage, valid until the buffer is destroyed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_float_buffer_data(buffer: *const FloatBuffer) -> *const f32 {
    // SAFETY: forwarded from the caller.
    unsafe { buffer.as_ref() }.map_or(ptr::null(), FloatBuffer::as_ptr)
}

// ── fonts and text ───────────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_font_load(
    path: *const c_char,
    size: u32,
    out_font: *mut *mut Font,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let path = unsafe { utf8(path) };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_font, AfferentResult::FontFailed, || match path {
            Some(path) => Font::load(path, size),
            None => Err(AfferentError::Font("font path is null or not UTF-8".into())),
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_font_destroy(font: *mut Font) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(font) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_font_get_metrics(
    font: *const Font,
    ascender: *mut f32,
    descender: *mut f32,
    line_height: *mut f32,
) {
    // SAFETY: forwarded from the caller.
    let Some(font) = (unsafe { font.as_ref() }) else { return };
    let m = font.metrics();
    // SAFETY: forwarded from the caller.
    unsafe {
        write_out(ascender, m.ascender);
        write_out(descender, m.descender);
        write_out(line_height, m.line_height);
    }
}

/// Width and line height of `text` in pixels. Caches any new glyphs.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_text_measure(
    font: *mut Font,
    text: *const c_char,
    width: *mut f32,
    height: *mut f32,
) {
    // SAFETY: forwarded from the caller.
    let (w, h) = match unsafe { (font.as_mut(), utf8(text)) } {
        (Some(font), Some(text)) => font.measure(text),
        _ => (0.0, 0.0),
    };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_out(width, w);
        write_out(height, h);
    }
}

/// Draws `text` with its baseline origin at `(x, y)` drawable pixels.
///
/// `transform` is null or six floats `[a, b, c, d, tx, ty]`.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn afferent_text_render(
    renderer: *mut Renderer,
    font: *mut Font,
    text: *const c_char,
    x: f32,
    y: f32,
    r: f32,
    g: f32,
    b: f32,
    a: f32,
    transform: *const f32,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let (renderer, font, text) = match unsafe { (renderer.as_mut(), font.as_mut(), utf8(text)) } {
        (Some(renderer), Some(font), Some(text)) => (renderer, font, text),
        _ => return AfferentResult::TextFailed,
    };
    // SAFETY: a non-null transform points at six floats.
    let transform = unsafe { slice(transform, 6) }
        .try_into()
        .ok()
        .map(Affine);
    renderer
        .draw_text(font, text, x, y, [r, g, b, a], transform)
        .into()
}

// ── textures and sprites ─────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_texture_load(
    path: *const c_char,
    out_texture: *mut *mut Texture,
) -> AfferentResult {
    // SAFETY: forwarded from the caller.
    let path = unsafe { utf8(path) };
    // SAFETY: forwarded from the caller.
    unsafe {
        write_handle(out_texture, AfferentResult::InitFailed, || match path {
            Some(path) => Texture::load(path),
            None => Err(AfferentError::Init("texture path is null or not UTF-8".into())),
        })
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_texture_destroy(texture: *mut Texture) {
    // SAFETY: forwarded from the caller.
    unsafe { destroy_handle(texture) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_texture_get_size(
    texture: *const Texture,
    width: *mut u32,
    height: *mut u32,
) {
    // SAFETY: forwarded from the caller.
    let (w, h) = unsafe { texture.as_ref() }.map_or((0, 0), Texture::size);
    // SAFETY: forwarded from the caller.
    unsafe {
        write_out(width, w);
        write_out(height, h);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_sprites(
    renderer: *mut Renderer,
    texture: *const Texture,
    data: *const f32,
    count: u32,
) {
    // SAFETY: forwarded from the caller.
    if let (Some(renderer), Some(texture)) = unsafe { (renderer.as_mut(), texture.as_ref()) } {
        // SAFETY: forwarded from the caller.
        renderer.draw_sprites(texture, unsafe { records(data, count, SPRITE_FLOATS) }, count);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_sprites_buffer(
    renderer: *mut Renderer,
    texture: *const Texture,
    buffer: *const FloatBuffer,
    count: u32,
) {
    // SAFETY: forwarded from the caller.
    let handles = unsafe { (renderer.as_mut(), texture.as_ref(), buffer.as_ref()) };
    if let (Some(renderer), Some(texture), Some(buffer)) = handles {
        renderer.draw_sprites_buffer(texture, buffer, count);
    }
}

// ── per-frame instance draws ─────────────────────────────────────────────

/// Exports a draw that takes `count` records of `$stride` floats, plus its
/// zero-copy FloatBuffer counterpart.
macro_rules! instance_draws {
    ($($name:ident / $buffer_name:ident => $method:ident / $buffer_method:ident, $stride:expr;)+) => {$(
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(renderer: *mut Renderer, data: *const f32, count: u32) {
            // SAFETY: forwarded from the caller.
            if let Some(renderer) = unsafe { renderer.as_mut() } {
                // SAFETY: forwarded from the caller.
                renderer.$method(unsafe { records(data, count, $stride) }, count);
            }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $buffer_name(
            renderer: *mut Renderer,
            buffer: *const FloatBuffer,
            count: u32,
        ) {
            // SAFETY: forwarded from the caller.
            if let (Some(renderer), Some(buffer)) = unsafe { (renderer.as_mut(), buffer.as_ref()) } {
                renderer.$buffer_method(buffer, count);
            }
        }
    )+};
}

instance_draws! {
    afferent_renderer_draw_instanced_rects / afferent_renderer_draw_instanced_rects_buffer
        => draw_instanced_rects / draw_instanced_rects_buffer, INSTANCE_FLOATS;
    afferent_renderer_draw_instanced_triangles / afferent_renderer_draw_instanced_triangles_buffer
        => draw_instanced_triangles / draw_instanced_triangles_buffer, INSTANCE_FLOATS;
    afferent_renderer_draw_instanced_circles / afferent_renderer_draw_instanced_circles_buffer
        => draw_instanced_circles / draw_instanced_circles_buffer, INSTANCE_FLOATS;
    afferent_renderer_upload_animated_rects / afferent_renderer_upload_animated_rects_buffer
        => upload_animated_rects / upload_animated_rects_buffer, ANIMATED_FLOATS;
    afferent_renderer_upload_animated_triangles / afferent_renderer_upload_animated_triangles_buffer
        => upload_animated_triangles / upload_animated_triangles_buffer, ANIMATED_FLOATS;
    afferent_renderer_upload_animated_circles / afferent_renderer_upload_animated_circles_buffer
        => upload_animated_circles / upload_animated_circles_buffer, ANIMATED_FLOATS;
}

/// Exports a dynamic draw (`time`, `hue_speed`) and its FloatBuffer
/// counterpart.
macro_rules! dynamic_draws {
    ($($name:ident / $buffer_name:ident => $method:ident / $buffer_method:ident, $stride:expr;)+) => {$(
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            renderer: *mut Renderer,
            data: *const f32,
            count: u32,
            time: f32,
            hue_speed: f32,
        ) {
            // SAFETY: forwarded from the caller.
            if let Some(renderer) = unsafe { renderer.as_mut() } {
                // SAFETY: forwarded from the caller.
                let data = unsafe { records(data, count, $stride) };
                renderer.$method(data, count, time, hue_speed);
            }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $buffer_name(
            renderer: *mut Renderer,
            buffer: *const FloatBuffer,
            count: u32,
            time: f32,
            hue_speed: f32,
        ) {
            // SAFETY: forwarded from the caller.
            if let (Some(renderer), Some(buffer)) = unsafe { (renderer.as_mut(), buffer.as_ref()) } {
                renderer.$buffer_method(buffer, count, time, hue_speed);
            }
        }
    )+};
}

dynamic_draws! {
    afferent_renderer_draw_dynamic_circles / afferent_renderer_draw_dynamic_circles_buffer
        => draw_dynamic_circles / draw_dynamic_circles_buffer, DYNAMIC_CIRCLE_FLOATS;
    afferent_renderer_draw_dynamic_rects / afferent_renderer_draw_dynamic_rects_buffer
        => draw_dynamic_rects / draw_dynamic_rects_buffer, DYNAMIC_SHAPE_FLOATS;
    afferent_renderer_draw_dynamic_triangles / afferent_renderer_draw_dynamic_triangles_buffer
        => draw_dynamic_triangles / draw_dynamic_triangles_buffer, DYNAMIC_SHAPE_FLOATS;
}

// ── GPU-animated draws ───────────────────────────────────────────────────

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_animated_rects(renderer: *mut Renderer, time: f32) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.draw_animated_rects(time);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_animated_triangles(renderer: *mut Renderer, time: f32) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.draw_animated_triangles(time);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_animated_circles(renderer: *mut Renderer, time: f32) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.draw_animated_circles(time);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_upload_orbital(
    renderer: *mut Renderer,
    data: *const f32,
    count: u32,
    center_x: f32,
    center_y: f32,
) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        // SAFETY: forwarded from the caller.
        let data = unsafe { records(data, count, ORBITAL_FLOATS) };
        renderer.upload_orbital(data, count, center_x, center_y);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_upload_orbital_buffer(
    renderer: *mut Renderer,
    buffer: *const FloatBuffer,
    count: u32,
    center_x: f32,
    center_y: f32,
) {
    // SAFETY: forwarded from the caller.
    if let (Some(renderer), Some(buffer)) = unsafe { (renderer.as_mut(), buffer.as_ref()) } {
        renderer.upload_orbital_buffer(buffer, count, center_x, center_y);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_orbital(
    renderer: *mut Renderer,
    time: f32,
    radius_wobble: f32,
) {
    // SAFETY: forwarded from the caller.
    if let Some(renderer) = unsafe { renderer.as_mut() } {
        renderer.draw_orbital(time, radius_wobble);
    }
}

// ── 3D ───────────────────────────────────────────────────────────────────

/// `vertices` holds `vertex_count` records of position, normal and RGBA.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_mesh_3d(
    renderer: *mut Renderer,
    vertices: *const f32,
    vertex_count: u32,
    indices: *const u32,
    index_count: u32,
    uniforms: *const Scene3DUniforms,
) {
    // SAFETY: forwarded from the caller.
    let (Some(renderer), Some(uniforms)) = (unsafe { (renderer.as_mut(), uniforms.as_ref()) }) else {
        return;
    };
    // SAFETY: forwarded from the caller.
    let (vertices, indices) = unsafe {
        (
            records(vertices, vertex_count, MESH_VERTEX_FLOATS),
            slice(indices, index_count as usize),
        )
    };
    renderer.draw_mesh_3d(vertices, indices, uniforms);
}

/// `vertices` holds `vertex_count` records of position, normal, uv and RGBA.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_mesh_3d_textured(
    renderer: *mut Renderer,
    vertices: *const f32,
    vertex_count: u32,
    indices: *const u32,
    index_count: u32,
    texture: *const Texture,
    uniforms: *const Scene3DUniforms,
) {
    // SAFETY: forwarded from the caller.
    let (Some(renderer), Some(texture), Some(uniforms)) =
        (unsafe { (renderer.as_mut(), texture.as_ref(), uniforms.as_ref()) })
    else {
        return;
    };
    // SAFETY: forwarded from the caller.
    let (vertices, indices) = unsafe {
        (
            records(vertices, vertex_count, TEXTURED_MESH_VERTEX_FLOATS),
            slice(indices, index_count as usize),
        )
    };
    renderer.draw_mesh_3d_textured(vertices, indices, texture, uniforms);
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn afferent_renderer_draw_ocean(
    renderer: *mut Renderer,
    grid_size: u32,
    uniforms: *const OceanUniforms,
) {
    // SAFETY: forwarded from the caller.
    if let (Some(renderer), Some(uniforms)) = unsafe { (renderer.as_mut(), uniforms.as_ref()) } {
        renderer.draw_ocean(grid_size, uniforms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_float_buffer(capacity: usize) -> *mut FloatBuffer {
        let mut handle: *mut FloatBuffer = ptr::null_mut();
        let res = unsafe { afferent_float_buffer_create(capacity, &mut handle) };
        assert_eq!(res, AfferentResult::Ok);
        assert!(!handle.is_null());
        handle
    }

    #[test]
    fn float_buffer_lifecycle() {
        let buf = new_float_buffer(16);
        unsafe {
            assert_eq!(afferent_float_buffer_capacity(buf), 16);
            assert_eq!(afferent_float_buffer_get(buf, 7), 0.0);
            afferent_float_buffer_set(buf, 7, 2.5);
            assert_eq!(afferent_float_buffer_get(buf, 7), 2.5);
            afferent_float_buffer_destroy(buf);
        }
    }

    #[test]
    fn set_vec5_records_read_back_through_the_data_pointer() {
        let buf = new_float_buffer(40);
        unsafe {
            for i in 0..8 {
                let f = i as f32;
                afferent_float_buffer_set_vec5(buf, i * 5, f, f + 0.5, f * 2.0, 8.0, 1.0);
            }
            let data = std::slice::from_raw_parts(afferent_float_buffer_data(buf), 40);
            for i in 0..8 {
                let f = i as f32;
                assert_eq!(&data[i * 5..i * 5 + 5], &[f, f + 0.5, f * 2.0, 8.0, 1.0]);
            }
            afferent_float_buffer_destroy(buf);
        }
    }

    #[test]
    fn set_vec8_fills_one_instance_record() {
        let buf = new_float_buffer(16);
        unsafe {
            afferent_float_buffer_set_vec8(buf, 8, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0);
            let data = std::slice::from_raw_parts(afferent_float_buffer_data(buf), 16);
            assert_eq!(&data[..8], &[0.0; 8]);
            assert_eq!(&data[8..], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
            afferent_float_buffer_destroy(buf);
        }
    }

    #[test]
    fn null_handles_are_tolerated() {
        unsafe {
            assert_eq!(afferent_float_buffer_capacity(ptr::null()), 0);
            assert!(afferent_float_buffer_data(ptr::null()).is_null());
            assert_eq!(afferent_float_buffer_get(ptr::null(), 3), 0.0);
            afferent_float_buffer_set(ptr::null_mut(), 3, 1.0);
            afferent_float_buffer_destroy(ptr::null_mut());

            assert!(afferent_window_should_close(ptr::null()));
            afferent_window_poll_events(ptr::null_mut());
            afferent_renderer_draw_instanced_rects(ptr::null_mut(), ptr::null(), 10);
            afferent_renderer_draw_ocean(ptr::null_mut(), 64, ptr::null());
            afferent_renderer_draw_mesh_3d_textured(
                ptr::null_mut(),
                ptr::null(),
                3,
                ptr::null(),
                3,
                ptr::null(),
                ptr::null(),
            );

            assert_eq!(
                afferent_renderer_begin_frame(ptr::null_mut(), 0.0, 0.0, 0.0, 1.0),
                AfferentResult::DeviceFailed
            );
            assert_eq!(
                afferent_renderer_draw_triangles_immediate(ptr::null_mut(), ptr::null(), 0, ptr::null(), 0),
                AfferentResult::BufferFailed
            );
        }
    }

    #[test]
    fn null_out_pointer_reports_the_create_call_failure() {
        let path = CString::new("/nonexistent/afferent-asset").unwrap();
        unsafe {
            assert_eq!(
                afferent_float_buffer_create(4, ptr::null_mut()),
                AfferentResult::BufferFailed
            );
            assert_eq!(
                afferent_font_load(path.as_ptr(), 16, ptr::null_mut()),
                AfferentResult::FontFailed
            );
            assert_eq!(
                afferent_texture_load(path.as_ptr(), ptr::null_mut()),
                AfferentResult::InitFailed
            );
            assert_eq!(
                afferent_window_create(64, 64, ptr::null(), ptr::null_mut()),
                AfferentResult::WindowFailed
            );
            assert_eq!(
                afferent_renderer_create(ptr::null(), ptr::null_mut()),
                AfferentResult::DeviceFailed
            );
            assert_eq!(
                afferent_buffer_create_index(ptr::null(), ptr::null(), 0, ptr::null_mut()),
                AfferentResult::BufferFailed
            );
        }
    }

    #[test]
    fn failed_create_nulls_the_handle() {
        let path = CString::new("/nonexistent/afferent-font.ttf").unwrap();
        let mut font = 1usize as *mut Font;
        let res = unsafe { afferent_font_load(path.as_ptr(), 16, &mut font) };
        assert_eq!(res, AfferentResult::FontFailed);
        assert!(font.is_null());
    }

    #[test]
    fn size_queries_on_null_handles_write_zero() {
        let (mut w, mut h) = (7u32, 7u32);
        unsafe { afferent_texture_get_size(ptr::null(), &mut w, &mut h) };
        assert_eq!((w, h), (0, 0));

        let (mut width, mut height) = (1.0f32, 1.0f32);
        unsafe { afferent_text_measure(ptr::null_mut(), ptr::null(), &mut width, &mut height) };
        assert_eq!((width, height), (0.0, 0.0));
    }

    #[test]
    fn record_slices_follow_the_stride() {
        let data = [0.0f32; 24];
        unsafe {
            assert_eq!(records(data.as_ptr(), 3, INSTANCE_FLOATS).len(), 24);
            assert!(records(ptr::null(), 3, INSTANCE_FLOATS).is_empty());
            assert!(records(data.as_ptr(), 0, INSTANCE_FLOATS).is_empty());
        }
    }
}
