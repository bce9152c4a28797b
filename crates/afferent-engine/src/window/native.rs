use std::sync::Arc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::{AfferentError, Result};

/// Number of zero-timeout pumps allowed for the platform to deliver `resumed`.
const CREATE_PUMP_ATTEMPTS: usize = 16;

/// Window creation parameters.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "afferent".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// A single native window whose events are pumped by the host.
pub struct NativeWindow {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    window: Arc<Window>,
}

impl NativeWindow {
    /// Opens a window and waits until the platform hands it back.
    pub fn new(config: WindowConfig) -> Result<Self> {
        let mut event_loop = EventLoop::new()
            .map_err(|e| AfferentError::Window(format!("failed to create event loop: {e}")))?;

        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let mut handler = WindowHandler {
            pending: Some(attrs),
            window: None,
            create_error: None,
            close_requested: false,
        };

        for _ in 0..CREATE_PUMP_ATTEMPTS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut handler)
            {
                return Err(AfferentError::Window(format!(
                    "event loop exited during window creation (code {code})"
                )));
            }
            if handler.window.is_some() || handler.create_error.is_some() {
                break;
            }
        }

        if let Some(err) = handler.create_error.take() {
            return Err(AfferentError::Window(err));
        }
        let window = handler
            .window
            .clone()
            .ok_or_else(|| AfferentError::Window("platform never resumed the event loop".into()))?;

        log::info!("window created ({:?})", window.inner_size());

        Ok(Self {
            event_loop,
            handler,
            window,
        })
    }

    /// Drains pending platform events without blocking.
    pub fn poll_events(&mut self) {
        if let PumpStatus::Exit(_) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            self.handler.close_requested = true;
        }
    }

    /// Whether the user asked to close the window.
    pub fn should_close(&self) -> bool {
        self.handler.close_requested
    }

    /// Inner size in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        let s = self.window.inner_size();
        (s.width, s.height)
    }

    /// Backing scale factor (physical / logical).
    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    /// Shared handle used to build a GPU surface.
    pub fn handle(&self) -> Arc<Window> {
        Arc::clone(&self.window)
    }
}

struct WindowHandler {
    pending: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    create_error: Option<String>,
    close_requested: bool,
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        let Some(attrs) = self.pending.take() else { return };
        match event_loop.create_window(attrs) {
            Ok(w) => self.window = Some(Arc::new(w)),
            Err(e) => self.create_error = Some(format!("failed to create window: {e}")),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                log::trace!("window resized to {}x{}", size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::debug!("scale factor changed to {scale_factor}");
            }
            _ => {}
        }
    }
}
