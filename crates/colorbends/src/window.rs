use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{CursorIcon, Fullscreen, Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::background::{BackgroundConfig, ColorBends};
use crate::gpu::GpuState;
use crate::overlay::{Overlay, OverlayLayout, OverlayUniforms};
use crate::runtime::{FrameScheduler, RenderPolicy};
use crate::text::TextEngine;
use crate::types::RendererConfig;
use crate::uniforms::ColorBendsUniforms;

/// Requests sent from the owning thread into the event loop.
enum WindowCommand {
    Configure(BackgroundConfig),
    SetOverlay(Option<OverlayLayout>),
    SetTitle(String),
    SetPolicy(RenderPolicy),
    Shutdown,
}

/// Notifications the event loop sends back to the owning thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    /// An interactive overlay panel was clicked.
    Activated(u32),
    /// The window closed and its GPU resources were released.
    Closed,
}

/// Pairs a button press with its release so a click only counts when both
/// land on the same panel.
#[derive(Debug, Default)]
struct ClickTracker {
    pressed: Option<u32>,
}

impl ClickTracker {
    fn handle(&mut self, state: ElementState, target: Option<u32>) -> Option<u32> {
        match state {
            ElementState::Pressed => {
                self.pressed = target;
                None
            }
            ElementState::Released => {
                let pressed = self.pressed.take()?;
                (target == Some(pressed)).then_some(pressed)
            }
        }
    }
}

/// Throttled once-per-second render statistics.
struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    fn record(&mut self, now: Instant, uniforms: &ColorBendsUniforms) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return;
        }
        debug!(
            fps = (self.frames as f32 / elapsed.as_secs_f32()).round(),
            time = uniforms.u_time,
            pointer_x = uniforms.u_pointer[0],
            pointer_y = uniforms.u_pointer[1],
            canvas_w = uniforms.u_canvas[0],
            canvas_h = uniforms.u_canvas[1],
            "render stats"
        );
        self.window_start = now;
        self.frames = 0;
    }
}

pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: Option<GpuState>,
    background: ColorBends,
    layout: Option<OverlayLayout>,
    overlay: Overlay,
    text: TextEngine,
    scale_factor: f64,
    cursor: Option<PhysicalPosition<f64>>,
    hovered: Option<u32>,
    clicks: ClickTracker,
    scheduler: FrameScheduler,
    stats: FrameStats,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            config.antialiasing,
            config.power,
            config.background.transparent,
        )?;
        let size = gpu.size();
        let background = ColorBends::new(config.background.clone(), (size.width, size.height));

        let mut state = Self {
            scale_factor: window.scale_factor(),
            window,
            gpu: Some(gpu),
            background,
            layout: config.overlay.clone(),
            overlay: Overlay::new(),
            text: config.text.clone().unwrap_or_default(),
            cursor: None,
            hovered: None,
            clicks: ClickTracker::default(),
            scheduler: FrameScheduler::new(config.policy.clone()),
            stats: FrameStats::new(Instant::now()),
        };
        state.rebuild_overlay();
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn logical_size(&self) -> (f32, f32) {
        let (width, height) = match self.gpu.as_ref() {
            Some(gpu) => (gpu.size().width, gpu.size().height),
            None => {
                let size = self.window.inner_size();
                (size.width, size.height)
            }
        };
        let scale = self.scale_factor.max(f64::EPSILON);
        (
            (f64::from(width) / scale) as f32,
            (f64::from(height) / scale) as f32,
        )
    }

    fn rebuild_overlay(&mut self) {
        let logical = self.logical_size();
        self.overlay = match &self.layout {
            Some(layout) => layout(logical.0, logical.1),
            None => Overlay::new(),
        };
        if let Some(gpu) = self.gpu.as_ref() {
            let scale = self.scale_factor as f32;
            gpu.write_overlay(&OverlayUniforms::new(&self.overlay, logical, scale));
            if !self.overlay.texts().is_empty() {
                let size = gpu.size();
                let layer = self
                    .text
                    .rasterize(self.overlay.texts(), size.width, size.height, scale);
                gpu.write_text(&layer);
                debug!(items = self.overlay.texts().len(), "overlay text rasterised");
            }
        }
        self.refresh_hover();
        self.scheduler.invalidate();
    }

    fn configure(&mut self, config: BackgroundConfig) {
        if config.transparent != self.background.config().transparent {
            if let Some(gpu) = self.gpu.as_mut() {
                gpu.set_transparent(config.transparent);
            }
        }
        info!(
            colors = config.colors.len(),
            transparent = config.transparent,
            "background configuration updated"
        );
        self.background.apply_config(config);
        self.scheduler.invalidate();
    }

    fn set_overlay(&mut self, layout: Option<OverlayLayout>) {
        self.layout = layout;
        self.rebuild_overlay();
    }

    fn set_policy(&mut self, policy: RenderPolicy) {
        self.scheduler.set_policy(policy);
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if !gpu.resize(new_size) {
            return;
        }
        if self.background.resize(new_size.width, new_size.height) {
            debug!(width = new_size.width, height = new_size.height, "canvas resized");
        }
        self.rebuild_overlay();
    }

    fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
        self.rebuild_overlay();
    }

    /// Overlay-space (logical) position of the cursor.
    fn cursor_logical(&self) -> Option<(f32, f32)> {
        let scale = self.scale_factor.max(f64::EPSILON);
        self.cursor
            .map(|pos| ((pos.x / scale) as f32, (pos.y / scale) as f32))
    }

    fn panel_under_cursor(&self) -> Option<u32> {
        let (x, y) = self.cursor_logical()?;
        self.overlay.hit_test(x, y)
    }

    fn refresh_hover(&mut self) {
        let hovered = self.panel_under_cursor();
        if hovered != self.hovered {
            self.hovered = hovered;
            let icon = if hovered.is_some() {
                CursorIcon::Pointer
            } else {
                CursorIcon::Default
            };
            self.window.set_cursor_icon(icon);
        }
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
        self.background
            .pointer_moved(position.x as f32, position.y as f32);
        self.refresh_hover();
    }

    fn cursor_left(&mut self) {
        self.cursor = None;
        self.refresh_hover();
    }

    fn mouse_input(&mut self, state: ElementState) -> Option<u32> {
        let target = self.panel_under_cursor();
        self.clicks.handle(state, target)
    }

    fn render(&mut self, now: Instant) -> Result<(), wgpu::SurfaceError> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        let uniforms = match self.scheduler.policy() {
            RenderPolicy::Still { time } => *self.background.seek(*time),
            RenderPolicy::Animate { .. } => *self.background.advance(now),
        };
        gpu.render(
            &uniforms,
            !self.overlay.panels().is_empty(),
            !self.overlay.texts().is_empty(),
            self.background.clear_color(),
        )?;
        self.scheduler.mark_rendered(now);
        self.stats.record(now, &uniforms);
        Ok(())
    }

    fn recover_surface(&mut self) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.reconfigure();
        }
    }

    /// Stops the scheduler and releases every GPU resource.
    fn unmount(&mut self) {
        self.scheduler.cancel();
        if self.gpu.take().is_some() {
            info!("renderer released");
        }
    }
}

/// Handle to the render thread. Dropping it shuts the window down.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    events: Receiver<WindowSignal>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (signal_tx, signal_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("colorbends-window".into())
            .spawn(move || run_window_thread(config, ready_tx, signal_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            events: signal_rx,
            join_handle: Some(handle),
        })
    }

    fn send(&self, command: WindowCommand) -> Result<()> {
        self.proxy
            .send_event(command)
            .map_err(|_| anyhow!("window event loop has already exited"))
    }

    /// Applies new background settings without resetting the animation.
    pub fn configure(&self, config: BackgroundConfig) -> Result<()> {
        self.send(WindowCommand::Configure(config))
    }

    pub fn set_overlay(&self, layout: Option<OverlayLayout>) -> Result<()> {
        self.send(WindowCommand::SetOverlay(layout))
    }

    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.send(WindowCommand::SetTitle(title.into()))
    }

    pub fn set_policy(&self, policy: RenderPolicy) -> Result<()> {
        self.send(WindowCommand::SetPolicy(policy))
    }

    /// Drains pending signals without blocking.
    pub fn take_signals(&self) -> Vec<WindowSignal> {
        self.events.try_iter().collect()
    }

    /// True once the render thread has returned, with or without an error.
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
    signal_tx: Sender<WindowSignal>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let message = format!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let proxy = event_loop.create_proxy();

    let (width, height) = config.surface_size;
    let mut window_builder = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(f64::from(width), f64::from(height)))
        .with_transparent(config.background.transparent);
    if config.fullscreen {
        window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = match window_builder.build(&event_loop) {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let message = format!("failed to create window: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };

    let mut state = match WindowState::new(window, &config) {
        Ok(state) => state,
        Err(err) => {
            let wrapped = anyhow!("failed to initialise window renderer: {err:#}");
            let _ = ready_tx.send(Err(anyhow!(wrapped.to_string())));
            return Err(wrapped);
        }
    };

    if state.scheduler.ready_for_frame(Instant::now()) {
        state.window().request_redraw();
    }
    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::UserEvent(command) => match command {
            WindowCommand::Configure(background) => {
                state.configure(background);
                state.window().request_redraw();
            }
            WindowCommand::SetOverlay(layout) => {
                state.set_overlay(layout);
                state.window().request_redraw();
            }
            WindowCommand::SetTitle(title) => state.window().set_title(&title),
            WindowCommand::SetPolicy(policy) => {
                state.set_policy(policy);
                state.window().request_redraw();
            }
            WindowCommand::Shutdown => {
                state.unmount();
                elwt.exit();
            }
        },
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    state.unmount();
                    elwt.exit();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.cursor_moved(position);
                }
                WindowEvent::CursorLeft { .. } => state.cursor_left(),
                WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } => {
                    if let Some(id) = state.mouse_input(button_state) {
                        debug!(panel = id, "overlay panel activated");
                        let _ = signal_tx.send(WindowSignal::Activated(id));
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                    state.window().request_redraw();
                }
                WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                    state.set_scale_factor(scale_factor);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    if !state.scheduler.ready_for_frame(now) {
                        return;
                    }
                    match state.render(now) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            warn!("surface lost or outdated; reconfiguring");
                            state.recover_surface();
                            state.scheduler.invalidate();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; closing window");
                            state.unmount();
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!("surface error: {other:?}; retrying next frame");
                        }
                    }
                }
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if state.scheduler.ready_for_frame(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = state.scheduler.next_deadline() {
                let ms = deadline.saturating_duration_since(now).as_millis();
                tracing::trace!(deadline_ms = ms, "scheduler: waiting until next frame");
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                tracing::trace!("scheduler: idle (no redraw requested)");
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        Event::LoopExiting => {
            state.unmount();
            let _ = signal_tx.send(WindowSignal::Closed);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_requires_press_and_release_on_same_panel() {
        let mut clicks = ClickTracker::default();
        assert_eq!(clicks.handle(ElementState::Pressed, Some(2)), None);
        assert_eq!(clicks.handle(ElementState::Released, Some(2)), Some(2));
    }

    #[test]
    fn release_elsewhere_cancels_click() {
        let mut clicks = ClickTracker::default();
        clicks.handle(ElementState::Pressed, Some(1));
        assert_eq!(clicks.handle(ElementState::Released, Some(2)), None);
        assert_eq!(clicks.handle(ElementState::Released, Some(1)), None);

        clicks.handle(ElementState::Pressed, None);
        assert_eq!(clicks.handle(ElementState::Released, Some(1)), None);
    }
}
