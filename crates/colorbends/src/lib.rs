//! GPU renderer for the ColorBends generative background.
//!
//! The crate is split between host-agnostic state and the native window:
//!
//! ```text
//!   BackgroundConfig ──▶ ColorBends ──advance()──▶ ColorBendsUniforms
//!                          ▲    ▲                          │
//!            pointer_moved │    │ resize                   ▼
//!   WindowRuntime (winit thread) ──▶ FrameScheduler ──▶ GpuState::render
//!                          │                               │
//!                          └── Overlay::hit_test ◀── overlay panels
//!                                                          │
//!                              TextEngine::rasterize ◀── overlay text
//! ```
//!
//! `ColorBends`, `FrameScheduler`, `Overlay` and `TextEngine` have no GPU
//! dependency and are unit tested directly. `WindowRuntime` spawns the event loop on its own
//! thread and talks to the caller through an `EventLoopProxy` for commands and
//! a crossbeam channel for signals.

mod background;
mod compile;
mod gpu;
mod overlay;
mod palette;
mod runtime;
mod text;
mod types;
mod uniforms;
mod window;

pub use background::{
    AnimationClock, BackgroundConfig, ColorBends, PointerEasing, POINTER_EASE_RATE,
};
pub use compile::{
    BACKGROUND_SHADER_GLSL, OVERLAY_SHADER_GLSL, TEXT_SHADER_GLSL, VERTEX_SHADER_GLSL,
};
pub use overlay::{
    sd_rounded_rect, Glow, Overlay, OverlayLayout, OverlayPanel, Rect, Rgba, MAX_PANELS,
};
pub use palette::{parse_hex_color, parse_palette, ColorParseError, Rgb, MAX_COLORS};
pub use runtime::{FrameScheduler, RenderPolicy};
pub use text::{FontWeight, OverlayText, TextEngine, TextStyle, LINE_HEIGHT};
pub use types::{Antialiasing, GpuPowerPreference, RendererConfig};
pub use uniforms::ColorBendsUniforms;
pub use window::{WindowRuntime, WindowSignal};
