use crate::background::BackgroundConfig;
use crate::overlay::OverlayLayout;
use crate::runtime::RenderPolicy;
use crate::text::TextEngine;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    #[default]
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Adapter selection hint passed to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Configuration handed to [`crate::WindowRuntime::spawn`].
#[derive(Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Borderless fullscreen on the current monitor.
    pub fullscreen: bool,
    pub antialiasing: Antialiasing,
    pub power: GpuPowerPreference,
    pub policy: RenderPolicy,
    pub background: BackgroundConfig,
    /// Panels drawn above the background; `None` draws the background alone.
    pub overlay: Option<OverlayLayout>,
    /// Fonts used to draw overlay text. Share the engine the layout measures
    /// with; `None` loads a separate collection in the window thread.
    pub text: Option<TextEngine>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 800),
            title: "ColorBends".into(),
            fullscreen: false,
            antialiasing: Antialiasing::default(),
            power: GpuPowerPreference::default(),
            policy: RenderPolicy::default(),
            background: BackgroundConfig::default(),
            overlay: None,
            text: None,
        }
    }
}
