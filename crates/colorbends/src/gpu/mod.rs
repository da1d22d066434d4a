//! GPU side of the renderer.
//!
//! - `context` owns the wgpu instance, device and surface and rebuilds the
//!   swapchain when the window resizes or the surface is lost.
//! - `pipeline` builds the background, overlay and text pipelines; each draws
//!   a single full-screen triangle.
//! - `state` owns the uniform buffers and the text layer and records one
//!   frame.

mod context;
mod pipeline;
mod state;

pub(crate) use state::GpuState;
