//! Rounded-rectangle panels composited over the background.
//!
//! Panels are described in logical pixels with a top-left origin and are
//! rendered by a single full-screen pass that evaluates a signed distance
//! field per panel. Later panels draw over earlier ones and win hit tests.
//! Text items are drawn above every panel.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::text::OverlayText;

/// Capacity of the overlay uniform block.
pub const MAX_PANELS: usize = 16;

/// Builds the overlay for a viewport given in logical pixels.
pub type OverlayLayout = Arc<dyn Fn(f32, f32) -> Overlay + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Straight (non-premultiplied) RGBA colour.
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Rgba,
    /// Falloff distance outside the panel edge, in logical pixels.
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPanel {
    pub id: u32,
    pub rect: Rect,
    pub radius: f32,
    pub fill: Rgba,
    /// End colour of a 135 degree gradient starting at `fill`.
    pub fill_end: Option<Rgba>,
    pub border: Rgba,
    pub border_width: f32,
    pub glow: Option<Glow>,
    /// Whether the panel takes part in hit testing.
    pub interactive: bool,
}

impl OverlayPanel {
    pub fn new(id: u32, rect: Rect) -> Self {
        Self {
            id,
            rect,
            radius: 0.0,
            fill: [0.0; 4],
            fill_end: None,
            border: [0.0; 4],
            border_width: 0.0,
            glow: None,
            interactive: false,
        }
    }

    /// Clamped corner radius; a radius of half the short side makes a pill.
    pub fn corner_radius(&self) -> f32 {
        self.radius
            .max(0.0)
            .min(self.rect.width.min(self.rect.height) * 0.5)
    }

    /// Signed distance from `point` to the panel outline; negative inside.
    pub fn distance(&self, x: f32, y: f32) -> f32 {
        let (cx, cy) = self.rect.center();
        sd_rounded_rect(
            (x - cx, y - cy),
            (self.rect.width * 0.5, self.rect.height * 0.5),
            self.corner_radius(),
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.distance(x, y) <= 0.0
    }
}

pub fn sd_rounded_rect(p: (f32, f32), half_size: (f32, f32), radius: f32) -> f32 {
    let qx = p.0.abs() - half_size.0 + radius;
    let qy = p.1.abs() - half_size.1 + radius;
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - radius
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    panels: Vec<OverlayPanel>,
    texts: Vec<OverlayText>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a panel on top of the existing ones. Returns `false` when the
    /// overlay is already full and the panel was dropped.
    pub fn push(&mut self, panel: OverlayPanel) -> bool {
        if self.panels.len() >= MAX_PANELS {
            tracing::warn!(id = panel.id, "overlay is full; dropping panel");
            return false;
        }
        self.panels.push(panel);
        true
    }

    pub fn push_text(&mut self, text: OverlayText) {
        self.texts.push(text);
    }

    pub fn panels(&self) -> &[OverlayPanel] {
        &self.panels
    }

    pub fn texts(&self) -> &[OverlayText] {
        &self.texts
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty() && self.texts.is_empty()
    }

    /// Id of the topmost interactive panel under the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<u32> {
        self.panels
            .iter()
            .rev()
            .find(|panel| panel.interactive && panel.contains(x, y))
            .map(|panel| panel.id)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct PanelUniform {
    rect: [f32; 4],
    fill: [f32; 4],
    fill_end: [f32; 4],
    border: [f32; 4],
    glow: [f32; 4],
    /// radius, border width, gradient flag, glow radius
    shape: [f32; 4],
}

impl From<&OverlayPanel> for PanelUniform {
    fn from(panel: &OverlayPanel) -> Self {
        let glow = panel.glow.unwrap_or(Glow {
            color: [0.0; 4],
            radius: 0.0,
        });
        Self {
            rect: [panel.rect.x, panel.rect.y, panel.rect.width, panel.rect.height],
            fill: panel.fill,
            fill_end: panel.fill_end.unwrap_or(panel.fill),
            border: panel.border,
            glow: glow.color,
            shape: [
                panel.corner_radius(),
                panel.border_width.max(0.0),
                if panel.fill_end.is_some() { 1.0 } else { 0.0 },
                glow.radius.max(0.0),
            ],
        }
    }
}

/// Host mirror of the `OverlayParams` block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct OverlayUniforms {
    /// logical width, logical height, scale factor, panel count
    viewport: [f32; 4],
    panels: [PanelUniform; MAX_PANELS],
}

impl OverlayUniforms {
    pub(crate) fn new(overlay: &Overlay, logical: (f32, f32), scale_factor: f32) -> Self {
        let mut uniforms = Self::zeroed();
        for (slot, panel) in uniforms.panels.iter_mut().zip(overlay.panels()) {
            *slot = PanelUniform::from(panel);
        }
        let count = overlay.panels().len().min(MAX_PANELS);
        uniforms.viewport = [logical.0, logical.1, scale_factor, count as f32];
        uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(id: u32, rect: Rect) -> OverlayPanel {
        OverlayPanel {
            radius: rect.height * 0.5,
            interactive: true,
            ..OverlayPanel::new(id, rect)
        }
    }

    #[test]
    fn rounded_corners_exclude_the_corner() {
        let pill = button(1, Rect::new(0.0, 0.0, 200.0, 60.0));
        assert!(pill.contains(100.0, 30.0));
        assert!(pill.contains(5.0, 30.0));
        assert!(!pill.contains(1.0, 1.0));
        assert!(!pill.contains(201.0, 30.0));
    }

    #[test]
    fn distance_is_negative_inside() {
        let panel = OverlayPanel::new(0, Rect::new(10.0, 10.0, 20.0, 20.0));
        assert!((panel.distance(20.0, 20.0) + 10.0).abs() < 1e-5);
        assert!((panel.distance(35.0, 20.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn hit_test_prefers_topmost_interactive_panel() {
        let mut overlay = Overlay::new();
        overlay.push(OverlayPanel::new(0, Rect::new(0.0, 0.0, 400.0, 400.0)));
        overlay.push(button(1, Rect::new(10.0, 10.0, 200.0, 60.0)));
        overlay.push(button(2, Rect::new(100.0, 10.0, 200.0, 60.0)));

        assert_eq!(overlay.hit_test(50.0, 40.0), Some(1));
        assert_eq!(overlay.hit_test(150.0, 40.0), Some(2));
        assert_eq!(overlay.hit_test(350.0, 350.0), None);
    }

    #[test]
    fn push_stops_at_capacity() {
        let mut overlay = Overlay::new();
        for id in 0..MAX_PANELS as u32 {
            assert!(overlay.push(OverlayPanel::new(id, Rect::default())));
        }
        assert!(!overlay.push(OverlayPanel::new(99, Rect::default())));
        assert_eq!(overlay.panels().len(), MAX_PANELS);
    }

    #[test]
    fn text_only_overlay_is_not_empty() {
        use crate::text::{FontWeight, TextStyle};

        let mut overlay = Overlay::new();
        assert!(overlay.is_empty());
        overlay.push_text(OverlayText {
            text: "WikiScrap UNESCO".into(),
            x: 0.0,
            y: 0.0,
            style: TextStyle::new(20.0, FontWeight::Semibold, [1.0; 4]),
        });
        assert!(!overlay.is_empty());
        assert!(overlay.panels().is_empty());
        assert_eq!(overlay.texts()[0].text, "WikiScrap UNESCO");
        assert_eq!(overlay.hit_test(0.0, 0.0), None);
    }

    #[test]
    fn uniform_block_matches_std140() {
        assert_eq!(std::mem::size_of::<PanelUniform>(), 96);
        assert_eq!(std::mem::size_of::<OverlayUniforms>(), 16 + 96 * MAX_PANELS);

        let mut overlay = Overlay::new();
        overlay.push(OverlayPanel {
            fill: [1.0, 1.0, 1.0, 1.0],
            fill_end: Some([0.0, 0.0, 1.0, 1.0]),
            ..button(3, Rect::new(0.0, 0.0, 100.0, 40.0))
        });
        let uniforms = OverlayUniforms::new(&overlay, (800.0, 600.0), 2.0);
        assert_eq!(uniforms.viewport, [800.0, 600.0, 2.0, 1.0]);
        assert_eq!(uniforms.panels[0].shape[0], 20.0);
        assert_eq!(uniforms.panels[0].shape[2], 1.0);
    }
}
