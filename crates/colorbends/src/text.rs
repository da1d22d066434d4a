//! Overlay text.
//!
//! Labels are shaped with cosmic-text and rasterised on the CPU into a
//! premultiplied RGBA layer the size of the surface. The layer is only
//! rebuilt when the overlay is, and a full-screen pass composites it above
//! the panels.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};

use crate::overlay::Rgba;

/// CSS `line-height: normal` for a sans-serif face, in ems.
pub const LINE_HEIGHT: f32 = 1.2;

/// Average semibold advance in ems, used when no font face is installed.
const FALLBACK_ADVANCE: f32 = 0.56;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Semibold,
    Bold,
}

impl FontWeight {
    fn weight(self) -> Weight {
        match self {
            FontWeight::Regular => Weight::NORMAL,
            FontWeight::Semibold => Weight::SEMIBOLD,
            FontWeight::Bold => Weight::BOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in logical pixels.
    pub size: f32,
    pub weight: FontWeight,
    pub color: Rgba,
}

impl TextStyle {
    pub const fn new(size: f32, weight: FontWeight, color: Rgba) -> Self {
        Self {
            size,
            weight,
            color,
        }
    }

    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT
    }

    fn attrs(&self) -> Attrs<'static> {
        Attrs::new()
            .family(Family::SansSerif)
            .weight(self.weight.weight())
    }

    fn color(&self) -> Color {
        let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::rgba(
            channel(self.color[0]),
            channel(self.color[1]),
            channel(self.color[2]),
            channel(self.color[3]),
        )
    }
}

/// A single line of text whose line box has its top-left corner at `(x, y)`
/// in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
}

/// RGBA8 pixels with premultiplied alpha, row-major from the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextLayer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextLayer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Source-over blend of one straight-alpha sample.
    fn blend(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let alpha = u32::from(color.a());
        if alpha == 0 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let pixel = &mut self.pixels[offset..offset + 4];
        let inverse = 255 - alpha;
        let source = [color.r(), color.g(), color.b()];
        for (dst, src) in pixel.iter_mut().zip(source) {
            let premultiplied = u32::from(src) * alpha / 255;
            *dst = (premultiplied + u32::from(*dst) * inverse / 255).min(255) as u8;
        }
        pixel[3] = (alpha + u32::from(pixel[3]) * inverse / 255).min(255) as u8;
    }
}

struct Fonts {
    system: FontSystem,
    swash: SwashCache,
}

impl Fonts {
    fn has_faces(&self) -> bool {
        !self.system.db().is_empty()
    }

    fn shape(&mut self, text: &str, style: &TextStyle, scale: f32) -> Option<Buffer> {
        let size = style.size * scale;
        if text.is_empty() || size.is_nan() || size <= 0.0 {
            return None;
        }
        let mut buffer = Buffer::new(&mut self.system, Metrics::new(size, size * LINE_HEIGHT));
        buffer.set_size(&mut self.system, None, None);
        buffer.set_text(&mut self.system, text, style.attrs(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.system, false);
        Some(buffer)
    }
}

/// Font database shared by layout and rasterisation. Clones share the same
/// loaded faces and glyph cache.
#[derive(Clone)]
pub struct TextEngine {
    fonts: Arc<Mutex<Fonts>>,
}

impl fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextEngine").finish_non_exhaustive()
    }
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    /// Loads the system font collection.
    pub fn new() -> Self {
        let system = FontSystem::new();
        let faces = system.db().len();
        if faces == 0 {
            tracing::warn!("no system fonts found; overlay text will not be drawn");
        } else {
            tracing::debug!(faces, "font collection loaded");
        }
        Self {
            fonts: Arc::new(Mutex::new(Fonts {
                system,
                swash: SwashCache::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Fonts> {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance width of a single line in logical pixels. Hosts without any
    /// font fall back to an average glyph advance so layout stays stable.
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        let mut fonts = self.lock();
        if !fonts.has_faces() {
            return text.chars().count() as f32 * style.size.max(0.0) * FALLBACK_ADVANCE;
        }
        fonts
            .shape(text, style, 1.0)
            .map(|buffer| {
                buffer
                    .layout_runs()
                    .map(|run| run.line_w)
                    .fold(0.0, f32::max)
            })
            .unwrap_or(0.0)
    }

    /// Draws every text item into a `width` x `height` physical-pixel layer.
    pub(crate) fn rasterize(
        &self,
        texts: &[OverlayText],
        width: u32,
        height: u32,
        scale: f32,
    ) -> TextLayer {
        let mut layer = TextLayer::new(width, height);
        let mut guard = self.lock();
        let fonts = &mut *guard;
        if !fonts.has_faces() {
            return layer;
        }
        for item in texts {
            let Some(buffer) = fonts.shape(&item.text, &item.style, scale) else {
                continue;
            };
            let origin_x = (item.x * scale).round() as i32;
            let origin_y = (item.y * scale).round() as i32;
            buffer.draw(
                &mut fonts.system,
                &mut fonts.swash,
                item.style.color(),
                |x, y, w, h, color| {
                    for dy in 0..h as i32 {
                        for dx in 0..w as i32 {
                            layer.blend(origin_x + x + dx, origin_y + y + dy, color);
                        }
                    }
                },
            );
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn longer_text_measures_wider() {
        let engine = TextEngine::new();
        let style = TextStyle::new(20.0, FontWeight::Semibold, WHITE);
        let short = engine.measure("Carte", &style);
        let long = engine.measure("Carte des sites", &style);
        assert!(short > 0.0);
        assert!(long > short);
        assert_eq!(engine.measure("", &style), 0.0);
    }

    #[test]
    fn measurement_scales_with_font_size() {
        let engine = TextEngine::new();
        let small = engine.measure("UNESCO", &TextStyle::new(20.0, FontWeight::Bold, WHITE));
        let large = engine.measure("UNESCO", &TextStyle::new(160.0, FontWeight::Bold, WHITE));
        assert!(large > small * 4.0);
    }

    #[test]
    fn blend_premultiplies_and_clips() {
        let mut layer = TextLayer::new(2, 1);
        layer.blend(0, 0, Color::rgba(255, 0, 0, 128));
        layer.blend(5, 0, Color::rgba(255, 255, 255, 255));
        layer.blend(-1, 0, Color::rgba(255, 255, 255, 255));
        assert_eq!(&layer.pixels[0..4], &[128, 0, 0, 128]);
        assert_eq!(&layer.pixels[4..8], &[0, 0, 0, 0]);

        layer.blend(0, 0, Color::rgba(0, 0, 255, 255));
        assert_eq!(&layer.pixels[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn rasterize_covers_text_origin_only() {
        let engine = TextEngine::new();
        let texts = [OverlayText {
            text: "Sites UNESCO".into(),
            x: 10.0,
            y: 10.0,
            style: TextStyle::new(24.0, FontWeight::Bold, WHITE),
        }];
        let layer = engine.rasterize(&texts, 320, 80, 1.0);
        assert_eq!(layer.pixels.len(), 320 * 80 * 4);

        // Nothing is drawn above the line box.
        let first_rows = &layer.pixels[..320 * 4 * 10];
        assert!(first_rows.iter().all(|&byte| byte == 0));
        if engine.lock().has_faces() {
            assert!(layer.pixels.chunks(4).any(|pixel| pixel[3] > 0));
        }
    }
}
