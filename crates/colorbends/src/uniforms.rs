use bytemuck::{Pod, Zeroable};

use crate::background::BackgroundConfig;
use crate::palette::MAX_COLORS;

/// Host mirror of the `ColorBendsParams` std140 block declared in
/// [`crate::compile`]. Every member is four bytes wide and the colour array
/// uses a vec4 stride, so `repr(C)` already matches std140 without padding
/// fields.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorBendsUniforms {
    pub u_canvas: [f32; 2],
    pub u_rot: [f32; 2],
    pub u_pointer: [f32; 2],
    pub u_time: f32,
    pub u_speed: f32,
    pub u_scale: f32,
    pub u_frequency: f32,
    pub u_warp_strength: f32,
    pub u_mouse_influence: f32,
    pub u_parallax: f32,
    pub u_noise: f32,
    pub u_color_count: i32,
    pub u_transparent: i32,
    pub u_colors: [[f32; 4]; MAX_COLORS],
}

impl ColorBendsUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.u_canvas = [width.max(1) as f32, height.max(1) as f32];
        uniforms.u_rot = [1.0, 0.0];
        uniforms
    }

    /// Writes the values that only change when the configuration does.
    pub fn apply_config(&mut self, config: &BackgroundConfig) {
        self.u_speed = config.speed;
        self.u_scale = config.scale;
        self.u_frequency = config.frequency;
        self.u_warp_strength = config.warp_strength;
        self.u_mouse_influence = config.mouse_influence;
        self.u_parallax = config.parallax;
        self.u_noise = config.noise;
        self.u_transparent = i32::from(config.transparent);

        let count = config.colors.len().min(MAX_COLORS);
        self.u_color_count = count as i32;
        self.u_colors = [[0.0; 4]; MAX_COLORS];
        for (slot, color) in self.u_colors.iter_mut().zip(&config.colors) {
            *slot = [color.r, color.g, color.b, 0.0];
        }
    }

    /// Returns `true` when the stored canvas size actually changed.
    pub fn set_canvas(&mut self, width: u32, height: u32) -> bool {
        let canvas = [width as f32, height as f32];
        if self.u_canvas == canvas {
            return false;
        }
        self.u_canvas = canvas;
        true
    }

    pub fn set_frame(&mut self, time: f32, rot: [f32; 2], pointer: [f32; 2]) {
        self.u_time = time;
        self.u_rot = rot;
        self.u_pointer = pointer;
    }

    pub fn color(&self, index: usize) -> Option<[f32; 3]> {
        self.u_colors
            .get(index)
            .map(|slot| [slot[0], slot[1], slot[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb;
    use std::mem::size_of;

    #[test]
    fn uniform_layout_matches_std140() {
        let uniforms = ColorBendsUniforms::new(1, 1);
        let base = &uniforms as *const _ as usize;
        let offset = |field: usize| field - base;

        assert_eq!(size_of::<ColorBendsUniforms>(), 192);
        assert_eq!(offset(&uniforms.u_canvas as *const _ as usize), 0);
        assert_eq!(offset(&uniforms.u_rot as *const _ as usize), 8);
        assert_eq!(offset(&uniforms.u_pointer as *const _ as usize), 16);
        assert_eq!(offset(&uniforms.u_time as *const _ as usize), 24);
        assert_eq!(offset(&uniforms.u_speed as *const _ as usize), 28);
        assert_eq!(offset(&uniforms.u_noise as *const _ as usize), 52);
        assert_eq!(offset(&uniforms.u_color_count as *const _ as usize), 56);
        assert_eq!(offset(&uniforms.u_transparent as *const _ as usize), 60);
        assert_eq!(offset(&uniforms.u_colors as *const _ as usize), 64);
    }

    #[test]
    fn color_count_clamps_and_pads() {
        let mut config = BackgroundConfig {
            colors: vec![Rgb::new(1.0, 0.5, 0.25); 11],
            ..BackgroundConfig::default()
        };
        let mut uniforms = ColorBendsUniforms::new(640, 480);
        uniforms.apply_config(&config);
        assert_eq!(uniforms.u_color_count, 8);

        config.colors.truncate(3);
        uniforms.apply_config(&config);
        assert_eq!(uniforms.u_color_count, 3);
        assert_eq!(uniforms.color(2), Some([1.0, 0.5, 0.25]));
        for index in 3..MAX_COLORS {
            assert_eq!(uniforms.color(index), Some([0.0, 0.0, 0.0]));
        }
    }

    #[test]
    fn set_canvas_reports_changes_once() {
        let mut uniforms = ColorBendsUniforms::new(800, 600);
        assert!(!uniforms.set_canvas(800, 600));
        assert!(uniforms.set_canvas(1024, 768));
        assert!(!uniforms.set_canvas(1024, 768));
        assert_eq!(uniforms.u_canvas, [1024.0, 768.0]);
    }

    #[test]
    fn transparent_flag_is_an_int() {
        let mut uniforms = ColorBendsUniforms::new(1, 1);
        uniforms.apply_config(&BackgroundConfig::default());
        assert_eq!(uniforms.u_transparent, 1);
        uniforms.apply_config(&BackgroundConfig {
            transparent: false,
            ..BackgroundConfig::default()
        });
        assert_eq!(uniforms.u_transparent, 0);
    }
}
