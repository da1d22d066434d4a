//! Host-agnostic animation state for the ColorBends background.
//!
//! [`ColorBends`] owns everything the shader needs between frames: the
//! elapsed clock, the eased pointer, the current canvas size and the derived
//! uniform block. The window runtime feeds it events and asks it for a fresh
//! [`ColorBendsUniforms`] before every draw.

use std::time::Instant;

use crate::palette::Rgb;
use crate::uniforms::ColorBendsUniforms;

/// Exponential pointer smoothing rate, in 1/seconds.
pub const POINTER_EASE_RATE: f32 = 8.0;

/// Visual knobs of the background. Colours are already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundConfig {
    /// Base rotation in degrees.
    pub rotation: f32,
    pub speed: f32,
    pub colors: Vec<Rgb>,
    pub transparent: bool,
    /// Additional rotation in degrees per second.
    pub auto_rotate: f32,
    pub scale: f32,
    pub frequency: f32,
    pub warp_strength: f32,
    pub mouse_influence: f32,
    pub parallax: f32,
    pub noise: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            rotation: 45.0,
            speed: 0.2,
            colors: Vec::new(),
            transparent: true,
            auto_rotate: 0.0,
            scale: 1.0,
            frequency: 1.0,
            warp_strength: 1.0,
            mouse_influence: 1.0,
            parallax: 0.5,
            noise: 0.1,
        }
    }
}

impl BackgroundConfig {
    /// Rotation angle in radians after `elapsed` seconds.
    pub fn angle_at(&self, elapsed: f32) -> f32 {
        (self.rotation + self.auto_rotate * elapsed).to_radians()
    }
}

/// Moves a current point towards a target by `min(1, dt * rate)` of the gap
/// each step, so it never overshoots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEasing {
    current: [f32; 2],
    target: [f32; 2],
    rate: f32,
}

impl Default for PointerEasing {
    fn default() -> Self {
        Self::new(POINTER_EASE_RATE)
    }
}

impl PointerEasing {
    pub fn new(rate: f32) -> Self {
        Self {
            current: [0.0, 0.0],
            target: [0.0, 0.0],
            rate,
        }
    }

    pub fn set_target(&mut self, target: [f32; 2]) {
        self.target = target;
    }

    pub fn target(&self) -> [f32; 2] {
        self.target
    }

    pub fn current(&self) -> [f32; 2] {
        self.current
    }

    /// Jumps straight to the target.
    pub fn settle(&mut self) {
        self.current = self.target;
    }

    pub fn step(&mut self, dt: f32) -> [f32; 2] {
        let amount = (dt.max(0.0) * self.rate).min(1.0);
        for axis in 0..2 {
            self.current[axis] += (self.target[axis] - self.current[axis]) * amount;
        }
        self.current
    }
}

/// Wall-clock frame timer. The first tick yields a zero delta.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationClock {
    last: Option<Instant>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick, never negative.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last = Some(now);
        delta
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// One mounted instance of the background.
#[derive(Debug, Clone)]
pub struct ColorBends {
    config: BackgroundConfig,
    uniforms: ColorBendsUniforms,
    pointer: PointerEasing,
    clock: AnimationClock,
    elapsed: f32,
}

impl ColorBends {
    pub fn new(config: BackgroundConfig, canvas: (u32, u32)) -> Self {
        let mut uniforms = ColorBendsUniforms::new(canvas.0, canvas.1);
        uniforms.apply_config(&config);
        let angle = config.angle_at(0.0);
        uniforms.set_frame(0.0, [angle.cos(), angle.sin()], [0.0, 0.0]);
        Self {
            config,
            uniforms,
            pointer: PointerEasing::default(),
            clock: AnimationClock::new(),
            elapsed: 0.0,
        }
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    pub fn uniforms(&self) -> &ColorBendsUniforms {
        &self.uniforms
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn pointer(&self) -> &PointerEasing {
        &self.pointer
    }

    /// Replaces the configuration; elapsed time and pointer state carry over.
    pub fn apply_config(&mut self, config: BackgroundConfig) {
        self.uniforms.apply_config(&config);
        self.config = config;
    }

    /// Ignores zero sizes; returns whether the canvas changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.uniforms.set_canvas(width, height)
    }

    /// Records a pointer position in canvas pixels (origin top-left). Only
    /// the target moves; the eased value catches up in [`Self::advance_by`].
    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        let [width, height] = self.uniforms.u_canvas;
        let nx = x / width.max(1.0) * 2.0 - 1.0;
        let ny = -(y / height.max(1.0) * 2.0 - 1.0);
        self.pointer.set_target([nx, ny]);
    }

    pub fn advance(&mut self, now: Instant) -> &ColorBendsUniforms {
        let dt = self.clock.tick(now);
        self.advance_by(dt)
    }

    pub fn advance_by(&mut self, dt: f32) -> &ColorBendsUniforms {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        let pointer = self.pointer.step(dt);
        self.write_frame(pointer);
        &self.uniforms
    }

    /// Evaluates the field at a fixed time with the pointer settled on its
    /// target. Used for still frames.
    pub fn seek(&mut self, seconds: f32) -> &ColorBendsUniforms {
        self.elapsed = seconds.max(0.0);
        self.clock.reset();
        self.pointer.settle();
        let pointer = self.pointer.current();
        self.write_frame(pointer);
        &self.uniforms
    }

    pub fn clear_color(&self) -> [f64; 4] {
        let alpha = if self.config.transparent { 0.0 } else { 1.0 };
        [0.0, 0.0, 0.0, alpha]
    }

    fn write_frame(&mut self, pointer: [f32; 2]) {
        let angle = self.config.angle_at(self.elapsed);
        self.uniforms
            .set_frame(self.elapsed, [angle.cos(), angle.sin()], pointer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn defaults_have_no_palette() {
        let bends = ColorBends::new(BackgroundConfig::default(), (800, 600));
        assert_eq!(bends.uniforms().u_color_count, 0);
        assert!(close(bends.uniforms().u_speed, 0.2));
        assert_eq!(bends.clear_color(), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn two_colours_transparent() {
        let config = BackgroundConfig {
            colors: vec![Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.0, 1.0, 0.0)],
            transparent: true,
            ..BackgroundConfig::default()
        };
        let bends = ColorBends::new(config, (800, 600));
        let uniforms = bends.uniforms();
        assert_eq!(uniforms.u_color_count, 2);
        assert_eq!(uniforms.color(0), Some([1.0, 0.0, 0.0]));
        assert_eq!(uniforms.color(1), Some([0.0, 1.0, 0.0]));
        assert_eq!(bends.clear_color()[3], 0.0);
    }

    #[test]
    fn opaque_clears_with_full_alpha() {
        let config = BackgroundConfig {
            transparent: false,
            ..BackgroundConfig::default()
        };
        let bends = ColorBends::new(config, (10, 10));
        assert_eq!(bends.clear_color(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn fixed_rotation_stays_put() {
        let config = BackgroundConfig {
            rotation: 90.0,
            auto_rotate: 0.0,
            ..BackgroundConfig::default()
        };
        let mut bends = ColorBends::new(config, (800, 600));
        for _ in 0..30 {
            let rot = bends.advance_by(1.0 / 60.0).u_rot;
            assert!(close(rot[0], 0.0), "{rot:?}");
            assert!(close(rot[1], 1.0), "{rot:?}");
        }
    }

    #[test]
    fn auto_rotate_accumulates_with_time() {
        let config = BackgroundConfig {
            rotation: 0.0,
            auto_rotate: 90.0,
            ..BackgroundConfig::default()
        };
        let mut bends = ColorBends::new(config, (800, 600));
        let rot = bends.advance_by(1.0).u_rot;
        assert!(close(rot[0], 0.0) && close(rot[1], 1.0), "{rot:?}");
        assert!(close(bends.uniforms().u_time, 1.0));
    }

    #[test]
    fn resize_ignores_zero_and_repeats() {
        let mut bends = ColorBends::new(BackgroundConfig::default(), (800, 600));
        assert!(!bends.resize(0, 600));
        assert!(bends.resize(1920, 1080));
        assert!(!bends.resize(1920, 1080));
        assert_eq!(bends.uniforms().u_canvas, [1920.0, 1080.0]);
    }

    #[test]
    fn pointer_maps_to_ndc_with_flipped_y() {
        let mut bends = ColorBends::new(BackgroundConfig::default(), (200, 100));
        bends.pointer_moved(0.0, 0.0);
        assert_eq!(bends.pointer().target(), [-1.0, 1.0]);
        bends.pointer_moved(200.0, 100.0);
        assert_eq!(bends.pointer().target(), [1.0, -1.0]);
        bends.pointer_moved(100.0, 50.0);
        assert_eq!(bends.pointer().target(), [0.0, 0.0]);
        assert_eq!(bends.pointer().current(), [0.0, 0.0]);
    }

    #[test]
    fn pointer_easing_contracts_without_overshoot() {
        let mut easing = PointerEasing::default();
        easing.set_target([1.0, -0.5]);
        let mut previous_gap = f32::MAX;
        for _ in 0..240 {
            let current = easing.step(1.0 / 60.0);
            assert!(current[0] <= 1.0 && current[1] >= -0.5);
            let gap = (1.0 - current[0]).abs() + (-0.5 - current[1]).abs();
            assert!(gap <= previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < 1e-3);
    }

    #[test]
    fn large_frame_gaps_snap_without_overshoot() {
        let mut easing = PointerEasing::default();
        easing.set_target([0.75, 0.25]);
        assert_eq!(easing.step(5.0), [0.75, 0.25]);
    }

    #[test]
    fn apply_config_keeps_clock_and_pointer() {
        let mut bends = ColorBends::new(BackgroundConfig::default(), (100, 100));
        bends.pointer_moved(100.0, 0.0);
        bends.advance_by(0.5);
        let pointer = bends.pointer().current();

        bends.apply_config(BackgroundConfig {
            speed: 1.5,
            colors: vec![Rgb::new(0.0, 0.0, 1.0)],
            ..BackgroundConfig::default()
        });
        assert!(close(bends.elapsed(), 0.5));
        assert_eq!(bends.pointer().current(), pointer);
        assert_eq!(bends.uniforms().u_color_count, 1);
        assert!(close(bends.uniforms().u_speed, 1.5));
    }

    #[test]
    fn advance_uses_wall_clock_deltas() {
        let mut bends = ColorBends::new(BackgroundConfig::default(), (100, 100));
        let start = Instant::now();
        bends.advance(start);
        assert_eq!(bends.elapsed(), 0.0);
        bends.advance(start + Duration::from_millis(250));
        assert!(close(bends.elapsed(), 0.25));
        bends.advance(start + Duration::from_millis(100));
        assert!(close(bends.elapsed(), 0.25));
    }

    #[test]
    fn seek_settles_pointer() {
        let mut bends = ColorBends::new(BackgroundConfig::default(), (100, 100));
        bends.pointer_moved(100.0, 100.0);
        let uniforms = *bends.seek(3.0);
        assert_eq!(uniforms.u_pointer, [1.0, -1.0]);
        assert!(close(uniforms.u_time, 3.0));
    }
}
