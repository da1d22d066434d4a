use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Redraw continuously, optionally capped to a frame rate.
    Animate {
        /// Optional frames-per-second cap; `None` follows the display's vsync.
        target_fps: Option<f32>,
    },
    /// Evaluate the background at a fixed timestamp and redraw only when the
    /// configuration or the surface changes.
    Still {
        /// Timestamp to evaluate the shader at (seconds).
        time: f32,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

impl RenderPolicy {
    fn frame_interval(&self) -> Option<Duration> {
        match self {
            RenderPolicy::Animate {
                target_fps: Some(fps),
            } if fps.is_finite() && *fps > 0.0 => {
                Some(Duration::from_secs_f64(1.0 / f64::from(*fps)))
            }
            _ => None,
        }
    }
}

/// Decides when the window should issue its next redraw.
///
/// Once [`FrameScheduler::cancel`] has been called no frame is ever ready
/// again, so nothing is drawn after teardown starts.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    policy: RenderPolicy,
    interval: Option<Duration>,
    last_frame: Option<Instant>,
    still_pending: bool,
    cancelled: bool,
}

impl FrameScheduler {
    pub fn new(policy: RenderPolicy) -> Self {
        let interval = policy.frame_interval();
        Self {
            policy,
            interval,
            last_frame: None,
            still_pending: true,
            cancelled: false,
        }
    }

    pub fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: RenderPolicy) {
        if self.policy != policy {
            *self = Self {
                cancelled: self.cancelled,
                ..Self::new(policy)
            };
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        if self.cancelled {
            return false;
        }
        match self.policy {
            RenderPolicy::Still { .. } => self.still_pending,
            RenderPolicy::Animate { .. } => match (self.interval, self.last_frame) {
                (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
                _ => true,
            },
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.cancelled {
            return None;
        }
        match self.policy {
            RenderPolicy::Still { .. } => None,
            RenderPolicy::Animate { .. } => {
                let interval = self.interval?;
                self.last_frame.map(|last| last + interval)
            }
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.still_pending = false;
    }

    /// Requests a redraw for still frames after a resize or configuration
    /// change. Animated policies redraw anyway.
    pub fn invalidate(&mut self) {
        self.still_pending = true;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_animation_is_always_ready() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::default());
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn capped_animation_waits_for_interval() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(10.0),
        });
        let start = Instant::now();
        assert!(scheduler.ready_for_frame(start));
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(100)));
        assert_eq!(
            scheduler.next_deadline(),
            Some(start + Duration::from_millis(100))
        );
    }

    #[test]
    fn zero_fps_is_uncapped() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(0.0),
        });
        let now = Instant::now();
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
    }

    #[test]
    fn still_renders_once_until_invalidated() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Still { time: 2.0 });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(!scheduler.ready_for_frame(now + Duration::from_secs(5)));
        scheduler.invalidate();
        assert!(scheduler.ready_for_frame(now));
    }

    #[test]
    fn cancelled_scheduler_never_fires() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(60.0),
        });
        let now = Instant::now();
        scheduler.mark_rendered(now);
        scheduler.cancel();
        scheduler.invalidate();
        scheduler.set_policy(RenderPolicy::Still { time: 0.0 });
        assert!(scheduler.is_cancelled());
        assert!(!scheduler.ready_for_frame(now + Duration::from_secs(1)));
        assert_eq!(scheduler.next_deadline(), None);
    }
}
