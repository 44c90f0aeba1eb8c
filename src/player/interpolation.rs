//! Smoothing of position corrections
//!
//! A correction is spread over a time window. Each step applies the slice of
//! the error that corresponds to the progress made since the previous step,
//! on top of wherever the entity currently is.

use crate::util::Vec3;

/// Past this distance from the target the entity is placed directly on it
pub const SNAP_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionInterpolator {
    target: Vec3,
    error: Vec3,
    start_time: u64,
    /// `None` while no interpolation is running
    finish_time: Option<u64>,
    last_alpha: f32,
}

impl PositionInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.finish_time.is_some()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Start moving from `current` to `target` over `delay_ms`
    pub fn begin(&mut self, current: Vec3, target: Vec3, delay_ms: u64, now: u64) {
        self.target = target;
        self.error = target - current;
        self.start_time = now;
        self.finish_time = Some(now.saturating_add(delay_ms));
        self.last_alpha = 0.0;
    }

    /// Position the entity should be moved to this tick, if any
    pub fn step(&mut self, current: Vec3, now: u64) -> Option<Vec3> {
        let finish_time = self.finish_time?;

        if current.distance(self.target) > SNAP_DISTANCE {
            self.clear();
            return Some(self.target);
        }

        let alpha = if finish_time <= self.start_time {
            1.0
        } else {
            let elapsed = now.saturating_sub(self.start_time) as f32;
            let window = (finish_time - self.start_time) as f32;
            (elapsed / window).clamp(0.0, 1.0)
        };

        let slice = alpha - self.last_alpha;
        self.last_alpha = alpha;

        if alpha >= 1.0 {
            self.clear();
        }

        Some(current + self.error * slice)
    }

    pub fn clear(&mut self) {
        self.finish_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn reaches_target_at_deadline() {
        let mut interp = PositionInterpolator::new();
        let mut pos = Vec3::ZERO;
        let target = Vec3::new(3.0, 1.0, 0.0);
        interp.begin(pos, target, 1000, 100);

        for now in (200..=1100).step_by(100) {
            if let Some(next) = interp.step(pos, now) {
                pos = next;
            }
        }

        assert!(approx(pos, target));
        assert!(!interp.is_active());
    }

    #[test]
    fn halfway_applies_half_the_error() {
        let mut interp = PositionInterpolator::new();
        interp.begin(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), 1000, 0);
        let pos = interp.step(Vec3::ZERO, 500);
        assert_eq!(pos, Some(Vec3::new(2.0, 0.0, 0.0)));
        assert!(interp.is_active());
    }

    #[test]
    fn large_error_snaps() {
        let mut interp = PositionInterpolator::new();
        let target = Vec3::new(5.5, 0.0, 0.0);
        interp.begin(Vec3::ZERO, target, 1000, 0);
        assert_eq!(interp.step(Vec3::ZERO, 10), Some(target));
        assert!(!interp.is_active());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut interp = PositionInterpolator::new();
        interp.begin(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 100, 0);
        interp.clear();
        let once = interp.clone();
        interp.clear();
        assert_eq!(interp, once);
        assert_eq!(interp.step(Vec3::ZERO, 50), None);
    }

    #[test]
    fn zero_delay_completes_immediately() {
        let mut interp = PositionInterpolator::new();
        let target = Vec3::new(1.0, 0.0, 0.0);
        interp.begin(Vec3::ZERO, target, 0, 10);
        assert_eq!(interp.step(Vec3::ZERO, 10), Some(target));
        assert!(!interp.is_active());
    }

    #[test]
    fn zero_window_at_clock_origin_still_applies() {
        let mut interp = PositionInterpolator::new();
        let target = Vec3::new(0.0, 2.0, 0.0);
        interp.begin(Vec3::ZERO, target, 0, 0);
        assert!(interp.is_active());
        assert_eq!(interp.step(Vec3::ZERO, 0), Some(target));
        assert!(!interp.is_active());
    }
}
