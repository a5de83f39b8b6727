use bevy::math::curve::{Curve, EaseFunction, EasingCurve};

use super::CameraPose;

pub type FlyToCallback = Box<dyn FnOnce(&CameraPose) + Send + Sync>;

/// A time-bounded interpolation from one pose to another.
pub struct FlyTo {
    start: CameraPose,
    target: CameraPose,
    duration: f32,
    elapsed: f32,
    on_complete: Option<FlyToCallback>,
}

impl std::fmt::Debug for FlyTo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlyTo")
            .field("start", &self.start)
            .field("target", &self.target)
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl FlyTo {
    pub fn new(
        start: CameraPose,
        target: CameraPose,
        duration: f32,
        on_complete: Option<FlyToCallback>,
    ) -> Self {
        Self {
            start,
            target,
            duration: duration.max(0.0),
            elapsed: 0.0,
            on_complete,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Advances the clock and returns the interpolated pose plus whether the
    /// flight has reached its target.
    pub fn advance(&mut self, dt: f32) -> (CameraPose, bool) {
        self.elapsed += dt.max(0.0);
        let t = self.progress();
        if t >= 1.0 {
            return (self.target, true);
        }
        let eased = ease_in_out(t);
        let pose = CameraPose {
            position: self.start.position.lerp(self.target.position, eased),
            look_at: self.start.look_at.lerp(self.target.look_at, eased),
        };
        (pose, false)
    }

    pub fn finish(mut self, pose: &CameraPose) {
        if let Some(callback) = self.on_complete.take() {
            callback(pose);
        }
    }
}

pub fn ease_in_out(t: f32) -> f32 {
    EasingCurve::new(0.0, 1.0, EaseFunction::CubicInOut).sample_clamped(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec3;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn pose(x: f32) -> CameraPose {
        CameraPose {
            position: Vec3::new(x, 10.0, 0.0),
            look_at: Vec3::new(x, 0.0, 0.0),
        }
    }

    #[test]
    fn easing_is_symmetric_and_bounded() {
        assert!(ease_in_out(0.0).abs() < 1e-6);
        assert!((ease_in_out(1.0) - 1.0).abs() < 1e-6);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-4);
        assert!(ease_in_out(0.25) < 0.25);
        assert!(ease_in_out(0.75) > 0.75);
    }

    #[test]
    fn reaches_target_after_duration() {
        let mut fly = FlyTo::new(pose(0.0), pose(10.0), 2.0, None);
        let (mid, done) = fly.advance(1.0);
        assert!(!done);
        assert!((mid.position.x - 5.0).abs() < 1e-3);
        let (end, done) = fly.advance(1.5);
        assert!(done);
        assert_eq!(end, pose(10.0));
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut fly = FlyTo::new(pose(0.0), pose(3.0), 0.0, None);
        let (end, done) = fly.advance(0.0);
        assert!(done);
        assert_eq!(end.position.x, 3.0);
    }

    #[test]
    fn finish_runs_callback_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let fly = FlyTo::new(
            pose(0.0),
            pose(1.0),
            1.0,
            Some(Box::new(move |_: &CameraPose| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        );
        fly.finish(&pose(1.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
