use std::time::{Duration, Instant};

use fieldconfig::Easing;

pub fn sample_curve(curve: Easing, t: f32) -> f32 {
    let clamped = t.clamp(0.0, 1.0);
    match curve {
        Easing::Linear => clamped,
        Easing::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
        Easing::EaseInOut => {
            if clamped < 0.5 {
                2.0 * clamped * clamped
            } else {
                -1.0 + (4.0 - 2.0 * clamped) * clamped
            }
        }
    }
}

/// Eases colour intensity between two values over a fixed duration.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTween {
    from: f32,
    to: f32,
    start: Instant,
    duration: Duration,
    curve: Easing,
}

impl IntensityTween {
    /// Returns `None` for a zero duration; callers jump straight to `to`.
    pub fn new(from: f32, to: f32, duration: Duration, curve: Easing, now: Instant) -> Option<Self> {
        if duration.is_zero() {
            None
        } else {
            Some(Self {
                from,
                to,
                start: now,
                duration,
                curve,
            })
        }
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn value_at(&self, now: Instant) -> (f32, bool) {
        let elapsed = now.saturating_duration_since(self.start);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32().max(f32::EPSILON);
        let mix = sample_curve(self.curve, progress);
        let value = self.from + (self.to - self.from) * mix;
        (value, progress >= 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curves_hit_endpoints() {
        for curve in [Easing::Linear, Easing::Smoothstep, Easing::EaseInOut] {
            assert!(sample_curve(curve, 0.0).abs() < 1e-6);
            assert!((sample_curve(curve, 1.0) - 1.0).abs() < 1e-6);
            assert!((sample_curve(curve, 0.5) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn ease_in_out_starts_slow() {
        assert!(sample_curve(Easing::EaseInOut, 0.25) < 0.25);
        assert!(sample_curve(Easing::EaseInOut, 0.75) > 0.75);
    }

    #[test]
    fn tween_reaches_target() {
        let start = Instant::now();
        let tween =
            IntensityTween::new(1.0, 1.5, Duration::from_millis(100), Easing::Linear, start).unwrap();
        let (mid, done) = tween.value_at(start + Duration::from_millis(50));
        assert!((mid - 1.25).abs() < 0.01);
        assert!(!done);
        let (end, done) = tween.value_at(start + Duration::from_millis(150));
        assert_eq!(end, 1.5);
        assert!(done);
    }

    #[test]
    fn zero_duration_has_no_tween() {
        assert!(IntensityTween::new(1.0, 2.0, Duration::ZERO, Easing::Linear, Instant::now()).is_none());
    }
}
