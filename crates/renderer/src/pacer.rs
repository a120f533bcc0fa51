use std::time::{Duration, Instant};

/// Slack that lets a redraw arriving a hair early still count.
const EARLY_SLACK: Duration = Duration::from_micros(250);

/// Accumulator-based frame limiter. Without a target rate every redraw
/// renders.
#[derive(Debug)]
pub(crate) struct FramePacer {
    target_interval: Option<Duration>,
    accumulator: Duration,
    last_tick: Option<Instant>,
}

impl FramePacer {
    pub(crate) fn new(target_fps: Option<f32>) -> Self {
        let target_interval = target_fps.and_then(|fps| {
            if fps.is_finite() && fps > 0.0 {
                Some(Duration::from_secs_f32(1.0 / fps))
            } else {
                None
            }
        });
        Self {
            target_interval,
            accumulator: Duration::ZERO,
            last_tick: None,
        }
    }

    pub(crate) fn target_interval(&self) -> Option<Duration> {
        self.target_interval
    }

    pub(crate) fn should_render(&mut self, now: Instant) -> bool {
        match (self.target_interval, self.last_tick) {
            (Some(interval), Some(last)) => {
                let delta = now.saturating_duration_since(last);
                self.last_tick = Some(now);
                self.accumulator = self.accumulator.saturating_add(delta);
                if self.accumulator + EARLY_SLACK < interval {
                    false
                } else {
                    // Never bank more than one frame of credit, so a stall is
                    // not followed by a burst.
                    self.accumulator = self.accumulator.saturating_sub(interval).min(interval);
                    true
                }
            }
            _ => {
                self.last_tick = Some(now);
                true
            }
        }
    }

    /// When the next frame is due, or None if it already is.
    pub(crate) fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let interval = self.target_interval?;
        let last = self.last_tick?;
        let owed = now.saturating_duration_since(last) + self.accumulator + EARLY_SLACK;
        if owed >= interval {
            None
        } else {
            Some(now + (interval - owed))
        }
    }
}
