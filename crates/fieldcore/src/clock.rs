use std::time::Instant;

/// Clock values handed to both passes for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockSample {
    pub time: f32,
    pub delta: f32,
    pub frame: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    origin: Option<Instant>,
    last: Option<Instant>,
    frame: u64,
    sample: ClockSample,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to `now`. The first call defines time zero; instants that go
    /// backwards are treated as no elapsed time.
    pub fn advance(&mut self, now: Instant) -> ClockSample {
        let origin = *self.origin.get_or_insert(now);
        let delta = self
            .last
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        let time = now
            .saturating_duration_since(origin)
            .as_secs_f32()
            .max(self.sample.time);
        self.last = Some(now);
        self.sample = ClockSample {
            time,
            delta,
            frame: self.frame,
        };
        self.frame += 1;
        self.sample
    }

    pub fn sample(&self) -> ClockSample {
        self.sample
    }

    /// Number of frames advanced so far.
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn counts_frames_from_zero() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        let first = clock.advance(start);
        assert_eq!(first.frame, 0);
        assert_eq!(first.time, 0.0);
        let second = clock.advance(start + Duration::from_millis(16));
        assert_eq!(second.frame, 1);
        assert!((second.delta - 0.016).abs() < 1e-4);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn time_never_runs_backwards() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        clock.advance(start + Duration::from_millis(50));
        let later = clock.advance(start + Duration::from_millis(100));
        let earlier = clock.advance(start + Duration::from_millis(10));
        assert!(earlier.time >= later.time);
        assert_eq!(earlier.delta, 0.0);
    }
}
