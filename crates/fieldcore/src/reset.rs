use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetPhase {
    Settling,
    Stable,
}

/// Frame countdown that damps the simulation feedback after a discontinuity.
///
/// Attenuation is non-zero exactly while frames remain; the tick that brings
/// the counter to zero stores `0.0` rather than letting it fade out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftReset {
    remaining: u32,
    attenuation: f32,
}

impl SoftReset {
    /// Starts a new countdown, replacing any in progress.
    pub fn request(&mut self, frames: u32, attenuation: f32) {
        let attenuation = if attenuation.is_finite() {
            attenuation.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.remaining > 0 {
            debug!(
                superseded = self.remaining,
                frames, "soft reset replaces pending countdown"
            );
        }
        self.remaining = frames;
        self.attenuation = if frames == 0 { 0.0 } else { attenuation };
        debug!(frames, attenuation = self.attenuation, "soft reset requested");
    }

    pub fn tick(&mut self) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.attenuation = 0.0;
        }
    }

    pub fn attenuation(&self) -> f32 {
        self.attenuation
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn phase(&self) -> ResetPhase {
        if self.remaining > 0 {
            ResetPhase::Settling
        } else {
            ResetPhase::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_exact_zero() {
        let mut reset = SoftReset::default();
        reset.request(3, 0.15);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(reset.attenuation());
            reset.tick();
        }
        assert_eq!(seen, vec![0.15, 0.15, 0.15, 0.0, 0.0]);
        assert_eq!(reset.phase(), ResetPhase::Stable);
    }

    #[test]
    fn last_request_wins() {
        let mut reset = SoftReset::default();
        reset.request(10, 0.5);
        reset.tick();
        reset.request(2, 0.1);
        assert_eq!(reset.remaining(), 2);
        assert_eq!(reset.attenuation(), 0.1);
    }

    #[test]
    fn zero_frames_stays_stable() {
        let mut reset = SoftReset::default();
        reset.request(0, 0.9);
        assert_eq!(reset.phase(), ResetPhase::Stable);
        assert_eq!(reset.attenuation(), 0.0);
    }
}
