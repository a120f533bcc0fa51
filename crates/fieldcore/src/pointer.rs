use std::time::{Duration, Instant};

use tracing::trace;

/// Movement older than this no longer excites the field.
pub const POINTER_TIMEOUT: Duration = Duration::from_millis(120);

const SPEED_FACTOR_MIN: f32 = 0.8;
const SPEED_FACTOR_MAX: f32 = 1.2;
const SPEED_GAIN: f32 = 0.003;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPolicy {
    /// Only a mouse cursor drives the brush.
    #[default]
    MouseOnly,
    Any,
}

impl PointerPolicy {
    pub fn from_mouse_only(mouse_only: bool) -> Self {
        if mouse_only {
            PointerPolicy::MouseOnly
        } else {
            PointerPolicy::Any
        }
    }

    fn accepts(self, kind: PointerKind) -> bool {
        match self {
            PointerPolicy::MouseOnly => kind == PointerKind::Mouse,
            PointerPolicy::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Active,
    Idle,
}

/// What the simulation sees of the pointer for one frame. Positions are in
/// logical pixels with the origin at the bottom-left corner; both are zero
/// while idle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub position: [f32; 2],
    pub previous: [f32; 2],
    pub active: bool,
    pub speed_factor: f32,
}

impl PointerSample {
    pub const IDLE: PointerSample = PointerSample {
        position: [0.0, 0.0],
        previous: [0.0, 0.0],
        active: false,
        speed_factor: 1.0,
    };
}

/// Brush size multiplier for a pointer that moved `distance` logical pixels
/// since its previous event.
pub fn speed_factor(distance: f32) -> f32 {
    if !distance.is_finite() {
        return SPEED_FACTOR_MAX;
    }
    (SPEED_FACTOR_MIN + distance * SPEED_GAIN).clamp(SPEED_FACTOR_MIN, SPEED_FACTOR_MAX)
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    policy: PointerPolicy,
    timeout: Duration,
    phase: PointerPhase,
    position: Option<[f32; 2]>,
    previous: [f32; 2],
    last_move: Option<Instant>,
    speed_factor: f32,
}

impl PointerTracker {
    pub fn new(policy: PointerPolicy) -> Self {
        Self::with_timeout(policy, POINTER_TIMEOUT)
    }

    pub fn with_timeout(policy: PointerPolicy, timeout: Duration) -> Self {
        Self {
            policy,
            timeout,
            phase: PointerPhase::Idle,
            position: None,
            previous: [0.0, 0.0],
            last_move: None,
            speed_factor: 1.0,
        }
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn policy(&self) -> PointerPolicy {
        self.policy
    }

    /// Records a movement. Returns `false` when the event was filtered out by
    /// the pointer policy.
    pub fn on_move(&mut self, position: [f32; 2], kind: PointerKind, now: Instant) -> bool {
        if !self.policy.accepts(kind) {
            trace!(?kind, "pointer event filtered by policy");
            return false;
        }

        let previous = self.position.unwrap_or(position);
        let dx = position[0] - previous[0];
        let dy = position[1] - previous[1];
        self.speed_factor = speed_factor(dx.hypot(dy));
        self.previous = previous;
        self.position = Some(position);
        self.last_move = Some(now);

        if self.phase == PointerPhase::Idle {
            trace!(x = position[0], y = position[1], "pointer active");
            self.phase = PointerPhase::Active;
        }
        true
    }

    pub fn on_leave(&mut self) {
        if self.phase == PointerPhase::Active {
            trace!("pointer left");
        }
        self.clear();
    }

    /// Applies the inactivity timeout. Returns `true` on the tick the pointer
    /// transitions to idle.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.phase != PointerPhase::Active {
            return false;
        }
        let stale = self
            .last_move
            .map(|at| now.saturating_duration_since(at) >= self.timeout)
            .unwrap_or(true);
        if stale {
            trace!("pointer idle");
            self.clear();
        }
        stale
    }

    pub fn sample(&self) -> PointerSample {
        match (self.phase, self.position) {
            (PointerPhase::Active, Some(position)) => PointerSample {
                position,
                previous: self.previous,
                active: true,
                speed_factor: self.speed_factor,
            },
            _ => PointerSample::IDLE,
        }
    }

    fn clear(&mut self) {
        self.phase = PointerPhase::Idle;
        self.position = None;
        self.previous = [0.0, 0.0];
        self.last_move = None;
        self.speed_factor = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_anchors_previous_to_current() {
        let mut tracker = PointerTracker::new(PointerPolicy::MouseOnly);
        let now = Instant::now();
        assert!(tracker.on_move([10.0, 20.0], PointerKind::Mouse, now));
        let sample = tracker.sample();
        assert!(sample.active);
        assert_eq!(sample.previous, [10.0, 20.0]);
        assert_eq!(sample.speed_factor, SPEED_FACTOR_MIN);
    }

    #[test]
    fn speed_factor_is_bounded() {
        assert_eq!(speed_factor(0.0), 0.8);
        assert!((speed_factor(100.0) - 1.1).abs() < 1e-6);
        assert_eq!(speed_factor(10_000.0), 1.2);
        assert_eq!(speed_factor(f32::INFINITY), 1.2);
    }

    #[test]
    fn goes_idle_after_timeout() {
        let mut tracker = PointerTracker::new(PointerPolicy::MouseOnly);
        let start = Instant::now();
        tracker.on_move([1.0, 1.0], PointerKind::Mouse, start);
        assert!(!tracker.refresh(start + Duration::from_millis(119)));
        assert_eq!(tracker.phase(), PointerPhase::Active);
        assert!(tracker.refresh(start + Duration::from_millis(120)));
        assert_eq!(tracker.sample(), PointerSample::IDLE);
    }

    #[test]
    fn leave_clears_position() {
        let mut tracker = PointerTracker::new(PointerPolicy::Any);
        let now = Instant::now();
        tracker.on_move([5.0, 5.0], PointerKind::Mouse, now);
        tracker.on_move([50.0, 5.0], PointerKind::Mouse, now);
        tracker.on_leave();
        assert_eq!(tracker.phase(), PointerPhase::Idle);
        assert_eq!(tracker.sample(), PointerSample::IDLE);

        tracker.on_move([80.0, 80.0], PointerKind::Mouse, now);
        assert_eq!(tracker.sample().previous, [80.0, 80.0]);
    }

    #[test]
    fn mouse_only_policy_drops_touch() {
        let mut tracker = PointerTracker::new(PointerPolicy::MouseOnly);
        assert!(!tracker.on_move([1.0, 1.0], PointerKind::Touch, Instant::now()));
        assert_eq!(tracker.phase(), PointerPhase::Idle);

        let mut any = PointerTracker::new(PointerPolicy::Any);
        assert!(any.on_move([1.0, 1.0], PointerKind::Pen, Instant::now()));
    }

    #[test]
    fn consecutive_moves_track_previous_event() {
        let mut tracker = PointerTracker::new(PointerPolicy::MouseOnly);
        let now = Instant::now();
        tracker.on_move([0.0, 0.0], PointerKind::Mouse, now);
        tracker.on_move([30.0, 40.0], PointerKind::Mouse, now);
        let sample = tracker.sample();
        assert_eq!(sample.previous, [0.0, 0.0]);
        assert_eq!(sample.position, [30.0, 40.0]);
        assert!((sample.speed_factor - 0.95).abs() < 1e-6);
    }
}
