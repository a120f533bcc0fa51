use std::time::{Duration, Instant};

use fieldconfig::{Easing, FieldConfig};
use tracing::{debug, warn};

use crate::clock::{ClockSample, FrameClock};
use crate::command::{ParamCommand, ParamInbox, HIGHLIGHT_MAX, HIGHLIGHT_MIN};
use crate::kernel::{DisplayInputs, FieldKernel, SimulationInputs};
use crate::params::{ParamId, ParamValue, ParameterStore};
use crate::pointer::{PointerKind, PointerPolicy, PointerTracker, POINTER_TIMEOUT};
use crate::reset::SoftReset;
use crate::targets::{ResizeOutcome, ResizeRequest, Slot, SurfaceTargets, TargetAllocator};
use crate::tween::IntensityTween;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerOptions {
    pub pointer_policy: PointerPolicy,
    pub pointer_timeout: Duration,
    /// Request a soft reset after every applied resize, even one that kept
    /// the targets.
    pub reset_on_resize: bool,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            pointer_policy: PointerPolicy::MouseOnly,
            pointer_timeout: POINTER_TIMEOUT,
            reset_on_resize: true,
        }
    }
}

impl SchedulerOptions {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            pointer_policy: PointerPolicy::from_mouse_only(config.pointer.mouse_only),
            pointer_timeout: POINTER_TIMEOUT,
            reset_on_resize: config.soft_reset.on_resize,
        }
    }
}

/// Trace of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub clock: ClockSample,
    pub pointer_active: bool,
    /// Feedback multiplier handed to the simulation pass.
    pub decay: f32,
    pub brush_size: f32,
    /// Soft-reset attenuation the simulation pass saw.
    pub soft_reset: f32,
    pub written: Slot,
    pub displayed: Slot,
    pub resized: Option<ResizeOutcome>,
    pub revision: u64,
}

/// Runs simulate then display once per refresh and owns everything they read.
pub struct FrameScheduler<T> {
    params: ParameterStore,
    inbox: Option<ParamInbox>,
    pointer: PointerTracker,
    reset: SoftReset,
    clock: FrameClock,
    targets: SurfaceTargets<T>,
    pending_resize: Option<ResizeRequest>,
    last_resize: ResizeRequest,
    reset_on_resize: bool,
    tween: Option<IntensityTween>,
    base_intensity: f32,
}

impl<T> FrameScheduler<T> {
    /// Allocates the initial targets and queues the start-up soft reset.
    pub fn new<A>(
        params: ParameterStore,
        options: SchedulerOptions,
        initial: ResizeRequest,
        allocator: &mut A,
    ) -> Self
    where
        A: TargetAllocator<Target = T> + ?Sized,
    {
        let targets = SurfaceTargets::new(initial, params.scalar(ParamId::DprMax), allocator);
        let base_intensity = params.scalar(ParamId::ColorIntensity);
        let mut scheduler = Self {
            params,
            inbox: None,
            pointer: PointerTracker::with_timeout(options.pointer_policy, options.pointer_timeout),
            reset: SoftReset::default(),
            clock: FrameClock::new(),
            targets,
            pending_resize: None,
            last_resize: initial,
            reset_on_resize: options.reset_on_resize,
            tween: None,
            base_intensity,
        };
        scheduler.request_soft_reset();
        scheduler
    }

    pub fn with_inbox(mut self, inbox: ParamInbox) -> Self {
        self.inbox = Some(inbox);
        self
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn targets(&self) -> &SurfaceTargets<T> {
        &self.targets
    }

    pub fn soft_reset(&self) -> &SoftReset {
        &self.reset
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    pub fn pointer_moved(&mut self, position: [f32; 2], kind: PointerKind, now: Instant) {
        if !self.params.flag(ParamId::Hover) {
            return;
        }
        self.pointer.on_move(position, kind, now);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.on_leave();
    }

    /// Queues a resize for the start of the next tick; a newer request
    /// replaces one that has not been applied yet.
    pub fn request_resize(&mut self, request: ResizeRequest) {
        if let Some(stale) = self.pending_resize.replace(request) {
            debug!(
                stale_width = stale.width,
                stale_height = stale.height,
                width = request.width,
                height = request.height,
                "superseded pending resize"
            );
        }
    }

    pub fn has_pending_resize(&self) -> bool {
        self.pending_resize.is_some()
    }

    /// Starts a soft reset with the configured frame count and strength.
    pub fn request_soft_reset(&mut self) {
        let (frames, strength) = self.params.soft_reset_request();
        self.reset.request(frames, strength);
    }

    /// Applies a parameter write in-thread, with the same side effects as a
    /// [`ParamCommand::Set`].
    pub fn set_param(&mut self, id: ParamId, value: ParamValue) {
        self.apply_command(ParamCommand::Set { id, value }, Instant::now());
    }

    /// Eases colour intensity to `multiple` times the last explicitly set
    /// intensity.
    pub fn ease_intensity(&mut self, multiple: f32, duration: Duration, curve: Easing, now: Instant) {
        let multiple = if multiple.is_finite() {
            multiple.clamp(HIGHLIGHT_MIN, HIGHLIGHT_MAX)
        } else {
            1.0
        };
        let from = self.params.scalar(ParamId::ColorIntensity);
        let to = self.base_intensity * multiple;
        match IntensityTween::new(from, to, duration, curve, now) {
            Some(tween) => self.tween = Some(tween),
            None => {
                self.tween = None;
                self.write_intensity(to);
            }
        }
    }

    pub fn tick<K>(&mut self, now: Instant, kernel: &mut K) -> Result<FrameReport, K::Error>
    where
        K: FieldKernel<Target = T>,
    {
        self.drain_commands(now);
        let resized = self.apply_pending_resize(kernel);

        let clock = self.clock.advance(now);
        self.advance_tween(now);
        self.pointer.refresh(now);

        let pointer = self.pointer.sample();
        let sim = self.params.simulation_params();
        let extent = *self.targets.extent();
        let inputs = SimulationInputs {
            resolution: extent.logical,
            texel: extent.texel(),
            pointer,
            brush_size: sim.brush_size * pointer.speed_factor,
            brush_strength: sim.brush_strength,
            fluid_decay: sim.fluid_decay,
            trail_length: sim.trail_length,
            stop_decay: sim.stop_decay,
            flow_speed: sim.flow_speed,
            soft_reset: self.reset.attenuation(),
            clock,
        };

        let written = self.targets.pair().current_slot();
        {
            let (previous, output) = self.targets.pair_mut().split();
            kernel.simulate(previous, output, &inputs)?;
        }
        self.reset.tick();

        let display = self.params.display_params();
        let display_inputs = DisplayInputs {
            resolution: extent.logical,
            clock,
            distortion_amount: display.distortion_amount,
            colors: display.colors,
            color_intensity: display.color_intensity,
            softness: display.softness,
            idle_speed: display.idle_speed,
        };
        let displayed = self.targets.pair().current_slot();
        let presented = kernel.display(self.targets.pair().current(), &display_inputs);

        // The simulation result was written either way, so roles advance even
        // if presentation failed.
        self.targets.pair_mut().swap();
        presented?;

        Ok(FrameReport {
            clock,
            pointer_active: pointer.active,
            decay: inputs.effective_decay(),
            brush_size: inputs.brush_size,
            soft_reset: inputs.soft_reset,
            written,
            displayed,
            resized,
            revision: self.params.revision(),
        })
    }

    fn apply_pending_resize<A>(&mut self, allocator: &mut A) -> Option<ResizeOutcome>
    where
        A: FieldKernel<Target = T>,
    {
        let request = self.pending_resize.take()?;
        self.last_resize = request;
        let outcome =
            self.targets
                .resize(request, self.params.scalar(ParamId::DprMax), allocator);
        allocator.configure_surface(self.targets.extent());
        if self.reset_on_resize || matches!(outcome, ResizeOutcome::Reallocated(_)) {
            self.request_soft_reset();
        }
        Some(outcome)
    }

    fn drain_commands(&mut self, now: Instant) {
        let commands = match &self.inbox {
            Some(inbox) => inbox.drain(),
            None => return,
        };
        for command in commands {
            self.apply_command(command, now);
        }
    }

    fn apply_command(&mut self, command: ParamCommand, now: Instant) {
        match command {
            ParamCommand::Set { id, value } => match self.params.set(id, value) {
                Ok(applied) => self.after_write(id, applied),
                Err(err) => warn!(%err, "rejected parameter update"),
            },
            ParamCommand::Reset { id } => {
                let applied = self.params.reset(id);
                self.after_write(id, applied);
            }
            ParamCommand::Query { id, reply } => {
                let _ = reply.send(self.params.get(id));
            }
            ParamCommand::EaseIntensity {
                multiple,
                duration,
                curve,
            } => self.ease_intensity(multiple, duration, curve, now),
            ParamCommand::SoftReset => self.request_soft_reset(),
        }
    }

    fn after_write(&mut self, id: ParamId, applied: ParamValue) {
        debug!(param = id.name(), value = %applied, "parameter updated");
        match id {
            ParamId::ColorIntensity => {
                self.tween = None;
                self.base_intensity = self.params.scalar(ParamId::ColorIntensity);
            }
            ParamId::DprMax => {
                if self.pending_resize.is_none() {
                    self.pending_resize = Some(self.last_resize);
                }
            }
            ParamId::Hover if applied == ParamValue::Flag(false) => self.pointer.on_leave(),
            _ => {}
        }
    }

    fn advance_tween(&mut self, now: Instant) {
        let Some(tween) = &self.tween else {
            return;
        };
        let (value, finished) = tween.value_at(now);
        self.write_intensity(value);
        if finished {
            self.tween = None;
        }
    }

    fn write_intensity(&mut self, value: f32) {
        let _ = self
            .params
            .set(ParamId::ColorIntensity, ParamValue::Scalar(value));
    }
}
