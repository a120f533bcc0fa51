use std::convert::Infallible;
use std::time::{Duration, Instant};

use fieldcore::{
    DisplayInputs, FieldKernel, FrameScheduler, ParamId, ParamValue, ParameterStore, PointerKind,
    ResizeOutcome, ResizeRequest, SchedulerOptions, SimulationInputs, Slot, SurfaceSize,
    TargetAllocator,
};

/// Target tagged with the allocation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tagged {
    id: u32,
    size: SurfaceSize,
}

#[derive(Debug, Clone, Copy)]
struct Pass {
    read: u32,
    wrote: u32,
    displayed: u32,
}

#[derive(Default)]
struct RecordingKernel {
    next_id: u32,
    allocations: u32,
    passes: Vec<Pass>,
    pending: Option<(u32, u32)>,
    inputs: Vec<SimulationInputs>,
}

impl TargetAllocator for RecordingKernel {
    type Target = Tagged;

    fn allocate(&mut self, _slot: Slot, size: SurfaceSize) -> Tagged {
        self.next_id += 1;
        self.allocations += 1;
        Tagged {
            id: self.next_id,
            size,
        }
    }
}

impl FieldKernel for RecordingKernel {
    type Error = Infallible;

    fn simulate(
        &mut self,
        previous: &Tagged,
        output: &mut Tagged,
        inputs: &SimulationInputs,
    ) -> Result<(), Infallible> {
        assert_ne!(previous.id, output.id, "simulation aliased its targets");
        assert_eq!(previous.size, output.size);
        self.pending = Some((previous.id, output.id));
        self.inputs.push(*inputs);
        Ok(())
    }

    fn display(&mut self, field: &Tagged, _inputs: &DisplayInputs) -> Result<(), Infallible> {
        let (read, wrote) = self.pending.take().expect("display without simulation");
        self.passes.push(Pass {
            read,
            wrote,
            displayed: field.id,
        });
        Ok(())
    }
}

fn scheduler(kernel: &mut RecordingKernel, store: ParameterStore) -> FrameScheduler<Tagged> {
    FrameScheduler::new(
        store,
        SchedulerOptions::default(),
        ResizeRequest::logical(800.0, 600.0),
        kernel,
    )
}

#[test]
fn output_of_each_tick_feeds_display_and_next_simulation() {
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, ParameterStore::default());
    let start = Instant::now();

    for frame in 0..1000u64 {
        let now = start + Duration::from_millis(16 * frame);
        let report = sched.tick(now, &mut kernel).unwrap();
        assert_eq!(report.written, report.displayed);
        assert_eq!(report.clock.frame, frame);
    }

    assert_eq!(kernel.passes.len(), 1000);
    for window in kernel.passes.windows(2) {
        let (this, next) = (window[0], window[1]);
        assert_eq!(this.wrote, this.displayed);
        assert_eq!(next.read, this.wrote);
        assert_ne!(next.wrote, this.wrote);
    }
}

#[test]
fn identical_resize_keeps_target_identity_but_still_soft_resets() {
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, ParameterStore::default());
    let start = Instant::now();

    sched.request_resize(ResizeRequest::logical(800.0, 600.0).with_scale(1.0));
    sched.request_resize(ResizeRequest::logical(1024.0, 768.0));
    let first = sched.tick(start, &mut kernel).unwrap();
    assert_eq!(
        first.resized,
        Some(ResizeOutcome::Reallocated(SurfaceSize::new(1024, 768)))
    );
    let allocations = kernel.allocations;
    let ids: Vec<u32> = [Slot::A, Slot::B]
        .into_iter()
        .map(|slot| sched.targets().pair().get(slot).id)
        .collect();

    // Let the resize-triggered countdown finish.
    for i in 1..20 {
        sched
            .tick(start + Duration::from_millis(16 * i), &mut kernel)
            .unwrap();
    }
    assert_eq!(sched.soft_reset().remaining(), 0);

    for _ in 0..2 {
        sched.request_resize(ResizeRequest::logical(1024.0, 768.0));
        let report = sched
            .tick(start + Duration::from_secs(1), &mut kernel)
            .unwrap();
        assert_eq!(report.resized, Some(ResizeOutcome::Unchanged));
        assert!(report.soft_reset > 0.0);
    }

    assert_eq!(kernel.allocations, allocations);
    let after: Vec<u32> = [Slot::A, Slot::B]
        .into_iter()
        .map(|slot| sched.targets().pair().get(slot).id)
        .collect();
    assert_eq!(ids, after);
    assert_ne!(
        sched.targets().pair().current_slot(),
        sched.targets().pair().previous_slot()
    );
}

#[test]
fn idle_pointer_switches_to_stop_decay() {
    let mut store = ParameterStore::default();
    store
        .set(ParamId::FluidDecay, ParamValue::Scalar(0.97))
        .unwrap();
    store.set(ParamId::StopDecay, ParamValue::Scalar(0.8)).unwrap();
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, store);
    let start = Instant::now();

    sched.pointer_moved([100.0, 100.0], PointerKind::Mouse, start);
    let active = sched.tick(start + Duration::from_millis(16), &mut kernel).unwrap();
    assert!(active.pointer_active);
    assert_eq!(active.decay, 0.97);

    let idle = sched
        .tick(start + Duration::from_millis(120), &mut kernel)
        .unwrap();
    assert!(!idle.pointer_active);
    assert_eq!(idle.decay, 0.8);

    let later = sched
        .tick(start + Duration::from_millis(500), &mut kernel)
        .unwrap();
    assert_eq!(later.decay, 0.8);
    let last = kernel.inputs.last().unwrap();
    assert_eq!(last.pointer.position, [0.0, 0.0]);
}

#[test]
fn fast_sweeps_widen_the_brush_within_bounds() {
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, ParameterStore::default());
    let start = Instant::now();

    sched.pointer_moved([0.0, 0.0], PointerKind::Mouse, start);
    sched.pointer_moved([400.0, 0.0], PointerKind::Mouse, start);
    let fast = sched.tick(start, &mut kernel).unwrap();
    assert_eq!(fast.brush_size, 25.0 * 1.2);

    sched.pointer_moved([401.0, 0.0], PointerKind::Mouse, start);
    let slow = sched.tick(start, &mut kernel).unwrap();
    assert!(slow.brush_size >= 25.0 * 0.8 && slow.brush_size < 25.0);

    sched.pointer_left();
    let gone = sched.tick(start, &mut kernel).unwrap();
    assert_eq!(gone.brush_size, 25.0);
    assert!(!gone.pointer_active);
}

#[test]
fn soft_reset_spans_exactly_the_requested_frames() {
    let mut store = ParameterStore::default();
    store
        .set(ParamId::SoftResetFrames, ParamValue::Scalar(5.0))
        .unwrap();
    store
        .set(ParamId::SoftResetStrength, ParamValue::Scalar(0.4))
        .unwrap();
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, store);
    let start = Instant::now();

    for i in 0..10 {
        sched.tick(start + Duration::from_millis(i), &mut kernel).unwrap();
    }
    sched.request_soft_reset();
    let trace: Vec<f32> = (0..8)
        .map(|i| {
            sched
                .tick(start + Duration::from_millis(20 + i), &mut kernel)
                .unwrap()
                .soft_reset
        })
        .collect();
    assert_eq!(trace, vec![0.4, 0.4, 0.4, 0.4, 0.4, 0.0, 0.0, 0.0]);
}

#[test]
fn touch_is_ignored_under_mouse_only_policy() {
    let mut kernel = RecordingKernel::default();
    let mut sched = scheduler(&mut kernel, ParameterStore::default());
    let now = Instant::now();
    sched.pointer_moved([10.0, 10.0], PointerKind::Touch, now);
    assert!(!sched.tick(now, &mut kernel).unwrap().pointer_active);
}

#[derive(Default)]
struct FailingKernel {
    next_id: u32,
    fail_simulate: bool,
    fail_display: bool,
    displays: u32,
}

impl TargetAllocator for FailingKernel {
    type Target = u32;

    fn allocate(&mut self, _slot: Slot, _size: SurfaceSize) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl FieldKernel for FailingKernel {
    type Error = &'static str;

    fn simulate(
        &mut self,
        _previous: &u32,
        _output: &mut u32,
        _inputs: &SimulationInputs,
    ) -> Result<(), &'static str> {
        if self.fail_simulate {
            return Err("device lost");
        }
        Ok(())
    }

    fn display(&mut self, _field: &u32, _inputs: &DisplayInputs) -> Result<(), &'static str> {
        self.displays += 1;
        if self.fail_display {
            return Err("surface lost");
        }
        Ok(())
    }
}

fn failing_scheduler(kernel: &mut FailingKernel) -> FrameScheduler<u32> {
    FrameScheduler::new(
        ParameterStore::default(),
        SchedulerOptions::default(),
        ResizeRequest::logical(64.0, 64.0),
        kernel,
    )
}

#[test]
fn failed_presentation_still_swaps_roles_and_reports_the_error() {
    let mut kernel = FailingKernel::default();
    let mut sched = failing_scheduler(&mut kernel);
    let now = Instant::now();
    let before = sched.targets().pair().current_slot();
    let remaining = sched.soft_reset().remaining();
    assert!(remaining > 0);

    kernel.fail_display = true;
    assert_eq!(sched.tick(now, &mut kernel), Err("surface lost"));
    assert_eq!(kernel.displays, 1);
    assert_eq!(sched.targets().pair().current_slot(), before.other());
    assert_eq!(sched.soft_reset().remaining(), remaining - 1);

    kernel.fail_display = false;
    let report = sched.tick(now, &mut kernel).unwrap();
    assert_eq!(report.written, before.other());
}

#[test]
fn failed_simulation_leaves_roles_and_countdown_untouched() {
    let mut kernel = FailingKernel::default();
    let mut sched = failing_scheduler(&mut kernel);
    let now = Instant::now();
    let before = sched.targets().pair().current_slot();
    let remaining = sched.soft_reset().remaining();

    kernel.fail_simulate = true;
    assert_eq!(sched.tick(now, &mut kernel), Err("device lost"));
    assert_eq!(kernel.displays, 0);
    assert_eq!(sched.targets().pair().current_slot(), before);
    assert_eq!(sched.soft_reset().remaining(), remaining);

    kernel.fail_simulate = false;
    let report = sched.tick(now, &mut kernel).unwrap();
    assert_eq!(report.written, before);
    assert_eq!(sched.soft_reset().remaining(), remaining - 1);
}
