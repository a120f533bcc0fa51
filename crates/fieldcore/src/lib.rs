//! Orchestration core for the gradient field: parameter store, pointer
//! tracking, soft reset, ping/pong targets and the per-frame scheduler.
//!
//! Nothing here touches a GPU. Kernels plug in through [`FieldKernel`]; the
//! wgpu one lives in the `renderer` crate and [`reference::CpuKernel`] runs on
//! the CPU.

pub mod clock;
pub mod command;
pub mod kernel;
pub mod params;
pub mod pointer;
pub mod reference;
pub mod reset;
pub mod scheduler;
pub mod targets;
pub mod tween;

pub use clock::{ClockSample, FrameClock};
pub use command::{param_channel, HandleError, ParamCommand, ParamHandle, ParamInbox};
pub use kernel::{DisplayInputs, FieldKernel, SimulationInputs};
pub use params::{
    parse_value, ParamEntry, ParamError, ParamGroup, ParamId, ParamValue, ParameterStore,
};
pub use pointer::{PointerKind, PointerPhase, PointerPolicy, PointerSample, PointerTracker};
pub use reset::{ResetPhase, SoftReset};
pub use scheduler::{FrameReport, FrameScheduler, SchedulerOptions};
pub use targets::{
    ResizeOutcome, ResizeRequest, Slot, SurfaceExtent, SurfaceSize, SurfaceTargets,
    TargetAllocator, TargetPair,
};
