use crate::clock::ClockSample;
use crate::pointer::PointerSample;
use crate::targets::{SurfaceExtent, TargetAllocator};

/// Everything the simulation pass is given for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationInputs {
    /// Logical size; pointer positions and brush size use the same units.
    pub resolution: [f32; 2],
    /// Reciprocal of the target size in texels.
    pub texel: [f32; 2],
    pub pointer: PointerSample,
    /// Base brush size already scaled by the pointer speed factor.
    pub brush_size: f32,
    pub brush_strength: f32,
    pub fluid_decay: f32,
    pub trail_length: f32,
    pub stop_decay: f32,
    pub flow_speed: f32,
    /// Soft-reset attenuation in `[0, 1]`.
    pub soft_reset: f32,
    pub clock: ClockSample,
}

impl SimulationInputs {
    /// Feedback multiplier for this frame: `fluid_decay` while the pointer
    /// drives the field, `stop_decay` once it is idle.
    pub fn effective_decay(&self) -> f32 {
        if self.pointer.active {
            self.fluid_decay
        } else {
            self.stop_decay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInputs {
    pub resolution: [f32; 2],
    pub clock: ClockSample,
    pub distortion_amount: f32,
    /// Linear RGB gradient stops.
    pub colors: [[f32; 3]; 4],
    pub color_intensity: f32,
    pub softness: f32,
    pub idle_speed: f32,
}

/// The numerical side of the field: whatever executes the two passes.
///
/// The scheduler owns the targets and decides which slot is read and which is
/// written; a kernel only runs the pass it is asked for.
pub trait FieldKernel: TargetAllocator {
    type Error;

    /// Called after every applied resize, before the next pass runs.
    fn configure_surface(&mut self, _extent: &SurfaceExtent) {}

    fn simulate(
        &mut self,
        previous: &Self::Target,
        output: &mut Self::Target,
        inputs: &SimulationInputs,
    ) -> Result<(), Self::Error>;

    fn display(&mut self, field: &Self::Target, inputs: &DisplayInputs) -> Result<(), Self::Error>;
}
