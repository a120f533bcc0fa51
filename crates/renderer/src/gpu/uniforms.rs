use bytemuck::{Pod, Zeroable};

use fieldcore::{DisplayInputs, SimulationInputs};

/// std140 block read by the simulation program. Every member is a `vec4` so
/// the Rust layout matches without padding fields.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable, PartialEq)]
pub(crate) struct SimulationUniforms {
    /// `xy` logical resolution, `zw` texel size.
    pub resolution: [f32; 4],
    /// `xy` pointer position, `zw` previous pointer position.
    pub pointer: [f32; 4],
    /// size, strength, active flag, soft-reset attenuation.
    pub brush: [f32; 4],
    /// fluid decay, trail length, stop decay, flow speed.
    pub feedback: [f32; 4],
    /// time, delta, frame.
    pub clock: [f32; 4],
}

impl SimulationUniforms {
    pub(crate) fn from_inputs(inputs: &SimulationInputs) -> Self {
        let pointer = inputs.pointer;
        Self {
            resolution: [
                inputs.resolution[0],
                inputs.resolution[1],
                inputs.texel[0],
                inputs.texel[1],
            ],
            pointer: [
                pointer.position[0],
                pointer.position[1],
                pointer.previous[0],
                pointer.previous[1],
            ],
            brush: [
                inputs.brush_size,
                inputs.brush_strength,
                if pointer.active { 1.0 } else { 0.0 },
                inputs.soft_reset,
            ],
            feedback: [
                inputs.fluid_decay,
                inputs.trail_length,
                inputs.stop_decay,
                inputs.flow_speed,
            ],
            clock: [
                inputs.clock.time,
                inputs.clock.delta,
                inputs.clock.frame as f32,
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable, PartialEq)]
pub(crate) struct DisplayUniforms {
    /// width, height, time, idle speed.
    pub frame: [f32; 4],
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub color3: [f32; 4],
    pub color4: [f32; 4],
    /// distortion, intensity, softness, encode-sRGB flag.
    pub shape: [f32; 4],
}

impl DisplayUniforms {
    pub(crate) fn from_inputs(inputs: &DisplayInputs, encode_srgb: bool) -> Self {
        let stop = |rgb: [f32; 3]| [rgb[0], rgb[1], rgb[2], 1.0];
        Self {
            frame: [
                inputs.resolution[0],
                inputs.resolution[1],
                inputs.clock.time,
                inputs.idle_speed,
            ],
            color1: stop(inputs.colors[0]),
            color2: stop(inputs.colors[1]),
            color3: stop(inputs.colors[2]),
            color4: stop(inputs.colors[3]),
            shape: [
                inputs.distortion_amount,
                inputs.color_intensity,
                inputs.softness,
                if encode_srgb { 1.0 } else { 0.0 },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcore::{ClockSample, PointerSample};

    #[test]
    fn blocks_are_whole_vec4s() {
        assert_eq!(std::mem::size_of::<SimulationUniforms>(), 5 * 16);
        assert_eq!(std::mem::size_of::<DisplayUniforms>(), 6 * 16);
    }

    #[test]
    fn simulation_block_packs_pointer_and_flags() {
        let inputs = SimulationInputs {
            resolution: [640.0, 480.0],
            texel: [1.0 / 1280.0, 1.0 / 960.0],
            pointer: PointerSample {
                position: [10.0, 20.0],
                previous: [5.0, 15.0],
                active: true,
                speed_factor: 1.0,
            },
            brush_size: 30.0,
            brush_strength: 0.3,
            fluid_decay: 0.99,
            trail_length: 0.85,
            stop_decay: 0.85,
            flow_speed: 0.5,
            soft_reset: 0.15,
            clock: ClockSample {
                time: 2.0,
                delta: 0.016,
                frame: 120,
            },
        };
        let block = SimulationUniforms::from_inputs(&inputs);
        assert_eq!(block.pointer, [10.0, 20.0, 5.0, 15.0]);
        assert_eq!(block.brush, [30.0, 0.3, 1.0, 0.15]);
        assert_eq!(block.clock[2], 120.0);
    }

    #[test]
    fn display_block_flags_srgb_encoding() {
        let inputs = DisplayInputs {
            resolution: [100.0, 50.0],
            clock: ClockSample::default(),
            distortion_amount: 1.5,
            colors: [[0.1, 0.0, 0.0]; 4],
            color_intensity: 1.0,
            softness: 2.0,
            idle_speed: 1.0,
        };
        assert_eq!(DisplayUniforms::from_inputs(&inputs, true).shape[3], 1.0);
        assert_eq!(DisplayUniforms::from_inputs(&inputs, false).shape[3], 0.0);
        assert_eq!(
            DisplayUniforms::from_inputs(&inputs, false).color1,
            [0.1, 0.0, 0.0, 1.0]
        );
    }
}
