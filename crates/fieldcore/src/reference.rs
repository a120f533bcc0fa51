//! CPU implementation of the field kernel.
//!
//! Mirrors the renderer's GLSL passes closely enough for headless runs and tests. Each
//! texel holds `(velocity.x, velocity.y, density, 0)`; row 0 is the bottom of
//! the image, matching the pointer's bottom-left origin.

use std::convert::Infallible;

use fieldconfig::color::linear_to_srgb;

use crate::kernel::{DisplayInputs, FieldKernel, SimulationInputs};
use crate::targets::{Slot, SurfaceSize, TargetAllocator};

/// Per-channel bound applied after every simulation step.
pub const FIELD_LIMIT: f32 = 8.0;

const MOTION_LIMIT: f32 = 64.0;
const MOTION_GAIN: f32 = 0.1;
const DRIFT_AMPLITUDE: f32 = 0.02;
const DISTORTION_SCALE: f32 = 0.002;
const ENERGY_GAIN: f32 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldImage {
    size: SurfaceSize,
    texels: Vec<[f32; 4]>,
}

impl FieldImage {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            texels: vec![[0.0; 4]; size.texel_count()],
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.size.width - 1) as usize;
        let y = y.min(self.size.height - 1) as usize;
        self.texels[y * self.size.width as usize + x]
    }

    /// Bilinear lookup with clamp-to-edge addressing, `uv` in `[0, 1]`.
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let w = self.size.width as f32;
        let h = self.size.height as f32;
        let x = (uv[0] * w - 0.5).clamp(0.0, w - 1.0);
        let y = (uv[1] * h - 0.5).clamp(0.0, h - 1.0);
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as u32, y0 as u32);
        let a = self.texel(x0, y0);
        let b = self.texel(x0 + 1, y0);
        let c = self.texel(x0, y0 + 1);
        let d = self.texel(x0 + 1, y0 + 1);
        let mut out = [0.0; 4];
        for i in 0..4 {
            let bottom = a[i] + (b[i] - a[i]) * fx;
            let top = c[i] + (d[i] - c[i]) * fx;
            out[i] = bottom + (top - bottom) * fy;
        }
        out
    }

    /// Largest absolute channel value, or `None` if any texel is not finite.
    pub fn max_abs(&self) -> Option<f32> {
        let mut max = 0.0f32;
        for texel in &self.texels {
            for v in texel {
                if !v.is_finite() {
                    return None;
                }
                max = max.max(v.abs());
            }
        }
        Some(max)
    }
}

/// Field statistics captured after each simulation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldStats {
    pub max_abs: f32,
    pub finite: bool,
}

#[derive(Debug, Default)]
pub struct CpuKernel {
    frame: Vec<[u8; 3]>,
    frame_size: Option<SurfaceSize>,
    stats: FieldStats,
}

impl CpuKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last displayed image as 8-bit sRGB, bottom row first.
    pub fn frame(&self) -> &[[u8; 3]] {
        &self.frame
    }

    pub fn frame_size(&self) -> Option<SurfaceSize> {
        self.frame_size
    }

    pub fn stats(&self) -> FieldStats {
        self.stats
    }
}

impl TargetAllocator for CpuKernel {
    type Target = FieldImage;

    fn allocate(&mut self, _slot: Slot, size: SurfaceSize) -> FieldImage {
        FieldImage::new(size)
    }
}

impl FieldKernel for CpuKernel {
    type Error = Infallible;

    fn simulate(
        &mut self,
        previous: &FieldImage,
        output: &mut FieldImage,
        inputs: &SimulationInputs,
    ) -> Result<(), Infallible> {
        let size = output.size;
        let decay = inputs.effective_decay();
        let keep = 1.0 - inputs.soft_reset.clamp(0.0, 1.0);
        let texel = inputs.texel;
        let pointer = inputs.pointer;
        let radius = inputs.brush_size.max(1.0);
        let motion = clamp_length(
            [
                pointer.position[0] - pointer.previous[0],
                pointer.position[1] - pointer.previous[1],
            ],
            MOTION_LIMIT,
        );

        let mut max_abs = 0.0f32;
        let mut finite = true;
        for y in 0..size.height {
            for x in 0..size.width {
                let uv = [
                    (x as f32 + 0.5) / size.width as f32,
                    (y as f32 + 0.5) / size.height as f32,
                ];
                let here = previous.sample(uv);
                let source = [
                    uv[0] - here[0] * inputs.flow_speed / inputs.resolution[0],
                    uv[1] - here[1] * inputs.flow_speed / inputs.resolution[1],
                ];
                let advected = previous.sample(source);
                let taps = [
                    previous.sample([source[0] + texel[0], source[1]]),
                    previous.sample([source[0] - texel[0], source[1]]),
                    previous.sample([source[0], source[1] + texel[1]]),
                    previous.sample([source[0], source[1] - texel[1]]),
                ];

                let mut next = [0.0f32; 4];
                for i in 0..3 {
                    let blur = taps.iter().map(|t| t[i]).sum::<f32>() * 0.25;
                    next[i] = (blur + (advected[i] - blur) * inputs.trail_length) * decay * keep;
                }

                if pointer.active {
                    let frag = [uv[0] * inputs.resolution[0], uv[1] * inputs.resolution[1]];
                    let d = segment_distance(frag, pointer.previous, pointer.position);
                    let splat = (-(d * d) / (radius * radius)).exp() * inputs.brush_strength;
                    next[0] += motion[0] * splat * MOTION_GAIN;
                    next[1] += motion[1] * splat * MOTION_GAIN;
                    next[2] += splat;
                }

                for v in next.iter_mut().take(3) {
                    *v = v.clamp(-FIELD_LIMIT, FIELD_LIMIT);
                    finite &= v.is_finite();
                    max_abs = max_abs.max(v.abs());
                }
                output.texels[(y * size.width + x) as usize] = next;
            }
        }
        self.stats = FieldStats { max_abs, finite };
        Ok(())
    }

    fn display(&mut self, field: &FieldImage, inputs: &DisplayInputs) -> Result<(), Infallible> {
        let size = field.size;
        self.frame.clear();
        self.frame.reserve(size.texel_count());
        let time = inputs.clock.time * inputs.idle_speed;
        for y in 0..size.height {
            for x in 0..size.width {
                let uv = [
                    (x as f32 + 0.5) / size.width as f32,
                    (y as f32 + 0.5) / size.height as f32,
                ];
                let linear = shade(field, uv, time, inputs);
                self.frame
                    .push(linear.map(|c| (linear_to_srgb(c) * 255.0).round() as u8));
            }
        }
        self.frame_size = Some(size);
        Ok(())
    }
}

fn shade(field: &FieldImage, uv: [f32; 2], time: f32, inputs: &DisplayInputs) -> [f32; 3] {
    let drift = [
        (time * 0.35 + uv[1] * 3.0).sin() * DRIFT_AMPLITUDE,
        (time * 0.28 + uv[0] * 3.0).cos() * DRIFT_AMPLITUDE,
    ];
    let value = field.sample(uv);
    let distort = inputs.distortion_amount * DISTORTION_SCALE;
    let warped = [
        uv[0] + drift[0] + value[0] * distort,
        uv[1] + drift[1] + value[1] * distort,
    ];
    let base = warped[0] * 0.6 + warped[1] * 0.4;
    let t = (base + value[2] * ENERGY_GAIN).clamp(0.0, 1.0);
    let color = gradient(&inputs.colors, t, inputs.softness);
    let intensity = inputs.color_intensity.max(0.0);
    color.map(|c| (c * intensity).clamp(0.0, 1.0))
}

/// Four-stop gradient in linear space. `softness` in `[0, 5]` widens the
/// blend between neighbouring stops from a hard edge to a full ramp.
pub fn gradient(colors: &[[f32; 3]; 4], t: f32, softness: f32) -> [f32; 3] {
    let scaled = t.clamp(0.0, 1.0) * 3.0;
    let segment = scaled.floor().min(2.0);
    let local = scaled - segment;
    let edge = 0.49 * (1.0 - (softness / 5.0).clamp(0.0, 1.0));
    let k = smoothstep(edge, 1.0 - edge, local);
    let index = segment as usize;
    let (from, to) = (colors[index], colors[index + 1]);
    [
        from[0] + (to[0] - from[0]) * k,
        from[1] + (to[1] - from[1]) * k,
        from[2] + (to[2] - from[2]) * k,
    ]
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn segment_distance(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let h = if len2 > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (ap[0] - ab[0] * h).hypot(ap[1] - ab[1] * h)
}

fn clamp_length(v: [f32; 2], limit: f32) -> [f32; 2] {
    let len = v[0].hypot(v[1]);
    if len > limit && len.is_finite() {
        [v[0] / len * limit, v[1] / len * limit]
    } else if len.is_finite() {
        v
    } else {
        [0.0, 0.0]
    }
}
