use std::borrow::Cow;

use anyhow::Result;
use wgpu::naga::ShaderStage;

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(compile(device, "fullscreen triangle vertex", VERTEX_SHADER_GLSL.into(), ShaderStage::Vertex))
}

pub(crate) fn compile_simulation_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(compile(
        device,
        "field simulation fragment",
        simulation_source().into(),
        ShaderStage::Fragment,
    ))
}

pub(crate) fn compile_display_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule> {
    Ok(compile(
        device,
        "field display fragment",
        display_source().into(),
        ShaderStage::Fragment,
    ))
}

fn compile(
    device: &wgpu::Device,
    label: &str,
    shader: Cow<'static, str>,
    stage: ShaderStage,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader,
            stage,
            defines: &[],
        },
    })
}

/// Simulation program: prelude, feedback uniforms, then the pass body.
pub(crate) fn simulation_source() -> String {
    format!("{FIELD_PRELUDE}\n{SIMULATION_UNIFORMS}\n{SIMULATION_BODY}")
}

pub(crate) fn display_source() -> String {
    format!("{FIELD_PRELUDE}\n{DISPLAY_UNIFORMS}\n{DISPLAY_BODY}")
}

/// Shared by both fragment programs. Field coordinates have their origin at
/// the bottom-left; `field_at` flips into texture space.
const FIELD_PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D field_texture;
layout(set = 1, binding = 1) uniform sampler field_sampler;

vec4 field_at(vec2 uv) {
    return texture(sampler2D(field_texture, field_sampler), vec2(uv.x, 1.0 - uv.y));
}
";

/// Must match `SimulationUniforms` in `gpu/uniforms.rs`.
const SIMULATION_UNIFORMS: &str = r"
layout(std140, set = 0, binding = 0) uniform SimulationParams {
    vec4 resolution;
    vec4 pointer;
    vec4 brush;
    vec4 feedback;
    vec4 clock;
} sim;
";

const SIMULATION_BODY: &str = r"
const float FIELD_LIMIT = 8.0;
const float MOTION_LIMIT = 64.0;
const float MOTION_GAIN = 0.1;

float segment_distance(vec2 p, vec2 a, vec2 b) {
    vec2 ab = b - a;
    vec2 ap = p - a;
    float h = clamp(dot(ap, ab) / max(dot(ab, ab), 1e-6), 0.0, 1.0);
    return length(ap - ab * h);
}

void main() {
    vec2 resolution = sim.resolution.xy;
    vec2 texel = sim.resolution.zw;
    float active = step(0.5, sim.brush.z);

    vec4 here = field_at(v_uv);
    vec2 source = v_uv - here.xy * sim.feedback.w / resolution;
    vec4 advected = field_at(source);
    vec4 blur = (field_at(source + vec2(texel.x, 0.0))
        + field_at(source - vec2(texel.x, 0.0))
        + field_at(source + vec2(0.0, texel.y))
        + field_at(source - vec2(0.0, texel.y))) * 0.25;

    float decay = mix(sim.feedback.z, sim.feedback.x, active);
    float keep = 1.0 - clamp(sim.brush.w, 0.0, 1.0);
    vec3 next = mix(blur.xyz, advected.xyz, sim.feedback.y) * decay * keep;

    if (active > 0.5) {
        vec2 frag = v_uv * resolution;
        vec2 motion = sim.pointer.xy - sim.pointer.zw;
        float travel = length(motion);
        if (travel > MOTION_LIMIT) {
            motion = motion * (MOTION_LIMIT / travel);
        }
        float radius = max(sim.brush.x, 1.0);
        float d = segment_distance(frag, sim.pointer.zw, sim.pointer.xy);
        float splat = exp(-(d * d) / (radius * radius)) * sim.brush.y;
        next = next + vec3(motion * splat * MOTION_GAIN, splat);
    }

    outColor = vec4(clamp(next, vec3(-FIELD_LIMIT), vec3(FIELD_LIMIT)), 0.0);
}
";

/// Must match `DisplayUniforms` in `gpu/uniforms.rs`.
const DISPLAY_UNIFORMS: &str = r"
layout(std140, set = 0, binding = 0) uniform DisplayParams {
    vec4 frame;
    vec4 color1;
    vec4 color2;
    vec4 color3;
    vec4 color4;
    vec4 shape;
} disp;
";

const DISPLAY_BODY: &str = r"
vec3 linear_to_srgb(vec3 c) {
    vec3 v = clamp(c, vec3(0.0), vec3(1.0));
    vec3 low = v * 12.92;
    vec3 high = 1.055 * pow(v, vec3(1.0 / 2.4)) - 0.055;
    return mix(low, high, step(vec3(0.0031308), v));
}

vec3 gradient(float t, float softness) {
    float scaled = clamp(t, 0.0, 1.0) * 3.0;
    float segment = min(floor(scaled), 2.0);
    float local_t = scaled - segment;
    float edge = 0.49 * (1.0 - clamp(softness / 5.0, 0.0, 1.0));
    float k = smoothstep(edge, 1.0 - edge, local_t);

    vec3 lo = disp.color1.rgb;
    vec3 hi = disp.color2.rgb;
    if (segment > 1.5) {
        lo = disp.color3.rgb;
        hi = disp.color4.rgb;
    } else if (segment > 0.5) {
        lo = disp.color2.rgb;
        hi = disp.color3.rgb;
    }
    return mix(lo, hi, k);
}

void main() {
    float time = disp.frame.z * disp.frame.w;
    vec2 drift = vec2(sin(time * 0.35 + v_uv.y * 3.0), cos(time * 0.28 + v_uv.x * 3.0)) * 0.02;
    vec4 value = field_at(v_uv);
    vec2 warped = v_uv + drift + value.xy * disp.shape.x * 0.002;
    float base = warped.x * 0.6 + warped.y * 0.4;
    float t = clamp(base + value.z * 0.25, 0.0, 1.0);

    vec3 color = clamp(gradient(t, disp.shape.z) * max(disp.shape.y, 0.0), vec3(0.0), vec3(1.0));
    if (disp.shape.w > 0.5) {
        color = linear_to_srgb(color);
    }
    outColor = vec4(color, 1.0);
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga::front::glsl::{Frontend, Options};
    use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};

    fn validate(source: &str, stage: ShaderStage) {
        let mut frontend = Frontend::default();
        let module = frontend
            .parse(&Options::from(stage), source)
            .unwrap_or_else(|err| panic!("parse failed: {err:?}\n{source}"));
        Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .unwrap_or_else(|err| panic!("validation failed: {err:?}"));
    }

    #[test]
    fn vertex_shader_validates() {
        validate(VERTEX_SHADER_GLSL, ShaderStage::Vertex);
    }

    #[test]
    fn simulation_shader_validates() {
        validate(&simulation_source(), ShaderStage::Fragment);
    }

    #[test]
    fn display_shader_validates() {
        validate(&display_source(), ShaderStage::Fragment);
    }

    #[test]
    fn programs_share_the_field_bindings() {
        for source in [simulation_source(), display_source()] {
            assert!(source.starts_with("#version 450"));
            assert!(source.contains("set = 1, binding = 0) uniform texture2D field_texture"));
            assert!(source.contains("set = 0, binding = 0"));
        }
    }
}
