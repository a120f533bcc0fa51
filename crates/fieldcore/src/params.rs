use std::fmt;

use fieldconfig::color::{hex_to_linear, linear_to_srgb, srgb8_to_linear};
use fieldconfig::{ConfigError, FieldConfig};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    UnknownName(String),
    #[error("parameter '{name}' expects a {expected} value")]
    KindMismatch { name: &'static str, expected: &'static str },
    #[error("invalid value for '{name}': {message}")]
    Parse { name: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamId {
    BrushSize,
    BrushStrength,
    DistortionAmount,
    FluidDecay,
    TrailLength,
    StopDecay,
    Color1,
    Color2,
    Color3,
    Color4,
    ColorIntensity,
    Softness,
    DprMax,
    SoftResetFrames,
    SoftResetStrength,
    FlowSpeed,
    IdleSpeed,
    Hover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGroup {
    Brush,
    Fluid,
    Display,
    Surface,
    Reset,
    Pointer,
}

impl ParamGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamGroup::Brush => "brush",
            ParamGroup::Fluid => "fluid",
            ParamGroup::Display => "display",
            ParamGroup::Surface => "surface",
            ParamGroup::Reset => "reset",
            ParamGroup::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Scalar { min: f32, max: f32 },
    /// Whole numbers carried as `f32`; values are rounded after clamping.
    Integer { min: f32, max: f32 },
    /// Linear RGB, each channel in `[0, 1]`.
    Color,
    Flag,
}

impl ParamKind {
    fn expected(self) -> &'static str {
        match self {
            ParamKind::Scalar { .. } => "scalar",
            ParamKind::Integer { .. } => "integer",
            ParamKind::Color => "colour",
            ParamKind::Flag => "flag",
        }
    }

    pub fn range(self) -> Option<(f32, f32)> {
        match self {
            ParamKind::Scalar { min, max } | ParamKind::Integer { min, max } => Some((min, max)),
            ParamKind::Color => Some((0.0, 1.0)),
            ParamKind::Flag => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f32),
    Color([f32; 3]),
    Flag(bool),
}

impl ParamValue {
    pub fn as_scalar(self) -> Option<f32> {
        match self {
            ParamValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(self) -> Option<[f32; 3]> {
        match self {
            ParamValue::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_flag(self) -> Option<bool> {
        match self {
            ParamValue::Flag(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(v) => write!(f, "{v}"),
            ParamValue::Color(rgb) => {
                let [r, g, b] = rgb.map(|c| (linear_to_srgb(c) * 255.0).round() as u8);
                write!(f, "#{r:02x}{g:02x}{b:02x}")
            }
            ParamValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub group: ParamGroup,
    pub kind: ParamKind,
    pub default: ParamValue,
}

const DEFAULT_COLORS: [[u8; 3]; 4] = [[0x3d, 0, 0], [0x90, 0, 0], [0xff, 0, 0], [0x1a, 0, 0]];

impl ParamId {
    pub const ALL: [ParamId; 18] = [
        ParamId::BrushSize,
        ParamId::BrushStrength,
        ParamId::DistortionAmount,
        ParamId::FluidDecay,
        ParamId::TrailLength,
        ParamId::StopDecay,
        ParamId::Color1,
        ParamId::Color2,
        ParamId::Color3,
        ParamId::Color4,
        ParamId::ColorIntensity,
        ParamId::Softness,
        ParamId::DprMax,
        ParamId::SoftResetFrames,
        ParamId::SoftResetStrength,
        ParamId::FlowSpeed,
        ParamId::IdleSpeed,
        ParamId::Hover,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamId::BrushSize => "brush_size",
            ParamId::BrushStrength => "brush_strength",
            ParamId::DistortionAmount => "distortion_amount",
            ParamId::FluidDecay => "fluid_decay",
            ParamId::TrailLength => "trail_length",
            ParamId::StopDecay => "stop_decay",
            ParamId::Color1 => "color_1",
            ParamId::Color2 => "color_2",
            ParamId::Color3 => "color_3",
            ParamId::Color4 => "color_4",
            ParamId::ColorIntensity => "color_intensity",
            ParamId::Softness => "softness",
            ParamId::DprMax => "dpr_max",
            ParamId::SoftResetFrames => "soft_reset_frames",
            ParamId::SoftResetStrength => "soft_reset_strength",
            ParamId::FlowSpeed => "flow_speed",
            ParamId::IdleSpeed => "idle_speed",
            ParamId::Hover => "hover",
        }
    }

    /// Accepts the snake_case name or its kebab-case spelling.
    pub fn from_name(raw: &str) -> Result<Self, ParamError> {
        let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|id| id.name() == normalized)
            .ok_or_else(|| ParamError::UnknownName(raw.trim().to_string()))
    }

    fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> ParamSpec {
        use ParamGroup::*;
        let scalar = |group, min, max, default| ParamSpec {
            id: self,
            group,
            kind: ParamKind::Scalar { min, max },
            default: ParamValue::Scalar(default),
        };
        let color = |index: usize| ParamSpec {
            id: self,
            group: Display,
            kind: ParamKind::Color,
            default: ParamValue::Color(srgb8_to_linear(DEFAULT_COLORS[index])),
        };

        match self {
            ParamId::BrushSize => scalar(Brush, 1.0, 200.0, 25.0),
            ParamId::BrushStrength => scalar(Brush, 0.05, 3.0, 0.3),
            ParamId::DistortionAmount => scalar(Display, 0.0, 5.0, 1.5),
            ParamId::FluidDecay => scalar(Fluid, 0.90, 0.999, 0.99),
            ParamId::TrailLength => scalar(Fluid, 0.5, 0.999, 0.85),
            ParamId::StopDecay => scalar(Fluid, 0.5, 1.0, 0.85),
            ParamId::Color1 => color(0),
            ParamId::Color2 => color(1),
            ParamId::Color3 => color(2),
            ParamId::Color4 => color(3),
            ParamId::ColorIntensity => scalar(Display, 0.2, 3.0, 1.0),
            ParamId::Softness => scalar(Display, 0.0, 5.0, 2.0),
            ParamId::DprMax => scalar(Surface, 0.5, 4.0, 2.0),
            ParamId::SoftResetFrames => ParamSpec {
                id: self,
                group: Reset,
                kind: ParamKind::Integer {
                    min: 0.0,
                    max: 240.0,
                },
                default: ParamValue::Scalar(12.0),
            },
            ParamId::SoftResetStrength => scalar(Reset, 0.0, 1.0, 0.15),
            ParamId::FlowSpeed => scalar(Fluid, 0.0, 1.8, 0.5),
            ParamId::IdleSpeed => scalar(Display, 0.0, 3.0, 1.0),
            ParamId::Hover => ParamSpec {
                id: self,
                group: Pointer,
                kind: ParamKind::Flag,
                default: ParamValue::Flag(true),
            },
        }
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs the simulation pass reads from the store each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub brush_size: f32,
    pub brush_strength: f32,
    pub fluid_decay: f32,
    pub trail_length: f32,
    pub stop_decay: f32,
    pub flow_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayParams {
    pub distortion_amount: f32,
    pub colors: [[f32; 3]; 4],
    pub color_intensity: f32,
    pub softness: f32,
    pub idle_speed: f32,
}

/// One row of the printable parameter table.
#[derive(Debug, Clone, Serialize)]
pub struct ParamEntry {
    pub name: &'static str,
    pub group: ParamGroup,
    pub value: ParamValue,
    pub default: ParamValue,
    pub range: Option<(f32, f32)>,
}

/// Flat, always-populated parameter namespace.
///
/// Writes never fail on range: scalars and colour channels are clamped to
/// their declared bounds and non-finite input falls back to the default.
/// The only errors are unknown names and values of the wrong kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    values: Vec<ParamValue>,
    revision: u64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            values: ParamId::ALL.iter().map(|id| id.spec().default).collect(),
            revision: 0,
        }
    }
}

impl ParameterStore {
    pub fn from_config(config: &FieldConfig) -> Result<Self, ConfigError> {
        let mut store = Self::default();
        let colors = config.display.linear_colors()?;
        let scalars = [
            (ParamId::BrushSize, config.brush.size),
            (ParamId::BrushStrength, config.brush.strength),
            (ParamId::DistortionAmount, config.display.distortion_amount),
            (ParamId::FluidDecay, config.fluid.decay),
            (ParamId::TrailLength, config.fluid.trail_length),
            (ParamId::StopDecay, config.fluid.stop_decay),
            (ParamId::ColorIntensity, config.display.color_intensity),
            (ParamId::Softness, config.display.softness),
            (ParamId::DprMax, config.surface.dpr_max),
            (ParamId::SoftResetFrames, config.soft_reset.frames as f32),
            (ParamId::SoftResetStrength, config.soft_reset.strength),
            (ParamId::FlowSpeed, config.fluid.flow_speed),
            (ParamId::IdleSpeed, config.display.idle_speed),
        ];
        for (id, value) in scalars {
            store.apply(id, ParamValue::Scalar(value));
        }
        for (id, rgb) in [ParamId::Color1, ParamId::Color2, ParamId::Color3, ParamId::Color4]
            .into_iter()
            .zip(colors)
        {
            store.apply(id, ParamValue::Color(rgb));
        }
        store.apply(ParamId::Hover, ParamValue::Flag(config.pointer.hover));
        store.revision = 0;
        Ok(store)
    }

    /// Bumped by every write that changed a value.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: ParamId) -> ParamValue {
        self.values[id.index()]
    }

    pub fn get_by_name(&self, name: &str) -> Result<ParamValue, ParamError> {
        Ok(self.get(ParamId::from_name(name)?))
    }

    /// Stores `value` clamped to the parameter's range and returns what was
    /// actually stored.
    pub fn set(&mut self, id: ParamId, value: ParamValue) -> Result<ParamValue, ParamError> {
        let spec = id.spec();
        let compatible = matches!(
            (spec.kind, value),
            (ParamKind::Scalar { .. } | ParamKind::Integer { .. }, ParamValue::Scalar(_))
                | (ParamKind::Color, ParamValue::Color(_))
                | (ParamKind::Flag, ParamValue::Flag(_))
        );
        if !compatible {
            return Err(ParamError::KindMismatch {
                name: id.name(),
                expected: spec.kind.expected(),
            });
        }
        let applied = self.apply(id, value);
        if applied != value {
            debug!(param = id.name(), requested = %value, applied = %applied, "parameter clamped");
        }
        Ok(applied)
    }

    pub fn set_by_name(&mut self, name: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
        self.set(ParamId::from_name(name)?, value)
    }

    pub fn reset(&mut self, id: ParamId) -> ParamValue {
        self.apply(id, id.spec().default)
    }

    pub fn scalar(&self, id: ParamId) -> f32 {
        self.get(id)
            .as_scalar()
            .or_else(|| id.spec().default.as_scalar())
            .unwrap_or(0.0)
    }

    pub fn color(&self, id: ParamId) -> [f32; 3] {
        self.get(id).as_color().unwrap_or([0.0; 3])
    }

    pub fn flag(&self, id: ParamId) -> bool {
        self.get(id).as_flag().unwrap_or(false)
    }

    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            brush_size: self.scalar(ParamId::BrushSize),
            brush_strength: self.scalar(ParamId::BrushStrength),
            fluid_decay: self.scalar(ParamId::FluidDecay),
            trail_length: self.scalar(ParamId::TrailLength),
            stop_decay: self.scalar(ParamId::StopDecay),
            flow_speed: self.scalar(ParamId::FlowSpeed),
        }
    }

    pub fn display_params(&self) -> DisplayParams {
        DisplayParams {
            distortion_amount: self.scalar(ParamId::DistortionAmount),
            colors: [
                self.color(ParamId::Color1),
                self.color(ParamId::Color2),
                self.color(ParamId::Color3),
                self.color(ParamId::Color4),
            ],
            color_intensity: self.scalar(ParamId::ColorIntensity),
            softness: self.scalar(ParamId::Softness),
            idle_speed: self.scalar(ParamId::IdleSpeed),
        }
    }

    pub fn soft_reset_request(&self) -> (u32, f32) {
        (
            self.scalar(ParamId::SoftResetFrames) as u32,
            self.scalar(ParamId::SoftResetStrength),
        )
    }

    pub fn entries(&self) -> impl Iterator<Item = ParamEntry> + '_ {
        ParamId::ALL.into_iter().map(|id| {
            let spec = id.spec();
            ParamEntry {
                name: id.name(),
                group: spec.group,
                value: self.get(id),
                default: spec.default,
                range: spec.kind.range(),
            }
        })
    }

    fn apply(&mut self, id: ParamId, value: ParamValue) -> ParamValue {
        let spec = id.spec();
        let applied = match (spec.kind, value) {
            (ParamKind::Scalar { min, max }, ParamValue::Scalar(v)) => {
                ParamValue::Scalar(clamp_or(v, min, max, spec.default))
            }
            (ParamKind::Integer { min, max }, ParamValue::Scalar(v)) => {
                ParamValue::Scalar(clamp_or(v, min, max, spec.default).round())
            }
            (ParamKind::Color, ParamValue::Color(rgb)) => {
                let fallback = spec.default.as_color().unwrap_or([0.0; 3]);
                let mut out = rgb;
                for (channel, default) in out.iter_mut().zip(fallback) {
                    *channel = if channel.is_nan() {
                        default
                    } else {
                        channel.clamp(0.0, 1.0)
                    };
                }
                ParamValue::Color(out)
            }
            (ParamKind::Flag, ParamValue::Flag(flag)) => ParamValue::Flag(flag),
            _ => spec.default,
        };
        let slot = &mut self.values[id.index()];
        if *slot != applied {
            *slot = applied;
            self.revision += 1;
        }
        applied
    }
}

/// Infinities clamp like any other out-of-range value; only NaN has no
/// nearest bound.
fn clamp_or(value: f32, min: f32, max: f32, default: ParamValue) -> f32 {
    if value.is_nan() {
        default.as_scalar().unwrap_or(min)
    } else {
        value.clamp(min, max)
    }
}

/// Parses a textual value for `id`: numbers for scalars, hex strings for
/// colours, and `true`/`false`/`on`/`off`/`1`/`0` for flags.
pub fn parse_value(id: ParamId, raw: &str) -> Result<ParamValue, ParamError> {
    let text = raw.trim();
    let parse_err = |message: String| ParamError::Parse {
        name: id.name(),
        message,
    };
    match id.spec().kind {
        ParamKind::Scalar { .. } | ParamKind::Integer { .. } => text
            .parse::<f32>()
            .map(ParamValue::Scalar)
            .map_err(|err| parse_err(format!("'{text}': {err}"))),
        ParamKind::Color => hex_to_linear(text).map(ParamValue::Color).map_err(parse_err),
        ParamKind::Flag => match text.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Ok(ParamValue::Flag(true)),
            "false" | "off" | "no" | "0" => Ok(ParamValue::Flag(false)),
            other => Err(parse_err(format!("'{other}' is not a flag"))),
        },
    }
}
