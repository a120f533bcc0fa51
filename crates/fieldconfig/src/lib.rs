pub mod color;

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root of `config.toml`. Every section and field is optional; numeric values
/// outside their working range are accepted here and clamped by the parameter
/// store, only structurally broken input is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    pub version: u32,
    pub brush: BrushConfig,
    pub fluid: FluidConfig,
    pub display: DisplayConfig,
    pub surface: SurfaceConfig,
    pub soft_reset: SoftResetConfig,
    pub pointer: PointerConfig,
    pub highlight: HighlightConfig,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            version: 1,
            brush: BrushConfig::default(),
            fluid: FluidConfig::default(),
            display: DisplayConfig::default(),
            surface: SurfaceConfig::default(),
            soft_reset: SoftResetConfig::default(),
            pointer: PointerConfig::default(),
            highlight: HighlightConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrushConfig {
    pub size: f32,
    pub strength: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            size: 25.0,
            strength: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FluidConfig {
    /// Feedback multiplier while the pointer is moving.
    pub decay: f32,
    pub trail_length: f32,
    /// Feedback multiplier once the pointer has gone idle.
    pub stop_decay: f32,
    pub flow_speed: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            decay: 0.99,
            trail_length: 0.85,
            stop_decay: 0.85,
            flow_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub distortion_amount: f32,
    pub color_1: String,
    pub color_2: String,
    pub color_3: String,
    pub color_4: String,
    pub color_intensity: f32,
    pub softness: f32,
    pub idle_speed: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            distortion_amount: 1.5,
            color_1: "#3d0000".into(),
            color_2: "#900000".into(),
            color_3: "#ff0000".into(),
            color_4: "#1a0000".into(),
            color_intensity: 1.0,
            softness: 2.0,
            idle_speed: 1.0,
        }
    }
}

impl DisplayConfig {
    pub fn colors(&self) -> [&str; 4] {
        [
            self.color_1.as_str(),
            self.color_2.as_str(),
            self.color_3.as_str(),
            self.color_4.as_str(),
        ]
    }

    /// Decodes the four gradient stops into linear RGB.
    pub fn linear_colors(&self) -> Result<[[f32; 3]; 4], ConfigError> {
        let mut out = [[0.0; 3]; 4];
        for (index, (slot, raw)) in out.iter_mut().zip(self.colors()).enumerate() {
            *slot = color::hex_to_linear(raw).map_err(|err| {
                ConfigError::Invalid(format!("display.color_{}: {err}", index + 1))
            })?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Upper bound applied to the window scale factor when sizing the field.
    pub dpr_max: f32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { dpr_max: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoftResetConfig {
    pub frames: u32,
    pub strength: f32,
    pub on_resize: bool,
}

impl Default for SoftResetConfig {
    fn default() -> Self {
        Self {
            frames: 12,
            strength: 0.15,
            on_resize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointerConfig {
    pub hover: bool,
    /// Ignore touch and pen input, only a mouse cursor excites the field.
    pub mouse_only: bool,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            hover: true,
            mouse_only: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    Smoothstep,
    EaseInOut,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HighlightConfig {
    pub on_focus: bool,
    pub multiple: f32,
    #[serde(deserialize_with = "deserialize_duration", serialize_with = "serialize_duration")]
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            on_focus: true,
            multiple: 1.15,
            duration: default_highlight_duration(),
            easing: Easing::EaseInOut,
        }
    }
}

fn default_highlight_duration() -> Duration {
    Duration::from_millis(400)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or_else(default_highlight_duration))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Parses a duration the way config files accept it: a humantime string
/// (`400ms`, `1s 500ms`) or a plain number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let text = raw.trim();
    if let Ok(seconds) = text.parse::<f64>() {
        if !seconds.is_finite() || seconds.is_sign_negative() {
            return Err(format!("invalid duration '{text}': must be non-negative"));
        }
        return Ok(Duration::from_secs_f64(seconds));
    }
    humantime::parse_duration(text).map_err(|err| format!("invalid duration '{text}': {err}"))
}

/// Parses an easing name as accepted on the command line and in config.
pub fn parse_easing(raw: &str) -> Result<Easing, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "linear" => Ok(Easing::Linear),
        "smoothstep" | "smooth" => Ok(Easing::Smoothstep),
        "ease-in-out" | "ease_in_out" | "easeinout" | "ease" => Ok(Easing::EaseInOut),
        other => Err(format!(
            "invalid easing '{other}'; expected linear, smoothstep or ease-in-out"
        )),
    }
}

impl FieldConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FieldConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        self.display.linear_colors()?;

        if self.highlight.multiple.is_nan() {
            return Err(ConfigError::Invalid(
                "highlight.multiple must be a number".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[brush]
size = 40
strength = 0.5

[fluid]
decay = 0.98
stop_decay = 0.9

[display]
color_1 = "#102030"
softness = 1.25

[surface]
dpr_max = 1.5

[soft_reset]
frames = 20
on_resize = false

[pointer]
mouse_only = false

[highlight]
multiple = 1.4
duration = "250ms"
easing = "smoothstep"
"##;

    #[test]
    fn parses_sample_config() {
        let config = FieldConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.brush.size, 40.0);
        assert_eq!(config.fluid.decay, 0.98);
        assert_eq!(config.fluid.trail_length, 0.85);
        assert_eq!(config.display.color_1, "#102030");
        assert_eq!(config.display.color_2, "#900000");
        assert_eq!(config.surface.dpr_max, 1.5);
        assert_eq!(config.soft_reset.frames, 20);
        assert!(!config.soft_reset.on_resize);
        assert!(!config.pointer.mouse_only);
        assert!(config.pointer.hover);
        assert_eq!(config.highlight.duration, Duration::from_millis(250));
        assert_eq!(config.highlight.easing, Easing::Smoothstep);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = FieldConfig::from_toml_str("").unwrap();
        assert_eq!(config, FieldConfig::default());
    }

    #[test]
    fn out_of_range_numbers_are_not_errors() {
        let config = FieldConfig::from_toml_str("[brush]\nsize = 5000\n").unwrap();
        assert_eq!(config.brush.size, 5000.0);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = FieldConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_misspelled_keys() {
        let err = FieldConfig::from_toml_str("[brush]\nsise = 40\n").unwrap_err();
        match err {
            ConfigError::Parse(inner) => assert!(inner.to_string().contains("sise"), "{inner}"),
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(FieldConfig::from_toml_str("[brushes]\nsize = 40\n").is_err());
    }

    #[test]
    fn rejects_malformed_colour() {
        let err = FieldConfig::from_toml_str("[display]\ncolor_3 = \"#zzzzzz\"\n").unwrap_err();
        match err {
            ConfigError::Invalid(message) => assert!(message.contains("color_3")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn numeric_duration_is_seconds() {
        let config = FieldConfig::from_toml_str("[highlight]\nduration = 2\n").unwrap();
        assert_eq!(config.highlight.duration, Duration::from_secs(2));
    }

    #[test]
    fn parses_easing_aliases() {
        assert_eq!(parse_easing("Ease-In-Out").unwrap(), Easing::EaseInOut);
        assert_eq!(parse_easing("linear").unwrap(), Easing::Linear);
        assert!(parse_easing("bounce").is_err());
    }

    #[test]
    fn parses_console_durations() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("0.5").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
