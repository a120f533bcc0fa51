use fieldconfig::HighlightConfig;
use fieldcore::{ParameterStore, SchedulerOptions};

/// Adapter power preference forwarded to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl GpuPowerPreference {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" | "low-power" => Some(Self::Low),
            "high" | "high-performance" => Some(Self::High),
            _ => None,
        }
    }
}

/// Summary of the adapter wgpu selected; logged at start-up and used to cap
/// the frame rate on software rasterizers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Everything the window runtime needs to start drawing the field.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in logical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    /// Starting parameter values; later changes arrive through the handle.
    pub params: ParameterStore,
    pub options: SchedulerOptions,
    pub highlight: HighlightConfig,
    pub gpu_power: GpuPowerPreference,
    /// Desired maximum frame latency, clamped to 1..=3.
    pub gpu_latency: u32,
    /// Optional frame rate cap; None renders on every redraw callback.
    pub target_fps: Option<f32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "fluidgrad".to_string(),
            params: ParameterStore::default(),
            options: SchedulerOptions::default(),
            highlight: HighlightConfig::default(),
            gpu_power: GpuPowerPreference::default(),
            gpu_latency: 2,
            target_fps: None,
        }
    }
}
