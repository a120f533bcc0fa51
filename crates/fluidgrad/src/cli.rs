use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "fluidgrad",
    author,
    version,
    about = "Pointer-reactive gradient field",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration file (defaults to `config.toml` in the config directory).
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Override a parameter after the config loads, e.g. `--set brush_size=40`. Repeatable.
    #[arg(
        long = "set",
        value_name = "NAME=VALUE",
        value_parser = parse_assignment,
        global = true
    )]
    pub overrides: Vec<Assignment>,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Cap the redraw rate; by default every vsync renders.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "low|high", value_parser = parse_power, default_value = "high")]
    pub power: GpuPowerPreference,

    /// Maximum frames queued ahead of presentation (1-3).
    #[arg(long, value_name = "FRAMES", default_value_t = 2)]
    pub latency: u32,

    /// Read parameter commands from stdin while the window runs.
    #[arg(long)]
    pub tune: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved parameter table.
    Params(ParamsArgs),
    /// Run the frame loop headless against the CPU kernel and print a summary.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
pub struct ParamsArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Number of ticks to run.
    #[arg(long, value_name = "N", default_value_t = 600)]
    pub frames: u64,

    /// Logical field size.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size, default_value = "160x90")]
    pub size: (u32, u32),

    /// Leave the pointer idle instead of sweeping it for the first half.
    #[arg(long)]
    pub idle: bool,

    /// Emit the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// A `NAME=VALUE` pair from `--set`; the value is parsed once the parameter
/// is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_assignment(value: &str) -> Result<Assignment, String> {
    let (name, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("parameter name must not be empty".to_string());
    }
    Ok(Assignment {
        name: name.to_string(),
        value: raw.trim().to_string(),
    })
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    Ok((width, height))
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    GpuPowerPreference::parse(value)
        .ok_or_else(|| format!("unknown power preference '{}'; expected low or high", value.trim()))
}
