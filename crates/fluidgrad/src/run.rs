use std::fs;

use anyhow::{Context, Result};
use fieldconfig::FieldConfig;
use fieldcore::{parse_value, ParamId, ParameterStore, SchedulerOptions};
use renderer::{Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::{Assignment, ParamsArgs, RunArgs, SimulateArgs};
use crate::console;
use crate::headless::{self, HeadlessRun};
use crate::paths::ConfigLocation;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file contents plus the parameter store built from them and any
/// `--set` overrides.
pub struct Resolved {
    pub config: FieldConfig,
    pub params: ParameterStore,
}

pub fn resolve(args: &RunArgs) -> Result<Resolved> {
    let location = ConfigLocation::resolve(args.config.as_deref())?;
    let config = load_config(&location)?;
    let mut params = ParameterStore::from_config(&config).context("invalid configuration")?;
    apply_overrides(&mut params, &args.overrides)?;
    Ok(Resolved { config, params })
}

fn load_config(location: &ConfigLocation) -> Result<FieldConfig> {
    let path = location.path();
    if matches!(location, ConfigLocation::Default(_)) && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using built-in defaults");
        return Ok(FieldConfig::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config = FieldConfig::from_toml_str(&text)
        .with_context(|| format!("failed to load config at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

pub fn apply_overrides(params: &mut ParameterStore, overrides: &[Assignment]) -> Result<()> {
    for Assignment { name, value } in overrides {
        let id = ParamId::from_name(name)
            .with_context(|| format!("invalid --set override '{name}={value}'"))?;
        let parsed = parse_value(id, value)
            .with_context(|| format!("invalid --set override '{name}={value}'"))?;
        let applied = params.set(id, parsed)?;
        tracing::debug!(param = id.name(), value = %applied, "applied override");
    }
    Ok(())
}

pub fn run_window(args: RunArgs) -> Result<()> {
    let Resolved { config, params } = resolve(&args)?;
    let renderer_config = RendererConfig {
        surface_size: args.size.unwrap_or(RendererConfig::default().surface_size),
        params,
        options: SchedulerOptions::from_config(&config),
        highlight: config.highlight.clone(),
        gpu_power: args.power,
        gpu_latency: args.latency,
        target_fps: args.fps,
        ..RendererConfig::default()
    };

    let renderer = Renderer::new(renderer_config);
    if args.tune {
        console::spawn(renderer.param_handle())?;
        tracing::info!("tuning console on stdin; type 'help' for commands");
    }
    tracing::info!("starting fluidgrad window");
    renderer.run()
}

pub fn run_params(args: &RunArgs, params_args: ParamsArgs) -> Result<()> {
    let Resolved { params, .. } = resolve(args)?;
    let entries: Vec<_> = params.entries().collect();
    if params_args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<20} {:<8} {:>10} {:>10}  range", "name", "group", "value", "default");
    for entry in entries {
        let range = match entry.range {
            Some((min, max)) => format!("{min} - {max}"),
            None => "-".to_string(),
        };
        println!(
            "{:<20} {:<8} {:>10} {:>10}  {range}",
            entry.name,
            entry.group.as_str(),
            entry.value.to_string(),
            entry.default.to_string(),
        );
    }
    Ok(())
}

pub fn run_simulate(args: &RunArgs, simulate: SimulateArgs) -> Result<()> {
    let Resolved { config, params } = resolve(args)?;
    let summary = headless::simulate(
        params,
        SchedulerOptions::from_config(&config),
        HeadlessRun {
            frames: simulate.frames,
            size: simulate.size,
            sweep: !simulate.idle,
        },
    );
    headless::report(&summary, simulate.json)
}
