use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn fluidgrad(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fluidgrad"))
        .env("FLUIDGRAD_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run fluidgrad")
}

fn entry<'a>(entries: &'a [serde_json::Value], name: &str) -> &'a serde_json::Value {
    entries
        .iter()
        .find(|entry| entry["name"] == name)
        .unwrap_or_else(|| panic!("missing parameter {name}"))
}

#[test]
fn params_json_lists_defaults_without_config() {
    let root = TempDir::new().unwrap();
    let output = fluidgrad(root.path(), &["params", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry(&entries, "brush_size")["value"], 25.0);
    assert_eq!(entry(&entries, "soft_reset_frames")["value"], 12.0);
    assert_eq!(entry(&entries, "hover")["value"], true);
    assert_eq!(entry(&entries, "fluid_decay")["group"], "fluid");
}

#[test]
fn config_file_and_overrides_are_applied_in_order() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[brush]\nsize = 60\nstrength = 9\n\n[fluid]\nflow_speed = 1.2\n",
    )
    .unwrap();

    let output = fluidgrad(
        root.path(),
        &["--set", "flow_speed=0.2", "params", "--json"],
    );
    assert!(output.status.success(), "{output:?}");

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry(&entries, "brush_size")["value"], 60.0);
    // Clamped to the top of its range.
    assert_eq!(entry(&entries, "brush_strength")["value"], 3.0);
    assert_eq!(entry(&entries, "flow_speed")["value"].as_f64().unwrap() as f32, 0.2);
}

#[test]
fn explicit_config_path_is_required_to_exist() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");
    let output = fluidgrad(
        root.path(),
        &["--config", missing.to_str().unwrap(), "params"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read config"), "{stderr}");
}

#[test]
fn malformed_colour_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[display]\ncolor_1 = \"#zzzzzz\"\n",
    )
    .unwrap();
    let output = fluidgrad(root.path(), &["params"]);
    assert!(!output.status.success());
}

#[test]
fn misspelled_config_key_is_rejected() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[brush]\nsise = 40\n").unwrap();
    let output = fluidgrad(root.path(), &["params"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load config"), "{stderr}");
}

#[test]
fn unknown_override_fails() {
    let root = TempDir::new().unwrap();
    let output = fluidgrad(root.path(), &["--set", "viscosity=2", "params"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("viscosity"), "{stderr}");
}

#[test]
fn table_output_names_every_group() {
    let root = TempDir::new().unwrap();
    let output = fluidgrad(root.path(), &["params"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("color_1"));
    assert!(stdout.contains("#3d0000"), "{stdout}");
    assert!(stdout.contains("dpr_max"));
}
