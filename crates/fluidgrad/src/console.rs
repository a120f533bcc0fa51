use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use fieldconfig::{parse_duration, parse_easing, Easing};
use fieldcore::{HandleError, ParamHandle};

const QUERY_TIMEOUT: Duration = Duration::from_secs(1);

const HELP: &str = "\
commands:
  set NAME VALUE                  change a parameter (hex for colours, true/false for flags)
  get NAME                        print the value the frame loop is using
  reset NAME                      restore the default
  ease MULTIPLE DURATION [CURVE]  ease colour intensity (curve: linear, smoothstep, ease-in-out)
  soft-reset                      fade the field out over the configured frames
  help                            show this text";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Set { name: String, value: String },
    Get { name: String },
    Reset { name: String },
    Ease {
        multiple: f32,
        duration: Duration,
        curve: Easing,
    },
    SoftReset,
    Help,
    Empty,
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ConsoleCommand::Empty);
    };
    let rest: Vec<&str> = words.collect();
    let name = |rest: &[&str]| -> Result<String, String> {
        match rest {
            [name] => Ok((*name).to_string()),
            _ => Err(format!("usage: {verb} NAME")),
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "set" => match rest.as_slice() {
            [name, value @ ..] if !value.is_empty() => Ok(ConsoleCommand::Set {
                name: (*name).to_string(),
                value: value.join(" "),
            }),
            _ => Err("usage: set NAME VALUE".to_string()),
        },
        "get" => Ok(ConsoleCommand::Get { name: name(&rest)? }),
        "reset" => Ok(ConsoleCommand::Reset { name: name(&rest)? }),
        "ease" => {
            let (multiple, duration, curve) = match rest.as_slice() {
                [multiple, duration] => (*multiple, *duration, None),
                [multiple, duration, curve] => (*multiple, *duration, Some(*curve)),
                _ => return Err("usage: ease MULTIPLE DURATION [CURVE]".to_string()),
            };
            let multiple = multiple
                .parse::<f32>()
                .map_err(|_| format!("invalid multiple '{multiple}'"))?;
            let duration = parse_duration(duration)?;
            let curve = curve.map(parse_easing).transpose()?.unwrap_or(Easing::EaseInOut);
            Ok(ConsoleCommand::Ease {
                multiple,
                duration,
                curve,
            })
        }
        "soft-reset" | "soft_reset" | "softreset" => Ok(ConsoleCommand::SoftReset),
        "help" | "?" => Ok(ConsoleCommand::Help),
        other => Err(format!("unknown command '{other}'; try 'help'")),
    }
}

/// Runs one command against the frame loop and returns the text to print.
pub fn execute(handle: &ParamHandle, command: ConsoleCommand) -> Result<Option<String>, HandleError> {
    match command {
        ConsoleCommand::Set { name, value } => handle.set_text(&name, &value).map(|_| None),
        ConsoleCommand::Get { name } => handle
            .get(&name, QUERY_TIMEOUT)
            .map(|value| Some(format!("{name} = {value}"))),
        ConsoleCommand::Reset { name } => handle.reset(&name).map(|_| None),
        ConsoleCommand::Ease {
            multiple,
            duration,
            curve,
        } => handle.ease_intensity(multiple, duration, curve).map(|_| None),
        ConsoleCommand::SoftReset => handle.soft_reset().map(|_| None),
        ConsoleCommand::Help => Ok(Some(HELP.to_string())),
        ConsoleCommand::Empty => Ok(None),
    }
}

/// Reads commands from stdin on a background thread until EOF or until the
/// frame loop goes away.
pub fn spawn(handle: ParamHandle) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("fluidgrad-console".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let command = match parse_line(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    }
                };
                match execute(&handle, command) {
                    Ok(Some(output)) => {
                        let mut stdout = io::stdout().lock();
                        let _ = writeln!(stdout, "{output}");
                    }
                    Ok(None) => {}
                    Err(HandleError::Disconnected) => {
                        tracing::debug!("frame loop closed; stopping console");
                        break;
                    }
                    Err(err) => eprintln!("{err}"),
                }
            }
        })
        .context("failed to spawn tuning console thread")
}
