mod cli;
mod console;
mod headless;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Params(args)) => run::run_params(&cli.run, args),
        Some(Command::Simulate(args)) => run::run_simulate(&cli.run, args),
        None => run::run_window(cli.run),
    }
}
