//! Strata CLI - versioned database schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{execute, generate, migrate, status, version};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.global);

    if let Err(err) = run(&cli) {
        let code = match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => *code,
            None => {
                eprintln!("Error: {err:#}");
                1
            }
        };
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Migrate(args) => migrate::execute(args, &cli.global),
        Commands::Execute(args) => execute::execute(args, &cli.global),
        Commands::Status(args) => status::execute(args, &cli.global),
        Commands::Version(args) => version::execute(args, &cli.global),
        Commands::Generate(args) => generate::execute(args, &cli.global),
    }
}

/// Route `log` output to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_logging(global: &cli::GlobalArgs) {
    let default_level = match global.verbosity_override() {
        Some(true) => "debug",
        Some(false) => "error",
        None => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
