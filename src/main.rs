//! ondemand - on-demand module delivery

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ondemand::cli::{Cli, Commands};
use ondemand::commands::{self, Context};
use ondemand::error::Result;

/// Log to stderr; `RUST_LOG` overrides the level chosen by `-v`
fn init_tracing(verbose: bool) {
    let level = if verbose { "ondemand=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let open = || Context::open(cli.config.as_deref(), cli.state_dir.as_deref());

    match cli.command {
        Commands::Install(args) => commands::install::run(&open()?, args),
        Commands::Launch(args) => commands::launch::run(&open()?, args),
        Commands::DeferInstall(args) => commands::deferred::run_install(&open()?, args),
        Commands::DeferUninstall(args) => commands::deferred::run_uninstall(&open()?, args),
        Commands::Settle => commands::settle::run(&open()?),
        Commands::List => commands::list::run(&open()?),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
