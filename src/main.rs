mod cli;

use clap::Parser;
use cli::Cli;
use color_eyre::eyre::Result;
use nettest::Session;
use nettest::common::spawn_signal_watcher;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for malformed or missing arguments
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging; stdout is reserved for statistics
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nettest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.command.into_session_config() {
        None => {
            print_info();
            return Ok(ExitCode::SUCCESS);
        }
        Some(Ok(config)) => config,
        Some(Err(e)) => {
            eprintln!("{e}");
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    info!(
        role = %config.role,
        service = config.service.name(),
        family = %config.family,
        address = %config.address,
        "Starting session"
    );

    let session = Session::new(config);
    let watcher = spawn_signal_watcher(session.quitter());
    let result = session.run().await;

    session.quitter().quit();
    let _ = watcher.await;

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) if e.is_usage() => {
            eprintln!("{e}");
            Ok(ExitCode::from(EXIT_USAGE))
        }
        Err(e) => {
            error!(error = %e, "Session failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_info() {
    println!("Name: {}", env!("CARGO_PKG_NAME"));
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "Build Date: {}",
        option_env!("NETTEST_BUILD_DATE").unwrap_or("unknown")
    );
}
