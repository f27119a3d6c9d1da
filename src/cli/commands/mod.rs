//! Command implementations for the CoAP ingest CLI
//!
//! Each command is implemented in its own module:
//! - `serve`: the CoAP listener
//! - `check`: offline parsing of a report payload
//! - `send`: posting a payload to a running listener

pub mod check;
pub mod send;
pub mod serve;
pub mod shared;

use crate::Result;
use crate::cli::args::{Args, Commands, ServeArgs};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Logging is initialised here so every command shares the same setup.
/// Without a subcommand the listener runs with flags taken from the
/// environment.
pub async fn run(args: Args, cancellation: CancellationToken) -> Result<()> {
    shared::setup_logging(&args.logging)?;

    match args.command {
        Some(Commands::Serve(serve_args)) => serve::run_serve(serve_args, cancellation).await,
        Some(Commands::Check(check_args)) => check::run_check(check_args),
        Some(Commands::Send(send_args)) => send::run_send(send_args).await,
        None => serve::run_serve(ServeArgs::from_env()?, cancellation).await,
    }
}
