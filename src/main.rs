use clap::Parser;
use coap_ingest::cli::{args::Args, commands};
use std::process;
use tokio_util::sync::CancellationToken;

fn main() {
    // Parse command line arguments; no subcommand means serve
    let args = Args::parse();

    // Create async runtime and run the main command logic with signal handling
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        // Create cancellation token for coordinating graceful shutdown
        let cancellation_token = CancellationToken::new();
        let command = commands::run(args, cancellation_token.clone());
        tokio::pin!(command);

        tokio::select! {
            result = &mut command => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    return Err(coap_ingest::Error::io("Failed to install CTRL+C signal handler", e));
                }
                eprintln!("\nReceived CTRL+C, shutting down gracefully...");

                // Let the listener leave its receive loop before exiting
                cancellation_token.cancel();
                command.await
            }
        }
    });

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
