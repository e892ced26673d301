// src/main.rs

use anyhow::Result;
use clap::Parser;
use repotar::cli::Cli;
use repotar::config::Config;
use repotar::web;

fn main() -> Result<()> {
    // Initialize logging. Default to 'info' if RUST_LOG is not set.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(if cfg!(debug_assertions) {
                    "repotar=debug".parse()?
                } else {
                    "repotar=info".parse()?
                })
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    log::info!("Starting repotar v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());

    // SECURITY: Panic Hook to prevent info leaks
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&str>() {
            Some(s) => *s,
            None => "Box<Any>",
        };
        eprintln!(
            "Application Error: {}",
            msg.replace(env!("CARGO_MANIFEST_DIR"), "<redacted>")
                .replace(std::path::MAIN_SEPARATOR, "/")
        );
    }));

    // --- Configuration ---
    let cli = Cli::parse();
    let config = Config::try_from(cli)?;
    log::debug!("Configuration built successfully: {:?}", config);

    // --- Serve ---
    let rt = tokio::runtime::Runtime::new()?;
    if let Err(e) = rt.block_on(web::start_server(config)) {
        log::error!("Server error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
