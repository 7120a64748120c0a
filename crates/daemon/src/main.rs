// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt Exec daemon (pxd)
//!
//! Background process owning the execution pipeline. Listens on a Unix
//! socket for commands from `px`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use px_daemon::{lifecycle, startup, Config, Listener};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("pxd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("pxd {}", env!("CARGO_PKG_VERSION"));
                println!("Prompt Exec daemon - owns the execution pipeline");
                println!();
                println!("USAGE:");
                println!("    pxd");
                println!();
                println!("The daemon is typically started by the `px` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands");
                println!("from `px`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: pxd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    let _log_guard = setup_logging(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting pxd");

    let started = match startup(&config).await {
        Ok(started) => started,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };

    let shutdown = Arc::new(Notify::new());
    let listener = Listener::new(
        started.listener,
        Arc::clone(&started.engine),
        Arc::clone(&shutdown),
    );
    let listener_task = tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = shutdown.notified() => info!("shutdown requested over the socket"),
        _ = sigterm.recv() => info!("SIGTERM received"),
        _ = sigint.recv() => info!("SIGINT received"),
    }

    listener_task.abort();
    lifecycle::shutdown_cleanup(&config);
    info!("pxd stopped");
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}
