// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dgd: deploy-guard daemon.
//!
//! Owns the safety state and serves the `dg` CLI over a Unix socket in the
//! state directory. One daemon runs per state directory.

mod env;
mod lifecycle;
mod listener;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::lifecycle::{Config, LifecycleError};
use crate::listener::{ListenCtx, Listener};

fn init_logging(config: &Config, foreground: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    if foreground || env::log_to_stderr() {
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        return None;
    }
    let appender = tracing_appender::rolling::never(&config.state_dir, "daemon.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).with_writer(writer).init();
    Some(guard)
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut foreground = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("dgd {}", env::PROTOCOL_VERSION);
                return ExitCode::SUCCESS;
            }
            "--foreground" => foreground = true,
            other => {
                eprintln!("dgd: unexpected argument '{other}' (usage: dgd [--foreground])");
                return ExitCode::from(2);
            }
        }
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dgd: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config.state_dir) {
        eprintln!("dgd: cannot create {}: {e}", config.state_dir.display());
        return ExitCode::FAILURE;
    }
    let _log_guard = init_logging(&config, foreground);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("daemon failed: {}", e);
            eprintln!("dgd: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    info!(state_dir = %config.state_dir.display(), version = env::PROTOCOL_VERSION, "starting daemon");
    let lifecycle::StartupResult { mut daemon, listener } = lifecycle::startup(&config).await?;

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        guard: Arc::clone(&daemon.guard),
        state_dir: config.state_dir.clone(),
        start_time: daemon.start_time,
        shutdown: Arc::clone(&shutdown),
    });
    let listener_task = tokio::spawn(Listener::new(listener, ctx).run());

    // Signals readiness to a parent waiting on stdout
    println!("READY");
    info!(socket = %config.socket_path.display(), "daemon ready");

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = shutdown.notified() => info!("shutdown requested"),
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
    }

    listener_task.abort();
    daemon.shutdown()
}
