//! visitd binary entry point.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default address (0.0.0.0:8080)
//! EMAIL_ADDRESS=ops@example.com EMAIL_PASSWORD=secret visitd
//!
//! # Custom bind address
//! visitd --addr 127.0.0.1:9000
//! VISITD_ADDR=127.0.0.1:9000 visitd
//!
//! # Enable debug logging
//! RUST_LOG=visitd=debug visitd
//! ```
//!
//! # Signal Handling
//!
//! SIGTERM/SIGINT trigger a graceful shutdown: the listener stops
//! accepting and the scheduler task is cancelled. No drain happens on
//! shutdown - in-memory counts carry no persistence guarantee.

use std::env;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use visitd::http::{router, AppState};
use visitd::registry::VisitRegistry;
use visitd::report::{ReportSender, SmtpMailer};
use visitd::scheduler::spawn_scheduler_task;
use visitd_core::MailConfig;

/// Default listen address when neither `--addr` nor `VISITD_ADDR` is set.
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// visitd - web visit tracker and daily report daemon
#[derive(Parser, Debug)]
#[command(name = "visitd", version, about)]
struct Args {
    /// Address to bind the HTTP listener on (overrides VISITD_ADDR)
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("visitd=info".parse()?)
                .add_directive("visitd_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "visitd starting"
    );

    let addr = resolve_addr(args.addr)?;
    let mail_config = MailConfig::from_env().context("Mail configuration incomplete")?;

    let mailer = SmtpMailer::new(&mail_config).context("Failed to build SMTP transport")?;
    let reports = Arc::new(ReportSender::new(Arc::new(mailer)));
    let registry = Arc::new(VisitRegistry::new());

    // Cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Signal handlers
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let scheduler = spawn_scheduler_task(
        Arc::clone(&registry),
        Arc::clone(&reports),
        cancel_token.clone(),
    );

    let app = router(AppState { registry, reports });
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, relay = %mail_config.smtp_server, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let token = cancel_token.clone();
        async move { token.cancelled().await }
    })
    .await
    .context("Server error")?;

    cancel_token.cancel();
    let _ = scheduler.await;

    info!("visitd stopped");
    Ok(())
}

/// Resolves the bind address: CLI flag, then `VISITD_ADDR`, then default.
fn resolve_addr(flag: Option<SocketAddr>) -> Result<SocketAddr> {
    if let Some(addr) = flag {
        return Ok(addr);
    }
    match env::var("VISITD_ADDR") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid VISITD_ADDR: {raw}")),
        Err(_) => DEFAULT_ADDR
            .parse()
            .context("Failed to parse default bind address"),
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
