use famdash_server::{server, storage};
mod cli;

use chrono::{Duration, Utc};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    use clap::Parser;
    let args = cli::Cli::parse();

    // Console-only logging with env-driven level
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = match server::AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error=%e, "Failed to load config");
            std::process::exit(2);
        }
    };

    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "data/famdash.db".into());
    if let Some(parent) = std::path::Path::new(&db_path).parent()
        && !parent.as_os_str().is_empty()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        tracing::warn!(error=%e, dir=%parent.display(), "Could not create data directory");
    }
    let store = match storage::Store::connect_sqlite(&db_path).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, path=%db_path, "Failed to connect DB");
            std::process::exit(3);
        }
    };

    if let Some(cmd) = args.command {
        let code = match run_command(cmd, &config, &store).await {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(error=%e, "command failed");
                1
            }
        };
        std::process::exit(code);
    }

    if let Some(seed) = &config.seed
        && let Err(e) = store.seed_from_config(seed).await
    {
        tracing::error!(error=%e, "Failed to seed DB");
        std::process::exit(4);
    }

    match store.prune_sessions(Utc::now()).await {
        Ok(0) => {}
        Ok(n) => tracing::info!(removed = n, "pruned expired PIN sessions"),
        Err(e) => tracing::warn!(error=%e, "session sweep failed"),
    }

    // Decide listen port: env PORT overrides config.listen_port, default 5252
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .or(config.listen_port)
        .unwrap_or(5252);

    let state = match server::AppState::new(config, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error=%e, "Invalid config");
            std::process::exit(2);
        }
    };
    let shutdown_token = state.shutdown_token();
    let shutdown_token_for_server = shutdown_token.clone();

    let app = server::router(state);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    tracing::info!(%addr, "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error=%e, %addr, "Failed to bind listener");
            std::process::exit(5);
        }
    };

    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_token_for_server.cancelled_owned())
            .await
    });

    // Wait for OS signal; then trigger graceful, and if it hangs beyond timeout, force abort.
    shutdown_signal().await;
    tracing::info!("shutdown: initiating graceful stop");
    shutdown_token.cancel();
    match tokio::time::timeout(std::time::Duration::from_secs(3), &mut server_task).await {
        Ok(join_res) => match join_res {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(%err, "server error"),
            Err(e) => tracing::error!(error=%e, "server task join error"),
        },
        Err(_) => {
            tracing::warn!("shutdown: forcing server abort due to timeout");
            server_task.abort();
        }
    }
}

async fn run_command(
    cmd: cli::Command,
    config: &server::AppConfig,
    store: &storage::Store,
) -> Result<(), storage::StorageError> {
    match cmd {
        cli::Command::Prune { retention_days } => {
            let now = Utc::now();
            let days = retention_days.unwrap_or(config.audit_retention_days);
            let sessions = store.prune_sessions(now).await?;
            let audit = store
                .prune_audit(now - Duration::days(i64::from(days)))
                .await?;
            tracing::info!(sessions, audit, retention_days = days, "prune finished");
        }
        cli::Command::ResetPin { yes } => {
            if !yes {
                eprintln!("This removes the household PIN and signs out every device.");
                eprintln!("Re-run with --yes to confirm.");
                std::process::exit(1);
            }
            let sessions = store.disable_pin().await?;
            store
                .record_audit("pin_reset", Some("offline reset from the command line".into()))
                .await?;
            tracing::info!(sessions, "household PIN removed");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (mut sigint, mut sigterm) = match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(i), Ok(t)) => (i, t),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error=%e, "failed to install signal handlers; using Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("shutdown: received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("shutdown: received SIGTERM");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown: received Ctrl+C");
    }
}
