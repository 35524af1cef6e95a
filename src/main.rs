//! Multi-channel IRC-style chat server - Entry Point
//!
//! Parses the listening port and shared password, starts the TCP
//! listener and the server actor, and accepts connections until a
//! termination signal arrives.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use irc_server_v1::{handle_connection, Server};

/// Channel buffer size for server commands
const CHANNEL_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=irc_server_v1=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("irc_server_v1=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let [_, port, password] = args.as_slice() else {
        eprintln!(
            "Usage: {} <port> <password>",
            args.first().map_or("irc_server_v1", String::as_str)
        );
        return ExitCode::from(1);
    };
    let Ok(port) = port.parse::<u16>() else {
        eprintln!("Usage: {} <port> <password>", args[0]);
        return ExitCode::from(1);
    };

    // Start TCP listener; a bind failure is fatal with its own status
    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind port {}: {}", port, e);
            return ExitCode::from(2);
        }
    };
    info!("listening on port {}", port);

    // Create the server actor channel and start it
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let server = Server::new(cmd_rx, password.clone());
    let server_task = tokio::spawn(server.run());

    // Connection accept loop, ended by SIGINT/SIGTERM
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(s) => s,
        Err(e) => {
            error!("failed to install signal handler: {}", e);
            return ExitCode::from(2);
        }
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!("new connection from {}", addr);
                        let cmd_tx = cmd_tx.clone();

                        // Spawn handler task for each connection
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, cmd_tx).await {
                                error!("connection handler error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        // transient accept failure: skip this round
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
            _ = &mut ctrl_c => {
                info!("SIGINT received, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
        }
    }

    // Dropping our command sender lets the actor drain and exit once
    // the remaining connection handlers are gone; give it a bounded
    // grace period, then let runtime teardown collect everything else.
    drop(cmd_tx);
    let _ = tokio::time::timeout(Duration::from_secs(1), server_task).await;

    ExitCode::SUCCESS
}
