//! `signet start`: load state, sync with peers, serve HTTP

use crate::handlers;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use signet_core::config::parse_address;
use signet_core::{Config, Node};
use std::fs;
use tracing::{info, warn};

/// Run the node until SIGINT/SIGTERM
pub async fn run() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load config")?;
    let node = Node::open(config.clone()).context("failed to initialize node")?;
    let node = web::Data::new(node);

    // one reconciliation round before serving, so a rejoining node does not
    // gossip from a stale tail
    if node.peers().len() > 1 {
        info!("syncing chain with peers...");
        if let Err(e) = node.sync_chain().await {
            warn!("chain sync failed: {}", e);
        }
    }

    let (host, _) = parse_address(&config.address);
    let bind_addr = format!("{}:{}", host, config.port);

    let app_node = node.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_node.clone())
            .app_data(handlers::json_config())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run();
    let server_handle = server.handle();

    let pid = std::process::id();
    let pid_path = config.pid_file_path();
    if let Err(e) = fs::write(&pid_path, format!("{}\n", pid)) {
        warn!("failed to write PID file: {}", e);
    }

    info!("signet node started (PID: {})", pid);
    info!("listening on {}", bind_addr);

    let server_task = tokio::spawn(server);

    shutdown_signal().await;
    info!("shutdown signal received");

    // graceful: lets in-flight requests and broadcasts finish
    server_handle.stop(true).await;

    if let Err(e) = fs::remove_file(&pid_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("failed to remove PID file: {}", e);
        }
    }

    match server_task.await {
        Ok(result) => result.context("server error")?,
        Err(e) => warn!("server task join error: {}", e),
    }

    info!("signet node stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
}
