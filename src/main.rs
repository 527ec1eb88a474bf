//! # Pool Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada: parsea la configuración, inicializa el logging y
//! corre el servidor hasta que el dispatcher termina.

use anyhow::Context;
use pool_server::config::Config;
use pool_server::server::Server;
use pool_server::telemetry;

fn main() -> anyhow::Result<()> {
    let config = Config::new();
    telemetry::init(&config.log_level);

    tracing::info!("=================================");
    tracing::info!("  Pool Server (fixed workers)");
    tracing::info!("=================================");
    config.print_summary();

    let server = Server::bind(config).context("💥 Could not start server")?;
    let report = server.run().context("💥 Server failed")?;

    for worker in &report.workers {
        tracing::info!(
            worker = worker.id,
            static_requests = worker.static_requests,
            dynamic_requests = worker.dynamic_requests,
            post_requests = worker.post_requests,
            "worker summary"
        );
    }

    Ok(())
}
