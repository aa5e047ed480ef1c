use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use turntable::transport::{SimOutputSink, SimTrackResolver};
use turntable::{create_router, AppState, Config, NatsPublisher, SessionRegistry};

#[derive(Debug, Parser)]
#[command(name = "turntable", about = "Multi-tenant playback scheduler daemon")]
struct Args {
    /// Config file path, without extension
    #[arg(short, long, default_value = "config/turntable")]
    config: String,

    /// Stream length for the built-in simulated transport
    #[arg(long, default_value_t = 30)]
    sim_stream_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Turntable v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let events = NatsPublisher::connect(&cfg.nats.url).await?;

    // The bundled transport is the simulated one; real resolvers and sinks
    // plug in through the TrackResolver / OutputSink traits.
    let resolver = Arc::new(SimTrackResolver::permissive());
    let sink = Arc::new(
        SimOutputSink::new().with_stream_duration(Duration::from_secs(args.sim_stream_secs)),
    );

    let registry = Arc::new(SessionRegistry::new(
        cfg.scheduler.clone(),
        resolver,
        sink,
        Arc::new(events),
    ));

    let app = create_router(AppState::new(Arc::clone(&registry)));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    registry.teardown_all().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
