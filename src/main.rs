//! Stream Bridge binary.
//!
//! Loads configuration from `STREAM_BRIDGE__*` environment variables, opens
//! the stream, listens for clients and ticks the bridge until Ctrl-C.
//! Exit never waits on a stream read that is still parked.

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use stream_bridge::adapters::{AsyncIoStream, TcpAcceptor};
use stream_bridge::application::{BridgeRunner, BridgeRunnerConfig, StreamBridge};
use stream_bridge::config::{AppConfig, ServerConfig};
use stream_bridge::ports::ConnectionAcceptor;
use stream_bridge::{runtime, AppError};

fn main() -> Result<(), AppError> {
    runtime::run(serve())?
}

async fn serve() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server)?;

    let stream = AsyncIoStream::open(&config.stream).await?;
    let mut acceptor =
        TcpAcceptor::bind(config.server.socket_addr()?, config.bridge.client_timeout()).await?;

    let bridge = StreamBridge::new(Box::new(stream));
    bridge.setup(&mut acceptor)?;

    let runner = BridgeRunner::with_config(
        bridge,
        BridgeRunnerConfig::default().with_tick_interval(config.bridge.tick_interval()),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(runner.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    acceptor.stop();
    let _ = shutdown_tx.send(true);
    task.await?;

    Ok(())
}

/// Logs go to stderr since stdout may be the bridged stream.
/// `RUST_LOG` wins over the configured filter when set.
fn init_tracing(server: &ServerConfig) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .map_err(|e| AppError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if server.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| AppError::Logging(e.to_string()))
}
