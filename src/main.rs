//! lrue server binary.
//!
//! Starts the TCP listener, the console, or both against one shared
//! [`CacheManager`], and tears everything down on Ctrl-C or SIGTERM. The
//! process keeps running after the console reaches EOF or `QUIT` until one
//! of those signals arrives.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use lrue::config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, EngineConfig, RunMode,
};
use lrue::manager::CacheManager;
use lrue::report;
use lrue::server::{ServerSettings, TcpFrontEnd, run_console};

/// Multi-tenant LRU cache engine with a line-oriented text protocol
#[derive(Parser)]
#[command(name = "lrue")]
#[command(version)]
#[command(about = "Multi-tenant LRU cache engine served over TCP and an interactive console")]
struct Cli {
    /// Address to bind the TCP listener to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// TCP port (1024-65535)
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Receive buffer size per connection in bytes (17-1024)
    #[arg(long = "buffer", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Maximum number of concurrent TCP connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: usize,

    /// Run only the TCP server or only the console
    #[arg(long = "only", value_enum, default_value_t = RunMode::Both)]
    mode: RunMode,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> EngineConfig {
        EngineConfig {
            host: self.host,
            port: self.port,
            buffer_size: self.buffer_size,
            max_connections: self.max_connections,
            mode: self.mode,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.into_config();
    if let Err(err) = config.validate() {
        report::fatal("invalid configuration", &err);
    }

    if let Err(err) = run(config).await {
        report::fatal("engine failed", &*err);
    }

    // The console's stdin reader can stay parked in a blocking read, so leave
    // without waiting for the runtime to drain it.
    std::process::exit(0);
}

async fn run(config: EngineConfig) -> anyhow::Result<()> {
    let manager: Arc<CacheManager> = Arc::new(CacheManager::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    info!(mode = %config.mode, "starting engine");

    let listener = if config.mode.runs_tcp() {
        let addr = config.bind_addr();
        let front_end = match TcpFrontEnd::bind(&addr, ServerSettings::from(&config)).await {
            Ok(front_end) => front_end,
            Err(err) => report::fatal("failed to start tcp listener", &err),
        };
        println!("Server started on {addr}");
        Some(tokio::spawn(
            front_end.serve(Arc::clone(&manager), shutdown_rx.clone()),
        ))
    } else {
        None
    };

    let console = async {
        if config.mode.runs_console() {
            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            if let Err(err) = run_console(&manager, stdin, stdout, shutdown_rx.clone()).await {
                report::non_fatal("console session failed", &err);
            }
            info!("console session ended");
        }
        // Closing the console does not stop the engine; only a signal does.
        std::future::pending::<()>().await;
    };

    tokio::select! {
        () = shutdown_signal() => {},
        () = console => {},
    }

    println!("Shutting down gracefully...");
    let _ = shutdown_tx.send(true);
    if let Some(listener) = listener {
        listener.await.context("tcp listener task failed")??;
    }
    manager.clear_all_caches();
    info!("engine stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            report::non_fatal("failed to listen for ctrl-c", &err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(err) => {
                report::non_fatal("failed to listen for SIGTERM", &err);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
