use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::{File, FileFormat};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cleaner_consul::consul_supplier;
use cleaner_core::config::Settings;
use cleaner_core::discovery::watcher::AddressWatcher;
use cleaner_core::ext::init_logger_with_filter;
use cleaner_core::reconciler::Reconciler;
use cleaner_core::scheduler::Scheduler;

/// Prunes failed gossip members and service-less catalog nodes from a consul
/// cluster. Unset options fall back to the config file, then to the built-in
/// defaults.
#[derive(Parser, Debug)]
#[command(name = "cleaner", version)]
struct Args {
    /// go-netaddrs formatted consul servers definition [required]
    #[arg(long, env = "CONSUL_ADDRESSES")]
    consul_addresses: Option<String>,
    /// grpc port of consul server [default: 8502]
    #[arg(long, env = "CONSUL_GRPC_PORT")]
    consul_grpc_port: Option<u16>,
    /// http port of consul server [default: 8500]
    #[arg(long, env = "CONSUL_HTTP_PORT")]
    consul_http_port: Option<u16>,
    /// http timeout in seconds for calls to consul server [default: 5]
    #[arg(long, env = "CONSUL_HTTP_TIMEOUT")]
    consul_http_timeout: Option<u32>,
    /// ACL token sent with every call
    #[arg(long, env = "CONSUL_HTTP_TOKEN", hide_env_values = true)]
    consul_http_token: Option<String>,
    /// http or https [default: http]
    #[arg(long, env = "CONSUL_HTTP_SCHEME")]
    consul_http_scheme: Option<String>,
    /// seconds between two cleanups [default: 20]
    #[arg(long, env = "REFRESH_INTERVAL")]
    refresh_interval: Option<u32>,
    /// optional toml config file
    #[arg(short, long, env = "CLEANER_CONFIG")]
    config: Option<PathBuf>,
    /// log filter directives
    #[arg(long, env = "CLEANER_LOG", default_value = "info")]
    log: String,
}

fn load_settings(args: &Args) -> cleaner_core::error::Result<Settings> {
    let mut builder = Settings::builder();
    if let Some(path) = &args.config {
        builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
    }
    builder
        .set_override_option("discovery.addresses", args.consul_addresses.clone())?
        .set_override_option("discovery.grpc-port", args.consul_grpc_port.map(i64::from))?
        .set_override_option("admin.http-port", args.consul_http_port.map(i64::from))?
        .set_override_option("admin.timeout", args.consul_http_timeout.map(i64::from))?
        .set_override_option("admin.token", args.consul_http_token.clone())?
        .set_override_option("admin.scheme", args.consul_http_scheme.clone())?
        .set_override_option("reconcile.interval", args.refresh_interval.map(i64::from))?
        .build()
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(error) => {
                error!("install SIGTERM handler failed: {}", error);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger_with_filter(args.log.as_str());
    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(error) => {
            error!("required parameters missing or invalid: {}", error);
            return Err(error.into());
        }
    };
    info!("cleaner starting for {} every {:?}", settings.discovery.addresses, settings.reconcile.interval());
    let shutdown = CancellationToken::new();
    let watcher = Arc::new(AddressWatcher::with_cancellation(settings.discovery.clone(), shutdown.clone())?);
    watcher.start();
    let supplier = consul_supplier(settings.admin.clone(), watcher.clone());
    let scheduler = Scheduler::new(Reconciler::new(supplier), &settings.reconcile);
    tokio::spawn(shutdown_signal(shutdown.clone()));
    scheduler.run(shutdown).await;
    watcher.stop().await;
    info!("cleaner stopped");
    Ok(())
}
