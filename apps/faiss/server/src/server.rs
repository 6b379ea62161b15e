//! gRPC server initialization and lifecycle management
//!
//! This module handles all server setup:
//! - Tracing initialization
//! - Configuration loading
//! - Index loading and query service creation
//! - Runtime sizing (blocking pool = max workers)
//! - gRPC server configuration and startup
//! - Health check service (grpc.health.v1.Health)

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use core_config::{Environment, FromEnv};
use domain_search::{FaissServiceImpl, IndexAdapter, IvfFlatIndex, QueryService, ServiceConfig};
use eyre::{Result, WrapErr};
use rpc::faiss::faiss_service_server::{FaissServiceServer, SERVICE_NAME};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tracing::{error, info};

use crate::config::ServerConfig;

/// Run the gRPC server
///
/// This is the main entry point for server initialization. It:
/// 1. Sets up structured logging (env-aware: JSON for prod, pretty for dev)
/// 2. Loads server and query configuration from the environment
/// 3. Builds a runtime whose blocking pool is capped at `max_workers`
/// 4. Loads the index and serves until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is missing or invalid
/// - The index file cannot be loaded
/// - Server binding fails
/// - Server runtime encounters an error
pub fn run() -> Result<()> {
    core_config::tracing::install_color_eyre();

    // Initialize tracing (env-aware: JSON for prod, pretty for dev)
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let config = ServerConfig::from_env().wrap_err("Failed to load server configuration")?;
    let service_config =
        ServiceConfig::from_env().wrap_err("Failed to load query service configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.max_workers)
        .thread_name("faiss-grpc")
        .build()
        .wrap_err("Failed to build tokio runtime")?;

    runtime.block_on(serve(config, service_config, shutdown_signal()))
}

/// Load the configured index, bind, and serve until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, service_config: ServiceConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    if let Some(port) = config.metrics_port {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
        observability::init_metrics_with_listener(addr)
            .wrap_err("Failed to start Prometheus exporter")?;
    }

    let listener = TcpListener::bind(config.bind_address())
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.bind_address()))?;

    serve_index(listener, config.index_path, service_config, shutdown).await
}

#[cfg(not(feature = "faiss"))]
async fn serve_index<F>(
    listener: TcpListener,
    index_path: PathBuf,
    service_config: ServiceConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let index = load_index(index_path, |path| IvfFlatIndex::load(path)).await?;
    run_with_listener(listener, QueryService::new(index, service_config), shutdown).await
}

/// `.json` files are IVF-Flat indexes; anything else is read by faiss.
#[cfg(feature = "faiss")]
async fn serve_index<F>(
    listener: TcpListener,
    index_path: PathBuf,
    service_config: ServiceConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let is_json = index_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let index = load_index(index_path, |path| IvfFlatIndex::load(path)).await?;
        run_with_listener(listener, QueryService::new(index, service_config), shutdown).await
    } else {
        let index = load_index(index_path, |path| domain_search::FaissIndex::load(path)).await?;
        run_with_listener(listener, QueryService::new(index, service_config), shutdown).await
    }
}

/// Serve `service` on an already-bound listener until `shutdown` resolves.
pub async fn run_with_listener<I, F>(
    listener: TcpListener,
    service: QueryService<I>,
    shutdown: F,
) -> Result<()>
where
    I: IndexAdapter + 'static,
    F: Future<Output = ()> + Send,
{
    let addr = listener.local_addr().wrap_err("Listener has no local address")?;
    info!(
        %addr,
        dimension = service.index().dimension(),
        total = service.index().total_count(),
        probe_count = service.index().probe_count(),
        normalize_query = service.config().normalize_query,
        "FaissService listening"
    );

    // Create a health reporter for Kubernetes probes
    let (health_reporter, health_service) = health_reporter();

    // Mark the service as serving (for k8s readiness/liveness probes)
    health_reporter
        .set_service_status(SERVICE_NAME, tonic_health::ServingStatus::Serving)
        .await;
    // Also set an empty service name for generic health checks (what k8s uses by default)
    health_reporter
        .set_service_status("", tonic_health::ServingStatus::Serving)
        .await;
    info!("Health check service enabled (grpc.health.v1.Health)");

    Server::builder()
        .add_service(health_service)
        .add_service(
            FaissServiceServer::new(FaissServiceImpl::new(service))
                .accept_compressed(tonic::codec::CompressionEncoding::Zstd)
                .send_compressed(tonic::codec::CompressionEncoding::Zstd),
        )
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .wrap_err("gRPC server failed")?;

    info!("FaissService stopped");
    Ok(())
}

/// Reads the index on the blocking pool; large files take a while to parse.
async fn load_index<I, L>(path: PathBuf, loader: L) -> Result<I>
where
    I: IndexAdapter + 'static,
    L: FnOnce(&Path) -> domain_search::SearchResult<I> + Send + 'static,
{
    info!(path = %path.display(), "Loading index");
    let display = path.display().to_string();

    tokio::task::spawn_blocking(move || loader(&path))
        .await
        .wrap_err("Index loading task failed")?
        .wrap_err_with(|| format!("Failed to load index from {}", display))
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}
