use std::{future::Future, net::SocketAddr, sync::Arc};

use a2a_rs::{
    adapters::jsonrpc::axum::create_router,
    agent_execution::AgentExecutor,
    request_handlers::DefaultRequestHandler,
    service::{A2aService, A2aServiceBuilder},
    tasks::InMemoryTaskStore,
    types::AgentCard,
};
use axum::Router;
use shared::error::CommonError;
use tower_http::cors::CorsLayer;
use tracing::info;

pub struct StartServerParams {
    pub host: String,
    pub port: u16,
    pub system_shutdown_signal_rx: tokio::sync::broadcast::Receiver<()>,
    pub router: Router,
}

/// The director's A2A surface: JSON-RPC on `/` and the agent card routes.
pub fn build_router(
    executor: Arc<dyn AgentExecutor>,
    agent_card: AgentCard,
) -> Result<Router, CommonError> {
    let request_handler = DefaultRequestHandler::new(executor, Arc::new(InMemoryTaskStore::new()));
    let service = A2aServiceBuilder::default()
        .agent_card(Arc::new(agent_card))
        .request_handler(Arc::new(request_handler))
        .build()
        .map_err(|e| CommonError::Unknown(anyhow::anyhow!("Failed to build A2A service: {e}")))?;

    let (router, _) = create_router::<A2aService>()
        .with_state(Arc::new(service))
        .split_for_parts();

    Ok(router.layer(CorsLayer::permissive()))
}

async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, CommonError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| {
            CommonError::invalid_configuration(format!("could not resolve {host}:{port}"))
        })
}

/// Starts the Axum server
pub async fn start_server(
    params: StartServerParams,
) -> Result<
    (
        impl Future<Output = Result<(), std::io::Error>>,
        axum_server::Handle,
        SocketAddr,
    ),
    CommonError,
> {
    let mut system_shutdown_signal_rx = params.system_shutdown_signal_rx;
    let addr = resolve_addr(&params.host, params.port).await?;

    info!("Starting server on {}", addr);

    let handle = axum_server::Handle::new();
    let server_fut = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(params.router.into_make_service());

    let handle_clone = handle.clone();
    tokio::spawn(async move {
        let _ = system_shutdown_signal_rx.recv().await;

        info!("Shutting down axum server, waiting for in-flight requests to complete...");
        handle_clone.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
    });

    info!("Server bound");
    Ok((server_fut, handle, addr))
}
