use std::{error::Error, path::PathBuf, sync::Arc};

use clap::Parser;
use shared::error::CommonError;
use tracing::{error, info};

use crate::{
    agent::DirectorAgent,
    card::get_agent_card,
    executor::DirectorAgentExecutor,
    selector::LlmAgentSelector,
    server::{StartServerParams, build_router, start_server},
    settings::AppSettings,
};

/// Routes A2A requests to the downstream agent an LLM picks for them.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Host to bind, overriding the settings file
    #[arg(long)]
    pub host: Option<String>,
    /// Port to bind, overriding the settings file
    #[arg(long)]
    pub port: Option<u16>,
    /// Path to a YAML settings file
    #[arg(long, env = "DIRECTOR_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn load_settings(&self) -> Result<AppSettings, CommonError> {
        let mut settings = AppSettings::load(self.config.as_deref())?;
        if let Some(ref host) = self.host {
            settings.a2a.director.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.a2a.director.port = port;
        }
        Ok(settings)
    }
}

fn log_error_chain(err: &(dyn Error)) {
    let mut current: Option<&(dyn Error)> = Some(err);

    while let Some(e) = current {
        eprintln!("Caused by: {e}");
        current = e.source();
    }
}

fn handle_error(err: &CommonError) {
    eprintln!("Error: {err}");
    log_error_chain(&err);
    ::std::process::exit(1);
}

async fn serve(settings: AppSettings) -> Result<(), CommonError> {
    let director = &settings.a2a.director;
    let selector = LlmAgentSelector::from_settings(&settings.a2a.llm_provider, &director.routes)?;
    let agent = DirectorAgent::from_settings(Arc::new(selector), director);
    let router = build_router(
        Arc::new(DirectorAgentExecutor::new(Arc::new(agent))),
        get_agent_card(&director.host, director.port),
    )?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        let _ = shutdown_tx.send(());
    });

    let (server_fut, _handle, addr) = start_server(StartServerParams {
        host: director.host.clone(),
        port: director.port,
        system_shutdown_signal_rx: shutdown_rx,
        router,
    })
    .await?;

    info!(
        app_name = %settings.app_name,
        "Director listening on http://{}", addr
    );
    server_fut.await?;
    info!("Director stopped");
    Ok(())
}

pub async fn run_cli(cli: Cli) -> Result<(), anyhow::Error> {
    let settings = cli.load_settings().inspect_err(|e| {
        error!("Failed to load director settings");
        handle_error(e);
    })?;

    if let Err(e) = serve(settings).await {
        handle_error(&e);
    }
    Ok(())
}
