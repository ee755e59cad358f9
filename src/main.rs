use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use vecseed::config;
use vecseed::{run_workflow, CollectionRepository, WeaviateClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries result rows and one line per failed step.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = config::load_config()?;
    log::info!("Configuration loaded: {:?}", config);

    // Connection failure is unrecoverable for this program.
    let cancel = CancellationToken::new();
    let client = WeaviateClient::connect(&config.connection)
        .context("Failed to construct vector database client")?
        .with_cancellation(cancel.clone());

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupt received, cancelling in-flight requests.");
                cancel.cancel();
            }
        }
    });

    let repository: Arc<dyn CollectionRepository> = Arc::new(client);
    let report = run_workflow(&config, repository).await;

    for book in &report.results {
        println!("{}", book);
    }
    for failure in &report.failures {
        println!("{}", failure);
    }

    let code = report.exit_code(config.strict_exit);
    if code != 0 {
        log::error!("{} step(s) failed.", report.failures.len());
        std::process::exit(code);
    }
    Ok(())
}
