use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Context;
use docreg_app::cli;
use docreg_app::config_loader;
use docreg_app::documents;
use docreg_app::shutdown_handler;
use docreg_app::tracing_setup;
use docreg_app::tracing_setup::LogOutput;
use docreg_http::RegistryError;
use tokio::task::JoinSet;
use tracing::Level;
use tracing::error;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = cli::from_env()?;
    let config = match &args.config_path {
        Some(path) => config_loader::load_config(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => config_loader::load_config_or_default(cli::DEFAULT_CONFIG_PATH),
    };

    let _guard = tracing_setup::init("docreg_submit", Path::new(&config.log_dir), Level::INFO, LogOutput::FileAndStdout)?;

    let client = Arc::new(config.build_client()?);
    let running = Arc::new(AtomicBool::new(true));
    shutdown_handler::setup(Arc::clone(&running), Arc::clone(client.limiter()))?;

    info!(documents = args.documents.len(), request_limit = config.request_limit, window_secs = config.window_secs, "Submitting documents");

    let max_wait = config.max_wait();
    let mut failures = 0usize;
    let mut submissions = JoinSet::new();

    for path in args.documents {
        if !running.load(Ordering::Relaxed) {
            warn!("Shutdown requested, not scheduling remaining documents");
            break;
        }

        let loaded = documents::load_document(&path).and_then(|document| Ok((document, documents::load_signature(&path)?)));
        let (document, signature) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                error!("{err:#}");
                failures += 1;
                continue;
            }
        };

        let client = Arc::clone(&client);
        submissions.spawn(async move {
            let result = match max_wait {
                Some(max_wait) => client.create_document_within(&document, &signature, max_wait).await,
                None => client.create_document(&document, &signature).await,
            };
            (path, result)
        });
    }

    while let Some(joined) = submissions.join_next().await {
        let (path, result) = joined.context("Submission task panicked")?;

        match result {
            Ok(()) => info!(document = %path.display(), "Document accepted"),
            Err(RegistryError::InterruptedWait(cause)) if cause.is_interrupted() => {
                warn!(document = %path.display(), "Document not sent: {cause}");
                failures += 1;
            }
            Err(err) => {
                error!(document = %path.display(), "Document failed: {err}");
                failures += 1;
            }
        }
    }

    let limiter = client.limiter();
    info!(resets = limiter.resets(), late_resets = limiter.late_resets(), "Submissions finished");
    limiter.shutdown();

    if failures > 0 {
        error!(failures, "Some documents were not accepted");
        return Ok(ExitCode::FAILURE);
    }

    info!("All documents accepted");
    Ok(ExitCode::SUCCESS)
}
