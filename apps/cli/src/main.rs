use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, project, ClassifierService, HttpClassifierClient, Workflow, WorkflowEvent,
};
use tokio::sync::broadcast::error::RecvError;

mod render;

#[derive(Parser, Debug)]
#[command(
    name = "sporecheck",
    about = "Classify a mushroom photo as edible or poisonous using a remote classifier"
)]
struct Args {
    /// Image file to classify.
    #[arg(required_unless_present = "check")]
    image: Option<PathBuf>,
    /// Base URL of the classification service (overrides sporecheck.toml and env).
    #[arg(long)]
    service_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Also request the Grad-CAM heatmap after a successful prediction.
    #[arg(long)]
    visualize: bool,
    /// Write the heatmap to this path (implies --visualize).
    #[arg(long)]
    overlay_out: Option<PathBuf>,
    /// Only check that the service is reachable.
    #[arg(long)]
    check: bool,
    /// Print the result as JSON instead of text.
    #[arg(long)]
    json: bool,
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings();
    if let Some(url) = args.service_url.clone() {
        settings.service_url = url;
    }
    if let Some(ms) = args.timeout_ms.filter(|ms| *ms > 0) {
        settings.request_timeout = Duration::from_millis(ms);
    }

    let client = HttpClassifierClient::new(&settings.service_url)
        .with_context(|| format!("invalid service url '{}'", settings.service_url))?;

    if args.check {
        let banner = client
            .health(settings.request_timeout)
            .await
            .context("classifier service health check failed")?;
        println!("{}: {}", client.base_url(), banner.message);
        return Ok(());
    }

    let image_path = args
        .image
        .clone()
        .ok_or_else(|| anyhow!("an image path is required"))?;
    let bytes = tokio::fs::read(&image_path)
        .await
        .with_context(|| format!("failed to read image '{}'", image_path.display()))?;
    let file_name = image_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let workflow = Workflow::new(Arc::new(client), settings.request_timeout);
    let progress = spawn_progress_reporter(&workflow).await;

    workflow
        .select_image(bytes, file_name.as_deref())
        .await
        .with_context(|| format!("'{}' is not a usable image", image_path.display()))?;

    workflow
        .submit_prediction()
        .await?
        .await
        .context("prediction task failed")?;
    let session = workflow.snapshot().await;
    if let Some(err) = session.last_error() {
        bail!("prediction failed: {}", err.message);
    }

    let mut overlay_error = None;
    if args.visualize || args.overlay_out.is_some() {
        workflow
            .request_visualization()
            .await?
            .await
            .context("visualization task failed")?;
        let session = workflow.snapshot().await;
        overlay_error = session.last_error().map(|err| err.message.clone());

        if let (Some(path), Some(overlay)) = (&args.overlay_out, session.visualization()) {
            tokio::fs::write(path, overlay.bytes())
                .await
                .with_context(|| format!("failed to write heatmap to '{}'", path.display()))?;
            tracing::info!(path = %path.display(), "heatmap written");
        }
    }

    progress.abort();
    let session = workflow.snapshot().await;
    let view = project(&session);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&render::view_json(&view))?);
    } else {
        print!("{}", render::view_text(&view));
    }

    if let Some(message) = overlay_error {
        bail!("visualization failed: {message}");
    }
    Ok(())
}

async fn spawn_progress_reporter(workflow: &Workflow) -> tokio::task::JoinHandle<()> {
    let mut events = workflow.subscribe().await;
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(WorkflowEvent::PhaseChanged { to, .. }) if to.is_in_flight() => {
                    eprintln!("{}", render::progress_line(to));
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}
