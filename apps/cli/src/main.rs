use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use client_core::{transport::WsJobChannel, ControllerPhase, FormController, FormFields};
use tracing::info;
use url::Url;

mod config;
mod view;

use view::ConsoleView;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the docgen service; falls back to config/env.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    git_url: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    doc_theme: Option<String>,
    #[arg(long)]
    doc_path: Option<String>,
    #[arg(long)]
    project_name: Option<String>,
    #[arg(long)]
    version: Option<String>,
    /// Print the download link without fetching the artifact.
    #[arg(long)]
    no_fetch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let settings = config::load_settings();

    let server_url = args
        .server_url
        .clone()
        .unwrap_or_else(|| settings.server_url.clone());
    let download_base = Url::parse(&server_url)
        .with_context(|| format!("invalid server url: {server_url}"))?;

    let fields = FormFields {
        email: args.email,
        git_url: args.git_url,
        author: args.author,
        doc_theme: args.doc_theme,
        doc_path: args.doc_path,
        project_name: args.project_name,
        version: args.version,
    };

    let channel = WsJobChannel::connect(&server_url).await?;
    let mut controller =
        FormController::new(channel, ConsoleView::default(), download_base, fields);

    controller.submit().await?;
    let phase = controller.run().await;

    if phase != ControllerPhase::Completed {
        return Err(anyhow!("build did not complete"));
    }

    if let Some(href) = controller.download_href() {
        if args.no_fetch {
            info!(href = %href, "skipping artifact fetch");
        } else {
            let path = fetch_artifact(href, Path::new(&settings.download_dir)).await?;
            println!("saved to {}", path.display());
        }
    }

    Ok(())
}

async fn fetch_artifact(href: &Url, download_dir: &Path) -> Result<PathBuf> {
    let response = reqwest::Client::new()
        .get(href.clone())
        .send()
        .await
        .with_context(|| format!("failed to fetch {href}"))?
        .error_for_status()?;

    let filename = href
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("artifact")
        .to_string();

    std::fs::create_dir_all(download_dir).with_context(|| {
        format!(
            "failed to create download directory '{}'",
            download_dir.display()
        )
    })?;

    let path = download_dir.join(filename);
    let bytes = response.bytes().await?;
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    info!(path = %path.display(), size_bytes = bytes.len(), "artifact downloaded");
    Ok(path)
}
