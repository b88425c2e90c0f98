use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use banner_map_client::config::{DEFAULT_MAP_HEIGHT_PX, DEFAULT_MAP_WIDTH_PX};
use banner_map_client::http_source::HttpBannerSource;
use banner_map_client::selection::Status;
use banner_map_client::session::MapSession;
use banner_map_client::source::{BannerSource, MemoryBannerSource};
use banner_map_client::tracker::MapSize;
use banner_map_shared::BannerId;
use banner_map_shared::bounds_codec::share_query;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lists the banners visible in a map deep link")]
struct Args {
    /// Deep-link query string or full URL, e.g. "lat=52.5&lng=13.4&zoom=12"
    link: Option<String>,

    /// Banner API base URL (default: BANNER_API_URL or the public API)
    #[arg(long)]
    api_url: Option<String>,

    /// Serve banners from a JSON array instead of the API
    #[arg(long, conflicts_with = "api_url")]
    fixture: Option<PathBuf>,

    /// Map width in pixels
    #[arg(long, default_value_t = DEFAULT_MAP_WIDTH_PX)]
    width: u32,

    /// Map height in pixels
    #[arg(long, default_value_t = DEFAULT_MAP_HEIGHT_PX)]
    height: u32,

    /// Select a banner after the first aggregation
    #[arg(long)]
    select: Option<BannerId>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn link_query(link: &str) -> &str {
    link.split_once('?').map_or(link, |(_, query)| query)
}

fn build_source(args: &Args) -> Result<Arc<dyn BannerSource>, String> {
    if let Some(path) = &args.fixture {
        let source = MemoryBannerSource::from_json_file(path).map_err(|e| e.to_string())?;
        tracing::info!(path = %path.display(), banners = source.len(), "loaded banner fixture");
        return Ok(Arc::new(source));
    }
    let source = match &args.api_url {
        Some(url) => HttpBannerSource::new(url),
        None => HttpBannerSource::from_env(),
    }
    .map_err(|e| e.to_string())?;
    Ok(Arc::new(source))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = match build_source(&args) {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(error = %e, "failed to set up banner source");
            return ExitCode::FAILURE;
        }
    };

    let query = args.link.as_deref().map(link_query).unwrap_or_default();
    let size = MapSize {
        width: args.width,
        height: args.height,
    };
    let session = MapSession::new(source, query, size);
    session.start().await;

    if let Some(id) = args.select {
        session.select(id).await;
        if session.selection().await.status() == Status::Error {
            tracing::error!(banner_id = id, "could not select banner");
        }
    }

    let status = session.status().await;
    let banners = session.banners().await;
    let selection = session.selection().await;
    let viewport = session.viewport().await;
    let query = session.query().await;
    let selected = session.selected_banner().await;

    if args.json {
        let output = json!({
            "status": status,
            "query": query,
            "share": share_query(&viewport),
            "viewport": viewport,
            "selectedBannerId": selection.selected_banner_id(),
            "selectedBanner": selected,
            "banners": banners.as_ref(),
        });
        println!("{output:#}");
    } else {
        for banner in banners.iter() {
            let marker = if selection.selected_banner_id() == Some(banner.id) {
                '*'
            } else {
                ' '
            };
            println!(
                "{marker} {:>10}  {:<40}  {:>9.5} {:>10.5}  {} missions",
                banner.id,
                banner.title,
                banner.start_latitude,
                banner.start_longitude,
                banner.number_of_missions
            );
        }
        println!("?{query}");
    }

    if status == Status::Error {
        tracing::error!("banner aggregation failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
