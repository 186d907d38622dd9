//! Courier Cache - fetch URLs through a transparent HTTP response cache

use anyhow::{Context, Result};
use clap::Parser;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

mod config;

use config::Config;
use courier_core::{CachingHandler, Snapshot};
use courier_proxy::{HttpTransport, Request, Response, Transport};
use courier_store::{MemoryStore, spawn_purge_task};

/// Courier Cache - send requests through a caching HTTP pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "COURIER_CACHE_CONFIG")]
    config: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Extra request header ("Name: value"), may be repeated
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Number of times to send the request
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: u32,

    /// Print cache statistics as JSON when done
    #[arg(long)]
    stats: bool,

    /// Print Prometheus metrics when done
    #[arg(long)]
    metrics: bool,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "COURIER_CACHE_LOG_LEVEL")]
    log_level: Option<String>,

    /// URL to fetch
    url: Url,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, &config.logging.format);

    let metrics = if args.metrics {
        Some(
            PrometheusBuilder::new()
                .install_recorder()
                .context("Failed to install metrics recorder")?,
        )
    } else {
        None
    };

    info!("Starting Courier Cache v{}", env!("CARGO_PKG_VERSION"));

    let request = build_request(&args)?;

    // Initialize upstream transport and cache layer
    let upstream = Arc::new(HttpTransport::new(config.client.transport_config())?);
    let store = Arc::new(MemoryStore::<Snapshot>::new());
    let cache = Arc::new(CachingHandler::new(upstream.clone(), store.clone()));

    let pipeline: Arc<dyn Transport> = if config.cache.enabled {
        cache.clone()
    } else {
        info!("Response cache disabled, requests go straight upstream");
        upstream
    };

    let purge_task = (config.cache.enabled && config.cache.purge_interval_secs > 0)
        .then(|| spawn_purge_task(store.clone(), config.cache.purge_interval_secs));

    for attempt in 1..=args.repeat {
        let started = Instant::now();
        let response = pipeline
            .send(request.clone())
            .await
            .with_context(|| format!("Request #{} to {} failed", attempt, args.url))?;
        print_response(attempt, response, started.elapsed()).await?;
    }

    if let Some(task) = purge_task {
        task.abort();
    }

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&cache.stats())?);
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }

    info!("{} entries held in cache", store.len());
    Ok(())
}

/// Build the outbound request from command line arguments
fn build_request(args: &Args) -> Result<Request> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid method: {}", args.method))?;

    let mut request = Request::new(method, args.url.clone());
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }

    Ok(request)
}

/// Parse a "Name: value" header argument
fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Invalid header (expected \"Name: value\"): {}", raw))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("Invalid header name: {}", name.trim()))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("Invalid header value for {}", name))?;

    Ok((name, value))
}

/// Print the status line, headers and body size of a response
async fn print_response(attempt: u32, response: Response, elapsed: Duration) -> Result<()> {
    println!(
        "#{} {:?} {} {} ({} ms)",
        attempt,
        response.version,
        response.status.as_u16(),
        response.reason,
        elapsed.as_millis()
    );
    print_headers(&response.headers);

    if let Some(body) = response.body {
        print_headers(body.headers());
        let bytes = body.bytes().await.context("Failed to read response body")?;
        println!("[{} bytes]", bytes.len());
    } else {
        println!("[no body]");
    }

    Ok(())
}

fn print_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
