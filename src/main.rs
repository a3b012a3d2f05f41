use clap::{Parser, Subcommand};
use image_press::{config, http};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "image-press")]
#[command(about = "Batch image upload service")]
#[command(long_about = "\
Batch image upload service

Accepts multipart uploads of up to ten images per request and, for each one,
writes a width-capped re-encode (optionally watermarked) and an optional
200x200 thumbnail into the storage directory:

  storage/
  ├── 1700000000000-dawn.jpg          # primary, width <= 1920
  └── 1700000000000-dawn.thumb.jpg    # thumbnail, exactly 200x200

Routes:
  POST /upload/image   fields: file (repeated), withThumbnail, watermark
  POST /upload/file    fields: file (repeated), stored unmodified
  GET  /<filename>     serves the storage directory

Run 'image-press gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind`
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Storage directory, overrides `server.storage_dir`
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Load and validate the config, then print the effective values
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.as_ref().unwrap_or(&Command::Serve) {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig => {
            let service_config = resolve_config(&cli)?;
            println!("==> Config is valid");
            print!("{}", toml::to_string_pretty(&service_config)?);
        }
        Command::Serve => {
            init_tracing();
            let service_config = resolve_config(&cli)?;
            init_thread_pool(&service_config.processing);
            tokio::runtime::Runtime::new()?.block_on(serve(service_config))?;
        }
    }

    Ok(())
}

/// Load the config file, apply CLI overrides, and re-validate.
fn resolve_config(cli: &Cli) -> Result<config::ServiceConfig, config::ConfigError> {
    let mut service_config = config::load_config(cli.config.as_deref())?;
    if let Some(bind) = &cli.bind {
        service_config.server.bind = bind.clone();
    }
    if let Some(storage) = &cli.storage {
        service_config.server.storage_dir = storage.clone();
    }
    service_config.validate()?;
    Ok(service_config)
}

async fn serve(service_config: config::ServiceConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(service_config.storage_dir()).await?;
    let bind = service_config.server.bind.clone();
    info!(
        bind = %bind,
        storage = %service_config.storage_dir().display(),
        max_files = service_config.upload.max_files,
        "Starting image-press"
    );

    let app = http::router(http::AppState::new(service_config));
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await
}

/// Structured logs to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The config can lower the count, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
