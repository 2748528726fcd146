// ABOUTME: CLI entry point for seafile-zip-mirror
// ABOUTME: Parses arguments, installs logging and runs one mirror pass

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seafile_zip_mirror::{ConfigLayer, FailurePolicy, MirrorConfig};

#[derive(Parser)]
#[command(name = "seafile-zip-mirror")]
#[command(
    about = "Downloads individual ZIP files for all folders of a Seafile library/repository",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// The authentication token to use for all requests to the server
    auth_token: String,

    /// The repository ID to download
    repo_id: String,

    /// The server where the repository is located [default: cloud.seafile.com]
    #[arg(long)]
    server: Option<String>,

    /// The local directory to save the downloaded ZIP files to [default: .]
    #[arg(long = "save_dir")]
    save_dir: Option<PathBuf>,

    /// Seconds to wait between consecutive checks whether a ZIP file is ready [default: 3]
    #[arg(long = "sleep_time")]
    sleep_time: Option<u64>,

    /// Total seconds to wait for a ZIP file to be created [default: 300]
    #[arg(long = "wait_time")]
    wait_time: Option<u64>,

    /// Remove ZIP files in the output directory that do not match a directory in the library
    #[arg(long = "remove_unknown")]
    remove_unknown: bool,

    /// What to do when creating or downloading one ZIP fails [default: abort]
    #[arg(long = "on-error", value_enum)]
    on_error: Option<FailurePolicy>,

    /// TOML file providing defaults for the options above
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            server: self.server.clone(),
            save_dir: self.save_dir.clone(),
            sleep_time: self.sleep_time,
            wait_time: self.wait_time,
            remove_unknown: self.remove_unknown.then_some(true),
            on_error: self.on_error,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut layer = cli.layer();
    if let Some(path) = &cli.config {
        layer = layer.or(ConfigLayer::from_toml_file(path)?);
    }
    let config = MirrorConfig::build(cli.auth_token, cli.repo_id, layer)?;

    info!("Starting download with parameters: {:?}.", config);

    seafile_zip_mirror::run(&config).await?;

    info!("Exiting.");
    Ok(())
}
