// ABOUTME: Mirror run orchestration
// ABOUTME: Lists the library, exports and downloads each directory in order, then reconciles

pub mod download;
pub mod lister;
pub mod poller;
pub mod reconcile;

pub use download::{archive_path, download_ready_job, DownloadedArchive};
pub use lister::{list_directories, select_directories};
pub use poller::{classify, export_directory, ExportJob, PollOutcome, PollSettings};
pub use reconcile::{archive_base_name, reconcile};

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, MirrorConfig};
use crate::error::MirrorError;
use crate::remote::SeafileClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub downloaded: Vec<String>,
    pub timed_out: Vec<String>,
    pub malformed: Vec<String>,
    pub failed: Vec<String>,
    pub removed: Vec<PathBuf>,
}

pub async fn run(config: &MirrorConfig) -> Result<MirrorSummary> {
    let client = SeafileClient::new(&config.server, &config.auth_token)?;
    run_with_client(&client, config).await
}

pub async fn run_with_client(
    client: &SeafileClient,
    config: &MirrorConfig,
) -> Result<MirrorSummary> {
    std::fs::create_dir_all(&config.save_dir).map_err(|e| {
        MirrorError::Filesystem(format!(
            "Cannot create output directory {}: {}",
            config.save_dir.display(),
            e
        ))
    })?;

    let target_set = list_directories(client, &config.repo_id).await?;
    let settings = PollSettings {
        sleep_interval: config.sleep_interval,
        max_wait: config.max_wait,
    };

    let mut summary = MirrorSummary::default();
    for directory in &target_set {
        match mirror_directory(client, config, directory, settings).await {
            Ok(PollOutcome::Ready) => summary.downloaded.push(directory.clone()),
            Ok(PollOutcome::TimedOut) => summary.timed_out.push(directory.clone()),
            Ok(PollOutcome::Malformed) => summary.malformed.push(directory.clone()),
            Err(e) => match config.on_error {
                FailurePolicy::Abort => {
                    return Err(e.context(format!("Mirroring directory '{}' failed", directory)));
                }
                FailurePolicy::Skip => {
                    error!("Mirroring directory '{}' failed: {:#}", directory, e);
                    warn!("Skipping directory '{}'.", directory);
                    summary.failed.push(directory.clone());
                }
            },
        }
    }

    // Skipped directories are still part of the target set, so their
    // existing archives survive.
    if config.remove_unknown {
        summary.removed = reconcile(&config.save_dir, &target_set)?;
    }

    info!(
        "Download(s) finished: {} downloaded, {} timed out, {} malformed, {} failed, {} removed.",
        summary.downloaded.len(),
        summary.timed_out.len(),
        summary.malformed.len(),
        summary.failed.len(),
        summary.removed.len()
    );

    Ok(summary)
}

async fn mirror_directory(
    client: &SeafileClient,
    config: &MirrorConfig,
    directory: &str,
    settings: PollSettings,
) -> Result<PollOutcome> {
    let (job, outcome) = export_directory(client, &config.repo_id, directory, settings, |p| {
        debug!("Progress for '{}': {:?}", directory, p)
    })
    .await?;

    if outcome == PollOutcome::Ready {
        download_ready_job(client, &job.token, directory, &config.save_dir).await?;
    }

    Ok(outcome)
}
