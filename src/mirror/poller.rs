// ABOUTME: Export job poller for server-side ZIP packaging
// ABOUTME: Creates a zip task per directory and polls it until ready, timed out or malformed

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::remote::{SeafileClient, ZipProgress};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    TimedOut,
    Malformed,
}

/// A server-side packaging job. The token is only valid for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub directory_name: String,
    pub token: String,
    pub zipped: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub sleep_interval: Duration,
    pub max_wait: Duration,
}

/// Terminal classification of one progress body, or `None` to keep polling.
pub fn classify(progress: &ZipProgress) -> Option<PollOutcome> {
    match progress.counters() {
        None => Some(PollOutcome::Malformed),
        Some((zipped, total)) if zipped == total => Some(PollOutcome::Ready),
        Some(_) => None,
    }
}

pub async fn create_job(
    client: &SeafileClient,
    repo_id: &str,
    directory_name: &str,
) -> Result<ExportJob> {
    let token = client.create_zip_task(repo_id, directory_name).await?;
    info!(
        "Requested creation of ZIP for directory '{}' with ZIP access token '{}'.",
        directory_name, token
    );

    Ok(ExportJob {
        directory_name: directory_name.to_string(),
        token,
        zipped: 0,
        total: 0,
    })
}

/// Polls `job` until it reaches a terminal outcome. `callback` sees every
/// progress body, including the final one.
pub async fn poll_job(
    client: &SeafileClient,
    job: &mut ExportJob,
    settings: PollSettings,
    callback: impl Fn(&ZipProgress),
) -> Result<PollOutcome> {
    let mut sleeps: u32 = 0;

    loop {
        let elapsed = settings.sleep_interval * sleeps;
        if elapsed > settings.max_wait {
            warn!(
                "Waited {} seconds to download directory '{}'. Skipping directory '{}'.",
                elapsed.as_secs_f64(),
                job.directory_name,
                job.directory_name
            );
            return Ok(PollOutcome::TimedOut);
        }

        let reply = client.query_zip_progress(&job.token).await?;
        callback(&reply.progress);

        if let Some((zipped, total)) = reply.progress.counters() {
            job.zipped = zipped;
            job.total = total;
        }

        match classify(&reply.progress) {
            Some(PollOutcome::Malformed) => {
                error!(
                    "JSON payload not as expected: {}. This usually indicates that the size of the directory is too large.",
                    reply.body
                );
                warn!("Skipping directory '{}'.", job.directory_name);
                return Ok(PollOutcome::Malformed);
            }
            Some(outcome) => return Ok(outcome),
            None => {
                info!(
                    "Requested progress of ZIP for directory '{}' -> Not ready ({}/{}, poll {})",
                    job.directory_name,
                    job.zipped,
                    job.total,
                    sleeps + 1
                );
            }
        }

        tokio::time::sleep(settings.sleep_interval).await;
        sleeps += 1;
    }
}

pub async fn export_directory(
    client: &SeafileClient,
    repo_id: &str,
    directory_name: &str,
    settings: PollSettings,
    callback: impl Fn(&ZipProgress),
) -> Result<(ExportJob, PollOutcome)> {
    let mut job = create_job(client, repo_id, directory_name).await?;
    let outcome = poll_job(client, &mut job, settings, callback).await?;
    Ok((job, outcome))
}
