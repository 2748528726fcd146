// ABOUTME: Directory lister for the library root
// ABOUTME: Produces the ordered target set of top-level directory names

use anyhow::Result;
use tracing::{debug, info};

use crate::remote::{Dirent, SeafileClient};

/// Keeps directory entries only, in server order. Duplicates are kept.
pub fn select_directories(dirents: &[Dirent]) -> Vec<String> {
    dirents
        .iter()
        .filter(|dirent| dirent.is_dir())
        .map(|dirent| dirent.name.clone())
        .collect()
}

pub async fn list_directories(client: &SeafileClient, repo_id: &str) -> Result<Vec<String>> {
    let dirents = client.list_dir(repo_id).await?;
    let directories = select_directories(&dirents);

    info!(
        "Requested list of all files in library ({} entries, {} directories).",
        dirents.len(),
        directories.len()
    );
    debug!("Target set: {:?}", directories);

    Ok(directories)
}
