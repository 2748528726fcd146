// ABOUTME: Library root for seafile-zip-mirror
// ABOUTME: Mirrors the top-level folders of a Seafile library to local ZIP archives

pub mod config;
pub mod error;
pub mod mirror;
pub mod remote;

pub use config::{ConfigLayer, FailurePolicy, MirrorConfig};
pub use error::MirrorError;
pub use mirror::{run, run_with_client, MirrorSummary, PollOutcome};
pub use remote::SeafileClient;
