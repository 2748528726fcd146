// ABOUTME: Remote Seafile API module
// ABOUTME: Client and wire models for the listing, zip-task and download endpoints

pub mod client;
pub mod models;

pub use client::{base_url, SeafileClient};
pub use models::{Dirent, DirentKind, ProgressReply, ZipProgress};
