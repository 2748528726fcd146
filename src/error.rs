// ABOUTME: Custom error types for the mirror run
// ABOUTME: Separates API, filesystem and configuration failures with actionable messages

use std::fmt;

#[derive(Debug)]
pub enum MirrorError {
    Api(String),
    Filesystem(String),
    Config(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MirrorError::Api(msg) => write!(f, "API error: {}", msg),
            MirrorError::Filesystem(msg) => write!(f, "Filesystem error: {}", msg),
            MirrorError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for MirrorError {}
