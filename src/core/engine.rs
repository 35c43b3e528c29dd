use crate::core::model::{PortRange, StatusSnapshot};
use async_trait::async_trait;
use std::path::Path;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid torrent descriptor: {0}")]
    InvalidSource(String),

    #[error("cannot open engine session: {0}")]
    BindFailure(String),

    #[error("{0}")]
    Unknown(String),
}

/// Starts downloads. Implementations never retry; errors surface as-is.
#[async_trait]
pub trait TorrentEngine: Send + Sync {
    async fn start(
        &self,
        source: &Path,
        save_dir: &Path,
        ports: PortRange,
    ) -> Result<Box<dyn TorrentHandle>, EngineError>;
}

#[async_trait]
pub trait TorrentHandle: Send + Sync {
    /// Best effort, never fails: falls back to a placeholder.
    fn name(&self) -> String;

    fn status(&self) -> Result<StatusSnapshot, EngineError>;

    /// Stops the session and releases listen ports.
    async fn shutdown(&self);
}
