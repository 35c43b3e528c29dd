use crate::core::config::descriptor_stem;
use crate::core::engine::{EngineError, TorrentEngine, TorrentHandle};
use crate::core::model::{PortRange, StatusSnapshot};
use crate::plugins::bt::resolver::validate_descriptor;
use async_trait::async_trait;
use librqbit::{
    AddTorrent, AddTorrentOptions, ManagedTorrent, Session, SessionOptions, TorrentStats,
    TorrentStatsState,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const UNNAMED: &str = "unnamed torrent";
const MIB: f64 = 1024.0 * 1024.0;

/// librqbit-backed engine: one session per download.
pub struct RqbitEngine;

impl RqbitEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TorrentEngine for RqbitEngine {
    async fn start(
        &self,
        source: &Path,
        save_dir: &Path,
        ports: PortRange,
    ) -> Result<Box<dyn TorrentHandle>, EngineError> {
        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| EngineError::Unknown(format!("read {}: {e}", source.display())))?;
        validate_descriptor(&bytes)?;

        let opts = SessionOptions {
            // librqbit takes a half-open range.
            listen_port_range: Some(ports.start..ports.end.saturating_add(1)),
            ..Default::default()
        };
        info!(ports = %ports, "starting engine session");
        let session = Session::new_with_opts(save_dir.to_path_buf(), opts)
            .await
            .map_err(|e| EngineError::BindFailure(format!("{e:#}")))?;

        let added = session
            .add_torrent(
                AddTorrent::from_bytes(bytes),
                Some(AddTorrentOptions { overwrite: true, ..Default::default() }),
            )
            .await;
        let torrent = match added.map(|resp| resp.into_handle()) {
            Ok(Some(t)) => t,
            Ok(None) => {
                session.stop().await;
                return Err(EngineError::Unknown("engine returned no torrent handle".to_string()));
            }
            Err(e) => {
                session.stop().await;
                return Err(EngineError::Unknown(format!("add torrent: {e:#}")));
            }
        };

        Ok(Box::new(RqbitHandle {
            session,
            torrent,
            stem: descriptor_stem(source),
        }))
    }
}

pub struct RqbitHandle {
    session: Arc<Session>,
    torrent: Arc<ManagedTorrent>,
    stem: Option<String>,
}

#[async_trait]
impl TorrentHandle for RqbitHandle {
    fn name(&self) -> String {
        pick_name(self.torrent.name(), self.stem.clone())
    }

    fn status(&self) -> Result<StatusSnapshot, EngineError> {
        snapshot_from_stats(&self.torrent.stats())
    }

    async fn shutdown(&self) {
        debug!("stopping engine session");
        self.session.stop().await;
    }
}

/// Engine name, then descriptor stem, then a placeholder. Blank names are skipped.
fn pick_name(engine: Option<String>, stem: Option<String>) -> String {
    [engine, stem]
        .into_iter()
        .flatten()
        .find(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNNAMED.to_string())
}

/// librqbit reports speed in MiB/s.
fn bytes_per_sec(mib_per_sec: f64) -> u64 {
    if !mib_per_sec.is_finite() {
        return 0;
    }
    (mib_per_sec * MIB).max(0.0) as u64
}

fn snapshot_from_stats(stats: &TorrentStats) -> Result<StatusSnapshot, EngineError> {
    if let Some(err) = &stats.error {
        return Err(EngineError::Unknown(err.clone()));
    }
    if matches!(stats.state, TorrentStatsState::Error) {
        return Err(EngineError::Unknown("torrent entered error state".to_string()));
    }

    let (download_rate, peers) = match &stats.live {
        Some(live) => (bytes_per_sec(live.download_speed.mbps), live.snapshot.peer_stats.live),
        None => (0, 0),
    };
    let progress = if stats.total_bytes == 0 {
        if stats.finished { 1.0 } else { 0.0 }
    } else {
        stats.progress_bytes as f64 / stats.total_bytes as f64
    };

    Ok(StatusSnapshot {
        progress,
        total_done: stats.progress_bytes,
        total_wanted: stats.total_bytes,
        download_rate,
        peers,
        is_seeding: stats.finished,
    })
}
