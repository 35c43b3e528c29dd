use crate::core::config::{descriptor_stem, RunConfig};
use crate::core::engine::{TorrentEngine, TorrentHandle};
use crate::core::error::RunError;
use crate::core::events::NotificationEvent;
use crate::core::metrics;
use crate::core::model::{StatusSnapshot, Summary};
use crate::core::notifier::{Notifier, StepGate};
use crate::core::peers::{PeerSignal, PeerTimeoutTracker};
use crate::core::progress::ProgressLine;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

pub const TICK: Duration = Duration::from_secs(1);

/// Adds the torrent, polls it until one of the terminal outcomes, and stops
/// the engine session on the way out. `interrupt` is honoured from the first
/// await on, including while the engine starts up.
pub async fn run_download<F>(
    engine: &dyn TorrentEngine,
    cfg: &RunConfig,
    notifier: &Notifier,
    progress: &ProgressLine,
    interrupt: F,
) -> Result<Summary, RunError>
where
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let fallback_name = descriptor_stem(&cfg.torrent)
        .unwrap_or_else(|| notifier.messages().unnamed_torrent.to_string());

    info!(torrent = %cfg.torrent.display(), "adding torrent to engine");
    let started = tokio::select! {
        biased;
        _ = &mut interrupt => {
            warn!("interrupted while starting the engine");
            notifier.send(&NotificationEvent::Interrupted { name: fallback_name }).await;
            return Err(RunError::Interrupted);
        }
        started = engine.start(&cfg.torrent, &cfg.save_dir, cfg.ports) => started,
    };
    let handle = match started {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "engine rejected torrent");
            notifier
                .send(&NotificationEvent::Failed { name: fallback_name, reason: e.to_string() })
                .await;
            return Err(e.into());
        }
    };

    let name = handle.name();
    info!(name = %name, "downloading");
    progress.set_name(&name);

    let mut monitor = Monitor {
        handle: handle.as_ref(),
        notifier,
        progress,
        name,
        save_dir: &cfg.save_dir,
        peers: PeerTimeoutTracker::new(cfg.no_peers_timeout, TICK),
        gate: StepGate::new(cfg.report_step),
    };
    let start_event = NotificationEvent::Start {
        name: monitor.name.clone(),
        save_dir: cfg.save_dir.clone(),
    };
    let result = tokio::select! {
        biased;
        _ = &mut interrupt => Some(Err(monitor.interrupted().await)),
        _ = notifier.send(&start_event) => None,
    };
    let result = match result {
        Some(r) => r,
        None => monitor.watch(interrupt.as_mut()).await,
    };
    handle.shutdown().await;
    result
}

struct Monitor<'a> {
    handle: &'a dyn TorrentHandle,
    notifier: &'a Notifier,
    progress: &'a ProgressLine,
    name: String,
    save_dir: &'a Path,
    peers: PeerTimeoutTracker,
    gate: StepGate,
}

impl Monitor<'_> {
    async fn watch<F>(&mut self, interrupt: F) -> Result<Summary, RunError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        let started = Instant::now();
        let mut ticker = time::interval(TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_percent: Option<u8> = None;

        loop {
            tokio::select! {
                biased;
                _ = &mut interrupt => return Err(self.interrupted().await),
                _ = ticker.tick() => {}
            }

            let snapshot = match self.handle.status() {
                Ok(s) => s,
                Err(e) => return Err(self.failed(e.into()).await),
            };

            // A finished torrent needs no peers.
            if !snapshot.is_seeding {
                for signal in self.peers.observe(snapshot.peers) {
                    if let Some(err) = self.on_peer_signal(signal).await {
                        return Err(err);
                    }
                }
            }

            let report = metrics::derive(&snapshot, started.elapsed());
            if last_percent != Some(report.percent) {
                last_percent = Some(report.percent);
                self.progress.update(&report, self.notifier.messages());
                debug!(
                    percent = report.percent,
                    peers = report.peers,
                    speed_kbps = report.speed_kbps,
                    eta = %report.eta,
                    no_peer_secs = self.peers.no_peer_ticks(),
                    "progress"
                );
                if self.gate.admit(&report) {
                    self.notifier
                        .send(&NotificationEvent::ProgressTick { name: self.name.clone(), report })
                        .await;
                }
            }

            if snapshot.is_seeding {
                return Ok(self.completed(&snapshot, started.elapsed()).await);
            }
        }
    }

    async fn on_peer_signal(&mut self, signal: PeerSignal) -> Option<RunError> {
        let name = self.name.clone();
        match signal {
            PeerSignal::PeersLost => {
                warn!("no peers, waiting");
                self.notifier.send(&NotificationEvent::PeersLost { name }).await;
                None
            }
            PeerSignal::PeersRecovered { after } => {
                info!(after_secs = after.as_secs(), "peers are back");
                self.notifier.send(&NotificationEvent::PeersRecovered { name, after }).await;
                None
            }
            PeerSignal::TimedOut { after } => {
                self.progress.abandon();
                warn!(after_secs = after.as_secs(), "no peers for too long, giving up");
                self.notifier.send(&NotificationEvent::TimedOut { name, after }).await;
                Some(RunError::PeerTimeout(after.as_secs()))
            }
        }
    }

    async fn interrupted(&self) -> RunError {
        self.progress.abandon();
        warn!("interrupted, stopping download");
        self.notifier
            .send(&NotificationEvent::Interrupted { name: self.name.clone() })
            .await;
        RunError::Interrupted
    }

    async fn failed(&self, err: RunError) -> RunError {
        self.progress.abandon();
        error!(error = %err, "download failed");
        self.notifier
            .send(&NotificationEvent::Failed { name: self.name.clone(), reason: err.to_string() })
            .await;
        err
    }

    async fn completed(&self, snapshot: &StatusSnapshot, elapsed: Duration) -> Summary {
        self.progress.finish();
        let average_speed_kbps = metrics::average_speed(snapshot.total_wanted, elapsed) / 1024.0;
        let files = list_files(self.save_dir);

        info!(save_dir = %self.save_dir.display(), "download complete");
        for file in &files {
            info!("- {}", file.display());
        }
        info!(
            elapsed = %metrics::format_duration(elapsed.as_secs()),
            average_speed_kbps = %format!("{average_speed_kbps:.2}"),
            "total download time"
        );

        self.notifier
            .send(&NotificationEvent::Completed {
                name: self.name.clone(),
                save_dir: self.save_dir.to_path_buf(),
                elapsed,
                average_speed_kbps,
            })
            .await;

        Summary {
            name: self.name.clone(),
            save_dir: self.save_dir.to_path_buf(),
            elapsed,
            average_speed_kbps,
            files,
        }
    }
}

/// Every regular file under `dir`, sorted.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
