use crate::core::metrics::{format_duration, render_eta};
use crate::core::model::ProgressReport;
use crate::i18n::Messages;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Start { name: String, save_dir: PathBuf },
    ProgressTick { name: String, report: ProgressReport },
    PeersLost { name: String },
    PeersRecovered { name: String, after: Duration },
    Completed { name: String, save_dir: PathBuf, elapsed: Duration, average_speed_kbps: f64 },
    TimedOut { name: String, after: Duration },
    Interrupted { name: String },
    Failed { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    ProgressTick,
    PeersLost,
    PeersRecovered,
    Completed,
    TimedOut,
    Interrupted,
    Failed,
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } => EventKind::Start,
            Self::ProgressTick { .. } => EventKind::ProgressTick,
            Self::PeersLost { .. } => EventKind::PeersLost,
            Self::PeersRecovered { .. } => EventKind::PeersRecovered,
            Self::Completed { .. } => EventKind::Completed,
            Self::TimedOut { .. } => EventKind::TimedOut,
            Self::Interrupted { .. } => EventKind::Interrupted,
            Self::Failed { .. } => EventKind::Failed,
        }
    }

    /// Events that mean something went wrong with the download.
    pub fn is_alarming(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::PeersLost | EventKind::TimedOut | EventKind::Failed | EventKind::Interrupted
        )
    }

    /// Renders the message body with inline markup (`*bold*`, `` `code` ``).
    pub fn render(&self, m: &Messages) -> String {
        match self {
            Self::Start { name, save_dir } => format!(
                "*{}*\n`{}`\n{}: `{}`",
                m.started,
                name,
                m.save_dir,
                save_dir.display()
            ),
            Self::ProgressTick { name, report } => format!(
                "*{}: {}%*\n`{}`\n{}: {:.2}/{:.2} MB\n{}: {:.2} KB/s\n{}: {}\n{}: {}\n{}: {}",
                m.progress,
                report.percent,
                name,
                m.downloaded,
                report.downloaded_mb,
                report.total_mb,
                m.speed,
                report.speed_kbps,
                m.peers,
                report.peers,
                m.eta,
                render_eta(report.eta, m),
                m.elapsed,
                format_duration(report.elapsed.as_secs()),
            ),
            Self::PeersLost { name } => format!("*{}*\n`{}`", m.peers_lost, name),
            Self::PeersRecovered { name, after } => format!(
                "*{}*\n`{}`\n{}",
                m.peers_recovered,
                name,
                format_duration(after.as_secs())
            ),
            Self::Completed { name, save_dir, elapsed, average_speed_kbps } => format!(
                "*{}*\n`{}`\n{}: `{}`\n{}: {}\n{}: {:.2} KB/s",
                m.completed,
                name,
                m.save_dir,
                save_dir.display(),
                m.elapsed,
                format_duration(elapsed.as_secs()),
                m.average_speed,
                average_speed_kbps,
            ),
            Self::TimedOut { name, after } => format!(
                "*{}*\n`{}`\n{}",
                m.timed_out,
                name,
                format_duration(after.as_secs())
            ),
            Self::Interrupted { name } => format!("*{}*\n`{}`", m.interrupted, name),
            Self::Failed { name, reason } => {
                format!("*{}*\n`{}`\n{}: `{}`", m.failed, name, m.reason, reason)
            }
        }
    }
}
