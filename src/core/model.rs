use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One poll's read of the engine status.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusSnapshot {
    /// Fraction in `[0, 1]`.
    pub progress: f64,
    pub total_done: u64,
    pub total_wanted: u64,
    /// Bytes per second.
    pub download_rate: u64,
    pub peers: usize,
    pub is_seeding: bool,
}

/// Inclusive listen-port range handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    Known(Duration),
    Unknown,
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Known(d) => f.write_str(&crate::core::metrics::format_duration(d.as_secs())),
            Eta::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub percent: u8,
    pub downloaded_mb: f64,
    pub total_mb: f64,
    pub speed_kbps: f64,
    pub eta: Eta,
    pub elapsed: Duration,
    pub peers: usize,
}

/// What a successful run leaves behind.
#[derive(Debug, Clone)]
pub struct Summary {
    pub name: String,
    pub save_dir: PathBuf,
    pub elapsed: Duration,
    pub average_speed_kbps: f64,
    pub files: Vec<PathBuf>,
}
