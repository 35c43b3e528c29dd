use crate::core::engine::EngineError;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid command line: {0}")]
    Usage(String),

    #[error("no torrent file given (--torrent or TORRENT_PATH) and none found in {searched}")]
    NoTorrent { searched: String },

    #[error("torrent file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid listen port range {start}-{end}")]
    PortRange { start: u16, end: u16 },

    #[error("report step must be between 1 and 100, got {0}")]
    ReportStep(u8),

    #[error("cannot create save directory {}: {source}", path.display())]
    SaveDir { path: PathBuf, source: std::io::Error },

    #[error("cannot open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: std::io::Error },
}

/// Why a run did not end in success. Every variant maps to one exit code.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid or corrupt torrent file: {0}")]
    InvalidDescriptor(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("interrupted by user")]
    Interrupted,

    #[error("no peers for {0}s, giving up")]
    PeerTimeout(u64),

    #[error("runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 1,
            RunError::InvalidDescriptor(_) => 2,
            RunError::Engine(_) => 3,
            RunError::Interrupted => 4,
            RunError::PeerTimeout(_) => 5,
            RunError::RuntimeUnavailable(_) => 10,
        }
    }
}

impl From<EngineError> for RunError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidSource(detail) => RunError::InvalidDescriptor(detail),
            other => RunError::Engine(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        let cases = [
            (RunError::Config(ConfigError::MissingFile("a".into())), 1),
            (RunError::Config(ConfigError::Usage("bad flag".into())), 1),
            (RunError::InvalidDescriptor("x".into()), 2),
            (RunError::Engine("x".into()), 3),
            (RunError::Interrupted, 4),
            (RunError::PeerTimeout(5), 5),
            (RunError::RuntimeUnavailable("x".into()), 10),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn engine_errors_are_classified() {
        let e: RunError = EngineError::InvalidSource("bad bencode".into()).into();
        assert_eq!(e.exit_code(), 2);

        let e: RunError = EngineError::BindFailure("ports busy".into()).into();
        assert_eq!(e.exit_code(), 3);
        assert!(e.to_string().contains("ports busy"));

        let e: RunError = EngineError::Unknown("disk full".into()).into();
        assert_eq!(e.exit_code(), 3);
    }
}
