use crate::core::error::ConfigError;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub logfile: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn default_filter(&self) -> &'static str {
        if self.verbose {
            "debug,librqbit=info,librqbit_dht=warn"
        } else {
            "info,librqbit=warn,librqbit_dht=error"
        }
    }
}

/// Installs the process subscriber: `console` always, plus an append-only log
/// file when one is configured. `RUST_LOG` overrides the level.
pub fn init<W>(config: &LoggingConfig, console: W) -> Result<(), ConfigError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));

    let file_layer = match &config.logfile {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|source| ConfigError::LogFile { path: path.clone(), source })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::LogFile { path: path.clone(), source })?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(console))
        .with(file_layer)
        .try_init();
    Ok(())
}
