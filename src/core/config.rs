use crate::core::error::ConfigError;
use crate::core::logging::LoggingConfig;
use crate::core::model::PortRange;
use crate::i18n::Locale;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_SAVE_DIR: &str = "/app/downloads";
pub const DEFAULT_PORT_START: u16 = 6881;
pub const DEFAULT_PORT_END: u16 = 6891;
pub const DEFAULT_NO_PEERS_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_REPORT_STEP: u8 = 20;
pub const TORRENT_SEARCH_DIRS: [&str; 2] = ["torrents", "/app/torrents"];

/// Raw values from the command line, before environment and defaults.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub torrent: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub port_start: Option<u16>,
    pub port_end: Option<u16>,
    pub no_peers_timeout_secs: u64,
    pub report_step: u8,
    pub verbose: bool,
    pub logfile: Option<PathBuf>,
    pub locale: Locale,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            torrent: None,
            save_dir: None,
            port_start: None,
            port_end: None,
            no_peers_timeout_secs: DEFAULT_NO_PEERS_TIMEOUT_SECS,
            report_step: DEFAULT_REPORT_STEP,
            verbose: false,
            logfile: None,
            locale: Locale::En,
            telegram_token: None,
            telegram_chat_id: None,
        }
    }
}

impl CliArgs {
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig { verbose: self.verbose, logfile: self.logfile.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    /// `None` uses the public Bot API.
    pub api_base: Option<String>,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub torrent: PathBuf,
    pub save_dir: PathBuf,
    pub ports: PortRange,
    /// `None` disables the no-peer timeout.
    pub no_peers_timeout: Option<Duration>,
    pub report_step: u8,
    pub telegram: Option<TelegramConfig>,
    pub logging: LoggingConfig,
    pub locale: Locale,
}

impl RunConfig {
    /// Flag > environment > discovered > hard default. `discover` picks a
    /// torrent from `search_dirs` when neither flag nor environment name one.
    pub fn resolve<E, D>(
        cli: CliArgs,
        env: E,
        search_dirs: &[PathBuf],
        discover: D,
    ) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        D: FnOnce(&[PathBuf]) -> Option<PathBuf>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let torrent = match cli.torrent.clone().or_else(|| env("TORRENT_PATH").map(PathBuf::from)) {
            Some(path) => path,
            None => discover(search_dirs).ok_or_else(|| ConfigError::NoTorrent {
                searched: search_dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?,
        };
        if !torrent.is_file() {
            return Err(ConfigError::MissingFile(torrent));
        }

        let save_dir = cli
            .save_dir
            .clone()
            .or_else(|| env("SAVE_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR));

        let start = port(cli.port_start, "LISTEN_PORT_START", DEFAULT_PORT_START, &env)?;
        let end = port(cli.port_end, "LISTEN_PORT_END", DEFAULT_PORT_END, &env)?;
        if start == 0 || start > end {
            return Err(ConfigError::PortRange { start, end });
        }

        if cli.report_step == 0 || cli.report_step > 100 {
            return Err(ConfigError::ReportStep(cli.report_step));
        }

        let token = cli.telegram_token.clone().or_else(|| env("TELEGRAM_BOT_TOKEN"));
        let chat_id = cli.telegram_chat_id.clone().or_else(|| env("TELEGRAM_CHAT_ID"));
        let telegram = match (token, chat_id) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id,
                api_base: None,
            }),
            (None, None) => None,
            (token, _) => {
                let missing = if token.is_none() { "TELEGRAM_BOT_TOKEN" } else { "TELEGRAM_CHAT_ID" };
                warn!(missing, "telegram credentials incomplete, notifications disabled");
                None
            }
        };

        Ok(Self {
            torrent,
            save_dir,
            ports: PortRange { start, end },
            no_peers_timeout: match cli.no_peers_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            report_step: cli.report_step,
            telegram,
            logging: cli.logging(),
            locale: cli.locale,
        })
    }
}

fn port<E>(flag: Option<u16>, key: &'static str, default: u16, env: &E) -> Result<u16, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(p) = flag {
        return Ok(p);
    }
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw.clone() }),
        None => Ok(default),
    }
}

/// File stem of the descriptor, used when the engine cannot name the torrent.
pub fn descriptor_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

pub fn default_search_dirs() -> Vec<PathBuf> {
    TORRENT_SEARCH_DIRS.iter().map(PathBuf::from).collect()
}

pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::bt::resolver::discover_descriptor;
    use std::collections::HashMap;
    use std::fs;

    const DESCRIPTOR: &[u8] =
        b"d4:infod6:lengthi42e4:name5:a.bin12:piece lengthi16384e6:pieces20:aaaaaaaaaaaaaaaaaaaaee";

    fn nothing(_: &[PathBuf]) -> Option<PathBuf> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    fn touch(dir: &std::path::Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, DESCRIPTOR).unwrap();
        p
    }

    #[test]
    fn flags_win_over_environment() {
        let dir = tempfile::tempdir().unwrap();
        let from_flag = touch(dir.path(), "flag.torrent");
        let from_env = touch(dir.path(), "env.torrent");

        let cli = CliArgs {
            torrent: Some(from_flag.clone()),
            save_dir: Some("/tmp/out".into()),
            port_start: Some(7000),
            ..Default::default()
        };
        let env = env_from(&[
            ("TORRENT_PATH", from_env.to_str().unwrap()),
            ("SAVE_PATH", "/srv/env"),
            ("LISTEN_PORT_START", "6000"),
            ("LISTEN_PORT_END", "7010"),
        ]);

        let cfg = RunConfig::resolve(cli, env, &[], nothing).unwrap();
        assert_eq!(cfg.torrent, from_flag);
        assert_eq!(cfg.save_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.ports, PortRange { start: 7000, end: 7010 });
    }

    #[test]
    fn environment_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let t = touch(dir.path(), "a.torrent");

        let cfg = RunConfig::resolve(
            CliArgs::default(),
            env_from(&[("TORRENT_PATH", t.to_str().unwrap()), ("SAVE_PATH", "")]),
            &[],
            nothing,
        )
        .unwrap();
        assert_eq!(cfg.torrent, t);
        assert_eq!(cfg.save_dir, PathBuf::from(DEFAULT_SAVE_DIR));
        assert_eq!(cfg.ports, PortRange { start: 6881, end: 6891 });
        assert_eq!(cfg.no_peers_timeout, Some(Duration::from_secs(300)));
        assert_eq!(cfg.report_step, 20);
        assert!(cfg.telegram.is_none());
    }

    #[test]
    fn discovery_is_used_last() {
        let dir = tempfile::tempdir().unwrap();
        let t = touch(dir.path(), "found.torrent");

        let dirs = [dir.path().to_path_buf()];
        let cfg = RunConfig::resolve(CliArgs::default(), env_from(&[]), &dirs, discover_descriptor)
            .unwrap();
        assert_eq!(cfg.torrent, t);
    }

    #[test]
    fn nothing_found_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = [dir.path().to_path_buf()];
        let err = RunConfig::resolve(CliArgs::default(), env_from(&[]), &dirs, discover_descriptor)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoTorrent { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let cli = CliArgs { torrent: Some("/nonexistent/x.torrent".into()), ..Default::default() };
        let err = RunConfig::resolve(cli, env_from(&[]), &[], nothing).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn bad_ports_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let t = touch(dir.path(), "a.torrent");

        let cli = CliArgs { torrent: Some(t.clone()), ..Default::default() };
        let env = env_from(&[("LISTEN_PORT_START", "abc")]);
        let err = RunConfig::resolve(cli, env, &[], nothing).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "LISTEN_PORT_START", .. }));

        let cli = CliArgs {
            torrent: Some(t),
            port_start: Some(7000),
            port_end: Some(6000),
            ..Default::default()
        };
        let err = RunConfig::resolve(cli, env_from(&[]), &[], nothing).unwrap_err();
        assert!(matches!(err, ConfigError::PortRange { start: 7000, end: 6000 }));
    }

    #[test]
    fn telegram_needs_both_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let t = touch(dir.path(), "a.torrent");

        let cli = CliArgs { torrent: Some(t.clone()), ..Default::default() };
        let env = env_from(&[("TELEGRAM_BOT_TOKEN", "tok")]);
        let cfg = RunConfig::resolve(cli, env, &[], nothing).unwrap();
        assert!(cfg.telegram.is_none());

        let cli = CliArgs {
            torrent: Some(t),
            telegram_chat_id: Some("99".into()),
            ..Default::default()
        };
        let cfg = RunConfig::resolve(
            cli,
            env_from(&[("TELEGRAM_BOT_TOKEN", "tok"), ("TELEGRAM_CHAT_ID", "1")]),
            &[],
            nothing,
        )
        .unwrap();
        let tg = cfg.telegram.unwrap();
        assert_eq!(tg.token, "tok");
        assert_eq!(tg.chat_id, "99");
        assert_eq!(tg.api_base, None);
    }

    #[test]
    fn stem_fallback() {
        assert_eq!(descriptor_stem(Path::new("/x/ubuntu.torrent")).as_deref(), Some("ubuntu"));
        assert_eq!(descriptor_stem(Path::new("/")), None);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let dir = tempfile::tempdir().unwrap();
        let cli = CliArgs {
            torrent: Some(touch(dir.path(), "a.torrent")),
            no_peers_timeout_secs: 0,
            ..Default::default()
        };
        let cfg = RunConfig::resolve(cli, env_from(&[]), &[], nothing).unwrap();
        assert_eq!(cfg.no_peers_timeout, None);
    }
}
