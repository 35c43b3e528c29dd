mod core;
mod i18n;
mod plugins;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use crate::core::config::{default_search_dirs, process_env, CliArgs, RunConfig};
use crate::core::error::{ConfigError, RunError};
use crate::core::model::Summary;
use crate::core::notifier::Notifier;
use crate::core::progress::ProgressLine;
use crate::i18n::Locale;
use crate::plugins::bt::driver::RqbitEngine;
use crate::plugins::bt::resolver::discover_descriptor;
use crate::plugins::registry::PluginRegistry;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

fn build_cli(registry: &PluginRegistry) -> Command {
    let cmd = Command::new("torentino")
        .about("Download a single .torrent with progress on the console, in a log file and in Telegram")
        .arg(
            Arg::new("torrent")
                .long("torrent")
                .help("Path to the .torrent file (or TORRENT_PATH)")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            Arg::new("save_dir")
                .long("save-dir")
                .help("Directory to save files into (or SAVE_PATH, default /app/downloads)")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            Arg::new("port_start")
                .long("port-start")
                .help("First listen port (or LISTEN_PORT_START, default 6881)")
                .value_parser(value_parser!(u16))
                .num_args(1),
        )
        .arg(
            Arg::new("port_end")
                .long("port-end")
                .help("Last listen port (or LISTEN_PORT_END, default 6891)")
                .value_parser(value_parser!(u16))
                .num_args(1),
        )
        .arg(
            Arg::new("no_peers_timeout")
                .long("no-peers-timeout")
                .help("Give up after this many seconds without peers (0 disables)")
                .value_parser(value_parser!(u64))
                .default_value("300")
                .num_args(1),
        )
        .arg(
            Arg::new("report_step")
                .long("report-step")
                .help("Send a progress notification every N percent")
                .value_parser(value_parser!(u8).range(1..=100))
                .default_value("20")
                .num_args(1),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .help("Also append logs to this file")
                .value_parser(value_parser!(PathBuf))
                .num_args(1),
        )
        .arg(
            Arg::new("locale")
                .long("locale")
                .help("Message language: en, ru")
                .default_value("en")
                .num_args(1),
        );

    registry.augment_command(cmd)
}

fn cli_args(m: &ArgMatches, registry: &PluginRegistry) -> anyhow::Result<CliArgs> {
    let mut args = CliArgs {
        torrent: m.get_one::<PathBuf>("torrent").cloned(),
        save_dir: m.get_one::<PathBuf>("save_dir").cloned(),
        port_start: m.get_one::<u16>("port_start").copied(),
        port_end: m.get_one::<u16>("port_end").copied(),
        verbose: m.get_flag("verbose"),
        logfile: m.get_one::<PathBuf>("logfile").cloned(),
        ..Default::default()
    };
    if let Some(secs) = m.get_one::<u64>("no_peers_timeout") {
        args.no_peers_timeout_secs = *secs;
    }
    if let Some(step) = m.get_one::<u8>("report_step") {
        args.report_step = *step;
    }
    if let Some(locale) = m.get_one::<String>("locale") {
        args.locale = Locale::parse(locale);
    }
    registry.apply_matches(m, &mut args)?;
    Ok(args)
}

/// Exit code for a command line clap refused, or `None` for `--help` and
/// `--version`, which clap prints and exits on itself.
fn usage_exit_code(e: &clap::Error) -> Option<u8> {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        kind => {
            let err = ConfigError::Usage(kind.as_str().unwrap_or("usage error").to_string());
            Some(RunError::from(err).exit_code())
        }
    }
}

fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    let registry = PluginRegistry::with_defaults();
    let matches = match build_cli(&registry).try_get_matches() {
        Ok(m) => m,
        Err(e) => match usage_exit_code(&e) {
            None => e.exit(),
            Some(code) => {
                let _ = e.print();
                return ExitCode::from(code);
            }
        },
    };

    let args = match cli_args(&matches, &registry) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            return ExitCode::from(1);
        }
    };

    let progress = ProgressLine::stdout();
    if let Err(e) = crate::core::logging::init(&args.logging(), progress.log_writer()) {
        eprintln!("[ERROR] {e}");
        return ExitCode::from(RunError::from(e).exit_code());
    }
    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if !e.not_found() => warn!(error = %e, "ignoring unreadable .env file"),
        Err(_) => {}
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            let err = RunError::RuntimeUnavailable(e.to_string());
            error!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };
    let interrupt = listen_for_interrupt(&runtime);

    match runtime.block_on(run(args, registry, progress, interrupt)) {
        Ok(summary) => {
            info!(
                name = %summary.name,
                save_dir = %summary.save_dir.display(),
                files = summary.files.len(),
                elapsed = %crate::core::metrics::format_duration(summary.elapsed.as_secs()),
                average_speed_kbps = %format!("{:.2}", summary.average_speed_kbps),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(
    args: CliArgs,
    registry: PluginRegistry,
    progress: ProgressLine,
    interrupt: impl Future<Output = ()>,
) -> Result<Summary, RunError> {
    info!("starting torrent downloader");
    let cfg = RunConfig::resolve(args, process_env, &default_search_dirs(), discover_descriptor)?;
    info!(
        torrent = %cfg.torrent.display(),
        save_dir = %cfg.save_dir.display(),
        ports = %cfg.ports,
        no_peers_timeout_secs = cfg.no_peers_timeout.map(|d| d.as_secs()).unwrap_or(0),
        telegram = cfg.telegram.is_some(),
        logfile = ?cfg.logging.logfile,
        "configuration resolved"
    );

    if !cfg.save_dir.exists() {
        tokio::fs::create_dir_all(&cfg.save_dir)
            .await
            .map_err(|source| ConfigError::SaveDir { path: cfg.save_dir.clone(), source })?;
        info!(save_dir = %cfg.save_dir.display(), "created save directory");
    }

    let notifier = Notifier::new(registry.sinks_for(&cfg), cfg.locale.messages());
    let engine = RqbitEngine::new();

    crate::core::monitor::run_download(&engine, &cfg, &notifier, &progress, interrupt).await
}

/// Starts listening for Ctrl-C right away and returns a future that resolves
/// on it. If the handler cannot be installed the future never resolves.
fn listen_for_interrupt(runtime: &Runtime) -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => warn!(error = %e, "cannot listen for interrupts"),
        }
    });
    async move {
        if rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
