use crate::core::config::{CliArgs, RunConfig};
use crate::core::events::NotificationEvent;
use anyhow::Context;
use async_trait::async_trait;
use clap::{ArgMatches, Command};
use tracing::warn;

pub trait CliPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn augment_command(&self, cmd: Command) -> Command;
    fn apply_matches(&self, matches: &ArgMatches, args: &mut CliArgs) -> anyhow::Result<()>;
}

/// A notification channel. Errors are reported to the fan-out, which logs and drops them.
#[async_trait]
pub trait NotifySink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, event: &NotificationEvent, text: &str) -> anyhow::Result<()>;
}

pub struct PluginRegistry {
    cli_plugins: Vec<Box<dyn CliPlugin>>,
}

impl PluginRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self { cli_plugins: vec![] };
        reg.cli_plugins.push(Box::new(crate::plugins::telegram::cli::TelegramCliPlugin::new()));
        reg
    }

    pub fn augment_command(&self, cmd: Command) -> Command {
        self.cli_plugins.iter().fold(cmd, |c, p| p.augment_command(c))
    }

    pub fn apply_matches(&self, matches: &ArgMatches, args: &mut CliArgs) -> anyhow::Result<()> {
        for p in &self.cli_plugins {
            p.apply_matches(matches, args)
                .with_context(|| format!("{} options", p.name()))?;
        }
        Ok(())
    }

    /// The log sink is always present; remote channels only when configured.
    pub fn sinks_for(&self, cfg: &RunConfig) -> Vec<Box<dyn NotifySink>> {
        let mut sinks: Vec<Box<dyn NotifySink>> =
            vec![Box::new(crate::plugins::log::driver::LogSink::new())];

        if let Some(tg) = &cfg.telegram {
            match crate::plugins::telegram::driver::TelegramSink::new(tg) {
                Ok(sink) => sinks.push(Box::new(sink)),
                Err(e) => warn!(error = %format!("{e:#}"), "telegram notifications disabled"),
            }
        }
        sinks
    }
}
