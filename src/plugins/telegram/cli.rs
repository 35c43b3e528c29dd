use crate::core::config::CliArgs;
use crate::plugins::registry::CliPlugin;
use clap::{Arg, ArgMatches, Command};

pub struct TelegramCliPlugin;

impl TelegramCliPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl CliPlugin for TelegramCliPlugin {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn augment_command(&self, cmd: Command) -> Command {
        cmd.arg(
            Arg::new("telegram_token")
                .long("telegram-token")
                .help_heading("Telegram")
                .help("Bot token (or TELEGRAM_BOT_TOKEN)")
                .num_args(1),
        )
        .arg(
            Arg::new("telegram_chat_id")
                .long("telegram-chat-id")
                .help_heading("Telegram")
                .help("Chat or channel id to notify (or TELEGRAM_CHAT_ID)")
                .num_args(1),
        )
    }

    fn apply_matches(&self, matches: &ArgMatches, args: &mut CliArgs) -> anyhow::Result<()> {
        if let Some(token) = matches.get_one::<String>("telegram_token") {
            args.telegram_token = Some(token.trim().to_string());
        }
        if let Some(chat) = matches.get_one::<String>("telegram_chat_id") {
            args.telegram_chat_id = Some(chat.trim().to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_land_in_cli_args() {
        let plugin = TelegramCliPlugin::new();
        let cmd = plugin.augment_command(Command::new("t"));
        let m = cmd
            .try_get_matches_from(["t", "--telegram-token", " abc ", "--telegram-chat-id", "42"])
            .unwrap();

        let mut args = CliArgs::default();
        plugin.apply_matches(&m, &mut args).unwrap();
        assert_eq!(args.telegram_token.as_deref(), Some("abc"));
        assert_eq!(args.telegram_chat_id.as_deref(), Some("42"));
    }
}
