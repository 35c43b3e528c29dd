/// Message catalogues for the console line and notifications.
/// Locale is selected via the `--locale` CLI flag (e.g. `--locale ru`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "ru" | "ru-ru" | "ru_ru" | "russian" => Self::Ru,
            _ => Self::En,
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Locale::En => &EN,
            Locale::Ru => &RU,
        }
    }
}

pub struct Messages {
    pub unnamed_torrent: &'static str,
    pub progress: &'static str,
    pub downloaded: &'static str,
    pub speed: &'static str,
    pub peers: &'static str,
    pub eta: &'static str,
    pub eta_unknown: &'static str,
    pub elapsed: &'static str,
    pub average_speed: &'static str,
    pub save_dir: &'static str,
    pub reason: &'static str,
    pub started: &'static str,
    pub completed: &'static str,
    pub peers_lost: &'static str,
    pub peers_recovered: &'static str,
    pub timed_out: &'static str,
    pub interrupted: &'static str,
    pub failed: &'static str,
}

pub static EN: Messages = Messages {
    unnamed_torrent: "unnamed torrent",
    progress: "Progress",
    downloaded: "Downloaded",
    speed: "Speed",
    peers: "Peers",
    eta: "ETA",
    eta_unknown: "unknown",
    elapsed: "Elapsed",
    average_speed: "Average speed",
    save_dir: "Saved to",
    reason: "Reason",
    started: "Download started",
    completed: "Download completed",
    peers_lost: "No peers available",
    peers_recovered: "Peers are back",
    timed_out: "Download stopped: no peers",
    interrupted: "Download interrupted",
    failed: "Download failed",
};

pub static RU: Messages = Messages {
    unnamed_torrent: "торрент без имени",
    progress: "Прогресс",
    downloaded: "Скачано",
    speed: "Скорость",
    peers: "Пиров",
    eta: "Осталось",
    eta_unknown: "неизвестно",
    elapsed: "Время",
    average_speed: "Средняя скорость",
    save_dir: "Файлы сохранены в",
    reason: "Причина",
    started: "Скачивание начато",
    completed: "Скачивание завершено",
    peers_lost: "Нет доступных пиров",
    peers_recovered: "Пиры снова доступны",
    timed_out: "Скачивание остановлено: нет пиров",
    interrupted: "Скачивание прервано",
    failed: "Ошибка скачивания",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_english() {
        assert_eq!(Locale::parse("RU"), Locale::Ru);
        assert_eq!(Locale::parse("ru_RU"), Locale::Ru);
        assert_eq!(Locale::parse("de"), Locale::En);
        assert_eq!(Locale::parse(""), Locale::En);
    }
}
