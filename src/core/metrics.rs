use crate::core::model::{Eta, ProgressReport, StatusSnapshot};
use crate::i18n::Messages;
use std::time::Duration;

const MB: f64 = 1024.0 * 1024.0;
const KB: f64 = 1024.0;

/// Derives the human-facing report for one snapshot. Pure.
pub fn derive(snapshot: &StatusSnapshot, elapsed: Duration) -> ProgressReport {
    ProgressReport {
        percent: percent(snapshot.progress),
        downloaded_mb: snapshot.total_done as f64 / MB,
        total_mb: snapshot.total_wanted as f64 / MB,
        speed_kbps: snapshot.download_rate as f64 / KB,
        eta: match eta_seconds(snapshot) {
            Some(s) => Eta::Known(Duration::from_secs(s)),
            None => Eta::Unknown,
        },
        elapsed,
        peers: snapshot.peers,
    }
}

pub fn percent(progress: f64) -> u8 {
    if !progress.is_finite() {
        return 0;
    }
    (progress * 100.0).floor().clamp(0.0, 100.0) as u8
}

/// `None` while nothing is flowing.
pub fn eta_seconds(snapshot: &StatusSnapshot) -> Option<u64> {
    if snapshot.download_rate == 0 {
        return None;
    }
    Some(snapshot.total_wanted.saturating_sub(snapshot.total_done) / snapshot.download_rate)
}

pub fn format_duration(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Bytes per second over the whole run, 0 when no time has passed.
pub fn average_speed(total_wanted: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    total_wanted as f64 / secs
}

pub fn render_eta(eta: Eta, msgs: &Messages) -> String {
    match eta {
        Eta::Known(d) => format_duration(d.as_secs()),
        Eta::Unknown => msgs.eta_unknown.to_string(),
    }
}

/// The single console line shown while downloading.
pub fn render_line(report: &ProgressReport, msgs: &Messages) -> String {
    format!(
        "{}: {}% | {}: {:.2}/{:.2} MB | {}: {:.2} KB/s | {}: {} | {}: {}",
        msgs.progress,
        report.percent,
        msgs.downloaded,
        report.downloaded_mb,
        report.total_mb,
        msgs.speed,
        report.speed_kbps,
        msgs.peers,
        report.peers,
        msgs.eta,
        render_eta(report.eta, msgs),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::EN;

    fn snapshot(done: u64, wanted: u64, rate: u64) -> StatusSnapshot {
        StatusSnapshot {
            progress: done as f64 / wanted as f64,
            total_done: done,
            total_wanted: wanted,
            download_rate: rate,
            peers: 4,
            is_seeding: false,
        }
    }

    #[test]
    fn eta_is_remaining_over_rate() {
        let s = snapshot(1_000, 101_000, 100);
        assert_eq!(eta_seconds(&s), Some(1_000));

        let s = snapshot(0, 7_000, 3);
        assert_eq!(eta_seconds(&s), Some(2_333));
    }

    #[test]
    fn eta_is_unknown_without_rate() {
        let s = snapshot(10, 100, 0);
        assert_eq!(eta_seconds(&s), None);
        let report = derive(&s, Duration::from_secs(3));
        assert_eq!(report.eta, Eta::Unknown);
        assert_eq!(report.eta.to_string(), "unknown");
        assert_eq!(render_eta(report.eta, &EN), "unknown");
    }

    #[test]
    fn eta_never_negative_when_done_exceeds_wanted() {
        let s = StatusSnapshot {
            progress: 1.0,
            total_done: 200,
            total_wanted: 100,
            download_rate: 10,
            ..Default::default()
        };
        assert_eq!(eta_seconds(&s), Some(0));
    }

    #[test]
    fn duration_tiers_at_boundaries() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(3599), "59m 59s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(3 * 3600 + 25 * 60 + 7), "3h 25m");
    }

    #[test]
    fn percent_floors_and_clamps() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.199), 19);
        assert_eq!(percent(0.2), 20);
        assert_eq!(percent(1.0), 100);
        assert_eq!(percent(1.3), 100);
        assert_eq!(percent(-0.5), 0);
        assert_eq!(percent(f64::NAN), 0);
    }

    #[test]
    fn derive_is_idempotent() {
        let s = snapshot(3 * 1024 * 1024, 10 * 1024 * 1024, 512 * 1024);
        let elapsed = Duration::from_secs(42);
        assert_eq!(derive(&s, elapsed), derive(&s, elapsed));
    }

    #[test]
    fn derive_converts_units() {
        let s = snapshot(3 * 1024 * 1024, 10 * 1024 * 1024, 512 * 1024);
        let r = derive(&s, Duration::from_secs(1));
        assert_eq!(r.percent, 30);
        assert_eq!(r.downloaded_mb, 3.0);
        assert_eq!(r.total_mb, 10.0);
        assert_eq!(r.speed_kbps, 512.0);
        assert_eq!(r.eta, Eta::Known(Duration::from_secs(14)));
    }

    #[test]
    fn average_speed_guards_zero_elapsed() {
        assert_eq!(average_speed(1_000, Duration::ZERO), 0.0);
        assert_eq!(average_speed(1_000, Duration::from_secs(4)), 250.0);
    }

    #[test]
    fn line_mentions_every_metric() {
        let r = derive(&snapshot(512 * 1024, 1024 * 1024, 1024), Duration::from_secs(1));
        let line = render_line(&r, &EN);
        assert_eq!(
            line,
            "Progress: 50% | Downloaded: 0.50/1.00 MB | Speed: 1.00 KB/s | Peers: 4 | ETA: 8m 32s"
        );
    }
}
