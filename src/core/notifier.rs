use crate::core::events::NotificationEvent;
use crate::core::model::ProgressReport;
use crate::i18n::Messages;
use crate::plugins::registry::NotifySink;
use tracing::warn;

/// Fans a rendered event out to every sink. Never fails.
pub struct Notifier {
    sinks: Vec<Box<dyn NotifySink>>,
    messages: &'static Messages,
}

impl Notifier {
    pub fn new(sinks: Vec<Box<dyn NotifySink>>, messages: &'static Messages) -> Self {
        Self { sinks, messages }
    }

    pub fn messages(&self) -> &'static Messages {
        self.messages
    }

    pub async fn send(&self, event: &NotificationEvent) {
        let text = event.render(self.messages);
        for sink in &self.sinks {
            if let Err(e) = sink.deliver(event, &text).await {
                warn!(sink = sink.name(), event = ?event.kind(), error = %format!("{e:#}"), "notification not delivered");
            }
        }
    }
}

/// Admits a progress notification each time percent enters a new `step`
/// bucket while data is flowing. 100% is left to the completion event.
#[derive(Debug)]
pub struct StepGate {
    step: u8,
    last_bucket: u8,
}

impl StepGate {
    pub fn new(step: u8) -> Self {
        Self { step: step.max(1), last_bucket: 0 }
    }

    pub fn admit(&mut self, report: &ProgressReport) -> bool {
        if report.percent >= 100 || report.speed_kbps <= 0.0 {
            return false;
        }
        let bucket = report.percent / self.step;
        if bucket <= self.last_bucket {
            return false;
        }
        self.last_bucket = bucket;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::EventKind;
    use crate::core::model::Eta;
    use crate::i18n::EN;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn report(percent: u8, speed_kbps: f64) -> ProgressReport {
        ProgressReport {
            percent,
            downloaded_mb: 0.0,
            total_mb: 0.0,
            speed_kbps,
            eta: Eta::Unknown,
            elapsed: Duration::ZERO,
            peers: 1,
        }
    }

    #[test]
    fn notifies_on_step_boundaries_only() {
        let mut gate = StepGate::new(20);
        let fired: Vec<u8> = [5, 19, 20, 21, 40, 41, 100]
            .into_iter()
            .filter(|&p| gate.admit(&report(p, 100.0)))
            .collect();
        assert_eq!(fired, vec![20, 40]);
    }

    #[test]
    fn stalled_crossing_is_notified_once_data_flows() {
        let mut gate = StepGate::new(20);
        assert!(!gate.admit(&report(22, 0.0)));
        assert!(gate.admit(&report(23, 50.0)));
        assert!(!gate.admit(&report(24, 50.0)));
    }

    #[test]
    fn regression_does_not_renotify() {
        let mut gate = StepGate::new(20);
        assert!(gate.admit(&report(41, 1.0)));
        assert!(!gate.admit(&report(39, 1.0)));
        assert!(!gate.admit(&report(40, 1.0)));
        assert!(gate.admit(&report(60, 1.0)));
    }

    #[test]
    fn skipped_buckets_fire_once() {
        let mut gate = StepGate::new(10);
        assert!(gate.admit(&report(55, 1.0)));
        assert!(!gate.admit(&report(59, 1.0)));
    }

    struct Failing;

    #[async_trait]
    impl NotifySink for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn deliver(&self, _: &NotificationEvent, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("endpoint unreachable")
        }
    }

    #[derive(Clone, Default)]
    struct Recording(Arc<Mutex<Vec<(EventKind, String)>>>);

    #[async_trait]
    impl NotifySink for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }
        async fn deliver(&self, event: &NotificationEvent, text: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push((event.kind(), text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_sink_does_not_stop_fan_out() {
        let rec = Recording::default();
        let notifier = Notifier::new(vec![Box::new(Failing), Box::new(rec.clone())], &EN);

        notifier.send(&NotificationEvent::Interrupted { name: "t".into() }).await;

        let got = rec.0.lock().unwrap().clone();
        assert_eq!(got, vec![(EventKind::Interrupted, "*Download interrupted*\n`t`".to_string())]);
    }
}
