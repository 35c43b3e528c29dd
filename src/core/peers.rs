use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Normal,
    NoPeersTimerRunning { ticks: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSignal {
    PeersLost,
    PeersRecovered { after: Duration },
    TimedOut { after: Duration },
}

/// Counts consecutive no-peer ticks and raises a timeout once the configured
/// threshold is reached. A threshold of `None` never times out.
#[derive(Debug)]
pub struct PeerTimeoutTracker {
    state: PeerState,
    threshold: Option<u64>,
    tick: Duration,
}

impl PeerTimeoutTracker {
    pub fn new(timeout: Option<Duration>, tick: Duration) -> Self {
        let tick_ms = tick.as_millis().max(1);
        let threshold = timeout
            .filter(|t| !t.is_zero())
            .map(|t| (t.as_millis().div_ceil(tick_ms)).max(1) as u64);
        Self { state: PeerState::Normal, threshold, tick }
    }

    pub fn no_peer_ticks(&self) -> u64 {
        match self.state {
            PeerState::Normal => 0,
            PeerState::NoPeersTimerRunning { ticks } => ticks,
        }
    }

    pub fn observe(&mut self, peers: usize) -> Vec<PeerSignal> {
        let mut signals = Vec::new();
        self.state = match (self.state, peers) {
            (PeerState::Normal, 0) => {
                signals.push(PeerSignal::PeersLost);
                self.expire(1, &mut signals);
                PeerState::NoPeersTimerRunning { ticks: 1 }
            }
            (PeerState::NoPeersTimerRunning { ticks }, 0) => {
                let ticks = ticks.saturating_add(1);
                self.expire(ticks, &mut signals);
                PeerState::NoPeersTimerRunning { ticks }
            }
            (PeerState::NoPeersTimerRunning { ticks }, _) => {
                signals.push(PeerSignal::PeersRecovered { after: self.span(ticks) });
                PeerState::Normal
            }
            (PeerState::Normal, _) => PeerState::Normal,
        };
        signals
    }

    // Fires only on the tick that reaches the threshold.
    fn expire(&self, ticks: u64, signals: &mut Vec<PeerSignal>) {
        if self.threshold == Some(ticks) {
            signals.push(PeerSignal::TimedOut { after: self.span(ticks) });
        }
    }

    fn span(&self, ticks: u64) -> Duration {
        self.tick.saturating_mul(ticks.min(u32::MAX as u64) as u32)
    }
}
