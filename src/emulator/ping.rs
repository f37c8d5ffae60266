//! Reachability probe results.

use crate::utils::duration::format_rtt;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Result of a single probe from `src` to `dst`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingOutcome {
    pub src: String,
    pub dst: String,
    pub received: bool,
    /// Round-trip time, when a reply came back
    #[serde(skip_serializing_if = "Option::is_none", with = "humantime_serde")]
    pub rtt: Option<Duration>,
}

impl PingOutcome {
    pub fn reply(src: &str, dst: &str, rtt: Duration) -> Self {
        Self { src: src.to_string(), dst: dst.to_string(), received: true, rtt: Some(rtt) }
    }

    pub fn lost(src: &str, dst: &str) -> Self {
        Self { src: src.to_string(), dst: dst.to_string(), received: false, rtt: None }
    }
}

impl fmt::Display for PingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rtt {
            Some(rtt) if self.received => {
                write!(f, "{} -> {}: reply, rtt {}", self.src, self.dst, format_rtt(rtt))
            }
            _ => write!(f, "{} -> {}: no reply", self.src, self.dst),
        }
    }
}

/// Aggregated results of an all-pairs probe run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PingReport {
    pub outcomes: Vec<PingOutcome>,
}

impl PingReport {
    pub fn sent(&self) -> usize {
        self.outcomes.len()
    }

    pub fn received(&self) -> usize {
        self.outcomes.iter().filter(|o| o.received).count()
    }

    /// Percentage of probes without a reply, rounded down
    pub fn dropped_percent(&self) -> usize {
        if self.outcomes.is_empty() {
            return 0;
        }
        (self.sent() - self.received()) * 100 / self.sent()
    }

    pub fn all_received(&self) -> bool {
        self.received() == self.sent()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PingOutcome> {
        self.outcomes.iter().filter(|o| !o.received)
    }

    /// One-line summary, e.g. `*** Results: 0% dropped (56/56 received)`
    pub fn summary(&self) -> String {
        format!(
            "*** Results: {}% dropped ({}/{} received)",
            self.dropped_percent(),
            self.received(),
            self.sent()
        )
    }
}

/// Per-source matrix: `h1 -> h2 h3 X h5`, where `X` marks a lost probe
impl fmt::Display for PingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current: Option<&str> = None;
        for outcome in &self.outcomes {
            if current != Some(outcome.src.as_str()) {
                if current.is_some() {
                    writeln!(f)?;
                }
                write!(f, "{} ->", outcome.src)?;
                current = Some(outcome.src.as_str());
            }
            if outcome.received {
                write!(f, " {}", outcome.dst)?;
            } else {
                write!(f, " X")?;
            }
        }
        if current.is_some() {
            writeln!(f)?;
        }
        write!(f, "{}", self.summary())
    }
}
