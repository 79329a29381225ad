// src/core/budget.rs — Stop conditions for the generation loop

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::generator::GenerationStats;

/// Why exploration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TimeLimit,
    InputLimit,
    OutputLimit,
    /// The caller's stopper asked to stop.
    Stopper,
    /// Too many consecutive steps added nothing to the pool.
    Stalled,
    /// No remaining operation can be fed from the pool.
    NoSatisfiableOperation,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TimeLimit => write!(f, "time limit reached"),
            StopReason::InputLimit => write!(f, "input limit reached"),
            StopReason::OutputLimit => write!(f, "output limit reached"),
            StopReason::Stopper => write!(f, "stopped by caller"),
            StopReason::Stalled => write!(f, "no progress"),
            StopReason::NoSatisfiableOperation => write!(f, "no operation can be satisfied"),
        }
    }
}

/// Limits on one exploration. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budget {
    pub time_limit: Option<Duration>,
    /// Candidate sequences built.
    pub input_limit: Option<u64>,
    /// Tests surfaced (regression plus error).
    pub output_limit: Option<usize>,
    pub statement_timeout: Option<Duration>,
    pub stall_limit: Option<u64>,
}

impl Budget {
    pub fn from_config(
        generation: &crate::infra::config::GenerationConfig,
        sandbox: &crate::infra::config::SandboxConfig,
    ) -> Self {
        Self {
            time_limit: Some(Duration::from_secs(generation.time_limit_secs)),
            input_limit: generation.input_limit,
            output_limit: generation.output_limit,
            statement_timeout: sandbox.statement_timeout(),
            stall_limit: generation.stall_limit,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_input_limit(mut self, limit: u64) -> Self {
        self.input_limit = Some(limit);
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = Some(limit);
        self
    }

    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    pub fn with_stall_limit(mut self, limit: u64) -> Self {
        self.stall_limit = Some(limit);
        self
    }

    /// Has any limit been reached?
    pub fn check(&self, stats: &GenerationStats, elapsed: Duration) -> Option<StopReason> {
        if let Some(limit) = self.time_limit {
            if elapsed >= limit {
                return Some(StopReason::TimeLimit);
            }
        }

        if let Some(limit) = self.input_limit {
            if stats.generated >= limit {
                return Some(StopReason::InputLimit);
            }
        }

        if let Some(limit) = self.output_limit {
            if stats.surfaced() >= limit {
                return Some(StopReason::OutputLimit);
            }
        }

        if let Some(limit) = self.stall_limit {
            if stats.consecutive_unproductive >= limit {
                return Some(StopReason::Stalled);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> GenerationStats {
        GenerationStats::default()
    }

    #[test]
    fn test_unlimited_never_stops() {
        let b = Budget::unlimited();
        let mut s = stats();
        s.generated = 1_000_000;
        assert_eq!(b.check(&s, Duration::from_secs(3600)), None);
    }

    #[test]
    fn test_time_limit() {
        let b = Budget::unlimited().with_time_limit(Duration::from_secs(1));
        assert_eq!(b.check(&stats(), Duration::from_millis(999)), None);
        assert_eq!(b.check(&stats(), Duration::from_secs(1)), Some(StopReason::TimeLimit));
    }

    #[test]
    fn test_input_limit() {
        let b = Budget::unlimited().with_input_limit(10);
        let mut s = stats();
        s.generated = 9;
        assert_eq!(b.check(&s, Duration::ZERO), None);
        s.generated = 10;
        assert_eq!(b.check(&s, Duration::ZERO), Some(StopReason::InputLimit));
    }

    #[test]
    fn test_output_limit_counts_both_kinds() {
        let b = Budget::unlimited().with_output_limit(3);
        let mut s = stats();
        s.regression_surfaced = 2;
        assert_eq!(b.check(&s, Duration::ZERO), None);
        s.error_surfaced = 1;
        assert_eq!(b.check(&s, Duration::ZERO), Some(StopReason::OutputLimit));
    }

    #[test]
    fn test_stall_limit() {
        let b = Budget::unlimited().with_stall_limit(5);
        let mut s = stats();
        s.consecutive_unproductive = 5;
        assert_eq!(b.check(&s, Duration::ZERO), Some(StopReason::Stalled));
    }

    #[test]
    fn test_time_checked_first() {
        let b = Budget::unlimited()
            .with_time_limit(Duration::from_secs(1))
            .with_input_limit(1);
        let mut s = stats();
        s.generated = 5;
        assert_eq!(b.check(&s, Duration::from_secs(2)), Some(StopReason::TimeLimit));
    }

    #[test]
    fn test_from_config() {
        let config = crate::infra::config::Config::default();
        let b = Budget::from_config(&config.generation, &config.sandbox);
        assert_eq!(b.time_limit, Some(Duration::from_secs(10)));
        assert_eq!(b.statement_timeout, Some(Duration::from_millis(1000)));
        assert_eq!(b.input_limit, None);
    }

    #[test]
    fn test_zero_statement_timeout_means_none() {
        let mut config = crate::infra::config::Config::default();
        config.sandbox.statement_timeout_ms = Some(0);
        let b = Budget::from_config(&config.generation, &config.sandbox);
        assert_eq!(b.statement_timeout, None);
    }
}
