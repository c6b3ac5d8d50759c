//! Timing configuration.
//!
//! Every wait in the harness is bounded by one of these knobs. The defaults
//! mirror the reference deployment's observed settle behavior; they are
//! deliberately conservative because participants register with each other
//! asynchronously after launch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs, all in milliseconds on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    /// Delay after launching each consensus participant.
    #[serde(default = "default_participant_start_delay_ms")]
    pub participant_start_delay_ms: u64,

    /// Delay after launching the ledger access service.
    #[serde(default = "default_service_startup_delay_ms")]
    pub service_startup_delay_ms: u64,

    /// Delay after launching the client, before its prompt is ready.
    #[serde(default = "default_client_prompt_delay_ms")]
    pub client_prompt_delay_ms: u64,

    /// Delay between interaction tokens.
    ///
    /// The target client reads its input buffer slower than the harness can
    /// write it; sending tokens back-to-back interleaves commands. This is a
    /// documented race in the target protocol and must be respected here.
    #[serde(default = "default_inter_step_delay_ms")]
    pub inter_step_delay_ms: u64,

    /// Stabilization delay after fault injection.
    #[serde(default = "default_stabilization_delay_ms")]
    pub stabilization_delay_ms: u64,

    /// Settle window after driving the script, before verification.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Interval between verification polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total deadline for verification polling.
    #[serde(default = "default_verify_deadline_ms")]
    pub verify_deadline_ms: u64,

    /// Grace period before a terminate escalates to a hard kill.
    #[serde(default = "default_grace_timeout_ms")]
    pub grace_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            participant_start_delay_ms: default_participant_start_delay_ms(),
            service_startup_delay_ms: default_service_startup_delay_ms(),
            client_prompt_delay_ms: default_client_prompt_delay_ms(),
            inter_step_delay_ms: default_inter_step_delay_ms(),
            stabilization_delay_ms: default_stabilization_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            verify_deadline_ms: default_verify_deadline_ms(),
            grace_timeout_ms: default_grace_timeout_ms(),
        }
    }
}

impl TimingConfig {
    /// Delay after launching each consensus participant.
    pub const fn participant_start_delay(&self) -> Duration {
        Duration::from_millis(self.participant_start_delay_ms)
    }

    /// Delay after launching the ledger access service.
    pub const fn service_startup_delay(&self) -> Duration {
        Duration::from_millis(self.service_startup_delay_ms)
    }

    /// Delay after launching the client.
    pub const fn client_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.client_prompt_delay_ms)
    }

    /// Delay between interaction tokens.
    pub const fn inter_step_delay(&self) -> Duration {
        Duration::from_millis(self.inter_step_delay_ms)
    }

    /// Stabilization delay after fault injection.
    pub const fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay_ms)
    }

    /// Settle window after driving the script.
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Interval between verification polls.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Total deadline for verification polling.
    pub const fn verify_deadline(&self) -> Duration {
        Duration::from_millis(self.verify_deadline_ms)
    }

    /// Grace period before a terminate escalates to a hard kill.
    pub const fn grace_timeout(&self) -> Duration {
        Duration::from_millis(self.grace_timeout_ms)
    }
}

const fn default_participant_start_delay_ms() -> u64 {
    1_000
}

const fn default_service_startup_delay_ms() -> u64 {
    3_000
}

const fn default_client_prompt_delay_ms() -> u64 {
    2_000
}

const fn default_inter_step_delay_ms() -> u64 {
    700
}

const fn default_stabilization_delay_ms() -> u64 {
    5_000
}

const fn default_settle_delay_ms() -> u64 {
    45_000
}

const fn default_poll_interval_ms() -> u64 {
    5_000
}

const fn default_verify_deadline_ms() -> u64 {
    90_000
}

const fn default_grace_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = TimingConfig::default();
        assert_eq!(timing.participant_start_delay(), Duration::from_secs(1));
        assert_eq!(timing.settle_delay(), Duration::from_secs(45));
        assert_eq!(timing.verify_deadline(), Duration::from_secs(90));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let timing: TimingConfig = toml::from_str("settle_delay_ms = 100").unwrap();
        assert_eq!(timing.settle_delay(), Duration::from_millis(100));
        assert_eq!(timing.poll_interval_ms, default_poll_interval_ms());
    }
}
