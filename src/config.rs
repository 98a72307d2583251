//! System configuration parameters
//!
//! All tunable timing for the controller lives here: phase durations,
//! task cadences and lock timeouts share one namespace so the state
//! table and both tasks read the same values.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fsm::Phase;

/// Duration of each phase in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub green_primary_ms: u32,
    pub yellow_primary_ms: u32,
    pub safety_gap_a_ms: u32,
    pub green_secondary_ms: u32,
    pub safety_gap_b_ms: u32,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            green_primary_ms: 20_000,
            yellow_primary_ms: 3_000,
            safety_gap_a_ms: 5_000,
            green_secondary_ms: 20_000,
            safety_gap_b_ms: 5_000,
        }
    }
}

impl PhaseTimings {
    pub const fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::GreenPrimary => self.green_primary_ms,
            Phase::YellowPrimary => self.yellow_primary_ms,
            Phase::SafetyGapA => self.safety_gap_a_ms,
            Phase::GreenSecondary => self.green_secondary_ms,
            Phase::SafetyGapB => self.safety_gap_b_ms,
        }
    }

    pub fn min_ms(&self) -> u32 {
        Phase::ALL
            .iter()
            .map(|p| self.duration_of(*p))
            .min()
            .unwrap_or(0)
    }

    pub fn total_cycle_ms(&self) -> u64 {
        Phase::ALL.iter().map(|p| u64::from(self.duration_of(*p))).sum()
    }
}

/// Scheduling parameters for one task thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    /// FreeRTOS priority (higher preempts lower).
    pub priority: u8,
    /// Stack size in KiB.
    pub stack_kb: usize,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Phases ---
    pub phases: PhaseTimings,

    // --- Task cadence ---
    /// Control task sleep between `update()` polls (milliseconds)
    pub control_poll_interval_ms: u32,
    /// Monitor task report period (milliseconds, drift-free)
    pub monitor_period_ms: u32,
    /// Longest either task waits for the shared lock (milliseconds)
    pub lock_timeout_ms: u32,

    // --- Threads ---
    pub control_task: TaskParams,
    pub monitor_task: TaskParams,

    // --- Diagnostics ---
    /// Log every phase transition at info level
    pub log_transitions: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            phases: PhaseTimings::default(),

            control_poll_interval_ms: 10,
            monitor_period_ms: 1_000,
            lock_timeout_ms: 100,

            control_task: TaskParams {
                priority: 5,
                stack_kb: 8,
            },
            monitor_task: TaskParams {
                priority: 3,
                stack_kb: 6,
            },

            log_transitions: true,
        }
    }
}

/// Polling must stay within 1% of the shortest phase.
const POLL_TO_PHASE_RATIO: u32 = 100;

impl SystemConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break a timing guarantee. Nothing is
    /// clamped or defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Phase::ALL.iter().any(|p| self.phases.duration_of(*p) == 0) {
            return Err(ConfigError::ValidationFailed(
                "every phase duration must be positive",
            ));
        }
        if self.control_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control poll interval must be positive",
            ));
        }
        if u64::from(self.control_poll_interval_ms) * u64::from(POLL_TO_PHASE_RATIO)
            > u64::from(self.phases.min_ms())
        {
            return Err(ConfigError::ValidationFailed(
                "control poll interval exceeds 1% of the shortest phase",
            ));
        }
        if self.monitor_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("monitor period must be positive"));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("lock timeout must be positive"));
        }
        if self.lock_timeout_ms >= self.monitor_period_ms {
            return Err(ConfigError::ValidationFailed(
                "lock timeout must be shorter than the monitor period",
            ));
        }
        if self.control_task.priority <= self.monitor_task.priority {
            return Err(ConfigError::ValidationFailed(
                "control task must outrank the monitor task",
            ));
        }
        if self.control_task.stack_kb == 0 || self.monitor_task.stack_kb == 0 {
            return Err(ConfigError::ValidationFailed("task stacks must be non-empty"));
        }
        Ok(())
    }

    pub fn control_poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.control_poll_interval_ms))
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.monitor_period_ms))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.lock_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = SystemConfig::default();
        assert_eq!(c.validate(), Ok(()));
        assert_eq!(c.phases.total_cycle_ms(), 53_000);
        assert_eq!(c.phases.min_ms(), 3_000);
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = SystemConfig::from_json(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = SystemConfig::from_json("{\n  \"phases\": 7").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn zero_phase_duration_rejected() {
        let mut c = SystemConfig::default();
        c.phases.yellow_primary_ms = 0;
        assert!(matches!(c.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn slow_polling_rejected() {
        let mut c = SystemConfig::default();
        c.control_poll_interval_ms = 31; // shortest phase is 3000 ms
        assert!(c.validate().is_err());
        c.control_poll_interval_ms = 30;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn lock_timeout_must_fit_in_monitor_period() {
        let mut c = SystemConfig::default();
        c.lock_timeout_ms = c.monitor_period_ms;
        assert!(c.validate().is_err());
    }

    #[test]
    fn priority_inversion_rejected() {
        let mut c = SystemConfig::default();
        c.monitor_task.priority = c.control_task.priority;
        assert!(c.validate().is_err());
    }

    #[test]
    fn invalid_json_values_are_not_clamped() {
        let mut c = SystemConfig::default();
        c.monitor_period_ms = 0;
        let json = serde_json::to_string(&c).unwrap();
        assert!(matches!(
            SystemConfig::from_json(&json),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = SystemConfig::default();
        assert!(
            c.control_poll_interval_ms < c.monitor_period_ms,
            "control polling should be faster than monitoring"
        );
        assert!(
            c.monitor_period_ms < c.phases.min_ms(),
            "every phase should be reported at least once"
        );
    }
}
