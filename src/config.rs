use std::time::Duration;

use crate::error::PoolError;
use crate::priority::{ALL_TIERS, Priority};

/// How the pool decides its worker count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalingMode {
    /// Processor-count workers; the observer scales between
    /// `max(ceiling / 4, 1)` and the processor count.
    Auto,
    /// Caller-supplied ceiling; the observer scales between
    /// `max(ceiling / 4, 1)` and the ceiling.
    FixedCeiling(usize),
    /// Exact worker counts per tier, lowest first. Static for the pool's
    /// lifetime; no observer runs.
    Banded([usize; 5]),
}

impl ScalingMode {
    /// Upper bound on the worker count for this mode.
    pub fn ceiling(&self) -> usize {
        match self {
            ScalingMode::Auto => num_cpus::get(),
            ScalingMode::FixedCeiling(max) => *max,
            ScalingMode::Banded(counts) => counts.iter().sum(),
        }
    }

    /// Whether an observer thread runs for this mode.
    pub fn autoscaling(&self) -> bool {
        !matches!(self, ScalingMode::Banded(_))
    }

    /// Tiers assigned to the initial workers, one entry per worker.
    pub(crate) fn initial_priorities(&self) -> Vec<Priority> {
        match self {
            ScalingMode::Auto | ScalingMode::FixedCeiling(_) => {
                vec![Priority::Normal; self.ceiling()]
            }
            ScalingMode::Banded(counts) => {
                let mut tiers = Vec::with_capacity(self.ceiling());
                for (tier, &count) in ALL_TIERS.iter().zip(counts.iter()) {
                    tiers.extend(std::iter::repeat_n(*tier, count));
                }
                tiers
            }
        }
    }
}

/// What a worker does when a submitted job panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicPolicy {
    /// Catch, log at error level, keep the worker alive.
    Resume,
    /// Catch, log, terminate only the panicking worker. An autoscaling pool
    /// regrows it on a later observer cycle.
    StopWorker,
    /// Catch, log, abort the process.
    Escalate,
}

/// Configuration for a [`ThreadPool`](crate::pool::ThreadPool).
///
/// The three named constructors cover the common modes; `with_config` takes
/// this struct directly when cadence or policy tuning is needed.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker-count strategy.
    pub scaling_mode: ScalingMode,

    /// How often the observer samples queue depth and pool size.
    pub observer_cadence: Duration,

    /// How long an idle worker waits on the queue before re-checking its
    /// lifecycle flags.
    pub idle_poll: Duration,

    /// Queue capacity at construction; deep clears return to this.
    pub initial_queue_capacity: usize,

    /// Prefix for worker and observer thread names.
    pub thread_name_prefix: String,

    /// Behavior when a submitted job panics.
    pub panic_policy: PanicPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            scaling_mode: ScalingMode::Auto,
            observer_cadence: Duration::from_millis(100),
            idle_poll: Duration::from_millis(10),
            initial_queue_capacity: 64,
            thread_name_prefix: "roost-worker".to_string(),
            panic_policy: PanicPolicy::Resume,
        }
    }
}

impl PoolConfig {
    /// Reject configurations that cannot produce a working pool.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.scaling_mode.ceiling() == 0 {
            return Err(PoolError::InvalidConfig(
                "worker ceiling must be at least 1".to_string(),
            ));
        }
        if self.observer_cadence.is_zero() {
            return Err(PoolError::InvalidConfig(
                "observer cadence must be non-zero".to_string(),
            ));
        }
        if self.idle_poll.is_zero() {
            return Err(PoolError::InvalidConfig(
                "idle poll interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_processor_count() {
        let config = PoolConfig::default();
        assert_eq!(config.scaling_mode, ScalingMode::Auto);
        assert_eq!(config.scaling_mode.ceiling(), num_cpus::get());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_banded_priorities() {
        let mode = ScalingMode::Banded([1, 0, 2, 0, 1]);
        assert_eq!(mode.ceiling(), 4);
        assert!(!mode.autoscaling());
        assert_eq!(
            mode.initial_priorities(),
            vec![
                Priority::Lowest,
                Priority::Normal,
                Priority::Normal,
                Priority::Highest,
            ]
        );
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let mut config = PoolConfig::default();
        config.scaling_mode = ScalingMode::FixedCeiling(0);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig(_))
        ));

        config.scaling_mode = ScalingMode::Banded([0; 5]);
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let mut config = PoolConfig::default();
        config.observer_cadence = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(PoolError::InvalidConfig(_))
        ));
    }
}
