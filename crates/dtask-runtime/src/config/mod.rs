//! Scheduler configuration
//!
//! Library defaults with runtime environment overrides, then the builder.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env()`)
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use dtask_runtime::config::{SchedulerConfig, QueueFullPolicy};
//!
//! let config = SchedulerConfig::from_env()
//!     .num_workers(8)
//!     .queue_capacity(64)
//!     .queue_full(QueueFullPolicy::Timeout(Duration::from_millis(250)));
//! ```

pub mod defaults;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use dtask_core::constants::{MAX_QUEUE_CAPACITY, MAX_WORKERS};
use dtask_core::env::{env_get, env_get_millis, env_get_opt};
use dtask_core::{DTaskError, DTaskResult};

use crate::timer::TimerBackendType;

/// What `submit` does when the work queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueFullPolicy {
    /// Block until a worker frees a slot
    #[default]
    Block,
    /// Block at most this long, then fail with `QueueFull`
    Timeout(Duration),
    /// Fail with `QueueFull` immediately
    FailFast,
}

impl FromStr for QueueFullPolicy {
    type Err = DTaskError;

    /// Accepts `block`, `fail-fast` (or `fail`), `timeout:<ms>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "block" => Ok(QueueFullPolicy::Block),
            "fail" | "fail-fast" | "failfast" => Ok(QueueFullPolicy::FailFast),
            other => other
                .strip_prefix("timeout:")
                .and_then(|ms| ms.trim().parse::<u64>().ok())
                .map(|ms| QueueFullPolicy::Timeout(Duration::from_millis(ms)))
                .ok_or_else(|| DTaskError::InvalidConfig(format!("unknown queue-full policy '{}'", s))),
        }
    }
}

/// How the poller waits between scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStrategy {
    /// Yield the CPU and rescan immediately (low latency, burns CPU)
    BusyYield,
    /// Sleep until the next deadline or an earlier insert
    #[default]
    WaitForNextDue,
}

impl FromStr for PollStrategy {
    type Err = DTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "busy-yield" | "busy" | "yield" => Ok(PollStrategy::BusyYield),
            "wait-for-next-due" | "wait" => Ok(PollStrategy::WaitForNextDue),
            other => Err(DTaskError::InvalidConfig(format!("unknown poll strategy '{}'", other))),
        }
    }
}

/// Where due timer callbacks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FireMode {
    /// Resubmit to the worker pool so slow callbacks can't stall the poller
    #[default]
    Pool,
    /// Run on the poller thread
    Inline,
}

impl FromStr for FireMode {
    type Err = DTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pool" => Ok(FireMode::Pool),
            "inline" => Ok(FireMode::Inline),
            other => Err(DTaskError::InvalidConfig(format!("unknown fire mode '{}'", other))),
        }
    }
}

impl fmt::Display for PollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PollStrategy::BusyYield => "busy-yield",
            PollStrategy::WaitForNextDue => "wait-for-next-due",
        })
    }
}

/// Scheduler configuration with builder pattern.
///
/// Use `from_env()` to start with library defaults and apply
/// any environment variable overrides.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads (degree of parallelism)
    pub num_workers: usize,
    /// Work queue capacity (backpressure threshold)
    pub queue_capacity: usize,
    /// Behaviour of `submit` at capacity
    pub queue_full: QueueFullPolicy,
    /// Poller wait strategy
    pub poll_strategy: PollStrategy,
    /// Where due callbacks execute
    pub fire_mode: FireMode,
    /// Optional limit on outstanding timers
    pub max_pending_timers: Option<usize>,
    /// Longest single poller park
    pub max_park: Duration,
    /// Background thread name prefix
    pub thread_prefix: String,
    /// Delay queue backend
    pub timer_backend: TimerBackendType,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Library defaults only, ignoring the environment
    pub fn defaults() -> Self {
        Self {
            num_workers: resolve_workers(defaults::NUM_WORKERS),
            queue_capacity: defaults::QUEUE_CAPACITY,
            queue_full: QueueFullPolicy::default(),
            poll_strategy: PollStrategy::default(),
            fire_mode: FireMode::default(),
            max_pending_timers: none_if_zero(defaults::MAX_PENDING_TIMERS),
            max_park: defaults::MAX_PARK,
            thread_prefix: defaults::THREAD_PREFIX.to_string(),
            timer_backend: TimerBackendType::default(),
        }
    }

    /// Create config from library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `DTASK_NUM_WORKERS` - Worker threads (0 = CPU count)
    /// - `DTASK_QUEUE_CAPACITY` - Work queue capacity
    /// - `DTASK_QUEUE_FULL` - `block`, `fail-fast` or `timeout:<ms>`
    /// - `DTASK_POLL_STRATEGY` - `wait-for-next-due` or `busy-yield`
    /// - `DTASK_FIRE_MODE` - `pool` or `inline`
    /// - `DTASK_MAX_TIMERS` - Pending timer limit (0 = unbounded)
    /// - `DTASK_MAX_PARK_MS` - Longest poller park in milliseconds
    /// - `DTASK_THREAD_PREFIX` - Thread name prefix
    ///
    /// Unparsable values keep the default.
    pub fn from_env() -> Self {
        let base = Self::defaults();
        Self {
            num_workers: resolve_workers(env_get("DTASK_NUM_WORKERS", defaults::NUM_WORKERS)),
            queue_capacity: env_get("DTASK_QUEUE_CAPACITY", base.queue_capacity),
            queue_full: env_get("DTASK_QUEUE_FULL", base.queue_full),
            poll_strategy: env_get("DTASK_POLL_STRATEGY", base.poll_strategy),
            fire_mode: env_get("DTASK_FIRE_MODE", base.fire_mode),
            max_pending_timers: env_get_opt::<usize>("DTASK_MAX_TIMERS")
                .map_or(base.max_pending_timers, none_if_zero),
            max_park: env_get_millis("DTASK_MAX_PARK_MS", base.max_park),
            thread_prefix: env_get("DTASK_THREAD_PREFIX", base.thread_prefix),
            timer_backend: base.timer_backend,
        }
    }

    /// Set number of worker threads
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Set work queue capacity
    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    /// Set queue-full policy
    pub fn queue_full(mut self, policy: QueueFullPolicy) -> Self {
        self.queue_full = policy;
        self
    }

    /// Set poller wait strategy
    pub fn poll_strategy(mut self, strategy: PollStrategy) -> Self {
        self.poll_strategy = strategy;
        self
    }

    /// Set where due callbacks run
    pub fn fire_mode(mut self, mode: FireMode) -> Self {
        self.fire_mode = mode;
        self
    }

    /// Limit outstanding timers (`None` = unbounded)
    pub fn max_pending_timers(mut self, limit: Option<usize>) -> Self {
        self.max_pending_timers = limit;
        self
    }

    /// Set longest single poller park
    pub fn max_park(mut self, d: Duration) -> Self {
        self.max_park = d;
        self
    }

    /// Set background thread name prefix
    pub fn thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> DTaskResult<()> {
        let invalid = |msg: &str| Err(DTaskError::InvalidConfig(msg.to_string()));
        if self.num_workers == 0 {
            return invalid("num_workers must be at least 1");
        }
        if self.num_workers > MAX_WORKERS {
            return invalid("num_workers exceeds maximum");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity must be at least 1");
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return invalid("queue_capacity exceeds maximum");
        }
        if self.max_pending_timers == Some(0) {
            return invalid("max_pending_timers must be at least 1 when set");
        }
        if self.max_park.is_zero() {
            return invalid("max_park must be non-zero");
        }
        if self.queue_full == QueueFullPolicy::Timeout(Duration::ZERO) {
            return invalid("queue-full timeout must be non-zero; use FailFast instead");
        }
        Ok(())
    }
}

fn resolve_workers(n: usize) -> usize {
    if n != 0 {
        return n;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(defaults::FALLBACK_WORKERS)
        .min(MAX_WORKERS)
}

fn none_if_zero(n: usize) -> Option<usize> {
    (n != 0).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SchedulerConfig::defaults();
        assert!(config.num_workers >= 1);
        assert_eq!(config.queue_capacity, defaults::QUEUE_CAPACITY);
        assert_eq!(config.queue_full, QueueFullPolicy::Block);
        assert_eq!(config.poll_strategy, PollStrategy::WaitForNextDue);
        assert_eq!(config.fire_mode, FireMode::Pool);
        assert!(config.max_pending_timers.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::defaults()
            .num_workers(3)
            .queue_capacity(7)
            .queue_full(QueueFullPolicy::FailFast)
            .poll_strategy(PollStrategy::BusyYield)
            .fire_mode(FireMode::Inline)
            .max_pending_timers(Some(100))
            .thread_prefix("web");
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.queue_capacity, 7);
        assert_eq!(config.max_pending_timers, Some(100));
        assert_eq!(config.thread_prefix, "web");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        let base = SchedulerConfig::defaults();
        assert!(base.clone().num_workers(0).validate().is_err());
        assert!(base.clone().num_workers(MAX_WORKERS + 1).validate().is_err());
        assert!(base.clone().queue_capacity(0).validate().is_err());
        assert!(base.clone().max_pending_timers(Some(0)).validate().is_err());
        assert!(base.clone().max_park(Duration::ZERO).validate().is_err());
        let err = base
            .queue_full(QueueFullPolicy::Timeout(Duration::ZERO))
            .validate()
            .unwrap_err();
        assert!(matches!(err, DTaskError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_queue_full_policy() {
        assert_eq!("block".parse::<QueueFullPolicy>().unwrap(), QueueFullPolicy::Block);
        assert_eq!("Fail-Fast".parse::<QueueFullPolicy>().unwrap(), QueueFullPolicy::FailFast);
        assert_eq!(
            "timeout:250".parse::<QueueFullPolicy>().unwrap(),
            QueueFullPolicy::Timeout(Duration::from_millis(250))
        );
        assert!("timeout:soon".parse::<QueueFullPolicy>().is_err());
        assert!("drop".parse::<QueueFullPolicy>().is_err());
    }

    #[test]
    fn test_parse_strategy_and_mode() {
        assert_eq!("busy-yield".parse::<PollStrategy>().unwrap(), PollStrategy::BusyYield);
        assert_eq!(
            "wait-for-next-due".parse::<PollStrategy>().unwrap(),
            PollStrategy::WaitForNextDue
        );
        assert_eq!("inline".parse::<FireMode>().unwrap(), FireMode::Inline);
        assert!("sleep0".parse::<PollStrategy>().is_err());
        assert_eq!(PollStrategy::BusyYield.to_string(), "busy-yield");
    }

    #[test]
    fn test_from_env_overrides() {
        std::env::set_var("DTASK_QUEUE_CAPACITY", "33");
        std::env::set_var("DTASK_QUEUE_FULL", "timeout:40");
        std::env::set_var("DTASK_MAX_TIMERS", "0");
        let config = SchedulerConfig::from_env();
        std::env::remove_var("DTASK_QUEUE_CAPACITY");
        std::env::remove_var("DTASK_QUEUE_FULL");
        std::env::remove_var("DTASK_MAX_TIMERS");

        assert_eq!(config.queue_capacity, 33);
        assert_eq!(config.queue_full, QueueFullPolicy::Timeout(Duration::from_millis(40)));
        assert!(config.max_pending_timers.is_none());
    }
}
