//! Restart policy for the smbd supervisor loop.
//!
//! The default policy waits one second after every exit and retries forever.
//! Bounded and exponential variants exist so callers (and tests) can put a
//! ceiling on the loop without tearing the process down.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay strategy between a daemon exit and its relaunch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every restart.
    Fixed {
        #[serde(with = "humantime_serde")]
        delay: Duration,
    },
    /// Delay doubles with each restart, starting at `initial`, capped at `max`.
    Exponential {
        #[serde(with = "humantime_serde")]
        initial: Duration,
        #[serde(with = "humantime_serde")]
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Delay to wait before restart number `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay } => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

/// When and how often the supervisor relaunches smbd.
///
/// In config files `strategy` may be omitted and defaults to `fixed`. Missing
/// durations take the values of [`Backoff::default`] and
/// [`RestartPolicy::DEFAULT_MAX_DELAY`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRestartPolicy")]
pub struct RestartPolicy {
    /// Delay strategy.
    #[serde(flatten)]
    pub backoff: Backoff,

    /// Stop restarting after this many relaunch attempts. `None` retries forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_restarts: Option<u32>,
}

impl RestartPolicy {
    /// Cap on the exponential delay when a config file names none.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Fixed delay, unbounded.
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed { delay },
            max_restarts: None,
        }
    }

    /// Exponential delay, unbounded.
    #[must_use]
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential { initial, max },
            max_restarts: None,
        }
    }

    /// Cap the number of relaunch attempts.
    #[must_use]
    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = Some(max);
        self
    }

    /// Whether `attempts` relaunches already use up the budget.
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_restarts.is_some_and(|max| attempts >= max)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Strategy {
    #[default]
    Fixed,
    Exponential,
}

/// On-disk form of [`RestartPolicy`]. serde cannot default the tag of an
/// internally tagged enum, so the strategy is resolved by hand.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRestartPolicy {
    #[serde(default)]
    strategy: Strategy,
    #[serde(default, with = "humantime_serde")]
    delay: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    initial: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    max: Option<Duration>,
    #[serde(default)]
    max_restarts: Option<u32>,
}

impl TryFrom<RawRestartPolicy> for RestartPolicy {
    type Error = String;

    fn try_from(raw: RawRestartPolicy) -> Result<Self, Self::Error> {
        let one_second = Backoff::default().delay(0);
        let backoff = match raw.strategy {
            Strategy::Fixed => {
                if raw.initial.is_some() || raw.max.is_some() {
                    return Err("`initial` and `max` need strategy = \"exponential\"".into());
                }
                Backoff::Fixed {
                    delay: raw.delay.unwrap_or(one_second),
                }
            }
            Strategy::Exponential => {
                if raw.delay.is_some() {
                    return Err("`delay` needs strategy = \"fixed\"".into());
                }
                Backoff::Exponential {
                    initial: raw.initial.unwrap_or(one_second),
                    max: raw.max.unwrap_or(Self::DEFAULT_MAX_DELAY),
                }
            }
        };

        Ok(Self {
            backoff,
            max_restarts: raw.max_restarts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_second_fixed_and_unbounded() {
        let policy = RestartPolicy::default();
        assert_eq!(policy.backoff.delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff.delay(50), Duration::from_secs(1));
        assert!(!policy.is_exhausted(u32::MAX));
    }

    #[test]
    fn exponential_doubles_then_caps() {
        let backoff = Backoff::Exponential {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(4), Duration::from_secs(16));
        assert_eq!(backoff.delay(5), Duration::from_secs(30));
        assert_eq!(backoff.delay(200), Duration::from_secs(30));
    }

    #[test]
    fn bounded_policy_exhausts() {
        let policy = RestartPolicy::fixed(Duration::from_millis(10)).with_max_restarts(3);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }

    #[test]
    fn policy_parses_from_toml() {
        let policy: RestartPolicy = toml::from_str(
            r#"
strategy = "exponential"
initial = "500ms"
max = "1m"
max_restarts = 10
"#,
        )
        .unwrap();

        assert_eq!(
            policy,
            RestartPolicy::exponential(Duration::from_millis(500), Duration::from_secs(60))
                .with_max_restarts(10)
        );
    }

    #[test]
    fn fixed_policy_parses_from_toml() {
        let policy: RestartPolicy = toml::from_str(
            r#"
strategy = "fixed"
delay = "2s"
"#,
        )
        .unwrap();

        assert_eq!(policy, RestartPolicy::fixed(Duration::from_secs(2)));
    }

    #[test]
    fn strategy_defaults_to_fixed() {
        let policy: RestartPolicy = toml::from_str("max_restarts = 3\n").unwrap();

        assert_eq!(policy, RestartPolicy::default().with_max_restarts(3));
    }

    #[test]
    fn exponential_fills_missing_durations() {
        let policy: RestartPolicy = toml::from_str("strategy = \"exponential\"\n").unwrap();

        assert_eq!(
            policy,
            RestartPolicy::exponential(Duration::from_secs(1), RestartPolicy::DEFAULT_MAX_DELAY)
        );
    }

    #[test]
    fn mismatched_strategy_fields_are_rejected() {
        let err = toml::from_str::<RestartPolicy>("delay = \"1s\"\nmax = \"5s\"\n").unwrap_err();
        assert!(err.to_string().contains("exponential"));
    }

    #[test]
    fn serialized_policy_reads_back() {
        let policy = RestartPolicy::exponential(Duration::from_secs(2), Duration::from_secs(40))
            .with_max_restarts(5);
        let text = toml::to_string(&policy).unwrap();

        assert_eq!(toml::from_str::<RestartPolicy>(&text).unwrap(), policy);
    }
}
