use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Absolute simulated instant, in whole milliseconds since a host-chosen epoch.
///
/// `SimTime::MAX` doubles as the "no more events" sentinel returned when the
/// timeline is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// True for the "no more events" sentinel
    pub const fn is_max(self) -> bool {
        self.0 == u64::MAX
    }

    /// Add a duration, truncated to whole milliseconds, saturating at `SimTime::MAX`
    pub fn saturating_add(self, delta: Duration) -> Self {
        let millis = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed since `earlier`, or zero if `earlier` is later
    pub fn saturating_since(self, earlier: SimTime) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        self.saturating_add(rhs)
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_max() {
            write!(f, "t=inf")
        } else {
            write!(f, "t={}ms", self.0)
        }
    }
}

/// Truncate a duration to whole milliseconds
pub(crate) fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
