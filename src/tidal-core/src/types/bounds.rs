//! Time bounds of a read.

use serde::{Deserialize, Serialize};

use super::time::{Duration, Time};

/// One edge of a time range, either absolute or relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TimeSpec {
    /// A fixed instant.
    Absolute(Time),
    /// An offset from the reference instant, usually negative (`-1h`).
    Relative(Duration),
}

impl TimeSpec {
    /// Resolve against the reference instant `now`.
    pub const fn resolve(self, now: Time) -> Time {
        match self {
            Self::Absolute(t) => t,
            Self::Relative(d) => now.saturating_add(d),
        }
    }

    /// Whether this is the absolute zero instant.
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Absolute(t) if t.is_zero())
    }
}

impl Default for TimeSpec {
    fn default() -> Self {
        Self::Absolute(Time::ZERO)
    }
}

/// Start, stop and reference instant of a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive start.
    pub start: TimeSpec,
    /// Exclusive stop.
    pub stop: TimeSpec,
    /// Reference instant for relative edges.
    pub now: Time,
}

impl Bounds {
    /// Absolute bounds `[start, stop)`.
    pub const fn absolute(start: Time, stop: Time) -> Self {
        Self {
            start: TimeSpec::Absolute(start),
            stop: TimeSpec::Absolute(stop),
            now: Time::ZERO,
        }
    }

    /// Bounds relative to `now`, e.g. `(-1h, 0)` for the last hour.
    pub const fn relative(start: Duration, stop: Duration, now: Time) -> Self {
        Self {
            start: TimeSpec::Relative(start),
            stop: TimeSpec::Relative(stop),
            now,
        }
    }

    /// Resolve both edges against the reference instant.
    pub const fn resolve(&self) -> ResolvedBounds {
        ResolvedBounds {
            start: self.start.resolve(self.now),
            stop: self.stop.resolve(self.now),
        }
    }

    /// Whether both edges are the zero instant, which marks unset bounds.
    pub const fn is_zero(&self) -> bool {
        self.start.is_zero() && self.stop.is_zero()
    }
}

impl From<ResolvedBounds> for Bounds {
    fn from(b: ResolvedBounds) -> Self {
        Self::absolute(b.start, b.stop)
    }
}

/// Absolute half-open interval `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedBounds {
    /// Inclusive start.
    pub start: Time,
    /// Exclusive stop.
    pub stop: Time,
}

impl ResolvedBounds {
    /// The canonical empty interval, `[MAX, MAX)`. It never collides with the
    /// zero pair that marks unset bounds.
    pub const EMPTY: Self = Self::new(Time::MAX, Time::MAX);

    /// Create an interval.
    pub const fn new(start: Time, stop: Time) -> Self {
        Self { start, stop }
    }

    /// Narrowest interval contained in both. Every empty intersection is
    /// [`ResolvedBounds::EMPTY`].
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let i = Self {
            start: self.start.max(other.start),
            stop: self.stop.min(other.stop),
        };
        if i.is_empty() { Self::EMPTY } else { i }
    }

    /// Whether the interval contains no instant.
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    /// Length of the interval, clamped at the domain edges.
    pub const fn duration(&self) -> Duration {
        self.stop.duration_since(self.start)
    }

    /// Whether `t` falls inside `[start, stop)`.
    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t < self.stop
    }
}
