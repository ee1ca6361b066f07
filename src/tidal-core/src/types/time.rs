//! Signed fixed-width time domain.
//!
//! Instants and durations are nanosecond counts in an `i64`. Arithmetic near
//! the edges of the domain is explicit: callers pick saturating, checked or
//! overflowing variants instead of relying on wraparound.

use std::fmt;
use std::ops::Neg;

use serde::{Deserialize, Serialize};

/// A signed span of time in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Duration(i64);

impl Duration {
    /// The zero-length duration.
    pub const ZERO: Self = Self(0);

    /// Create a duration from nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a duration from whole seconds, saturating at the domain edges.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Nanosecond count.
    pub const fn nanos(self) -> i64 {
        self.0
    }

    /// Whether this duration is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether this duration points forward in time.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// An instant in nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Time(i64);

impl Time {
    /// Smallest representable instant.
    pub const MIN: Self = Self(i64::MIN);
    /// Largest representable instant.
    pub const MAX: Self = Self(i64::MAX);
    /// The Unix epoch, also the zero instant.
    pub const ZERO: Self = Self(0);

    /// Create an instant from nanoseconds since the epoch.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Current wall-clock instant.
    pub fn now() -> Self {
        let nanos = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_nanos()).map_or(i64::MIN, |n| -n),
        };
        Self(nanos)
    }

    /// Nanoseconds since the epoch.
    pub const fn nanos(self) -> i64 {
        self.0
    }

    /// Whether this is the zero instant.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add a duration, returning `None` when the result leaves the domain.
    pub const fn checked_add(self, d: Duration) -> Option<Self> {
        match self.0.checked_add(d.0) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Add a duration, also reporting whether the domain was left.
    ///
    /// The returned instant is the wrapped value when the flag is set and
    /// must not be used as a real instant.
    pub const fn overflowing_add(self, d: Duration) -> (Self, bool) {
        let (n, overflowed) = self.0.overflowing_add(d.0);
        (Self(n), overflowed)
    }

    /// Add a duration, clamping at the domain edges.
    pub const fn saturating_add(self, d: Duration) -> Self {
        Self(self.0.saturating_add(d.0))
    }

    /// Subtract a duration, clamping at the domain edges.
    pub const fn saturating_sub(self, d: Duration) -> Self {
        Self(self.0.saturating_sub(d.0))
    }

    /// Span from `earlier` to `self`, clamping at the domain edges.
    pub const fn duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }

    /// Remainder of this instant modulo `d`; zero for a zero duration.
    pub const fn remainder(self, d: Duration) -> Duration {
        if d.0 == 0 {
            return Duration::ZERO;
        }
        Duration(self.0.wrapping_rem(d.0))
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflowing_add_at_edges() {
        let (t, overflowed) = Time::MAX.overflowing_add(Duration::from_nanos(1));
        assert!(overflowed);
        assert_eq!(t, Time::MIN);

        let (_, overflowed) = Time::MIN.overflowing_add(Duration::from_nanos(-1));
        assert!(overflowed);

        let (t, overflowed) = Time::from_nanos(10).overflowing_add(Duration::from_nanos(-20));
        assert!(!overflowed);
        assert_eq!(t, Time::from_nanos(-10));
    }

    #[test]
    fn test_checked_and_saturating() {
        assert_eq!(Time::MAX.checked_add(Duration::from_nanos(1)), None);
        assert_eq!(Time::MAX.saturating_add(Duration::from_nanos(1)), Time::MAX);
        assert_eq!(Time::MIN.saturating_sub(Duration::from_nanos(1)), Time::MIN);
        assert_eq!(Time::MAX.duration_since(Time::MIN), Duration::from_nanos(i64::MAX));
    }

    #[test]
    fn test_remainder() {
        assert_eq!(Time::from_nanos(105).remainder(Duration::from_nanos(10)), Duration::from_nanos(5));
        assert_eq!(Time::from_nanos(105).remainder(Duration::ZERO), Duration::ZERO);
        assert_eq!(Time::MIN.remainder(Duration::from_nanos(-1)), Duration::ZERO);
    }

    #[test]
    fn test_from_secs() {
        assert_eq!(Duration::from_secs(2).nanos(), 2_000_000_000);
        assert_eq!(Duration::from_secs(i64::MAX).nanos(), i64::MAX);
        assert!((-Duration::from_secs(1)).nanos() < 0);
    }
}
