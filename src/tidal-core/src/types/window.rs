//! Window schedule of a storage read.

use common_error::{TidalError, TidalResult};
use serde::{Deserialize, Serialize};

use super::bounds::ResolvedBounds;
use super::time::Duration;

/// Periodic window schedule.
///
/// Each window covers `period`; consecutive windows start `every` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Window {
    /// Distance between consecutive window stops.
    pub every: Duration,
    /// Length of each window.
    pub period: Duration,
    /// Alignment of window edges.
    pub offset: Duration,
}

impl Window {
    /// Create a window schedule.
    pub const fn new(every: Duration, period: Duration, offset: Duration) -> Self {
        Self {
            every,
            period,
            offset,
        }
    }

    /// A single window covering the whole interval exactly once.
    pub const fn whole(bounds: &ResolvedBounds) -> Self {
        let duration = bounds.duration();
        Self {
            every: duration,
            period: duration,
            offset: bounds.start.remainder(duration),
        }
    }

    /// Reject schedules that can never advance.
    pub fn validate(&self) -> TidalResult<()> {
        if self.every.is_zero() {
            return Err(TidalError::validation("window every must be non-zero"));
        }
        if self.period.nanos() < 0 {
            return Err(TidalError::validation(format!(
                "window period must not be negative, got {}",
                self.period
            )));
        }
        Ok(())
    }
}
