//! Time domain and grouping types.

mod bounds;
mod group;
mod time;
mod window;

pub use bounds::{Bounds, ResolvedBounds, TimeSpec};
pub use group::GroupMode;
pub use time::{Duration, Time};
pub use window::Window;
