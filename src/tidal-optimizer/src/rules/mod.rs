//! Rewrite rules for storage reads.
//!
//! Every rule except [`FromConversion`] is anchored on a node reading from a
//! physical read and folds some of that node's work into the read:
//!
//! - [`FromConversion`]: logical read to unbounded physical read
//! - [`MergeReadRange`]: time bounds, intersected with existing ones
//! - [`MergeReadFilter`]: the pushable conjunction of a predicate
//! - [`ReadDistinctProbe`]: one point per series under distinct over a key
//! - [`MergeReadGroup`]: group by tag keys
//! - [`ReadKeysProbe`]: one point per series under a key listing
//!
//! A rule that cannot safely apply reports [`Transformed::No`]. Errors are
//! reserved for graph surgery failures. A read that feeds several nodes is
//! copied by a merge and never rewritten in place.

mod distinct_probe;
mod from_conversion;
mod keys_probe;
mod merge_filter;
mod merge_group;
mod merge_range;
mod optimizer;
mod rule;

pub use distinct_probe::ReadDistinctProbe;
pub use from_conversion::FromConversion;
pub use keys_probe::ReadKeysProbe;
pub use merge_filter::MergeReadFilter;
pub use merge_group::MergeReadGroup;
pub use merge_range::MergeReadRange;
pub use optimizer::{Optimizer, OptimizerConfig};
pub use rule::{OptimizedPlan, RewriteRule, RuleTrace, Transformed};

/// The rule catalog in application order.
pub fn default_rules() -> Vec<Box<dyn RewriteRule>> {
    vec![
        Box::new(FromConversion),
        Box::new(MergeReadRange),
        Box::new(MergeReadFilter),
        Box::new(ReadDistinctProbe),
        Box::new(MergeReadGroup),
        Box::new(ReadKeysProbe),
    ]
}
