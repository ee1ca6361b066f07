//! Procedure specifications carried by plan nodes.
//!
//! Every node of a plan graph holds exactly one [`ProcedureSpec`]. Rules
//! match on [`ProcedureKind`] tags and read the typed payload through the
//! `as_*` accessors.

mod distinct;
mod filter;
mod from;
mod group;
mod keys;
mod range;
mod sink;

pub use distinct::DistinctSpec;
pub use filter::FilterSpec;
pub use from::{BucketRef, FromOpSpec, FromSpec};
pub use group::GroupSpec;
pub use keys::KeysSpec;
pub use range::RangeSpec;
pub use sink::YieldSpec;

use serde::{Deserialize, Serialize};

use crate::read::PhysicalReadSpec;

/// Kind tag of a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    /// Logical storage read.
    From,
    /// Physical storage read with pushed-down state.
    PhysicalRead,
    /// Time range restriction.
    Range,
    /// Row predicate.
    Filter,
    /// Regrouping.
    Group,
    /// Distinct values of a column.
    Distinct,
    /// Group key listing.
    Keys,
    /// Named result output.
    Yield,
}

impl std::fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::From => "from",
            Self::PhysicalRead => "physicalRead",
            Self::Range => "range",
            Self::Filter => "filter",
            Self::Group => "group",
            Self::Distinct => "distinct",
            Self::Keys => "keys",
            Self::Yield => "yield",
        };
        f.write_str(s)
    }
}

/// Typed payload of a plan node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "camelCase")]
pub enum ProcedureSpec {
    /// Logical storage read.
    From(FromSpec),
    /// Physical storage read.
    PhysicalRead(PhysicalReadSpec),
    /// Time range restriction.
    Range(RangeSpec),
    /// Row predicate.
    Filter(FilterSpec),
    /// Regrouping.
    Group(GroupSpec),
    /// Distinct values of a column.
    Distinct(DistinctSpec),
    /// Group key listing.
    Keys(KeysSpec),
    /// Named result output.
    Yield(YieldSpec),
}

impl ProcedureSpec {
    /// Kind tag of this spec.
    pub const fn kind(&self) -> ProcedureKind {
        match self {
            Self::From(_) => ProcedureKind::From,
            Self::PhysicalRead(_) => ProcedureKind::PhysicalRead,
            Self::Range(_) => ProcedureKind::Range,
            Self::Filter(_) => ProcedureKind::Filter,
            Self::Group(_) => ProcedureKind::Group,
            Self::Distinct(_) => ProcedureKind::Distinct,
            Self::Keys(_) => ProcedureKind::Keys,
            Self::Yield(_) => ProcedureKind::Yield,
        }
    }

    /// Logical read payload.
    pub const fn as_from(&self) -> Option<&FromSpec> {
        match self {
            Self::From(s) => Some(s),
            _ => None,
        }
    }

    /// Physical read payload.
    pub const fn as_physical_read(&self) -> Option<&PhysicalReadSpec> {
        match self {
            Self::PhysicalRead(s) => Some(s),
            _ => None,
        }
    }

    /// Filter payload.
    pub const fn as_filter(&self) -> Option<&FilterSpec> {
        match self {
            Self::Filter(s) => Some(s),
            _ => None,
        }
    }

    /// One-line summary for explain output.
    pub fn summary(&self) -> String {
        match self {
            Self::From(s) => format!("bucket={}", s.bucket),
            Self::PhysicalRead(s) => s.summary(),
            Self::Range(s) => {
                let b = s.bounds.resolve();
                format!("start={}, stop={}", b.start, b.stop)
            }
            Self::Filter(s) => format!("fn={}", s.func),
            Self::Group(s) => format!("mode={}, keys=[{}]", s.mode, s.keys.join(", ")),
            Self::Distinct(s) => format!("column={}", s.column),
            Self::Keys(s) => format!("except=[{}]", s.except.join(", ")),
            Self::Yield(s) => format!("name={}", s.name),
        }
    }
}

macro_rules! impl_from_spec {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ProcedureSpec {
                fn from(spec: $ty) -> Self {
                    Self::$variant(spec)
                }
            }
        )*
    };
}

impl_from_spec!(
    FromSpec => From,
    PhysicalReadSpec => PhysicalRead,
    RangeSpec => Range,
    FilterSpec => Filter,
    GroupSpec => Group,
    DistinctSpec => Distinct,
    KeysSpec => Keys,
    YieldSpec => Yield,
);
