//! Node-kind patterns and typed matches.
//!
//! A [`Pattern`] is a kind tag for the root node plus one sub-pattern per
//! predecessor. A rule anchored on a physical read uses
//! [`Pattern::over_read`], and binds the matched nodes through
//! [`ReadMatch`], which hands out typed specs instead of the raw sum type.

use crate::graph::{NodeId, PlanGraph};
use crate::ops::{
    DistinctSpec, FilterSpec, FromSpec, GroupSpec, KeysSpec, ProcedureKind, ProcedureSpec,
    RangeSpec, YieldSpec,
};
use crate::read::PhysicalReadSpec;

/// Tree of node kinds matched against a node and its predecessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches any node regardless of its inputs.
    Any,
    /// Matches a node of the given kind whose predecessors match the
    /// sub-patterns one for one. An empty list places no constraint on
    /// the predecessors.
    Kind(ProcedureKind, Vec<Pattern>),
}

impl Pattern {
    /// A single node of `kind`, inputs unconstrained.
    pub const fn kind(kind: ProcedureKind) -> Self {
        Self::Kind(kind, Vec::new())
    }

    /// A node of `kind` reading from exactly one physical read.
    pub fn over_read(kind: ProcedureKind) -> Self {
        Self::Kind(kind, vec![Self::kind(ProcedureKind::PhysicalRead)])
    }

    /// Whether the node `id` and its inputs match this pattern.
    pub fn matches(&self, graph: &PlanGraph, id: &NodeId) -> bool {
        let Some(node) = graph.get(id) else {
            return false;
        };
        match self {
            Self::Any => true,
            Self::Kind(kind, inputs) => {
                if node.kind() != *kind {
                    return false;
                }
                if inputs.is_empty() {
                    return true;
                }
                node.predecessors().len() == inputs.len()
                    && inputs
                        .iter()
                        .zip(node.predecessors())
                        .all(|(p, pred)| p.matches(graph, pred))
            }
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Kind(kind, inputs) => {
                write!(f, "{kind}")?;
                for input in inputs {
                    write!(f, " <- {input}")?;
                }
                Ok(())
            }
        }
    }
}

/// A procedure payload with a fixed kind tag.
pub trait Procedure: Sized {
    /// Kind tag of this payload.
    const KIND: ProcedureKind;

    /// Borrow the payload out of the sum type.
    fn extract(spec: &ProcedureSpec) -> Option<&Self>;
}

macro_rules! impl_procedure {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl Procedure for $ty {
                const KIND: ProcedureKind = ProcedureKind::$variant;

                fn extract(spec: &ProcedureSpec) -> Option<&Self> {
                    match spec {
                        ProcedureSpec::$variant(s) => Some(s),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_procedure!(
    FromSpec => From,
    PhysicalReadSpec => PhysicalRead,
    RangeSpec => Range,
    FilterSpec => Filter,
    GroupSpec => Group,
    DistinctSpec => Distinct,
    KeysSpec => Keys,
    YieldSpec => Yield,
);

/// A node of payload `T` bound together with the physical read it reads from.
#[derive(Debug, Clone, Copy)]
pub struct ReadMatch<'g, T> {
    /// Id of the matched root node.
    pub id: &'g NodeId,
    /// Payload of the root node.
    pub spec: &'g T,
    /// Id of the physical read below the root.
    pub read_id: &'g NodeId,
    /// Payload of the physical read.
    pub read: &'g PhysicalReadSpec,
    /// Whether the physical read also feeds nodes other than the root.
    pub shared: bool,
}

impl<'g, T: Procedure> ReadMatch<'g, T> {
    /// Pattern matched by [`ReadMatch::bind`].
    pub fn pattern() -> Pattern {
        Pattern::over_read(T::KIND)
    }

    /// Bind `id` if it is a `T` node reading from exactly one physical read.
    pub fn bind(graph: &'g PlanGraph, id: &NodeId) -> Option<Self> {
        let node = graph.get(id)?;
        let spec = T::extract(node.spec())?;
        let [read_id] = node.predecessors() else {
            return None;
        };
        let read_node = graph.get(read_id)?;
        let read = read_node.spec().as_physical_read()?;
        Some(Self {
            id: node.id(),
            spec,
            read_id: read_node.id(),
            read,
            shared: read_node.successors().len() > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidal_core::{Bounds, Time};

    fn graph() -> (PlanGraph, Vec<NodeId>) {
        let mut g = PlanGraph::new();
        let ids = g
            .chain([
                ProcedureSpec::from(PhysicalReadSpec::from_logical(&FromSpec::bucket("db"))),
                RangeSpec::new(Bounds::absolute(Time::from_nanos(0), Time::from_nanos(5))).into(),
            ])
            .unwrap();
        (g, ids)
    }

    #[test]
    fn test_pattern_matching() {
        let (g, ids) = graph();
        let pattern = Pattern::over_read(ProcedureKind::Range);
        assert!(pattern.matches(&g, &ids[1]));
        assert!(!pattern.matches(&g, &ids[0]));
        assert!(Pattern::kind(ProcedureKind::PhysicalRead).matches(&g, &ids[0]));
        assert!(!Pattern::over_read(ProcedureKind::Filter).matches(&g, &ids[1]));
        assert_eq!(pattern.to_string(), "range <- physicalRead");
    }

    #[test]
    fn test_read_match_binding() {
        let (g, ids) = graph();
        let m = ReadMatch::<RangeSpec>::bind(&g, &ids[1]).unwrap();
        assert_eq!(m.read_id, &ids[0]);
        assert_eq!(m.spec.resolved().stop, Time::from_nanos(5));
        assert!(ReadMatch::<FilterSpec>::bind(&g, &ids[1]).is_none());
        assert!(ReadMatch::<RangeSpec>::bind(&g, &ids[0]).is_none());
        assert!(!m.shared);
    }

    #[test]
    fn test_read_match_sees_other_consumers() {
        let (mut g, ids) = graph();
        let other = g.add_node(YieldSpec::default());
        g.connect(&ids[0], &other).unwrap();
        let m = ReadMatch::<RangeSpec>::bind(&g, &ids[1]).unwrap();
        assert!(m.shared);
    }
}
