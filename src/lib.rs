//! License condition resolution over a dependency graph of build targets.
//!
//! A [`LicenseGraph`] holds targets, their inherent license conditions and
//! annotated dependency edges. [`resolve_bottom_up`] pushes conditions from
//! dependencies up to everything that incorporates them; [`resolve_top_down`]
//! then spreads restricted conditions back down into everything bundled with
//! an obligated target. Both produce a [`ResolutionSet`].

pub mod core;
pub mod mapping;

pub use crate::core::classify::{Transfer, permit, permit_all};
pub use crate::core::config::{ConfigError, ResolverConfig};
pub use crate::core::delta::ResolutionRecord;
pub use crate::core::graph::{Edge, GraphBuilder, GraphError, LicenseGraph, Target};
pub use crate::core::propagate::{resolve_bottom_up, resolve_bottom_up_with};
pub use crate::core::resolution::{Resolution, ResolutionSet, ResolveError};
pub use crate::core::spread::{resolve_top_down, resolve_top_down_with};
pub use crate::core::types::{
    Annotation, AnnotationSet, Condition, ConditionCategory, EdgeId, NodeId, ParseError,
};
pub use crate::mapping::graph_spec::{EdgeSpec, GraphSpec, TargetSpec};
pub use crate::mapping::policy_map::{PolicyError, PolicyMap};
