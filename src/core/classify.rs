// transfer policy: how a condition crosses a dependency edge
use crate::core::graph::{Edge, LicenseGraph};
use crate::core::types::{Annotation, AnnotationSet, Condition, ConditionCategory, NodeId};

/// What a condition is allowed to do across one edge. Variants are ordered
/// from least to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transfer {
    Blocked,
    /// Visible to the other side, which does not become obligated.
    SurfaceOnly,
    /// Visible, and the other side becomes obligated too.
    SurfaceAndInfect,
}

impl Transfer {
    pub fn crosses(self) -> bool {
        self != Transfer::Blocked
    }
}

/// The closed (category, annotation) table.
pub fn permit(category: ConditionCategory, annotation: Annotation) -> Transfer {
    use Annotation::*;
    use ConditionCategory::*;

    match (category, annotation) {
        // build tools never ship
        (_, Toolchain) => Transfer::Blocked,

        (Notice | Reciprocal, Static) => Transfer::SurfaceOnly,
        (Notice | Reciprocal, Dynamic) => Transfer::Blocked,

        (RestrictedStrong, Static | Dynamic) => Transfer::SurfaceAndInfect,

        (RestrictedWeak | RestrictedWeakException, Static) => Transfer::SurfaceAndInfect,
        (RestrictedWeak | RestrictedWeakException, Dynamic) => Transfer::Blocked,
    }
}

/// Most permissive entry over every annotation on the edge. A toolchain
/// annotation never outranks a co-present static or dynamic one.
pub fn permit_all(category: ConditionCategory, annotations: &AnnotationSet) -> Transfer {
    annotations
        .iter()
        .map(|a| permit(category, a))
        .max()
        .unwrap_or(Transfer::Blocked)
}

impl LicenseGraph {
    /// Transfer of `condition` (originating at `origin`) up across `edge`.
    ///
    /// A license exception does not hold for a direct dependent in the
    /// package that carries it: when `edge` links straight into `origin` from
    /// a target of the same package, a weak-exception condition transfers
    /// with strong rules. Any other edge uses the plain table.
    pub fn transfer(&self, edge: &Edge, condition: &Condition, origin: NodeId) -> Transfer {
        let category = match condition.category {
            ConditionCategory::RestrictedWeakException
                if edge.to == origin
                    && self.target(edge.from).shares_package_with(self.target(origin)) =>
            {
                ConditionCategory::RestrictedStrong
            }
            c => c,
        };
        permit_all(category, &edge.annotations)
    }
}
