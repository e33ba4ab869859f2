use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::core::graph::LicenseGraph;
use crate::core::types::{Condition, NodeId};

/// Resolver invariant failures. Any of these means the result cannot be
/// trusted and no partial result is handed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("subject '{0}' is missing from the resolution set")]
    MissingSubject(String),

    #[error("subject '{subject}' lacks its own condition {condition}")]
    MissingSelfTriple { subject: String, condition: String },

    #[error("resolution set refers to node {0}, which is not in the graph")]
    UnknownNode(NodeId),

    #[error("encoding resolution set: {0}")]
    Encode(String),
}

/// `condition`, originating at `origin`, applies to `acts_on`.
///
/// `acts_on == origin` means the origin's own condition is visible; anything
/// else means `acts_on` was infected by a condition from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution {
    pub acts_on: NodeId,
    pub origin: NodeId,
    pub condition: Condition,
}

impl Resolution {
    pub fn new(acts_on: NodeId, origin: NodeId, condition: Condition) -> Self {
        Self { acts_on, origin, condition }
    }

    pub fn is_own(&self) -> bool {
        self.acts_on == self.origin
    }
}

/// Per-subject sets of resolutions. Equality is by value: a subject absent
/// from one side equals an empty set on the other.
#[derive(Debug, Clone, Default)]
pub struct ResolutionSet {
    pub(crate) map: HashMap<NodeId, HashSet<Resolution>>,
}

impl ResolutionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per node id, subjects taken from the index.
    pub(crate) fn from_per_target(per_target: Vec<HashSet<Resolution>>) -> Self {
        let map = per_target
            .into_iter()
            .enumerate()
            .map(|(i, set)| (i as NodeId, set))
            .collect();
        Self { map }
    }

    /// Returns false when the triple was already present.
    pub fn add(&mut self, subject: NodeId, resolution: Resolution) -> bool {
        self.map.entry(subject).or_default().insert(resolution)
    }

    pub fn add_subject(&mut self, subject: NodeId) {
        self.map.entry(subject).or_default();
    }

    pub fn contains(&self, subject: NodeId, resolution: &Resolution) -> bool {
        self.map.get(&subject).is_some_and(|s| s.contains(resolution))
    }

    pub fn get(&self, subject: NodeId) -> Option<&HashSet<Resolution>> {
        self.map.get(&subject)
    }

    pub fn triples_for(&self, subject: NodeId) -> impl Iterator<Item = &Resolution> + '_ {
        self.map.get(&subject).into_iter().flatten()
    }

    /// Subjects in id order.
    pub fn subjects(&self) -> Vec<NodeId> {
        let mut s: Vec<NodeId> = self.map.keys().copied().collect();
        s.sort_unstable();
        s
    }

    /// Total number of triples over all subjects.
    pub fn len(&self) -> usize {
        self.map.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn union(&self, other: &ResolutionSet) -> ResolutionSet {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    pub(crate) fn merge(&mut self, other: &ResolutionSet) {
        for (&subject, set) in &other.map {
            self.map.entry(subject).or_default().extend(set.iter().cloned());
        }
    }

    /// Checks that every target is a subject, that each subject holds a
    /// self-triple for every inherent condition, and that no id points outside
    /// the graph.
    pub fn verify(&self, graph: &LicenseGraph) -> Result<(), ResolveError> {
        let n = graph.len() as NodeId;
        for (&subject, set) in &self.map {
            if subject >= n {
                return Err(ResolveError::UnknownNode(subject));
            }
            if let Some(r) = set.iter().find(|r| r.acts_on >= n || r.origin >= n) {
                return Err(ResolveError::UnknownNode(r.acts_on.max(r.origin)));
            }
        }
        for (id, target) in graph.targets() {
            let set = self
                .map
                .get(&id)
                .ok_or_else(|| ResolveError::MissingSubject(target.name.clone()))?;
            for c in &target.conditions {
                if !set.contains(&Resolution::new(id, id, c.clone())) {
                    return Err(ResolveError::MissingSelfTriple {
                        subject: target.name.clone(),
                        condition: c.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl PartialEq for ResolutionSet {
    fn eq(&self, other: &Self) -> bool {
        let same = |a: &Self, b: &Self| {
            a.map.iter().all(|(k, set)| match b.map.get(k) {
                Some(other) => set == other,
                None => set.is_empty(),
            })
        };
        same(self, other) && same(other, self)
    }
}

impl Eq for ResolutionSet {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{GraphBuilder, Target};
    use crate::core::types::{Annotation, ConditionCategory};

    fn notice() -> Condition {
        Condition::notice("notice")
    }

    fn gpl() -> Condition {
        Condition::new("restricted", ConditionCategory::RestrictedStrong)
    }

    #[test]
    fn equality_ignores_insertion_order_and_duplicates() {
        let mut a = ResolutionSet::new();
        a.add(0, Resolution::new(0, 0, notice()));
        a.add(0, Resolution::new(0, 1, gpl()));

        let mut b = ResolutionSet::new();
        b.add(0, Resolution::new(0, 1, gpl()));
        b.add(0, Resolution::new(0, 0, notice()));
        assert!(!b.add(0, Resolution::new(0, 0, notice())));

        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn empty_subject_equals_absent_subject() {
        let mut a = ResolutionSet::new();
        a.add(0, Resolution::new(0, 0, notice()));
        let mut b = a.clone();
        b.add_subject(7);

        assert_eq!(a, b);
        b.add(7, Resolution::new(7, 7, notice()));
        assert_ne!(a, b);
    }

    #[test]
    fn union_is_order_independent() {
        let mut a = ResolutionSet::new();
        a.add(0, Resolution::new(0, 0, notice()));
        let mut b = ResolutionSet::new();
        b.add(0, Resolution::new(0, 1, gpl()));
        b.add(1, Resolution::new(1, 1, gpl()));

        let ab = a.union(&b);
        assert_eq!(ab, b.union(&a));
        assert_eq!(ab.union(&ab), ab);
        assert!(ab.contains(1, &Resolution::new(1, 1, gpl())));
        assert_eq!(ab.subjects(), vec![0, 1]);
        assert_eq!(ab.triples_for(0).count(), 2);
        assert_eq!(ab.triples_for(5).count(), 0);
    }

    #[test]
    fn verify_catches_missing_self_triple_and_subject() {
        let mut b = GraphBuilder::new();
        b.add_target(Target::new("apacheBin").with_condition(notice()))
            .add_target(Target::new("gplLib").with_condition(gpl()))
            .add_edge("apacheBin", "gplLib", [Annotation::Static])
            .add_root("apacheBin");
        let g = b.build().unwrap();
        let (bin, lib) = (g.find("apacheBin").unwrap(), g.find("gplLib").unwrap());

        let mut rs = ResolutionSet::new();
        rs.add(bin, Resolution::new(bin, bin, notice()));
        assert_eq!(rs.verify(&g), Err(ResolveError::MissingSubject("gplLib".into())));

        rs.add(lib, Resolution::new(bin, lib, gpl()));
        assert!(matches!(rs.verify(&g), Err(ResolveError::MissingSelfTriple { .. })));

        rs.add(lib, Resolution::new(lib, lib, gpl()));
        assert_eq!(rs.verify(&g), Ok(()));

        rs.add(9, Resolution::new(9, 9, gpl()));
        assert_eq!(rs.verify(&g), Err(ResolveError::UnknownNode(9)));
    }
}
