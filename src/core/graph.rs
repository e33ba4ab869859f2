use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::core::types::{Annotation, AnnotationSet, Condition, EdgeId, NodeId};
use crate::mapping::policy_map::PolicyError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("target '{0}' is declared more than once")]
    DuplicateTarget(String),

    #[error("edge {from} -> {to} names unknown target '{missing}'")]
    UnknownEdgeTarget { from: String, to: String, missing: String },

    #[error("edge {from} -> {to} carries no annotations")]
    EmptyAnnotations { from: String, to: String },

    #[error("root '{0}' is not a known target")]
    UnknownRoot(String),

    #[error("graph declares no roots")]
    NoRoots,

    #[error("dependency cycle: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("target '{target}': {source}")]
    Policy { target: String, source: PolicyError },

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("graph description: {0}")]
    Format(String),
}

/// One license-metadata unit: a binary, library or bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub package: Option<String>,
    /// Inherent conditions, insertion ordered, without repeats.
    pub conditions: Vec<Condition>,
    /// Pure aggregate (e.g. a filesystem image) rather than a combined work.
    pub container: bool,
    root: bool,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            conditions: Vec::new(),
            container: false,
            root: false,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        self
    }

    pub fn as_container(mut self) -> Self {
        self.container = true;
        self
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn has_restricted_condition(&self) -> bool {
        self.conditions.iter().any(|c| c.category.is_restricted())
    }

    pub fn shares_package_with(&self, other: &Target) -> bool {
        matches!((&self.package, &other.package), (Some(a), Some(b)) if a == b)
    }
}

/// Dependency edge: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub annotations: AnnotationSet,
}

/// Immutable, acyclic license graph. Node ids follow sorted target names, so
/// two builds of the same input agree on every id.
#[derive(Debug, Clone)]
pub struct LicenseGraph {
    targets: Vec<Target>,
    edges: Vec<Edge>,
    out: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    roots: Vec<NodeId>,
    by_name: HashMap<String, NodeId>,
    // dependencies before dependents
    order: Vec<NodeId>,
}

impl LicenseGraph {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, id: NodeId) -> &Target {
        &self.targets[id as usize]
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.targets[id as usize].name
    }

    pub fn find(&self, name: &str) -> Result<NodeId, GraphError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::TargetNotFound(name.to_string()))
    }

    pub fn targets(&self) -> impl Iterator<Item = (NodeId, &Target)> + '_ {
        self.targets.iter().enumerate().map(|(i, t)| (i as NodeId, t))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        0..self.targets.len() as NodeId
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    /// Outgoing edges of `id`, i.e. the edges to its dependencies.
    pub fn dependencies(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.out[id as usize].iter().map(|&e| &self.edges[e as usize])
    }

    /// Incoming edges of `id`, i.e. the edges from its dependents.
    pub fn dependents(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming[id as usize].iter().map(|&e| &self.edges[e as usize])
    }

    /// Every target, dependencies before dependents.
    pub fn dependency_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Targets grouped by height (0 = no dependencies). A target only
    /// depends on targets in earlier layers.
    pub fn dependency_layers(&self) -> Vec<Vec<NodeId>> {
        let mut height = vec![0usize; self.len()];
        for &t in &self.order {
            let h = self
                .dependencies(t)
                .map(|e| height[e.to as usize] + 1)
                .max()
                .unwrap_or(0);
            height[t as usize] = h;
        }
        group_by_level(&height, self.node_ids())
    }

    /// Targets reachable from `reachable` grouped by longest distance from a
    /// root. A target's reachable dependents all sit in earlier layers.
    pub fn dependent_layers(&self, reachable: &[bool]) -> Vec<Vec<NodeId>> {
        let mut depth = vec![0usize; self.len()];
        for &t in self.order.iter().rev() {
            if !reachable[t as usize] {
                continue;
            }
            let d = self
                .dependents(t)
                .filter(|e| reachable[e.from as usize])
                .map(|e| depth[e.from as usize] + 1)
                .max()
                .unwrap_or(0);
            depth[t as usize] = d;
        }
        group_by_level(&depth, self.node_ids().filter(|&t| reachable[t as usize]))
    }

    /// Marks every target reachable from a declared root along any edge.
    pub fn reachable_from_roots(&self) -> Vec<bool> {
        let mut seen = vec![false; self.len()];
        let mut stack: Vec<NodeId> = self.roots.clone();
        while let Some(t) = stack.pop() {
            if seen[t as usize] {
                continue;
            }
            seen[t as usize] = true;
            stack.extend(self.dependencies(t).map(|e| e.to).filter(|&c| !seen[c as usize]));
        }
        seen
    }
}

fn group_by_level(level: &[usize], ids: impl Iterator<Item = NodeId>) -> Vec<Vec<NodeId>> {
    let mut layers: Vec<Vec<NodeId>> = Vec::new();
    for id in ids {
        let l = level[id as usize];
        if layers.len() <= l {
            layers.resize_with(l + 1, Vec::new);
        }
        layers[l].push(id);
    }
    layers
}

/// Collects targets, edges and roots by name and validates them into a
/// [`LicenseGraph`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    targets: Vec<Target>,
    edges: Vec<(String, String, AnnotationSet)>,
    roots: Vec<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, target: Target) -> &mut Self {
        self.targets.push(target);
        self
    }

    pub fn add_edge(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> &mut Self {
        self.edges
            .push((from.into(), to.into(), annotations.into_iter().collect()));
        self
    }

    pub fn add_root(&mut self, name: impl Into<String>) -> &mut Self {
        self.roots.push(name.into());
        self
    }

    pub fn build(&self) -> Result<LicenseGraph, GraphError> {
        let mut targets = self.targets.clone();
        targets.sort_by(|a, b| a.name.cmp(&b.name));

        let mut by_name = HashMap::with_capacity(targets.len());
        for (i, t) in targets.iter().enumerate() {
            if by_name.insert(t.name.clone(), i as NodeId).is_some() {
                return Err(GraphError::DuplicateTarget(t.name.clone()));
            }
        }

        let mut resolved: Vec<(NodeId, NodeId, AnnotationSet)> =
            Vec::with_capacity(self.edges.len());
        for (from, to, annotations) in &self.edges {
            let lookup = |name: &String| {
                by_name.get(name).copied().ok_or_else(|| GraphError::UnknownEdgeTarget {
                    from: from.clone(),
                    to: to.clone(),
                    missing: name.clone(),
                })
            };
            let (f, t) = (lookup(from)?, lookup(to)?);
            if annotations.is_empty() {
                return Err(GraphError::EmptyAnnotations { from: from.clone(), to: to.clone() });
            }
            resolved.push((f, t, *annotations));
        }
        // edge ids must not depend on input order
        resolved.sort();

        let mut roots = BTreeSet::new();
        for r in &self.roots {
            let id = by_name.get(r).copied().ok_or_else(|| GraphError::UnknownRoot(r.clone()))?;
            roots.insert(id);
        }
        if roots.is_empty() {
            return Err(GraphError::NoRoots);
        }
        for &r in &roots {
            targets[r as usize].root = true;
        }

        let n = targets.len();
        let mut out = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        let edges: Vec<Edge> = resolved
            .into_iter()
            .enumerate()
            .map(|(i, (from, to, annotations))| {
                out[from as usize].push(i as EdgeId);
                incoming[to as usize].push(i as EdgeId);
                Edge { id: i as EdgeId, from, to, annotations }
            })
            .collect();

        let mut graph = LicenseGraph {
            targets,
            edges,
            out,
            incoming,
            roots: roots.into_iter().collect(),
            by_name,
            order: Vec::new(),
        };
        graph.order = topological_order(&graph)?;

        debug!(
            targets = graph.len(),
            edges = graph.edges.len(),
            roots = graph.roots.len(),
            "license graph built"
        );
        Ok(graph)
    }
}

/// Kahn's algorithm over out-degree, so dependencies come first. Leftover
/// nodes all sit on or behind a cycle, which is reported by name.
fn topological_order(g: &LicenseGraph) -> Result<Vec<NodeId>, GraphError> {
    let n = g.len();
    let mut pending: Vec<usize> = (0..n).map(|i| g.out[i].len()).collect();
    let mut ready: BTreeSet<NodeId> = g.node_ids().filter(|&t| pending[t as usize] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(t) = ready.pop_first() {
        order.push(t);
        for e in g.dependents(t) {
            let p = &mut pending[e.from as usize];
            *p -= 1;
            if *p == 0 {
                ready.insert(e.from);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    // every leftover node still has a dependency among the leftovers
    let mut on_path = vec![None; n];
    let mut path: Vec<NodeId> = Vec::new();
    let mut cur = (0..n as NodeId).find(|&t| pending[t as usize] > 0);
    while let Some(t) = cur {
        if let Some(start) = on_path[t as usize] {
            let mut names: Vec<String> =
                path[start..].iter().map(|&p| g.name(p).to_string()).collect();
            names.push(g.name(t).to_string());
            return Err(GraphError::Cycle { path: names });
        }
        on_path[t as usize] = Some(path.len());
        path.push(t);
        cur = g.dependencies(t).map(|e| e.to).find(|&c| pending[c as usize] > 0);
    }
    // unreachable for a graph with leftovers; report what was walked
    Err(GraphError::Cycle {
        path: path.iter().map(|&p| g.name(p).to_string()).collect(),
    })
}
