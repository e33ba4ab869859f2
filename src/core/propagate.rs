// bottom-up pass: conditions travel from dependencies up to their dependents
use std::collections::HashSet;

use tracing::{debug, trace};

use crate::core::classify::Transfer;
use crate::core::config::ResolverConfig;
use crate::core::graph::LicenseGraph;
use crate::core::resolution::{Resolution, ResolutionSet, ResolveError};
use crate::core::types::NodeId;

/// Resolution of every target as the subject of a compliance query, combining
/// its own conditions with what crosses up from its dependencies.
pub fn resolve_bottom_up(graph: &LicenseGraph) -> Result<ResolutionSet, ResolveError> {
    resolve_bottom_up_with(graph, &ResolverConfig::default())
}

pub fn resolve_bottom_up_with(
    graph: &LicenseGraph,
    config: &ResolverConfig,
) -> Result<ResolutionSet, ResolveError> {
    debug!(
        targets = graph.len(),
        edges = graph.edges().len(),
        parallel = config.parallel,
        "bottom-up resolution started"
    );

    let per_target = fold_up(graph, config, |t| own_conditions(graph, t));
    let rs = ResolutionSet::from_per_target(per_target);
    rs.verify(graph)?;

    debug!(triples = rs.len(), "bottom-up resolution finished");
    Ok(rs)
}

/// `(t, t, c)` for every inherent condition `c` of `t`.
pub(crate) fn own_conditions(graph: &LicenseGraph, t: NodeId) -> HashSet<Resolution> {
    graph
        .target(t)
        .conditions
        .iter()
        .map(|c| Resolution::new(t, t, c.clone()))
        .collect()
}

/// Computes every target's set from `seed(t)` plus whatever crosses each of
/// its dependency edges, one height layer at a time. A layer only reads sets
/// finished in earlier layers.
pub(crate) fn fold_up<F>(
    graph: &LicenseGraph,
    config: &ResolverConfig,
    seed: F,
) -> Vec<HashSet<Resolution>>
where
    F: Fn(NodeId) -> HashSet<Resolution> + Sync + Send,
{
    let mut done: Vec<HashSet<Resolution>> = vec![HashSet::new(); graph.len()];

    for layer in graph.dependency_layers() {
        let finished = config.map_layer(&layer, |t| lift_dependencies(graph, t, seed(t), &done));
        for (t, set) in finished {
            done[t as usize] = set;
        }
    }
    done
}

fn lift_dependencies(
    graph: &LicenseGraph,
    t: NodeId,
    mut acc: HashSet<Resolution>,
    done: &[HashSet<Resolution>],
) -> HashSet<Resolution> {
    for edge in graph.dependencies(t) {
        for r in &done[edge.to as usize] {
            let transfer = graph.transfer(edge, &r.condition, r.origin);
            if !transfer.crosses() {
                continue;
            }
            // only an origin's own condition infects; infections recorded
            // further down pass through unchanged
            if transfer == Transfer::SurfaceAndInfect && r.is_own() {
                acc.insert(Resolution::new(t, r.origin, r.condition.clone()));
            }
            acc.insert(r.clone());
        }
    }
    trace!(node = graph.name(t), triples = acc.len(), "resolved");
    acc
}
