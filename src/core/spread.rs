// top-down pass: an obligated target taints what is bundled with it
use std::collections::HashSet;

use tracing::{debug, trace};

use crate::core::classify::permit_all;
use crate::core::config::ResolverConfig;
use crate::core::graph::{LicenseGraph, Target};
use crate::core::propagate::{fold_up, own_conditions};
use crate::core::resolution::{Resolution, ResolutionSet, ResolveError};
use crate::core::types::{Condition, NodeId};

/// (origin, condition) pairs a target is obligated by.
type Infections = HashSet<(NodeId, Condition)>;

/// Extends `bottom_up` with the infections that spread down from obligated
/// targets into their dependencies, starting at the declared roots, and
/// surfaces those new triples back up to every ancestor.
pub fn resolve_top_down(
    graph: &LicenseGraph,
    bottom_up: &ResolutionSet,
) -> Result<ResolutionSet, ResolveError> {
    resolve_top_down_with(graph, bottom_up, &ResolverConfig::default())
}

pub fn resolve_top_down_with(
    graph: &LicenseGraph,
    bottom_up: &ResolutionSet,
    config: &ResolverConfig,
) -> Result<ResolutionSet, ResolveError> {
    bottom_up.verify(graph)?;
    debug!(targets = graph.len(), roots = graph.roots().len(), "top-down resolution started");

    let reachable = graph.reachable_from_roots();
    let infected = spread_infections(graph, bottom_up, &reachable, config);

    let mut per_target = fold_up(graph, config, |t| {
        let mut seed = own_conditions(graph, t);
        seed.extend(
            infected[t as usize]
                .iter()
                .map(|(origin, c)| Resolution::new(t, *origin, c.clone())),
        );
        seed
    });
    // outside every root's reach nothing spreads
    for t in graph.node_ids().filter(|&t| !reachable[t as usize]) {
        per_target[t as usize] = bottom_up.triples_for(t).cloned().collect();
    }

    let mut rs = ResolutionSet::from_per_target(per_target);
    rs.merge(bottom_up);
    rs.verify(graph)?;

    debug!(triples = rs.len(), added = rs.len() - bottom_up.len(), "top-down resolution finished");
    Ok(rs)
}

/// Infections per target, parents before children. A target holds what it
/// is obligated by bottom-up plus whatever its reachable, spreading parents
/// hold and may pass across the connecting edge.
fn spread_infections(
    graph: &LicenseGraph,
    bottom_up: &ResolutionSet,
    reachable: &[bool],
    config: &ResolverConfig,
) -> Vec<Infections> {
    let mut infected: Vec<Infections> = vec![HashSet::new(); graph.len()];

    for layer in graph.dependent_layers(reachable) {
        let finished = config.map_layer(&layer, |t| {
            let mut own: Infections = bottom_up
                .triples_for(t)
                .filter(|r| r.acts_on == t && r.condition.category.is_restricted())
                .map(|r| (r.origin, r.condition.clone()))
                .collect();

            for edge in graph.dependents(t) {
                let parent = edge.from;
                if !reachable[parent as usize] || !spreads_down(graph.target(parent)) {
                    continue;
                }
                // the package exception never widens a downward spread
                for (origin, c) in &infected[parent as usize] {
                    if permit_all(c.category, &edge.annotations).crosses() {
                        own.insert((*origin, c.clone()));
                    }
                }
            }
            own
        });
        for (t, inf) in finished {
            if !inf.is_empty() {
                trace!(node = graph.name(t), infections = inf.len(), "infected");
            }
            infected[t as usize] = inf;
        }
    }
    infected
}

/// A pure aggregate does not combine its parts into one work, so it only
/// passes infections down when it is itself restricted-licensed.
fn spreads_down(target: &Target) -> bool {
    !target.container || target.has_restricted_condition()
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::core::propagate::{resolve_bottom_up, resolve_bottom_up_with};
    use crate::core::types::{Annotation, ConditionCategory};

    /// Per-node kind plus `(from, to, annotation bits)`; only `from < to`
    /// edges are kept, so every draw is acyclic.
    type Drawn = (Vec<u8>, Vec<(usize, usize, u8)>);

    fn arb_dag() -> impl Strategy<Value = Drawn> {
        (2usize..9).prop_flat_map(|n| {
            (
                prop::collection::vec(0u8..6, n),
                prop::collection::vec((0..n, 0..n, 1u8..8), 0..n * 2),
            )
        })
    }

    fn mk_node(i: usize, kind: u8) -> Target {
        use ConditionCategory::*;

        let category = match kind {
            0 | 5 => Notice,
            1 => Reciprocal,
            2 => RestrictedStrong,
            3 => RestrictedWeak,
            _ => RestrictedWeakException,
        };
        let t = Target::new(format!("t{i}"))
            .with_package(format!("pkg{}", i % 2))
            .with_condition(Condition::new(format!("c{kind}"), category));
        if kind == 5 { t.as_container() } else { t }
    }

    fn annotations(bits: u8) -> Vec<Annotation> {
        Annotation::ALL
            .into_iter()
            .enumerate()
            .filter(|(i, _)| bits & (1 << i) != 0)
            .map(|(_, a)| a)
            .collect()
    }

    fn mk_builder((kinds, edges): &Drawn, reversed: bool) -> GraphBuilder {
        let mut nodes: Vec<Target> =
            kinds.iter().enumerate().map(|(i, &k)| mk_node(i, k)).collect();
        let mut kept: Vec<(usize, usize, u8)> =
            edges.iter().copied().filter(|(f, t, _)| f < t).collect();
        if reversed {
            nodes.reverse();
            kept.reverse();
        }

        let mut b = GraphBuilder::new();
        for n in nodes {
            b.add_target(n);
        }
        for &(f, t, bits) in &kept {
            b.add_edge(format!("t{f}"), format!("t{t}"), annotations(bits));
        }
        for i in 0..kinds.len() {
            if !kept.iter().any(|&(_, t, _)| t == i) {
                b.add_root(format!("t{i}"));
            }
        }
        b
    }

    fn both_passes(g: &LicenseGraph, config: &ResolverConfig) -> (ResolutionSet, ResolutionSet) {
        let bu = resolve_bottom_up_with(g, config).unwrap();
        let td = resolve_top_down_with(g, &bu, config).unwrap();
        (bu, td)
    }

    proptest! {
        #[test]
        fn input_order_does_not_matter(drawn in arb_dag()) {
            let g1 = mk_builder(&drawn, false).build().unwrap();
            let g2 = mk_builder(&drawn, true).build().unwrap();
            let config = ResolverConfig::default();

            prop_assert_eq!(both_passes(&g1, &config), both_passes(&g2, &config));
        }

        #[test]
        fn top_down_is_a_fixpoint(drawn in arb_dag()) {
            let g = mk_builder(&drawn, false).build().unwrap();
            let bu = resolve_bottom_up(&g).unwrap();
            let td = resolve_top_down(&g, &bu).unwrap();

            prop_assert_eq!(resolve_top_down(&g, &td).unwrap(), td.clone());
            prop_assert!(bu.difference(&td).is_empty());
        }

        #[test]
        fn parallel_matches_sequential(drawn in arb_dag()) {
            let g = mk_builder(&drawn, false).build().unwrap();
            let par = ResolverConfig { parallel: true, min_parallel_layer: 2 };

            prop_assert_eq!(both_passes(&g, &ResolverConfig::default()), both_passes(&g, &par));
        }

        #[test]
        fn toolchain_dependencies_stay_isolated(
            drawn in arb_dag(),
            users in prop::collection::vec(any::<bool>(), 8),
        ) {
            let mut b = mk_builder(&drawn, false);
            let tool = Target::new("tool")
                .with_condition(Condition::new("restricted", ConditionCategory::RestrictedStrong));
            b.add_target(tool);
            let mut linked = false;
            for i in 0..drawn.0.len() {
                if users[i % users.len()] {
                    b.add_edge(format!("t{i}"), "tool", [Annotation::Toolchain]);
                    linked = true;
                }
            }
            if !linked {
                b.add_edge("t0", "tool", [Annotation::Toolchain]);
            }
            let g = b.build().unwrap();
            let tool = g.find("tool").unwrap();
            let (bu, td) = both_passes(&g, &ResolverConfig::default());

            for rs in [&bu, &td] {
                for subject in rs.subjects() {
                    if subject != tool {
                        let leaked =
                            rs.triples_for(subject).any(|r| r.origin == tool || r.acts_on == tool);
                        prop_assert!(!leaked);
                    }
                }
                prop_assert_eq!(rs.triples_for(tool).count(), 1);
            }
        }
    }
}
