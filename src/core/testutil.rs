// shared fixtures for resolver tests
use std::collections::BTreeSet;

use crate::core::graph::{GraphBuilder, LicenseGraph, Target};
use crate::core::resolution::{Resolution, ResolutionSet};
use crate::core::types::{Annotation, Condition, ConditionCategory};

/// The fixture catalogue: package, condition name, category, container flag.
pub(crate) fn mk_target(name: &str) -> Target {
    use ConditionCategory::*;

    let (package, condition, category, container) = match name {
        "apacheBin" | "apacheLib" | "mitBin" | "mitLib" => ("Android", "notice", Notice, false),
        "apacheContainer" => ("Android", "notice", Notice, true),
        "gplBin" | "gplLib" => ("Free Software", "restricted", RestrictedStrong, false),
        "lgplBin" | "lgplLib" => ("Free Library", "restricted", RestrictedWeak, false),
        "mplLib" => ("Free Library", "reciprocal", Reciprocal, false),
        "gplWithClasspathException" => {
            ("Free Software", "restricted", RestrictedWeakException, false)
        }
        "dependentModule" => ("Free Software", "notice", Notice, false),
        other => panic!("no fixture named {other}"),
    };
    let t = Target::new(name)
        .with_package(package)
        .with_condition(Condition::new(condition, category));
    if container { t.as_container() } else { t }
}

/// Builds a graph of fixture targets from the names used in `roots` and
/// `edges`.
pub(crate) fn mk_graph(roots: &[&str], edges: &[(&str, &str, Annotation)]) -> LicenseGraph {
    let names: BTreeSet<&str> = roots
        .iter()
        .copied()
        .chain(edges.iter().flat_map(|(from, to, _)| [*from, *to]))
        .collect();

    let mut b = GraphBuilder::new();
    for name in names {
        b.add_target(mk_target(name));
    }
    for (from, to, annotation) in edges {
        b.add_edge(*from, *to, [*annotation]);
    }
    for root in roots {
        b.add_root(*root);
    }
    b.build().unwrap()
}

/// Rows are (subject, acts_on, origin, condition name). The condition is
/// looked up among the origin's own conditions.
pub(crate) fn mk_expected(g: &LicenseGraph, rows: &[(&str, &str, &str, &str)]) -> ResolutionSet {
    let mut rs = ResolutionSet::new();
    for t in g.node_ids() {
        rs.add_subject(t);
    }
    for (subject, acts_on, origin, condition) in rows {
        let origin = g.find(origin).unwrap();
        let c = g
            .target(origin)
            .conditions
            .iter()
            .find(|c| c.name == *condition)
            .unwrap_or_else(|| panic!("{} has no condition {condition}", g.name(origin)))
            .clone();
        rs.add(g.find(subject).unwrap(), Resolution::new(g.find(acts_on).unwrap(), origin, c));
    }
    rs
}

#[track_caller]
pub(crate) fn check_same(
    case: &str,
    g: &LicenseGraph,
    actual: &ResolutionSet,
    expected: &ResolutionSet,
) {
    if actual == expected {
        return;
    }
    panic!(
        "{case}: resolution sets differ\nunexpected:\n{}missing:\n{}",
        actual.difference(expected).render(g).unwrap(),
        expected.difference(actual).render(g).unwrap(),
    );
}
