// graph description documents
use serde::{Deserialize, Serialize};

use crate::core::graph::{GraphBuilder, GraphError, LicenseGraph, Target};
use crate::core::types::Annotation;
use crate::mapping::policy_map::PolicyMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub licenses: Vec<String>,
    #[serde(default)]
    pub container: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub annotations: Vec<Annotation>,
}

/// A whole graph as plain data: targets name their licenses, which are
/// classified through a [`PolicyMap`] when the graph is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub roots: Vec<String>,
    pub targets: Vec<TargetSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl GraphSpec {
    pub fn from_toon(text: &str) -> Result<Self, GraphError> {
        toon_format::decode_default(text).map_err(|e| GraphError::Format(e.to_string()))
    }

    pub fn to_toon(&self) -> Result<String, GraphError> {
        toon_format::encode_default(self).map_err(|e| GraphError::Format(e.to_string()))
    }

    pub fn build(&self, policy: &PolicyMap) -> Result<LicenseGraph, GraphError> {
        let mut b = GraphBuilder::new();
        for spec in &self.targets {
            let mut target = Target::new(&spec.name);
            if let Some(package) = &spec.package {
                target = target.with_package(package);
            }
            for license in &spec.licenses {
                let condition = policy.classify(license).map_err(|source| GraphError::Policy {
                    target: spec.name.clone(),
                    source,
                })?;
                target = target.with_condition(condition.clone());
            }
            if spec.container {
                target = target.as_container();
            }
            b.add_target(target);
        }
        for e in &self.edges {
            b.add_edge(&e.from, &e.to, e.annotations.iter().copied());
        }
        for r in &self.roots {
            b.add_root(r);
        }
        b.build()
    }
}
