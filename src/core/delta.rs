// diffs and readable dumps of resolution sets
use serde::{Deserialize, Serialize};

use crate::core::graph::LicenseGraph;
use crate::core::resolution::{ResolutionSet, ResolveError};
use crate::core::types::{ConditionCategory, NodeId};

/// One triple of a resolution set with every id replaced by a target name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub subject: String,
    pub acts_on: String,
    pub origin: String,
    pub condition: String,
    pub category: ConditionCategory,
}

#[derive(Serialize)]
struct Document<'a> {
    resolutions: &'a [ResolutionRecord],
}

impl ResolutionSet {
    /// Triples in `self` that `other` lacks, per subject. Subjects whose
    /// difference is empty are left out.
    pub fn difference(&self, other: &ResolutionSet) -> ResolutionSet {
        let mut out = ResolutionSet::new();
        for (&subject, set) in &self.map {
            for r in set {
                if !other.contains(subject, r) {
                    out.add(subject, r.clone());
                }
            }
        }
        out
    }

    /// Every triple, by name, sorted by subject, acts-on, origin, then condition.
    pub fn records(&self, graph: &LicenseGraph) -> Result<Vec<ResolutionRecord>, ResolveError> {
        let name = |id: NodeId| {
            if (id as usize) < graph.len() {
                Ok(graph.name(id).to_string())
            } else {
                Err(ResolveError::UnknownNode(id))
            }
        };

        let mut records = Vec::with_capacity(self.len());
        for (&subject, set) in &self.map {
            for r in set {
                records.push(ResolutionRecord {
                    subject: name(subject)?,
                    acts_on: name(r.acts_on)?,
                    origin: name(r.origin)?,
                    condition: r.condition.name.clone(),
                    category: r.condition.category,
                });
            }
        }
        records.sort();
        Ok(records)
    }

    /// One `subject: acts_on <- origin name:category` line per triple.
    pub fn render(&self, graph: &LicenseGraph) -> Result<String, ResolveError> {
        let lines = self
            .records(graph)?
            .into_iter()
            .map(|r| {
                format!(
                    "  {}: {} <- {} {}:{}\n",
                    r.subject, r.acts_on, r.origin, r.condition, r.category
                )
            })
            .collect();
        Ok(lines)
    }

    pub fn to_toon(&self, graph: &LicenseGraph) -> Result<String, ResolveError> {
        let records = self.records(graph)?;
        toon_format::encode_default(&Document { resolutions: &records })
            .map_err(|e| ResolveError::Encode(e.to_string()))
    }
}
