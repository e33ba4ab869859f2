// license name -> condition
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{Condition, ConditionCategory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("license '{license}' has no policy mapping")]
    Unmapped { license: String },

    #[error("license '{license}' names unknown category '{category}'")]
    UnknownCategory { license: String, category: String },

    #[error("policy document: {0}")]
    Format(String),
}

/// Assigns every known license its condition. Unknown licenses are an
/// error, never a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyMap {
    licenses: BTreeMap<String, Condition>,
}

#[derive(Serialize, Deserialize)]
struct PolicyDocument {
    licenses: Vec<PolicyRow>,
}

#[derive(Serialize, Deserialize)]
struct PolicyRow {
    license: String,
    condition: String,
    category: String,
}

impl PolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `license` to `condition`, replacing any earlier mapping.
    pub fn insert(&mut self, license: impl Into<String>, condition: Condition) -> &mut Self {
        self.licenses.insert(license.into(), condition);
        self
    }

    pub fn classify(&self, license: &str) -> Result<&Condition, PolicyError> {
        self.licenses.get(license).ok_or_else(|| PolicyError::Unmapped {
            license: license.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }

    /// Reads a document of the form
    ///
    /// ```text
    /// licenses[2]{license,condition,category}:
    ///   Apache-2.0,notice,notice
    ///   GPL-2.0-only,restricted,restricted-strong
    /// ```
    pub fn from_toon(text: &str) -> Result<Self, PolicyError> {
        let doc: PolicyDocument =
            toon_format::decode_default(text).map_err(|e| PolicyError::Format(e.to_string()))?;

        let mut map = PolicyMap::new();
        for row in doc.licenses {
            let category: ConditionCategory =
                row.category.parse().map_err(|_| PolicyError::UnknownCategory {
                    license: row.license.clone(),
                    category: row.category.clone(),
                })?;
            map.insert(row.license, Condition::new(row.condition, category));
        }
        Ok(map)
    }

    pub fn to_toon(&self) -> Result<String, PolicyError> {
        let doc = PolicyDocument {
            licenses: self
                .licenses
                .iter()
                .map(|(license, c)| PolicyRow {
                    license: license.clone(),
                    condition: c.name.clone(),
                    category: c.category.to_string(),
                })
                .collect(),
        };
        toon_format::encode_default(&doc).map_err(|e| PolicyError::Format(e.to_string()))
    }
}
