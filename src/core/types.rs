use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown edge annotation '{0}'")]
    Annotation(String),

    #[error("unknown condition category '{0}'")]
    Category(String),
}

/// How a dependency is consumed by its dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Annotation {
    Static,
    Dynamic,
    /// Build-time tool only; never part of the distributed artifact.
    Toolchain,
}

impl Annotation {
    pub const ALL: [Annotation; 3] =
        [Annotation::Static, Annotation::Dynamic, Annotation::Toolchain];

    pub fn as_str(self) -> &'static str {
        match self {
            Annotation::Static => "static",
            Annotation::Dynamic => "dynamic",
            Annotation::Toolchain => "toolchain",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Annotation::Static => 0b001,
            Annotation::Dynamic => 0b010,
            Annotation::Toolchain => 0b100,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Annotation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(Annotation::Static),
            "dynamic" => Ok(Annotation::Dynamic),
            "toolchain" => Ok(Annotation::Toolchain),
            other => Err(ParseError::Annotation(other.to_string())),
        }
    }
}

/// Set of annotations carried by one edge. Order and repetition of the input
/// do not matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationSet(u8);

impl AnnotationSet {
    pub fn new() -> Self {
        AnnotationSet(0)
    }

    pub fn insert(&mut self, a: Annotation) {
        self.0 |= a.bit();
    }

    pub fn contains(&self, a: Annotation) -> bool {
        self.0 & a.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Annotation> + '_ {
        Annotation::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

impl FromIterator<Annotation> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        let mut set = AnnotationSet::new();
        for a in iter {
            set.insert(a);
        }
        set
    }
}

impl fmt::Display for AnnotationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Annotation::as_str).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

/// Propagation class of a license condition, as assigned by the policy map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionCategory {
    /// Must be acknowledged; never infects.
    Notice,
    /// Same-license sharing duty for the origin only; never infects others.
    Reciprocal,
    /// Infects everything that combines with it, statically or dynamically.
    RestrictedStrong,
    /// Infects static combinations only.
    RestrictedWeak,
    /// A strong license carrying an exception: behaves as `RestrictedWeak`.
    RestrictedWeakException,
}

impl ConditionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionCategory::Notice => "notice",
            ConditionCategory::Reciprocal => "reciprocal",
            ConditionCategory::RestrictedStrong => "restricted-strong",
            ConditionCategory::RestrictedWeak => "restricted-weak",
            ConditionCategory::RestrictedWeakException => "restricted-weak-exception",
        }
    }

    /// True for the categories that can make another target obligated.
    pub fn is_restricted(self) -> bool {
        match self {
            ConditionCategory::Notice | ConditionCategory::Reciprocal => false,
            ConditionCategory::RestrictedStrong
            | ConditionCategory::RestrictedWeak
            | ConditionCategory::RestrictedWeakException => true,
        }
    }
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notice" => Ok(ConditionCategory::Notice),
            "reciprocal" => Ok(ConditionCategory::Reciprocal),
            "restricted-strong" => Ok(ConditionCategory::RestrictedStrong),
            "restricted-weak" => Ok(ConditionCategory::RestrictedWeak),
            "restricted-weak-exception" => Ok(ConditionCategory::RestrictedWeakException),
            other => Err(ParseError::Category(other.to_string())),
        }
    }
}

/// A named license obligation. Compared by value: name and category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub category: ConditionCategory,
}

impl Condition {
    pub fn new(name: impl Into<String>, category: ConditionCategory) -> Self {
        Self { name: name.into(), category }
    }

    pub fn notice(name: impl Into<String>) -> Self {
        Self::new(name, ConditionCategory::Notice)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.category)
    }
}
