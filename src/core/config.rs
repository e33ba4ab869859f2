use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("decoding resolver config: {0}")]
    Decode(String),
}

/// Execution knobs for both resolver passes. Neither setting changes the
/// result, only how a layer of independent targets is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Compute wide dependency layers on the rayon pool.
    pub parallel: bool,
    /// Layers narrower than this stay on the calling thread.
    pub min_parallel_layer: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            min_parallel_layer: 64,
        }
    }
}

impl ResolverConfig {
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    pub fn from_toon(text: &str) -> Result<Self, ConfigError> {
        toon_format::decode_default(text).map_err(|e| ConfigError::Decode(e.to_string()))
    }

    pub(crate) fn runs_parallel(&self, width: usize) -> bool {
        self.parallel && width >= self.min_parallel_layer.max(2)
    }

    /// Applies `f` to every target of one layer. Output order follows `layer`
    /// either way, so callers see identical results.
    pub(crate) fn map_layer<T, F>(&self, layer: &[NodeId], f: F) -> Vec<(NodeId, T)>
    where
        T: Send,
        F: Fn(NodeId) -> T + Sync + Send,
    {
        if self.runs_parallel(layer.len()) {
            layer.par_iter().map(|&t| (t, f(t))).collect()
        } else {
            layer.iter().map(|&t| (t, f(t))).collect()
        }
    }
}
