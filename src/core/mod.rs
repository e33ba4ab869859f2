pub mod classify;
pub mod config;
pub mod delta;
pub mod graph;
pub mod propagate;
pub mod resolution;
pub mod spread;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;
