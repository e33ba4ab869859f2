pub mod graph_spec;
pub mod policy_map;
