//! Dependency resolution engine: collection of the raw (possibly cyclic)
//! dependency graph, conflict resolution into a DAG, and the session-level
//! repository cache.

pub mod cache;
pub mod collector;
pub mod conflict;
pub mod graph;
pub mod policy;
pub mod version_resolver;
