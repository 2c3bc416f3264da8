//! Core data types for the Maven-style dependency resolution engine.
//!
//! This crate defines the fundamental types shared by every other
//! `resolver-*` crate: artifact coordinates, dependency declarations,
//! scopes and exclusions, the `ArtifactDescriptor` contract that treats
//! POM-reading as an external collaborator, global configuration, and
//! `${env:VAR}` property interpolation.
//!
//! This crate is intentionally free of async code and network I/O.
//! Session configuration (`ResolverConfig`) lives in `resolver-maven`, next
//! to the repository/transport code it configures.

pub mod coordinate;
pub mod dependency;
pub mod descriptor;
pub mod lockfile;
pub mod properties;
