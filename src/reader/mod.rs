//! Configuration reading and merging.
//!
//! The reader resolves three layers (shipped default, app override, role
//! override) from local disk or the remote object store, deep-merges them,
//! and selects the active runtime profile's sub-tree. Layer provenance
//! (source version and last-modified) is tracked for observability.

pub mod config_reader;
pub mod layer;
pub mod merge;

pub use config_reader::{
    role_configuration_filename, role_path_component, ConfigReader, RESERVED_PROFILES,
};
pub use layer::{ConfigurationVersions, LayerProvenance, RawConfigLayer};
pub use merge::deep_merge;
