//! Environment detection.
//!
//! Whether the host is a managed datacenter instance or a developer
//! workstation decides which configuration sources to trust. The probe reads
//! explicit overrides first, then well-known files under the marker
//! directory, and reaches the instance metadata service for cloud identity.

pub mod environment;

pub use environment::{EnvironmentProbe, ProbeOverrides, CONFIG_DIR};
