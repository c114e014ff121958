//! Typed configuration building.
//!
//! Converts the reader's untyped key/value mapping into an immutable,
//! strongly-typed configuration: one declaration per expected key with its
//! type, nullability, enum constraint, and optional secrets-vault
//! indirection. The build pass also records which declared types were used
//! and which input keys went unconsumed, for diagnostics.

pub mod config_builder;
pub mod convert;
pub mod value;

// Re-export commonly used types
pub use config_builder::{ConfigBuilder, KeySpec, SecretResolution, TypedConfig};
pub use convert::convert;
pub use value::{classify_raw, ConfigValue, RawSetting, ValueType};
