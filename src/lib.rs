// Strata - Layered Host Configuration Resolution
// Copyright (c) 2025 Strata Contributors
// Licensed under the MIT License

//! # Strata - Layered Host Configuration Resolution
//!
//! Strata resolves application configuration for a multi-tenant deployment
//! (multiple environments, multiple host roles) from a layered set of
//! sources: a shipped default file, a remote or local override, and an
//! optional per-role override. It then validates and type-converts each value
//! into an immutable, strongly-typed configuration object.
//!
//! It behaves identically on a developer workstation (all sources local) and
//! on a managed datacenter host (overrides fetched from an object store, and
//! secrets from a vault), switching source strategy based on environment
//! detection.
//!
//! ## Architecture
//!
//! - [`probe`] - Host environment detection (datacenter marker, environment
//!   name, instance role, cloud identity)
//! - [`remote`] - Collaborator seams (object store, secrets vault, instance
//!   metadata service) and the remote source facade
//! - [`reader`] - Three-layer merge and runtime-profile selection
//! - [`builder`] - Typed key declarations and the immutable [`builder::TypedConfig`]
//! - [`loader`] - Bootstrap glue combining all of the above
//! - [`domain`] - Error taxonomy and result alias
//! - [`logging`] - Optional tracing-subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use strata::builder::{KeySpec, ValueType};
//! use strata::loader::ConfigLoader;
//! use strata::probe::EnvironmentProbe;
//!
//! fn main() -> strata::domain::Result<()> {
//!     let probe = Arc::new(EnvironmentProbe::from_env());
//!
//!     let config = ConfigLoader::new("/srv/app", probe).load("production", |builder| {
//!         builder.add("database_host", KeySpec::new(ValueType::String))?;
//!         builder.add("pool_size", KeySpec::new(ValueType::Integer))?;
//!         builder.add(
//!             "api_token",
//!             KeySpec::new(ValueType::String).secret_ref("prod/api_token"),
//!         )?;
//!         Ok(())
//!     })?;
//!
//!     println!("pool_size = {:?}", config.get("pool_size"));
//!     Ok(())
//! }
//! ```
//!
//! ## Resolution Rules
//!
//! Layers merge in precedence order default < app-override < role-override:
//! nested mappings merge recursively, and a null value never overrides a
//! present lower-precedence value. The reserved profile sub-trees
//! (`development`, `production`, `test`) are removed from the top level and
//! the active profile's sub-tree is merged on top.
//!
//! Resolution is synchronous and happens once, early in bootstrap. Missing
//! optional layers degrade silently to empty layers; a missing default
//! document, malformed YAML, or a failed type conversion is fatal before the
//! application starts serving. No partial configuration is ever returned.
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`] with the
//! [`domain::StrataError`] taxonomy:
//!
//! ```rust,no_run
//! use strata::domain::StrataError;
//!
//! fn bootstrap() -> strata::domain::Result<()> {
//!     // Errors are automatically converted using the ? operator
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Strata logs through the `tracing` crate; every remote fetch logs bucket
//! and key before issuing:
//!
//! ```rust,no_run
//! tracing::info!(bucket = "app-secrets.12345-us-east-1", key = "staging/idp/v1/application.yml", "reading remote object");
//! ```

pub mod builder;
pub mod domain;
pub mod loader;
pub mod logging;
pub mod probe;
pub mod reader;
pub mod remote;
