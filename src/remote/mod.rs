//! External collaborator seams and the remote source facade.
//!
//! Configuration documents and secrets live outside the process: bulk YAML
//! documents in an object store, sensitive values in a secrets vault, and the
//! host's own account/region in the link-local instance metadata service.
//! This module defines the narrow traits those collaborators are consumed
//! through, plus [`RemoteSource`], the facade that is all the reader ever
//! sees of them.
//!
//! All calls are blocking with short fixed timeouts. This library performs no
//! retries; connection and timeout errors propagate to the caller with the
//! bucket/key/secret context attached.

pub mod metadata;
pub mod object_store;
pub mod secret;
pub mod secrets;
pub mod source;

// Re-export commonly used types
pub use metadata::{Imds, InstanceIdentity, MetadataService};
pub use object_store::{FetchedObject, InMemoryObjectStore, ObjectStore};
pub use secret::{secret_string, SecretString, SecretValue};
pub use secrets::{InMemoryVault, SecretsVault};
pub use source::{bucket_name, RemoteSource, ENV_PLACEHOLDER};
