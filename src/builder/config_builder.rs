//! Typed configuration building
//!
//! The builder takes the resolved raw mapping, collects one declaration per
//! expected key, converts and validates each value, and finalizes into an
//! immutable [`TypedConfig`]. The builder is consumed by the build pass, so
//! declaring keys after finalization is unrepresentable, and the raw mapping
//! is dropped at finalize to minimize retention of sensitive values.

use super::convert::convert;
use super::value::{classify_raw, ConfigValue, RawSetting, ValueType};
use crate::domain::{Result, StrataError};
use crate::remote::SecretsVault;
use secrecy::ExposeSecret;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// How secret references resolve during the build pass
///
/// In the managed datacenter every secret reference goes to the vault.
/// Outside it, the reference name is looked up directly as a key in the raw
/// mapping. This is how local development substitutes fixture values for
/// the managed secret store.
pub enum SecretResolution {
    Datacenter(Arc<dyn SecretsVault>),
    LocalFixture,
}

/// Declaration of one expected configuration key
#[derive(Clone)]
pub struct KeySpec {
    value_type: ValueType,
    allow_nil: bool,
    enum_values: Option<Vec<ConfigValue>>,
    secret_ref: Option<String>,
}

impl KeySpec {
    /// Declare a key of the given type, required and unconstrained
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            allow_nil: false,
            enum_values: None,
            secret_ref: None,
        }
    }

    /// Permit the key to be absent
    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    /// Constrain the converted value to this set
    pub fn one_of(mut self, values: impl IntoIterator<Item = ConfigValue>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// Fetch this key's raw value from the secrets vault under `name`
    /// instead of from the resolved mapping
    pub fn secret_ref(mut self, name: impl Into<String>) -> Self {
        self.secret_ref = Some(name.into());
        self
    }
}

/// Immutable typed configuration assembled from all declarations
#[derive(Debug, Clone)]
pub struct TypedConfig {
    values: BTreeMap<String, ConfigValue>,
    key_types: BTreeMap<String, ValueType>,
    unused_keys: BTreeSet<String>,
}

impl TypedConfig {
    /// The converted value for a declared key
    ///
    /// `None` only for keys declared with `allow_nil` whose raw value was
    /// absent.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// The converted value, or a required-key error naming it
    pub fn require(&self, key: &str) -> Result<&ConfigValue> {
        self.values
            .get(key)
            .ok_or_else(|| StrataError::RequiredKey(key.to_string()))
    }

    /// Declared type per key, frozen after the build pass
    pub fn key_types(&self) -> &BTreeMap<String, ValueType> {
        &self.key_types
    }

    /// Raw input keys that no declaration referenced
    pub fn unused_keys(&self) -> &BTreeSet<String> {
        &self.unused_keys
    }
}

/// Single-use builder fed by `add` declarations
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use strata::builder::{ConfigBuilder, KeySpec, SecretResolution, ValueType};
///
/// # fn example() -> strata::domain::Result<()> {
/// let mut raw = BTreeMap::new();
/// raw.insert("database_host".to_string(), serde_yaml::Value::from("localhost"));
///
/// let config = ConfigBuilder::build(raw, SecretResolution::LocalFixture, |builder| {
///     builder.add("database_host", KeySpec::new(ValueType::String))?;
///     builder.add("database_port", KeySpec::new(ValueType::Integer).allow_nil())?;
///     Ok(())
/// })?;
///
/// assert_eq!(config.get("database_host").unwrap().as_str(), Some("localhost"));
/// # Ok(())
/// # }
/// ```
pub struct ConfigBuilder {
    raw: BTreeMap<String, Value>,
    resolution: SecretResolution,
    key_types: BTreeMap<String, ValueType>,
    written: BTreeMap<String, ConfigValue>,
}

impl ConfigBuilder {
    /// Run a build pass: the declaration closure sees the builder, then the
    /// result is finalized and the raw mapping dropped
    pub fn build(
        raw: BTreeMap<String, Value>,
        resolution: SecretResolution,
        declare: impl FnOnce(&mut ConfigBuilder) -> Result<()>,
    ) -> Result<TypedConfig> {
        let mut builder = ConfigBuilder {
            raw,
            resolution,
            key_types: BTreeMap::new(),
            written: BTreeMap::new(),
        };

        declare(&mut builder)?;

        let unused_keys = builder
            .raw
            .keys()
            .filter(|key| !builder.key_types.contains_key(*key))
            .cloned()
            .collect();

        // Raw mapping dropped here with the builder; only converted values
        // survive.
        Ok(TypedConfig {
            values: builder.written,
            key_types: builder.key_types,
            unused_keys,
        })
    }

    /// Declare one key with the built-in converter for its type
    pub fn add(&mut self, key: &str, spec: KeySpec) -> Result<()> {
        let raw_value = self.resolve_raw(key, &spec)?;
        self.key_types.insert(key.to_string(), spec.value_type);

        let converted = match &raw_value {
            Some(value) => Some(convert(key, value, spec.value_type)?),
            None => None,
        };

        self.finish_declaration(key, &spec, raw_value, converted)
    }

    /// Declare one key with a caller-supplied converter
    ///
    /// The converter receives the resolved raw value (after indirection
    /// resolution, before type conversion) and its return value is used
    /// as-is; the nil and enum checks still apply.
    pub fn add_with<F>(&mut self, key: &str, spec: KeySpec, converter: F) -> Result<()>
    where
        F: FnOnce(Option<&Value>) -> Result<Option<ConfigValue>>,
    {
        let raw_value = self.resolve_raw(key, &spec)?;
        self.key_types.insert(key.to_string(), spec.value_type);

        let converted = converter(raw_value.as_ref())?;
        self.finish_declaration(key, &spec, raw_value, converted)
    }

    fn finish_declaration(
        &mut self,
        key: &str,
        spec: &KeySpec,
        raw_value: Option<Value>,
        converted: Option<ConfigValue>,
    ) -> Result<()> {
        if converted.is_none() && !spec.allow_nil {
            return Err(StrataError::RequiredKey(key.to_string()));
        }

        if let Some(enum_values) = &spec.enum_values {
            let permitted = match &converted {
                Some(value) => enum_values.contains(value),
                None => spec.allow_nil,
            };
            if !permitted {
                return Err(StrataError::UnexpectedValue {
                    key: key.to_string(),
                    value: raw_value
                        .map(|v| format!("{v:?}"))
                        .unwrap_or_else(|| "nil".to_string()),
                    expected: enum_values.iter().map(ToString::to_string).collect(),
                });
            }
        }

        if let Some(value) = converted {
            self.written.insert(key.to_string(), value);
        }
        Ok(())
    }

    // Step one of every declaration: find the raw value, resolving vault and
    // environment indirections before any type conversion.
    fn resolve_raw(&self, key: &str, spec: &KeySpec) -> Result<Option<Value>> {
        if let Some(name) = &spec.secret_ref {
            return self.resolve_secret(name);
        }

        let Some(value) = self.raw.get(key) else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }

        match classify_raw(value) {
            RawSetting::Literal(value) => Ok(Some(value)),
            RawSetting::EnvRef(name) => {
                let fetched = std::env::var(&name).map_err(|_| StrataError::Conversion {
                    key: key.to_string(),
                    message: format!("environment variable {name} is not set"),
                })?;
                Ok(Some(Value::String(fetched)))
            }
            RawSetting::SecretRef(name) => self.resolve_secret(&name),
        }
    }

    fn resolve_secret(&self, name: &str) -> Result<Option<Value>> {
        match &self.resolution {
            SecretResolution::Datacenter(vault) => {
                let secret = vault.get_secret_value(name)?;
                Ok(Some(Value::String(
                    secret.expose_secret().as_ref().to_string(),
                )))
            }
            SecretResolution::LocalFixture => Ok(self
                .raw
                .get(name)
                .filter(|value| !value.is_null())
                .cloned()),
        }
    }
}
