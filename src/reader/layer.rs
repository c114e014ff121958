//! Configuration layers and their provenance
//!
//! One layer is one loaded source: the shipped default file, the app
//! override, or the role override. A layer is constructed once per
//! resolution pass, carries its source revision and timestamp for
//! observability, and is discarded after the merge.

use crate::domain::{Result, StrataError};
use chrono::{DateTime, Utc};
use serde_yaml::Value;
use std::path::Path;

/// Source revision and timestamp of one layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerProvenance {
    /// Opaque revision identifier: object version remotely, file mtime
    /// seconds locally, absent for an empty layer
    pub version: Option<String>,

    /// Last-modified timestamp of the source
    pub last_updated: Option<DateTime<Utc>>,
}

/// Provenance of the layers that feed the merged configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationVersions {
    /// The mandatory shipped default layer
    pub default: LayerProvenance,

    /// The app-override layer (remote or local)
    pub app_override: LayerProvenance,
}

/// The result of loading one configuration source
#[derive(Debug, Clone)]
pub struct RawConfigLayer {
    content: Value,
    version: Option<String>,
    last_updated: Option<DateTime<Utc>>,
}

impl RawConfigLayer {
    /// A layer with no content; stands in for optional sources that are
    /// absent
    pub fn empty() -> Self {
        Self {
            content: Value::Mapping(Default::default()),
            version: None,
            last_updated: None,
        }
    }

    /// Parse a layer from YAML text
    ///
    /// An empty document becomes an empty mapping; any other non-mapping
    /// document is malformed and fatal.
    pub fn from_yaml(
        text: &str,
        version: Option<String>,
        last_updated: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let content: Value = serde_yaml::from_str(text)?;
        let content = match content {
            Value::Null => Value::Mapping(Default::default()),
            mapping @ Value::Mapping(_) => mapping,
            other => {
                return Err(StrataError::Configuration(format!(
                    "configuration layer must be a mapping, got {}",
                    yaml_type_name(&other)
                )))
            }
        };
        Ok(Self {
            content,
            version,
            last_updated,
        })
    }

    /// Parse a layer from a local file, recording its mtime as provenance
    pub fn from_local_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let modified: DateTime<Utc> = std::fs::metadata(path)?.modified()?.into();
        Self::from_yaml(
            &text,
            Some(modified.timestamp().to_string()),
            Some(modified),
        )
    }

    /// The parsed mapping
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Revision and timestamp of the source this layer was loaded from
    pub fn provenance(&self) -> LayerProvenance {
        LayerProvenance {
            version: self.version.clone(),
            last_updated: self.last_updated,
        }
    }
}

fn yaml_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_layer_is_empty_mapping() {
        let layer = RawConfigLayer::empty();
        assert_eq!(layer.content(), &Value::Mapping(Default::default()));
        assert_eq!(layer.provenance(), LayerProvenance::default());
    }

    #[test]
    fn test_from_yaml_mapping() {
        let layer = RawConfigLayer::from_yaml("a: 1\nb: two\n", None, None).unwrap();
        assert_eq!(layer.content()["a"], Value::from(1));
        assert_eq!(layer.content()["b"], Value::from("two"));
    }

    #[test]
    fn test_from_yaml_empty_document() {
        let layer = RawConfigLayer::from_yaml("", None, None).unwrap();
        assert_eq!(layer.content(), &Value::Mapping(Default::default()));
    }

    #[test]
    fn test_from_yaml_scalar_document_is_fatal() {
        let err = RawConfigLayer::from_yaml("just a string", None, None).unwrap_err();
        assert!(matches!(err, StrataError::Configuration(_)));
    }

    #[test]
    fn test_from_yaml_malformed_is_fatal() {
        let err = RawConfigLayer::from_yaml("a: [unclosed", None, None).unwrap_err();
        assert!(matches!(err, StrataError::Configuration(_)));
    }

    #[test]
    fn test_from_local_file_records_mtime() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"key: value\n").unwrap();
        file.flush().unwrap();

        let layer = RawConfigLayer::from_local_file(file.path()).unwrap();
        let provenance = layer.provenance();
        assert!(provenance.version.is_some());
        assert!(provenance.last_updated.is_some());
        assert_eq!(
            provenance.version.unwrap(),
            provenance.last_updated.unwrap().timestamp().to_string()
        );
    }

    #[test]
    fn test_from_local_file_missing_is_error() {
        let err = RawConfigLayer::from_local_file(Path::new("/nonexistent/app.yml")).unwrap_err();
        assert!(matches!(err, StrataError::Io(_)));
    }
}
