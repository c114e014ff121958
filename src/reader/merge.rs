//! Deep merge of configuration documents
//!
//! Precedence runs default < app-override < role-override. Nested mappings
//! merge recursively; for any other conflict the higher-precedence value
//! wins unless it is null, in which case the lower-precedence value is kept.

use serde_yaml::{Mapping, Value};

/// Merge `higher` over `lower`
pub fn deep_merge(lower: &Value, higher: &Value) -> Value {
    match (lower, higher) {
        (Value::Mapping(lower_map), Value::Mapping(higher_map)) => {
            Value::Mapping(merge_mappings(lower_map, higher_map))
        }
        (_, Value::Null) => lower.clone(),
        _ => higher.clone(),
    }
}

fn merge_mappings(lower: &Mapping, higher: &Mapping) -> Mapping {
    let mut merged = lower.clone();
    for (key, higher_value) in higher {
        let value = match merged.get(key) {
            Some(lower_value) => deep_merge(lower_value, higher_value),
            None => higher_value.clone(),
        };
        merged.insert(key.clone(), value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_higher_wins_on_scalar_conflict() {
        let merged = deep_merge(&yaml("a: 1"), &yaml("a: 2"));
        assert_eq!(merged, yaml("a: 2"));
    }

    #[test]
    fn test_null_never_overrides_present_value() {
        let merged = deep_merge(&yaml("a: 1"), &yaml("a: null"));
        assert_eq!(merged, yaml("a: 1"));
    }

    #[test]
    fn test_nested_mappings_merge_recursively() {
        let lower = yaml("db:\n  host: localhost\n  port: 5432");
        let higher = yaml("db:\n  host: db.internal");
        assert_eq!(
            deep_merge(&lower, &higher),
            yaml("db:\n  host: db.internal\n  port: 5432")
        );
    }

    #[test]
    fn test_mapping_replaced_by_scalar() {
        let merged = deep_merge(&yaml("a:\n  nested: 1"), &yaml("a: flat"));
        assert_eq!(merged, yaml("a: flat"));
    }

    #[test]
    fn test_disjoint_keys_union() {
        let merged = deep_merge(&yaml("a: 1"), &yaml("b: 2"));
        assert_eq!(merged, yaml("a: 1\nb: 2"));
    }

    #[test]
    fn test_sequential_merge_matches_three_way_precedence() {
        let default = yaml("a: 1\nb:\n  x: 1\n  y: 1");
        let app = yaml("b:\n  y: 2\nc: 2");
        let role = yaml("b:\n  y: 3\nd: null");

        let sequential = deep_merge(&deep_merge(&default, &app), &role);
        assert_eq!(sequential, yaml("a: 1\nb:\n  x: 1\n  y: 3\nc: 2\nd: null"));
    }

    #[test]
    fn test_null_at_depth_keeps_lower_value() {
        let lower = yaml("db:\n  host: localhost");
        let higher = yaml("db:\n  host: null\n  port: 6432");
        assert_eq!(
            deep_merge(&lower, &higher),
            yaml("db:\n  host: localhost\n  port: 6432")
        );
    }
}
