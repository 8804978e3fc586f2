use crate::domain::model::JsonMap;
use serde_json::Value;

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// Looks up a dotted key path inside nested JSON objects.
pub fn value_at<'a>(root: &'a JsonMap, path: &str) -> Option<&'a Value> {
    let mut parts = segments(path);
    let first = parts.next()?;
    let mut current = root.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Writes `value` at a dotted key path.
///
/// Missing intermediate objects are only created with `create_missing`. An
/// intermediate value that is present but not an object blocks the write.
pub fn set_at(root: &mut JsonMap, path: &str, value: Value, create_missing: bool) -> bool {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        return false;
    };

    let mut current = root;
    for part in parents {
        if !current.contains_key(*part) {
            if !create_missing {
                tracing::trace!("Skipping write to '{}': '{}' is missing", path, part);
                return false;
            }
            current.insert((*part).to_string(), Value::Object(JsonMap::new()));
        }
        match current.get_mut(*part) {
            Some(Value::Object(next)) => current = next,
            _ => {
                tracing::trace!("Skipping write to '{}': '{}' is not an object", path, part);
                return false;
            }
        }
    }

    current.insert((*last).to_string(), value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> JsonMap {
        json!({
            "id": 123,
            "user": {
                "profile": { "name": "John Doe" },
                "tags": ["a", "b"]
            },
            "metadata": null
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_value_at_nested() {
        let data = sample();
        assert_eq!(value_at(&data, "id"), Some(&json!(123)));
        assert_eq!(value_at(&data, "user.profile.name"), Some(&json!("John Doe")));
        assert_eq!(value_at(&data, "user.profile.email"), None);
        assert_eq!(value_at(&data, "user.tags.0"), None);
        assert_eq!(value_at(&data, "metadata"), Some(&Value::Null));
        assert_eq!(value_at(&data, "metadata.created"), None);
    }

    #[test]
    fn test_set_at_creates_missing_parents() {
        let mut data = JsonMap::new();
        assert!(set_at(&mut data, "address.coordinates.latitude", json!(37.3), true));
        assert!(set_at(&mut data, "address.city", json!("Cupertino"), true));
        assert_eq!(
            Value::Object(data),
            json!({"address": {"city": "Cupertino", "coordinates": {"latitude": 37.3}}})
        );
    }

    #[test]
    fn test_set_at_without_create_missing() {
        let mut data = JsonMap::new();
        assert!(!set_at(&mut data, "address.city", json!("Cupertino"), false));
        assert!(data.is_empty());
        assert!(set_at(&mut data, "city", json!("Cupertino"), false));
    }

    #[test]
    fn test_set_at_blocked_by_non_object() {
        let mut data = sample();
        assert!(!set_at(&mut data, "metadata.created", json!("2024"), true));
        assert_eq!(data.get("metadata"), Some(&Value::Null));
        assert!(!set_at(&mut data, "id.value", json!(1), true));
    }
}
