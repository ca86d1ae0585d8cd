//! JSON-LD normalization helpers
//!
//! A JSON-LD payload may be a single object, an array of objects, an object
//! carrying a `@graph` array, or any nesting of those. Everything downstream
//! works on the flattened sequence of objects.

use serde_json::{Map, Value};

/// Flatten a JSON-LD payload into the sequence of objects it describes.
///
/// Arrays are walked element by element (every element, not only the first)
/// and `@graph` members are lifted out. An object carrying `@graph` is itself
/// kept when it also declares a `@type`.
pub fn typed_objects(value: &Value) -> Vec<&Map<String, Value>> {
    let mut objects = Vec::new();
    collect_objects(value, &mut objects);
    objects
}

fn collect_objects<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
    match value {
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                if map.contains_key("@type") {
                    out.push(map);
                }
                collect_objects(graph, out);
            } else {
                out.push(map);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_objects(item, out);
            }
        }
        _ => {}
    }
}

/// The `@type` names of an object, with any `schema:` prefix removed
pub fn type_names(object: &Map<String, Value>) -> Vec<&str> {
    match object.get("@type") {
        Some(Value::String(s)) => vec![strip_type_prefix(s)],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(strip_type_prefix)
            .collect(),
        _ => Vec::new(),
    }
}

fn strip_type_prefix(name: &str) -> &str {
    let name = name.trim_start_matches("schema:");
    name.rsplit('/').next().unwrap_or(name)
}

/// First textual value of a JSON-LD property.
///
/// Handles plain strings, `{"@value": ...}` wrappers, `{"name": ...}`
/// entities and arrays of any of those.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Object(map) => map
            .get("@value")
            .or_else(|| map.get("name"))
            .and_then(text_value),
        Value::Array(items) => items.iter().find_map(text_value),
        _ => None,
    }
}

/// Textual value of a named property on an object
pub fn property_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(text_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object() {
        let value = json!({"@type": "Article", "headline": "x"});
        assert_eq!(typed_objects(&value).len(), 1);
    }

    #[test]
    fn test_array_every_element() {
        let value = json!([
            {"@type": "Organization"},
            {"@type": "BreadcrumbList"},
            {"@type": "Article", "dateModified": "2024-01-01"}
        ]);
        let objects = typed_objects(&value);
        assert_eq!(objects.len(), 3);
        assert!(objects[2].contains_key("dateModified"));
    }

    #[test]
    fn test_graph_and_nested_arrays() {
        let value = json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "WebSite"},
                [{"@type": "WebPage"}, {"@type": "MedicalWebPage"}]
            ]
        });
        let objects = typed_objects(&value);
        assert_eq!(objects.len(), 3);
        assert_eq!(type_names(objects[2]), vec!["MedicalWebPage"]);
    }

    #[test]
    fn test_type_names_prefixes() {
        let value = json!({"@type": ["schema:Article", "https://schema.org/NewsArticle"]});
        let objects = typed_objects(&value);
        assert_eq!(type_names(objects[0]), vec!["Article", "NewsArticle"]);
    }

    #[test]
    fn test_text_value_shapes() {
        assert_eq!(text_value(&json!("Jane")), Some("Jane".to_string()));
        assert_eq!(text_value(&json!({"@type": "Person", "name": "Jane"})), Some("Jane".to_string()));
        assert_eq!(text_value(&json!([{"name": ""}, "Bob"])), Some("Bob".to_string()));
        assert_eq!(text_value(&json!({"@value": "2024-01-01"})), Some("2024-01-01".to_string()));
        assert_eq!(text_value(&json!(42)), None);
    }
}
