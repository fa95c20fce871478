//! Server-side allocation through WAPI object functions, e.g.
//! `next_available_ip` on a network.

use crate::resources::fields::Field;
use crate::schema::Diagnostic;
use serde_json::{Map, Value};

pub const FIELD_NAME: &str = "func_call";

pub fn field() -> Field {
    Field::object(
        FIELD_NAME,
        "Allocates the target attribute through a WAPI object function. The function only runs on create, so changing it replaces the object.",
        vec![
            Field::string("attribute_name", "Attribute that receives the function result, e.g. ipv4addr.")
                .required(),
            Field::string("object_function", "Function to call, e.g. next_available_ip.").required(),
            Field::string("object", "Object type the function is called on, e.g. network.").optional(),
            Field::string_map("object_parameters", "Search parameters selecting the object.").optional(),
            Field::string("result_field", "Field of the function result to use, e.g. ips.").required(),
            Field::string_map("parameters", "Arguments passed to the function.").optional(),
        ],
    )
    .optional()
    .managed()
}

/// Terraform maps only hold strings; the WAPI wants typed arguments
fn typed(map: Option<&Value>) -> Map<String, Value> {
    let Some(map) = map.and_then(Value::as_object) else {
        return Map::new();
    };

    map.iter()
        .map(|(k, v)| {
            let typed = match v.as_str() {
                Some("true") => Value::Bool(true),
                Some("false") => Value::Bool(false),
                Some(s) => s
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or_else(|_| Value::String(s.to_string())),
                None => v.clone(),
            };
            (k.clone(), typed)
        })
        .collect()
}

/// Build `(target attribute, function call document)`
pub fn expand(func_call: &Map<String, Value>) -> Result<(String, Value), String> {
    let get = |key: &str| func_call.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());

    let attribute = get("attribute_name").ok_or("func_call.attribute_name is required")?;
    let function = get("object_function").ok_or("func_call.object_function is required")?;
    let result_field = get("result_field").ok_or("func_call.result_field is required")?;

    let mut call = Map::new();
    call.insert("_object_function".to_string(), Value::String(function.to_string()));
    if let Some(object) = get("object") {
        call.insert("_object".to_string(), Value::String(object.to_string()));
    }
    let object_parameters = typed(func_call.get("object_parameters"));
    if !object_parameters.is_empty() {
        call.insert("_object_parameters".to_string(), Value::Object(object_parameters));
    }
    call.insert("_result_field".to_string(), Value::String(result_field.to_string()));
    let parameters = typed(func_call.get("parameters"));
    if !parameters.is_empty() {
        call.insert("_parameters".to_string(), Value::Object(parameters));
    }

    Ok((attribute.to_string(), Value::Object(call)))
}

/// The target must be allowed for the type and must not be set directly too
pub fn validate(
    func_call: &Map<String, Value>,
    targets: &[&str],
    config: &Map<String, Value>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let path = vec![FIELD_NAME.to_string(), "attribute_name".to_string()];

    let Some(attribute) = func_call.get("attribute_name").and_then(Value::as_str) else {
        return diagnostics;
    };

    if !targets.contains(&attribute) {
        diagnostics.push(
            Diagnostic::error("Invalid func_call")
                .with_detail(&format!(
                    "attribute_name must be one of: {}",
                    targets.join(", ")
                ))
                .with_attribute(path),
        );
    } else if config.get(attribute).is_some_and(|v| !v.is_null()) {
        diagnostics.push(
            Diagnostic::error("Conflicting configuration")
                .with_detail(&format!(
                    "{} is allocated by func_call and cannot also be set directly",
                    attribute
                ))
                .with_attribute(vec![attribute.to_string()]),
        );
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_expand_next_available_ip() {
        let fc = obj(json!({
            "attribute_name": "ipv4addr",
            "object_function": "next_available_ip",
            "object": "network",
            "object_parameters": {"network": "10.0.0.0/24", "network_view": "default"},
            "result_field": "ips",
            "parameters": {"num": "1", "exclude": "10.0.0.1"}
        }));

        let (attribute, call) = expand(&fc).unwrap();
        assert_eq!(attribute, "ipv4addr");
        assert_eq!(
            call,
            json!({
                "_object_function": "next_available_ip",
                "_object": "network",
                "_object_parameters": {"network": "10.0.0.0/24", "network_view": "default"},
                "_result_field": "ips",
                "_parameters": {"num": 1, "exclude": "10.0.0.1"}
            })
        );
    }

    #[test]
    fn test_expand_requires_function() {
        let fc = obj(json!({"attribute_name": "network", "result_field": "networks"}));
        assert!(expand(&fc).is_err());
    }

    #[test]
    fn test_typed_booleans() {
        let map = json!({"recursive": "true", "cidr": "24", "name": "x"});
        let typed = typed(Some(&map));
        assert_eq!(typed["recursive"], json!(true));
        assert_eq!(typed["cidr"], json!(24));
        assert_eq!(typed["name"], json!("x"));
    }

    #[test]
    fn test_validate_targets_and_conflicts() {
        let fc = obj(json!({"attribute_name": "ipv4addr"}));

        let ok = validate(&fc, &["ipv4addr"], &obj(json!({"ipv4addr": null})));
        assert!(ok.is_empty());

        let conflict = validate(&fc, &["ipv4addr"], &obj(json!({"ipv4addr": "10.0.0.5"})));
        assert_eq!(conflict.len(), 1);
        assert_eq!(conflict[0].attribute, Some(vec!["ipv4addr".to_string()]));

        let wrong = validate(&fc, &["network"], &Map::new());
        assert_eq!(wrong.len(), 1);
    }
}
