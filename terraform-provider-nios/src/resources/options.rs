//! DHCP option lists
//!
//! NIOS hands options back in its own order and adds the inherited lease time
//! as a disabled `dhcp-lease-time` entry. State has to follow the configured
//! order and must not grow entries the user never wrote.

use crate::resources::fields::Field;
use crate::schema::Diagnostic;
use crate::validators::{as_integer, Validator};
use serde_json::{Map, Value};

pub const DEFAULT_VENDOR_CLASS: &str = "DHCP";

const LEASE_TIME_NAME: &str = "dhcp-lease-time";
const LEASE_TIME_NUM: i64 = 51;

/// Options that accept `use_option`, with their DHCP codes
const USE_OPTION_CAPABLE: &[(&str, Option<i64>)] = &[
    ("routers", Some(3)),
    ("router-templates", None),
    ("domain-name-servers", Some(6)),
    ("domain-name", Some(15)),
    ("broadcast-address", Some(28)),
    ("broadcast-address-offset", None),
    ("dhcp-lease-time", Some(51)),
    ("dhcp6.name-servers", Some(23)),
];

pub fn option_fields() -> Vec<Field> {
    vec![
        Field::string("name", "Name of the DHCP option.").optional_computed(),
        Field::integer("num", "Code of the DHCP option.")
            .optional_computed()
            .validate(Validator::IntRange(1, 254)),
        Field::string("value", "Value of the DHCP option.").required(),
        Field::string("vendor_class", "Option space the option belongs to.")
            .default(Value::String(DEFAULT_VENDOR_CLASS.to_string())),
        Field::bool(
            "use_option",
            "Only applies to special options that are displayed separately from other options and have a use flag.",
        )
        .optional_computed(),
    ]
}

fn name_of(option: &Map<String, Value>) -> Option<&str> {
    option.get("name").and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn num_of(option: &Map<String, Value>) -> Option<i64> {
    option.get("num").and_then(as_integer)
}

fn vendor_class_of(option: &Map<String, Value>) -> &str {
    option
        .get("vendor_class")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_VENDOR_CLASS)
}

/// Same option: same vendor class and same name or code
pub fn same_option(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if vendor_class_of(a) != vendor_class_of(b) {
        return false;
    }
    if let (Some(x), Some(y)) = (name_of(a), name_of(b)) {
        return x == y;
    }
    matches!((num_of(a), num_of(b)), (Some(x), Some(y)) if x == y)
}

/// The disabled lease time entry NIOS adds on its own
fn is_server_default(option: &Map<String, Value>) -> bool {
    let lease_time = name_of(option) == Some(LEASE_TIME_NAME) || num_of(option) == Some(LEASE_TIME_NUM);
    let disabled = option.get("use_option").and_then(Value::as_bool) == Some(false);
    lease_time && disabled
}

/// Order response options like the configured list and drop server defaults
/// the configuration does not mention
pub fn reconcile(configured: Option<&Value>, response: &Value) -> Vec<Map<String, Value>> {
    let response: Vec<&Map<String, Value>> = response
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();
    let mut used = vec![false; response.len()];
    let mut ordered = Vec::with_capacity(response.len());

    if let Some(configured) = configured.and_then(Value::as_array) {
        for wanted in configured.iter().filter_map(Value::as_object) {
            let hit = response
                .iter()
                .enumerate()
                .find(|(i, candidate)| !used[*i] && same_option(wanted, candidate))
                .map(|(i, _)| i);
            if let Some(i) = hit {
                used[i] = true;
                ordered.push(response[i].clone());
            }
        }
    }

    for (i, option) in response.iter().enumerate() {
        if !used[i] && !is_server_default(option) {
            ordered.push((*option).clone());
        }
    }

    ordered
}

/// Fill unset computed members of planned options from the matching prior
/// option, so an unchanged list plans as unchanged
pub fn fill_from_prior(planned: &Value, prior: Option<&Value>) -> Value {
    let Some(items) = planned.as_array() else {
        return planned.clone();
    };
    let prior_items: Vec<&Map<String, Value>> = prior
        .and_then(Value::as_array)
        .map(|p| p.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();

    let filled = items
        .iter()
        .map(|item| {
            let Some(option) = item.as_object() else {
                return item.clone();
            };
            let mut option = option.clone();
            if option.get("vendor_class").map_or(true, Value::is_null) {
                option.insert(
                    "vendor_class".to_string(),
                    Value::String(DEFAULT_VENDOR_CLASS.to_string()),
                );
            }
            if let Some(previous) = prior_items.iter().find(|p| same_option(&option, p)) {
                for key in ["name", "num", "use_option"] {
                    if option.get(key).map_or(true, Value::is_null) {
                        if let Some(v) = previous.get(key) {
                            option.insert(key.to_string(), v.clone());
                        }
                    }
                }
            }
            Value::Object(option)
        })
        .collect();

    Value::Array(filled)
}

/// Cross-field checks for one configured option
pub fn validate_option(option: &Map<String, Value>, path: &[String]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let name = name_of(option);
    let num = num_of(option);

    if name.is_none() && num.is_none() {
        diagnostics.push(
            Diagnostic::error("Invalid DHCP option")
                .with_detail("Either name or num must be set for each option.")
                .with_attribute(path.to_vec()),
        );
        return diagnostics;
    }

    let use_option_set = option.get("use_option").is_some_and(|v| !v.is_null());
    if use_option_set {
        let capable = USE_OPTION_CAPABLE.iter().any(|(n, code)| {
            name == Some(*n) || (name.is_none() && num.is_some() && *code == num)
        });
        if !capable {
            let mut attr = path.to_vec();
            attr.push("use_option".to_string());
            diagnostics.push(
                Diagnostic::error("Invalid DHCP option")
                    .with_detail(&format!(
                        "use_option can only be set for {}",
                        USE_OPTION_CAPABLE
                            .iter()
                            .map(|(n, _)| *n)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                    .with_attribute(attr),
            );
        }
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
    fn test_same_option_by_name_or_num() {
        let a = obj(json!({"name": "routers", "value": "10.0.0.1"}));
        let b = obj(json!({"name": "routers", "num": 3, "vendor_class": "DHCP"}));
        let c = obj(json!({"num": 3}));
        let d = obj(json!({"name": "routers", "vendor_class": "MSFT"}));

        assert!(same_option(&a, &b));
        assert!(same_option(&c, &b));
        assert!(!same_option(&a, &d));
        assert!(!same_option(&a, &obj(json!({"name": "domain-name"}))));
    }

    #[test]
    fn test_reconcile_follows_configured_order() {
        let configured = json!([
            {"name": "domain-name", "value": "example.com"},
            {"num": 3, "value": "10.0.0.1"}
        ]);
        let response = json!([
            {"name": "routers", "num": 3, "value": "10.0.0.1", "vendor_class": "DHCP", "use_option": true},
            {"name": "dhcp-lease-time", "num": 51, "value": "43200", "vendor_class": "DHCP", "use_option": false},
            {"name": "domain-name", "num": 15, "value": "example.com", "vendor_class": "DHCP", "use_option": true}
        ]);

        let ordered = reconcile(Some(&configured), &response);
        let names: Vec<&str> = ordered.iter().filter_map(|o| name_of(o)).collect();
        assert_eq!(names, vec!["domain-name", "routers"]);
    }

    #[test]
    fn test_reconcile_keeps_configured_lease_time_and_unknown_extras() {
        let configured = json!([{"name": "dhcp-lease-time", "value": "3600", "use_option": false}]);
        let response = json!([
            {"name": "ntp-servers", "num": 42, "value": "10.0.0.9", "vendor_class": "DHCP"},
            {"name": "dhcp-lease-time", "num": 51, "value": "3600", "vendor_class": "DHCP", "use_option": false}
        ]);

        let ordered = reconcile(Some(&configured), &response);
        let names: Vec<&str> = ordered.iter().filter_map(|o| name_of(o)).collect();
        assert_eq!(names, vec!["dhcp-lease-time", "ntp-servers"]);
    }

    #[test]
    fn test_reconcile_without_configuration_drops_defaults_only() {
        let response = json!([
            {"name": "dhcp-lease-time", "num": 51, "value": "43200", "use_option": false},
            {"name": "dhcp-lease-time", "num": 51, "value": "600", "use_option": true},
            {"name": "routers", "num": 3, "value": "10.0.0.1"}
        ]);

        let ordered = reconcile(None, &response);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0]["value"], json!("600"));
    }

    #[test]
    fn test_fill_from_prior() {
        let planned = json!([{"name": "routers", "value": "10.0.0.1", "num": null, "vendor_class": null, "use_option": null}]);
        let prior = json!([{"name": "routers", "num": 3, "value": "10.0.0.254", "vendor_class": "DHCP", "use_option": true}]);

        let filled = fill_from_prior(&planned, Some(&prior));
        assert_eq!(
            filled,
            json!([{"name": "routers", "num": 3, "value": "10.0.0.1", "vendor_class": "DHCP", "use_option": true}])
        );
    }

    #[test]
    fn test_validate_option() {
        let path = vec!["options".to_string(), "0".to_string()];

        assert!(validate_option(&obj(json!({"name": "routers", "use_option": true})), &path).is_empty());
        assert!(validate_option(&obj(json!({"num": 6, "use_option": false})), &path).is_empty());

        let diags = validate_option(&obj(json!({"value": "x"})), &path);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(path.clone()));

        let diags = validate_option(&obj(json!({"name": "ntp-servers", "use_option": true})), &path);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute,
            Some(vec!["options".to_string(), "0".to_string(), "use_option".to_string()])
        );
    }
}
