//! Extensible attributes
//!
//! State carries two maps: `extattrs`, which the user manages, and the
//! computed `extattrs_all`, which mirrors everything NIOS reports including
//! inherited values and the `Terraform Internal ID` marker.

use crate::resources::fields::render;
use serde_json::{json, Map, Value};
use uuid::Uuid;

pub const INTERNAL_ID_EA: &str = "Terraform Internal ID";

/// Search parameter selecting objects by the internal ID EA
pub const INTERNAL_ID_SEARCH_PARAM: &str = "*Terraform Internal ID";

pub fn new_internal_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn search_param(internal_id: &str) -> (String, String) {
    (INTERNAL_ID_SEARCH_PARAM.to_string(), internal_id.to_string())
}

/// `{"Site": "HQ"}` to `{"Site": {"value": "HQ"}}`
pub fn expand(user: &Map<String, Value>) -> Map<String, Value> {
    user.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), json!({ "value": v })))
        .collect()
}

pub fn with_internal_id(mut extattrs: Map<String, Value>, internal_id: &str) -> Map<String, Value> {
    extattrs.insert(INTERNAL_ID_EA.to_string(), json!({ "value": internal_id }));
    extattrs
}

/// Request fragment that adds the internal ID without touching other EAs
pub fn stamp_payload(internal_id: &str) -> Value {
    json!({ "extattrs+": { INTERNAL_ID_EA: { "value": internal_id } } })
}

fn is_inherited(entry: &Value) -> bool {
    entry
        .get("inheritance_source")
        .is_some_and(|src| !src.is_null())
}

fn value_of(entry: &Value) -> String {
    match entry.get("value") {
        Some(v) => render(v),
        None => render(entry),
    }
}

/// Look up the internal ID in either the WAPI shape or the flattened
/// `extattrs_all` shape
pub fn internal_id(extattrs: Option<&Value>) -> Option<String> {
    let entry = extattrs?.as_object()?.get(INTERNAL_ID_EA)?;
    let id = value_of(entry);
    (!id.is_empty()).then_some(id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Null when nothing user-managed remains and the user set nothing
    pub extattrs: Value,
    pub extattrs_all: Value,
}

/// Split the EAs on a response into the user-managed and computed maps.
///
/// Inherited EAs only land in `extattrs` when the user's previous map named
/// them; the internal ID never does.
pub fn reconcile(response: Option<&Value>, prior_user: Option<&Map<String, Value>>) -> Reconciled {
    let mut user = Map::new();
    let mut all = Map::new();

    if let Some(eas) = response.and_then(Value::as_object) {
        for (name, entry) in eas {
            let value = value_of(entry);
            all.insert(name.clone(), Value::String(value.clone()));

            if name == INTERNAL_ID_EA {
                continue;
            }
            let declared = prior_user.is_some_and(|p| p.contains_key(name));
            if is_inherited(entry) && !declared {
                continue;
            }
            user.insert(name.clone(), Value::String(value));
        }
    }

    let extattrs = if user.is_empty() && prior_user.is_none() {
        Value::Null
    } else {
        Value::Object(user)
    };

    Reconciled {
        extattrs,
        extattrs_all: Value::Object(all),
    }
}

/// EAs for a PUT: the planned user map plus the internal ID carried over
/// from state, or a fresh one for objects that never had it
pub fn update_payload(plan_user: Option<&Map<String, Value>>, prior_all: Option<&Value>) -> Map<String, Value> {
    let user = plan_user.map(expand).unwrap_or_default();
    let internal_id = internal_id(prior_all).unwrap_or_else(new_internal_id);
    with_internal_id(user, &internal_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_expand_and_internal_id() {
        let eas = expand(&obj(json!({"Site": "HQ", "Skip": null})));
        let eas = with_internal_id(eas, "abc");
        assert_eq!(
            Value::Object(eas),
            json!({"Site": {"value": "HQ"}, "Terraform Internal ID": {"value": "abc"}})
        );
    }

    #[test]
    fn test_new_internal_id_is_uuid() {
        let id = new_internal_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_internal_id());
    }

    #[test]
    fn test_internal_id_lookup_both_shapes() {
        let wire = json!({"Terraform Internal ID": {"value": "id-1"}});
        let flat = json!({"Terraform Internal ID": "id-2"});
        assert_eq!(internal_id(Some(&wire)).as_deref(), Some("id-1"));
        assert_eq!(internal_id(Some(&flat)).as_deref(), Some("id-2"));
        assert_eq!(internal_id(Some(&json!({}))), None);
        assert_eq!(internal_id(None), None);
    }

    #[test]
    fn test_reconcile_drops_inherited_and_internal_id() {
        let response = json!({
            "Site": {"value": "HQ"},
            "Region": {"value": "EMEA", "inheritance_source": {"_ref": "networkcontainer/abc"}},
            "Ports": {"value": [80, 443]},
            "Terraform Internal ID": {"value": "id-1"}
        });
        let prior = obj(json!({"Site": "HQ"}));

        let r = reconcile(Some(&response), Some(&prior));

        assert_eq!(r.extattrs, json!({"Site": "HQ", "Ports": "80,443"}));
        assert_eq!(
            r.extattrs_all,
            json!({
                "Site": "HQ",
                "Region": "EMEA",
                "Ports": "80,443",
                "Terraform Internal ID": "id-1"
            })
        );
    }

    #[test]
    fn test_reconcile_keeps_declared_inherited() {
        let response = json!({
            "Region": {"value": "EMEA", "inheritance_source": {"_ref": "networkcontainer/abc"}}
        });
        let prior = obj(json!({"Region": "EMEA"}));

        let r = reconcile(Some(&response), Some(&prior));
        assert_eq!(r.extattrs, json!({"Region": "EMEA"}));
    }

    #[test]
    fn test_reconcile_null_when_unmanaged() {
        let response = json!({"Terraform Internal ID": {"value": "id-1"}});
        let r = reconcile(Some(&response), None);
        assert_eq!(r.extattrs, Value::Null);

        let r = reconcile(Some(&response), Some(&Map::new()));
        assert_eq!(r.extattrs, json!({}));
    }

    #[test]
    fn test_update_payload_carries_internal_id() {
        let plan = obj(json!({"Site": "DR"}));
        let prior_all = json!({"Site": "HQ", "Terraform Internal ID": "id-1"});

        let payload = update_payload(Some(&plan), Some(&prior_all));
        assert_eq!(
            Value::Object(payload),
            json!({"Site": {"value": "DR"}, "Terraform Internal ID": {"value": "id-1"}})
        );

        let fresh = update_payload(None, None);
        assert!(internal_id(Some(&Value::Object(fresh))).is_some());
    }

    #[test]
    fn test_search_param() {
        let (key, value) = search_param("id-3");
        assert_eq!(key, "*Terraform Internal ID");
        assert_eq!(value, "id-3");
    }

    #[test]
    fn test_stamp_payload() {
        assert_eq!(
            stamp_payload("id-9"),
            json!({"extattrs+": {"Terraform Internal ID": {"value": "id-9"}}})
        );
    }
}
