//! Declarative field tables
//!
//! A [`Field`] ties a Terraform attribute to its WAPI counterpart. Object
//! definitions are lists of fields, and the same list drives the schema,
//! request bodies ("expand"), state from responses ("flatten") and config
//! validation.

use crate::resources::options;
use crate::schema::{AttributeType, Diagnostic, SchemaAttribute};
use crate::validators::{as_integer, Validator};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Integer,
    Bool,
    StringList,
    StringMap,
    /// `["ref"]` in state, `[{"_ref": "ref"}]` on the wire
    RefList,
    Object(Vec<Field>),
    ObjectList(Vec<Field>),
    /// DHCP option list, reconciled against the configured order on read
    Options,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub api_name: &'static str,
    pub kind: FieldKind,
    pub attribute: SchemaAttribute,
    /// Computed only, never sent
    pub read_only: bool,
    /// Sent on create, left out of updates
    pub create_only: bool,
    /// Never returned by the WAPI, so never requested
    pub write_only: bool,
    /// Handled by the resource engine rather than the generic mapping
    pub managed: bool,
    /// `use_*` flag switched on whenever this field is sent
    pub use_flag: Option<&'static str>,
    /// `_struct` discriminator for nested WAPI structs
    pub struct_tag: Option<&'static str>,
    pub validators: Vec<Validator>,
}

impl Field {
    fn new(name: &'static str, kind: FieldKind, attribute: SchemaAttribute) -> Self {
        Self {
            name,
            api_name: name,
            kind,
            attribute,
            read_only: false,
            create_only: false,
            write_only: false,
            managed: false,
            use_flag: None,
            struct_tag: None,
            validators: Vec::new(),
        }
    }

    pub fn string(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::String,
            SchemaAttribute::string().with_description(description),
        )
    }

    pub fn integer(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::Integer,
            SchemaAttribute::number().with_description(description),
        )
    }

    pub fn bool(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::Bool,
            SchemaAttribute::bool().with_description(description),
        )
    }

    pub fn string_list(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::StringList,
            SchemaAttribute::list(AttributeType::String).with_description(description),
        )
    }

    pub fn string_map(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::StringMap,
            SchemaAttribute::map(AttributeType::String).with_description(description),
        )
    }

    pub fn ref_list(name: &'static str, description: &str) -> Self {
        Self::new(
            name,
            FieldKind::RefList,
            SchemaAttribute::list(AttributeType::String).with_description(description),
        )
    }

    pub fn object(name: &'static str, description: &str, fields: Vec<Field>) -> Self {
        let attribute = SchemaAttribute::object(object_type_map(&fields)).with_description(description);
        Self::new(name, FieldKind::Object(fields), attribute)
    }

    pub fn object_list(name: &'static str, description: &str, fields: Vec<Field>) -> Self {
        let attribute = SchemaAttribute::list(AttributeType::Object(object_type_map(&fields)))
            .with_description(description);
        Self::new(name, FieldKind::ObjectList(fields), attribute)
    }

    /// DHCP options, `options` on most objects
    pub fn options(name: &'static str, description: &str) -> Self {
        let attribute =
            SchemaAttribute::list(AttributeType::Object(object_type_map(&options::option_fields())))
                .with_description(description);
        Self::new(name, FieldKind::Options, attribute)
    }

    pub fn api(mut self, api_name: &'static str) -> Self {
        self.api_name = api_name;
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute = self.attribute.required();
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute = self.attribute.optional();
        self
    }

    /// Optional, with the server's value kept when unset
    pub fn optional_computed(mut self) -> Self {
        self.attribute = self.attribute.optional().computed();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.attribute.optional = false;
        self.attribute.required = false;
        self.attribute = self.attribute.computed();
        self.read_only = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.attribute = self.attribute.optional().computed().with_default(value);
        self
    }

    pub fn force_new(mut self) -> Self {
        self.attribute = self.attribute.force_new();
        self
    }

    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    pub fn managed(mut self) -> Self {
        self.managed = true;
        self
    }

    pub fn use_flag(mut self, flag: &'static str) -> Self {
        self.use_flag = Some(flag);
        self
    }

    pub fn tagged(mut self, struct_tag: &'static str) -> Self {
        self.struct_tag = Some(struct_tag);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Fields of nested objects, for object kinds
    fn nested(&self) -> Option<Vec<Field>> {
        match &self.kind {
            FieldKind::Object(fields) | FieldKind::ObjectList(fields) => Some(fields.clone()),
            FieldKind::Options => Some(options::option_fields()),
            _ => None,
        }
    }
}

pub fn object_type_map(fields: &[Field]) -> HashMap<String, AttributeType> {
    fields
        .iter()
        .map(|f| (f.name.to_string(), f.attribute.attr_type.clone()))
        .collect()
}

/// WAPI fields to ask for on every read
pub fn return_fields(fields: &[Field]) -> Vec<String> {
    fields
        .iter()
        .filter(|f| !f.managed && !f.write_only && f.api_name != "_ref")
        .map(|f| f.api_name.to_string())
        .collect()
}

// ============================================================================
// Expand: Terraform state -> request body
// ============================================================================

pub fn expand(fields: &[Field], state: &Map<String, Value>, op: Operation) -> Map<String, Value> {
    let mut body = Map::new();

    for field in fields {
        if field.read_only || field.managed {
            continue;
        }
        if field.create_only && op == Operation::Update {
            continue;
        }
        let Some(value) = state.get(field.name) else {
            continue;
        };

        if let Some(wire) = expand_value(field, value, op) {
            body.insert(field.api_name.to_string(), wire);

            if let Some(flag) = field.use_flag {
                let user_set = state.get(flag).is_some_and(|v| !v.is_null());
                if !user_set {
                    body.insert(flag.to_string(), Value::Bool(true));
                }
            }
        }
    }

    body
}

fn expand_value(field: &Field, value: &Value, op: Operation) -> Option<Value> {
    if value.is_null() {
        return None;
    }

    match &field.kind {
        FieldKind::Integer => Some(as_integer(value).map(Value::from).unwrap_or_else(|| value.clone())),
        FieldKind::String | FieldKind::Bool | FieldKind::StringList | FieldKind::StringMap => {
            Some(value.clone())
        }
        FieldKind::RefList => {
            let refs = value
                .as_array()?
                .iter()
                .filter_map(Value::as_str)
                .map(|r| serde_json::json!({ "_ref": r }))
                .collect();
            Some(Value::Array(refs))
        }
        FieldKind::Object(nested) => {
            let obj = value.as_object()?;
            Some(Value::Object(expand_nested(field, nested, obj, op)))
        }
        FieldKind::ObjectList(nested) => {
            let items = value
                .as_array()?
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| Value::Object(expand_nested(field, nested, obj, op)))
                .collect();
            Some(Value::Array(items))
        }
        FieldKind::Options => {
            let nested = options::option_fields();
            let items = value
                .as_array()?
                .iter()
                .filter_map(Value::as_object)
                .map(|obj| Value::Object(expand(&nested, obj, op)))
                .collect();
            Some(Value::Array(items))
        }
    }
}

fn expand_nested(field: &Field, nested: &[Field], obj: &Map<String, Value>, op: Operation) -> Map<String, Value> {
    let mut body = expand(nested, obj, op);
    if let Some(tag) = field.struct_tag {
        body.insert("_struct".to_string(), Value::String(tag.to_string()));
    }
    body
}

/// Update body: the planned values plus clearing values for attributes
/// that prior state had and the plan dropped
pub fn expand_update(
    fields: &[Field],
    planned: &Map<String, Value>,
    prior: &Map<String, Value>,
) -> Map<String, Value> {
    let mut body = expand(fields, planned, Operation::Update);
    let is_set = |state: &Map<String, Value>, name: &str| state.get(name).is_some_and(|v| !v.is_null());

    for field in fields {
        if field.read_only || field.managed || field.create_only {
            continue;
        }
        if is_set(planned, field.name) || !is_set(prior, field.name) {
            continue;
        }

        if let Some(cleared) = clearing_value(field) {
            body.insert(field.api_name.to_string(), cleared);
        }
        if let Some(flag) = field.use_flag {
            if !is_set(planned, flag) {
                body.insert(flag.to_string(), Value::Bool(false));
            }
        }
    }

    body
}

/// Wire value that resets a field on the WAPI side, if it has one
fn clearing_value(field: &Field) -> Option<Value> {
    if let Some(default) = &field.attribute.default {
        return Some(default.clone());
    }
    match field.kind {
        FieldKind::String => Some(Value::String(String::new())),
        FieldKind::StringList | FieldKind::RefList | FieldKind::ObjectList(_) | FieldKind::Options => {
            Some(Value::Array(Vec::new()))
        }
        FieldKind::StringMap => Some(Value::Object(Map::new())),
        FieldKind::Integer | FieldKind::Bool | FieldKind::Object(_) => None,
    }
}

// ============================================================================
// Flatten: response object -> Terraform state
// ============================================================================

pub fn flatten(
    fields: &[Field],
    object: &Map<String, Value>,
    prior: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    let mut state = Map::new();

    for field in fields {
        if field.managed {
            continue;
        }
        let prior_value = prior.and_then(|p| p.get(field.name)).filter(|v| !v.is_null());

        let value = match object.get(field.api_name) {
            Some(wire) => flatten_value(field, wire, prior_value),
            None => prior_value.cloned().unwrap_or(Value::Null),
        };
        state.insert(field.name.to_string(), value);
    }

    state
}

fn flatten_value(field: &Field, wire: &Value, prior: Option<&Value>) -> Value {
    if wire.is_null() {
        return Value::Null;
    }

    let flat = match &field.kind {
        FieldKind::String => match wire {
            Value::String(_) => wire.clone(),
            other => Value::String(other.to_string()),
        },
        FieldKind::Integer => as_integer(wire).map(Value::from).unwrap_or(Value::Null),
        FieldKind::Bool => wire.as_bool().map(Value::Bool).unwrap_or(Value::Null),
        FieldKind::StringList => match wire.as_array() {
            Some(items) => Value::Array(items.iter().map(|v| Value::String(render(v))).collect()),
            None => Value::Null,
        },
        FieldKind::StringMap => match wire.as_object() {
            Some(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(render(v))))
                    .collect(),
            ),
            None => Value::Null,
        },
        FieldKind::RefList => match wire.as_array() {
            Some(items) => Value::Array(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(r) => Some(Value::String(r.clone())),
                        Value::Object(obj) => obj.get("_ref").cloned(),
                        _ => None,
                    })
                    .collect(),
            ),
            None => Value::Null,
        },
        FieldKind::Object(nested) => match wire.as_object() {
            Some(obj) => {
                let prior_obj = prior.and_then(Value::as_object);
                Value::Object(flatten(nested, obj, prior_obj))
            }
            None => Value::Null,
        },
        FieldKind::ObjectList(nested) => match wire.as_array() {
            Some(items) => {
                let prior_items = prior.and_then(Value::as_array);
                Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .filter_map(|(i, item)| {
                            let prior_item = prior_items.and_then(|p| p.get(i)).and_then(Value::as_object);
                            item.as_object()
                                .map(|obj| Value::Object(flatten(nested, obj, prior_item)))
                        })
                        .collect(),
                )
            }
            None => Value::Null,
        },
        FieldKind::Options => {
            let nested = options::option_fields();
            let ordered = options::reconcile(prior, wire);
            Value::Array(
                ordered
                    .iter()
                    .map(|obj| Value::Object(flatten(&nested, obj, None)))
                    .collect(),
            )
        }
    };

    // An empty collection the user never configured stays null
    let empty = match &flat {
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty() && !matches!(field.kind, FieldKind::Object(_)),
        _ => false,
    };
    if empty && prior.is_none() {
        return Value::Null;
    }
    flat
}

/// String rendering used for string-typed state values
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

// ============================================================================
// Validation
// ============================================================================

pub fn validate(fields: &[Field], config: &Map<String, Value>, path: &[String]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for field in fields {
        let value = config.get(field.name).unwrap_or(&Value::Null);
        let mut field_path = path.to_vec();
        field_path.push(field.name.to_string());

        if value.is_null() {
            if field.attribute.required {
                diagnostics.push(
                    Diagnostic::error("Missing required argument")
                        .with_detail(&format!("The argument {:?} is required.", field.name))
                        .with_attribute(field_path),
                );
            }
            continue;
        }

        if field.read_only {
            diagnostics.push(
                Diagnostic::error("Invalid configuration")
                    .with_detail(&format!("{:?} is computed and cannot be set.", field.name))
                    .with_attribute(field_path),
            );
            continue;
        }

        for validator in &field.validators {
            if let Err(detail) = validator.check(value) {
                diagnostics.push(Diagnostic::invalid_attribute(field_path.clone(), &detail));
            }
        }

        let Some(nested) = field.nested() else {
            continue;
        };

        match value {
            Value::Object(obj) => diagnostics.extend(validate(&nested, obj, &field_path)),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let mut item_path = field_path.clone();
                    item_path.push(i.to_string());
                    if let Some(obj) = item.as_object() {
                        diagnostics.extend(validate(&nested, obj, &item_path));
                        if matches!(field.kind, FieldKind::Options) {
                            diagnostics.extend(options::validate_option(obj, &item_path));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    diagnostics
}
