//! Terraform Resources for NIOS
//!
//! Every object type is an [`ObjectDefinition`] (a field table plus a few
//! behaviour switches) served by the one generic [`WapiResource`].

pub mod data_source;
pub mod dhcp;
pub mod extattrs;
pub mod fields;
pub mod func_call;
pub mod ipam;
pub mod options;

use crate::client::{SearchRequest, WapiClient, WapiError};
use crate::schema::{Diagnostic, ResourceSchema, SchemaBlock};
use async_trait::async_trait;
use data_source::{DataSource, WapiDataSource};
use fields::{Field, FieldKind, Operation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, Vec<Diagnostic>>;

/// Resource state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub values: HashMap<String, Value>,
}

impl ResourceState {
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            values: object.into_iter().collect(),
        }
    }

    pub fn to_object(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str()).map(String::from)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(crate::validators::as_integer)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}

/// Outcome of planning
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub state: ResourceState,
    /// Attribute paths whose change forces a new object
    pub requires_replace: Vec<Vec<String>>,
}

/// Resource trait
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource type name
    fn type_name(&self) -> &str;

    /// Get the schema for this resource
    fn schema(&self) -> ResourceSchema;

    /// Check a configuration without contacting NIOS
    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Create a new resource
    async fn create(&self, client: &WapiClient, planned: &ResourceState) -> ResourceResult<ResourceState>;

    /// Read an existing resource; `None` once it is gone
    async fn read(
        &self,
        client: &WapiClient,
        current: &ResourceState,
    ) -> ResourceResult<Option<ResourceState>>;

    /// Update an existing resource
    async fn update(
        &self,
        client: &WapiClient,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState>;

    /// Delete a resource
    async fn delete(&self, client: &WapiClient, current: &ResourceState) -> ResourceResult<()>;

    /// Import an existing object by reference
    async fn import(&self, client: &WapiClient, id: &str) -> ResourceResult<ResourceState>;

    /// Plan changes
    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<PlannedChange> {
        let _ = current;
        Ok(PlannedChange {
            state: proposed.clone(),
            requires_replace: Vec::new(),
        })
    }
}

// ============================================================================
// Object definitions
// ============================================================================

pub const REF_FIELD: &str = "ref";
pub const EXTATTRS_FIELD: &str = "extattrs";
pub const EXTATTRS_ALL_FIELD: &str = "extattrs_all";

/// One WAPI object type and how it maps onto Terraform
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub type_name: &'static str,
    pub wapi_type: &'static str,
    pub description: &'static str,
    pub fields: Vec<Field>,
    pub extattrs: bool,
    pub func_targets: &'static [&'static str],
    pub delete_retry: bool,
}

impl ObjectDefinition {
    pub fn new(type_name: &'static str, wapi_type: &'static str, description: &'static str) -> Self {
        Self {
            type_name,
            wapi_type,
            description,
            fields: vec![Field::string(REF_FIELD, "The reference to the object.")
                .api("_ref")
                .read_only()],
            extattrs: false,
            func_targets: &[],
            delete_retry: false,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn with_extattrs(mut self) -> Self {
        self.extattrs = true;
        self.field(
            Field::string_map(EXTATTRS_FIELD, "Extensible attributes managed for the object.")
                .optional()
                .managed(),
        )
        .field(
            Field::string_map(
                EXTATTRS_ALL_FIELD,
                "Extensible attributes of the object, including inherited ones.",
            )
            .read_only()
            .managed(),
        )
    }

    pub fn with_func_call(mut self, targets: &'static [&'static str]) -> Self {
        self.func_targets = targets;
        self.field(func_call::field())
    }

    /// Retry deletes the WAPI rejects while the object is still referenced
    pub fn with_delete_retry(mut self) -> Self {
        self.delete_retry = true;
        self
    }

    pub fn schema(&self) -> ResourceSchema {
        let block = self
            .fields
            .iter()
            .fold(SchemaBlock::new(), |block, field| {
                block.with_attribute(field.name, field.attribute.clone())
            })
            .with_description(self.description);

        ResourceSchema::new(0, block)
    }

    pub fn return_fields(&self) -> Vec<String> {
        let mut names = fields::return_fields(&self.fields);
        if self.extattrs {
            names.push(EXTATTRS_FIELD.to_string());
        }
        names
    }

    fn field_named(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Response object to state, `prior` being the planned or previous state
    pub fn flatten(&self, object: &Map<String, Value>, prior: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut state = fields::flatten(&self.fields, object, prior);

        if self.extattrs {
            let prior_user = prior
                .and_then(|p| p.get(EXTATTRS_FIELD))
                .and_then(Value::as_object);
            let eas = extattrs::reconcile(object.get(EXTATTRS_FIELD), prior_user);
            state.insert(EXTATTRS_FIELD.to_string(), eas.extattrs);
            state.insert(EXTATTRS_ALL_FIELD.to_string(), eas.extattrs_all);
        }

        if !self.func_targets.is_empty() {
            let kept = prior
                .and_then(|p| p.get(func_call::FIELD_NAME))
                .cloned()
                .unwrap_or(Value::Null);
            state.insert(func_call::FIELD_NAME.to_string(), kept);
        }

        state
    }
}

// ============================================================================
// Generic resource
// ============================================================================

pub struct WapiResource {
    def: Arc<ObjectDefinition>,
}

impl WapiResource {
    pub fn new(def: Arc<ObjectDefinition>) -> Self {
        Self { def }
    }

    fn reference(&self, state: &ResourceState) -> ResourceResult<String> {
        state.get_string(REF_FIELD).ok_or_else(|| {
            vec![Diagnostic::error(&format!(
                "{} has no reference in state",
                self.def.type_name
            ))]
        })
    }

    fn wapi_error(&self, action: &str, err: WapiError) -> Vec<Diagnostic> {
        vec![Diagnostic::error(&format!("Failed to {} {}", action, self.def.type_name))
            .with_detail(&err.to_string())]
    }

    /// Search by the internal ID EA after a reference went stale
    async fn locate(
        &self,
        client: &WapiClient,
        prior: &Map<String, Value>,
    ) -> ResourceResult<Option<Map<String, Value>>> {
        if !self.def.extattrs {
            return Ok(None);
        }
        let Some(internal_id) = extattrs::internal_id(prior.get(EXTATTRS_ALL_FIELD)) else {
            return Ok(None);
        };

        warn!(
            "{} reference is stale, searching by internal ID {}",
            self.def.type_name, internal_id
        );

        let request = SearchRequest {
            params: vec![extattrs::search_param(&internal_id)],
            return_fields: self.def.return_fields(),
            single_page: true,
            ..Default::default()
        };
        let mut found = client
            .search(self.def.wapi_type, &request)
            .await
            .map_err(|e| self.wapi_error("search", e))?;

        match found.len() {
            0 => Ok(None),
            1 => match found.remove(0) {
                Value::Object(object) => Ok(Some(object)),
                other => Err(vec![Diagnostic::error(&format!(
                    "Unexpected search result for {}",
                    self.def.type_name
                ))
                .with_detail(&other.to_string())]),
            },
            n => Err(vec![Diagnostic::error(&format!(
                "Multiple {} objects carry internal ID {}",
                self.def.type_name, internal_id
            ))
            .with_detail(&format!(
                "Expected exactly one object, found {}. Remove the duplicated {:?} extensible attribute.",
                n,
                extattrs::INTERNAL_ID_EA
            ))]),
        }
    }

    fn create_body(&self, planned: &Map<String, Value>) -> ResourceResult<Map<String, Value>> {
        let mut body = fields::expand(&self.def.fields, planned, Operation::Create);

        if self.def.extattrs {
            let user = planned
                .get(EXTATTRS_FIELD)
                .and_then(Value::as_object)
                .map(extattrs::expand)
                .unwrap_or_default();
            let eas = extattrs::with_internal_id(user, &extattrs::new_internal_id());
            body.insert(EXTATTRS_FIELD.to_string(), Value::Object(eas));
        }

        if let Some(fc) = planned.get(func_call::FIELD_NAME).and_then(Value::as_object) {
            let (attribute, call) = func_call::expand(fc)
                .map_err(|e| vec![Diagnostic::error("Invalid func_call").with_detail(&e)])?;
            let api_name = self
                .def
                .field_named(&attribute)
                .map_or(attribute.as_str(), |f| f.api_name);
            body.insert(api_name.to_string(), call);
        }

        Ok(body)
    }

    fn update_body(&self, planned: &Map<String, Value>, prior: &Map<String, Value>) -> Map<String, Value> {
        let mut body = fields::expand_update(&self.def.fields, planned, prior);

        if self.def.extattrs {
            let eas = extattrs::update_payload(
                planned.get(EXTATTRS_FIELD).and_then(Value::as_object),
                prior.get(EXTATTRS_ALL_FIELD),
            );
            body.insert(EXTATTRS_FIELD.to_string(), Value::Object(eas));
        }

        body
    }
}

#[async_trait]
impl Resource for WapiResource {
    fn type_name(&self) -> &str {
        self.def.type_name
    }

    fn schema(&self) -> ResourceSchema {
        self.def.schema()
    }

    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        let config = config.to_object();
        let mut diagnostics = fields::validate(&self.def.fields, &config, &[]);

        if self.def.func_targets.is_empty() {
            return diagnostics;
        }

        match config.get(func_call::FIELD_NAME).and_then(Value::as_object) {
            Some(fc) => diagnostics.extend(func_call::validate(fc, self.def.func_targets, &config)),
            None => {
                let any_target = self
                    .def
                    .func_targets
                    .iter()
                    .any(|t| config.get(*t).is_some_and(|v| !v.is_null()));
                if !any_target {
                    diagnostics.push(
                        Diagnostic::error("Missing required argument")
                            .with_detail(&format!(
                                "One of {} or func_call must be set.",
                                self.def.func_targets.join(", ")
                            ))
                            .with_attribute(vec![self.def.func_targets[0].to_string()]),
                    );
                }
            }
        }

        diagnostics
    }

    async fn create(&self, client: &WapiClient, planned: &ResourceState) -> ResourceResult<ResourceState> {
        let planned = planned.to_object();
        let body = self.create_body(&planned)?;
        info!("Creating {}", self.def.type_name);

        let object = client
            .create(self.def.wapi_type, &Value::Object(body), &self.def.return_fields())
            .await
            .map_err(|e| self.wapi_error("create", e))?;

        Ok(ResourceState::from_object(self.def.flatten(&object, Some(&planned))))
    }

    async fn read(
        &self,
        client: &WapiClient,
        current: &ResourceState,
    ) -> ResourceResult<Option<ResourceState>> {
        let reference = self.reference(current)?;
        let prior = current.to_object();
        debug!("Reading {} {}", self.def.type_name, reference);

        let object = match client.get(&reference, &self.def.return_fields()).await {
            Ok(object) => Some(object),
            Err(e) if e.is_not_found() => self.locate(client, &prior).await?,
            Err(e) => return Err(self.wapi_error("read", e)),
        };

        match object {
            Some(object) => Ok(Some(ResourceState::from_object(
                self.def.flatten(&object, Some(&prior)),
            ))),
            None => {
                warn!(
                    "{} {} no longer exists, removing it from state",
                    self.def.type_name, reference
                );
                Ok(None)
            }
        }
    }

    async fn update(
        &self,
        client: &WapiClient,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        let reference = self.reference(current)?;
        let prior = current.to_object();
        let planned = planned.to_object();
        let body = Value::Object(self.update_body(&planned, &prior));
        let return_fields = self.def.return_fields();
        info!("Updating {} {}", self.def.type_name, reference);

        let object = match client.update(&reference, &body, &return_fields).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                let moved = self
                    .locate(client, &prior)
                    .await?
                    .and_then(|found| found.get("_ref").and_then(Value::as_str).map(String::from))
                    .ok_or_else(|| {
                        vec![Diagnostic::error(&format!(
                            "{} {} no longer exists",
                            self.def.type_name, reference
                        ))]
                    })?;
                warn!("Retrying update of {} at {}", self.def.type_name, moved);
                client
                    .update(&moved, &body, &return_fields)
                    .await
                    .map_err(|e| self.wapi_error("update", e))?
            }
            Err(e) => return Err(self.wapi_error("update", e)),
        };

        Ok(ResourceState::from_object(self.def.flatten(&object, Some(&planned))))
    }

    async fn delete(&self, client: &WapiClient, current: &ResourceState) -> ResourceResult<()> {
        let reference = self.reference(current)?;
        let policy = client.delete_retry();
        let attempts = if self.def.delete_retry {
            policy.attempts.max(1)
        } else {
            1
        };
        info!("Deleting {} {}", self.def.type_name, reference);

        let mut attempt = 1;
        loop {
            match client.delete(&reference).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_not_found() => {
                    debug!("{} {} already deleted", self.def.type_name, reference);
                    return Ok(());
                }
                Err(e) if e.is_conflict() && attempt < attempts => {
                    warn!(
                        "{} {} is still in use (attempt {}/{}): {}",
                        self.def.type_name, reference, attempt, attempts, e
                    );
                    tokio::time::sleep(policy.interval).await;
                    attempt += 1;
                }
                Err(e) => return Err(self.wapi_error("delete", e)),
            }
        }
    }

    async fn import(&self, client: &WapiClient, id: &str) -> ResourceResult<ResourceState> {
        let return_fields = self.def.return_fields();
        info!("Importing {} {}", self.def.type_name, id);

        let mut object = client.get(id, &return_fields).await.map_err(|e| {
            if e.is_not_found() {
                vec![Diagnostic::error(&format!(
                    "Cannot import non-existent {} {}",
                    self.def.type_name, id
                ))]
            } else {
                self.wapi_error("import", e)
            }
        })?;

        if self.def.extattrs && extattrs::internal_id(object.get(EXTATTRS_FIELD)).is_none() {
            let internal_id = extattrs::new_internal_id();
            debug!("Stamping {} with internal ID {}", id, internal_id);
            object = client
                .update(id, &extattrs::stamp_payload(&internal_id), &return_fields)
                .await
                .map_err(|e| self.wapi_error("import", e))?;
        }

        Ok(ResourceState::from_object(self.def.flatten(&object, None)))
    }

    fn plan_change(
        &self,
        current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<PlannedChange> {
        let prior = current.map(ResourceState::to_object);
        let prior_value = |name: &str| -> Option<Value> {
            prior
                .as_ref()
                .and_then(|p| p.get(name))
                .filter(|v| !v.is_null())
                .cloned()
        };
        let mut planned = proposed.to_object();

        for field in &self.def.fields {
            let unset = planned.get(field.name).map_or(true, Value::is_null);
            if unset {
                let fill = field
                    .attribute
                    .default
                    .clone()
                    .or_else(|| field.attribute.computed.then(|| prior_value(field.name)).flatten());
                if let Some(value) = fill {
                    planned.insert(field.name.to_string(), value);
                }
            } else if matches!(field.kind, FieldKind::Options) {
                let prior_options = prior_value(field.name);
                let filled = options::fill_from_prior(&planned[field.name], prior_options.as_ref());
                planned.insert(field.name.to_string(), filled);
            }
        }

        let mut requires_replace = Vec::new();
        if let Some(prior) = &prior {
            // A removed inheritable value falls back to the inherited one
            for field in &self.def.fields {
                let Some(flag) = field.use_flag else {
                    continue;
                };
                if proposed.get(field.name).is_none()
                    && proposed.get(flag).is_none()
                    && prior_value(field.name).is_some()
                {
                    planned.insert(flag.to_string(), Value::Bool(false));
                }
            }

            let differs = |name: &str| {
                planned.get(name).unwrap_or(&Value::Null) != prior.get(name).unwrap_or(&Value::Null)
            };

            requires_replace = self
                .def
                .fields
                .iter()
                .filter(|f| f.attribute.force_new && differs(f.name))
                .map(|f| vec![f.name.to_string()])
                .collect();

            // The function only runs on create
            let func_call_changed = proposed.get(func_call::FIELD_NAME).is_some()
                && prior_value(func_call::FIELD_NAME).is_some()
                && differs(func_call::FIELD_NAME);
            if func_call_changed {
                requires_replace.push(vec![func_call::FIELD_NAME.to_string()]);
            }

            if self.def.extattrs && differs(EXTATTRS_FIELD) {
                planned.insert(EXTATTRS_ALL_FIELD.to_string(), Value::Null);
            }
        }

        Ok(PlannedChange {
            state: ResourceState::from_object(planned),
            requires_replace,
        })
    }
}

/// Every supported object type
pub fn definitions() -> Vec<Arc<ObjectDefinition>> {
    dhcp::definitions()
        .into_iter()
        .chain(ipam::definitions())
        .map(Arc::new)
        .collect()
}

/// Get all available resources
pub fn get_all_resources() -> Vec<Box<dyn Resource>> {
    definitions()
        .into_iter()
        .map(|def| Box::new(WapiResource::new(def)) as Box<dyn Resource>)
        .collect()
}

/// Get all available data sources
pub fn get_all_data_sources() -> Vec<Box<dyn DataSource>> {
    definitions()
        .into_iter()
        .map(|def| Box::new(WapiDataSource::new(def)) as Box<dyn DataSource>)
        .collect()
}
