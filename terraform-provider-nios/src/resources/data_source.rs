//! Data sources
//!
//! Each object type is also searchable. Filters go to the WAPI as plain
//! search parameters, EA filters as `*Name=value`.

use crate::client::{SearchRequest, WapiClient, DEFAULT_PAGE_SIZE};
use crate::resources::fields::{self, Field};
use crate::resources::{func_call, ObjectDefinition, ResourceResult, ResourceState};
use crate::schema::{AttributeType, Diagnostic, ResourceSchema, SchemaAttribute, SchemaBlock};
use crate::validators::Validator;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const RESULT_FIELD: &str = "result";

#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &str;

    fn schema(&self) -> ResourceSchema;

    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Search and return the config with `result` filled in
    async fn read(&self, client: &WapiClient, config: &ResourceState) -> ResourceResult<ResourceState>;
}

fn input_fields() -> Vec<Field> {
    vec![
        Field::string_map(
            "filters",
            "Filters are used to return a more specific list of results, e.g. by name.",
        )
        .optional(),
        Field::string_map(
            "extattrfilters",
            "Extensible attribute filters are used to return a more specific list of results.",
        )
        .optional(),
        Field::integer("paging", "Enable (1) or disable (0) paging for the query.")
            .default(json!(0))
            .validate(Validator::IntRange(0, 1)),
        Field::integer("page_size", "Number of results to return per page.")
            .default(json!(DEFAULT_PAGE_SIZE))
            .validate(Validator::IntRange(1, 10000)),
        Field::integer("max_results", "Maximum number of objects to return.")
            .optional()
            .validate(Validator::IntRange(1, i64::from(u32::MAX))),
    ]
}

pub struct WapiDataSource {
    def: Arc<ObjectDefinition>,
}

impl WapiDataSource {
    pub fn new(def: Arc<ObjectDefinition>) -> Self {
        Self { def }
    }

    fn result_type(&self) -> HashMap<String, AttributeType> {
        let visible: Vec<Field> = self
            .def
            .fields
            .iter()
            .filter(|f| f.name != func_call::FIELD_NAME)
            .cloned()
            .collect();
        fields::object_type_map(&visible)
    }

    fn search_request(&self, config: &ResourceState) -> SearchRequest {
        let mut params: Vec<(String, String)> = Vec::new();

        if let Some(filters) = config.get("filters").and_then(Value::as_object) {
            for (key, value) in filters {
                params.push((key.clone(), fields::render(value)));
            }
        }
        if let Some(filters) = config.get("extattrfilters").and_then(Value::as_object) {
            for (key, value) in filters {
                params.push((format!("*{}", key), fields::render(value)));
            }
        }

        let page_size = config
            .get_i64("page_size")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);

        SearchRequest {
            params,
            return_fields: self.def.return_fields(),
            page_size,
            single_page: config.get_i64("paging").unwrap_or(0) != 1,
            max_results: config
                .get_i64("max_results")
                .and_then(|n| usize::try_from(n).ok()),
        }
    }
}

#[async_trait]
impl DataSource for WapiDataSource {
    fn type_name(&self) -> &str {
        self.def.type_name
    }

    fn schema(&self) -> ResourceSchema {
        let block = input_fields()
            .into_iter()
            .fold(SchemaBlock::new(), |block, field| {
                block.with_attribute(field.name, field.attribute)
            })
            .with_attribute(
                RESULT_FIELD,
                SchemaAttribute::list(AttributeType::Object(self.result_type()))
                    .with_description("Objects matching the filters.")
                    .computed(),
            )
            .with_description(&format!("Retrieves information about existing {} objects.", self.def.wapi_type));

        ResourceSchema::new(0, block)
    }

    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        fields::validate(&input_fields(), &config.to_object(), &[])
    }

    async fn read(&self, client: &WapiClient, config: &ResourceState) -> ResourceResult<ResourceState> {
        let request = self.search_request(config);
        debug!(
            "Searching {} with {} parameters",
            self.def.wapi_type,
            request.params.len()
        );

        let found = client
            .search(self.def.wapi_type, &request)
            .await
            .map_err(|e| {
                vec![Diagnostic::error(&format!("Failed to read {}", self.def.type_name))
                    .with_detail(&e.to_string())]
            })?;

        let items: Vec<Value> = found
            .iter()
            .filter_map(Value::as_object)
            .map(|object| {
                let mut item = self.def.flatten(object, None);
                item.remove(func_call::FIELD_NAME);
                Value::Object(item)
            })
            .collect();

        let mut state = config.clone();
        for field in input_fields() {
            if state.get(field.name).is_none() {
                if let Some(default) = field.attribute.default {
                    state.set(field.name, default);
                }
            }
        }
        state.set(RESULT_FIELD, Value::Array(items));
        Ok(state)
    }
}
