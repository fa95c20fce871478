//! Terraform Provider Implementation
//!
//! Implements the Terraform Plugin Protocol for Infoblox NIOS.

use crate::client::WapiClient;
use crate::config::{
    ProviderConfig, DEFAULT_DELETE_RETRIES, DEFAULT_DELETE_RETRY_INTERVAL_SECS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_WAPI_VERSION,
};
use crate::resources::data_source::DataSource;
use crate::resources::{get_all_data_sources, get_all_resources, Resource, ResourceState};
use crate::schema::{Diagnostic, ProviderSchema, RpcRequest, RpcResponse, SchemaAttribute, SchemaBlock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// NIOS Terraform Provider
pub struct NiosProvider {
    client: Arc<RwLock<Option<WapiClient>>>,
    resources: HashMap<String, Box<dyn Resource>>,
    data_sources: HashMap<String, Box<dyn DataSource>>,
    runtime: Runtime,
}

/// Object state from a request parameter; `null` means no object
fn state_from_param(params: &Value, key: &str) -> Option<ResourceState> {
    params
        .get(key)
        .and_then(Value::as_object)
        .map(|obj| ResourceState::from_object(obj.clone()))
}

fn type_name(params: &Value) -> &str {
    params.get("type_name").and_then(Value::as_str).unwrap_or("")
}

fn unknown_type(id: i64, kind: &str, type_name: &str) -> RpcResponse {
    RpcResponse::diagnostics(
        id,
        &[Diagnostic::error(&format!("Unknown {} type: {}", kind, type_name))],
    )
}

impl NiosProvider {
    /// Create a new provider
    pub fn new() -> std::io::Result<Self> {
        let resources: HashMap<String, Box<dyn Resource>> = get_all_resources()
            .into_iter()
            .map(|r| (r.type_name().to_string(), r))
            .collect();

        let data_sources: HashMap<String, Box<dyn DataSource>> = get_all_data_sources()
            .into_iter()
            .map(|d| (d.type_name().to_string(), d))
            .collect();

        Ok(Self {
            client: Arc::new(RwLock::new(None)),
            resources,
            data_sources,
            runtime: Runtime::new()?,
        })
    }

    /// Get provider schema
    fn get_schema(&self) -> ProviderSchema {
        let provider_block = SchemaBlock::new()
            .with_attribute(
                "nios_host_url",
                SchemaAttribute::string()
                    .with_description("NIOS Grid Master URL, e.g. https://gm.example.com. Falls back to NIOS_HOST_URL.")
                    .optional(),
            )
            .with_attribute(
                "nios_username",
                SchemaAttribute::string()
                    .with_description("NIOS API username. Falls back to NIOS_USERNAME.")
                    .optional(),
            )
            .with_attribute(
                "nios_password",
                SchemaAttribute::string()
                    .with_description("NIOS API password. Falls back to NIOS_PASSWORD.")
                    .optional()
                    .sensitive(),
            )
            .with_attribute(
                "wapi_version",
                SchemaAttribute::string()
                    .with_description("WAPI version. Falls back to NIOS_WAPI_VERSION.")
                    .optional()
                    .with_default(json!(DEFAULT_WAPI_VERSION)),
            )
            .with_attribute(
                "insecure",
                SchemaAttribute::bool()
                    .with_description("Skip TLS verification. Falls back to NIOS_INSECURE.")
                    .optional()
                    .with_default(json!(false)),
            )
            .with_attribute(
                "timeout",
                SchemaAttribute::number()
                    .with_description("Request timeout in seconds. Falls back to NIOS_TIMEOUT.")
                    .optional()
                    .with_default(json!(DEFAULT_TIMEOUT_SECS)),
            )
            .with_attribute(
                "delete_retries",
                SchemaAttribute::number()
                    .with_description("Attempts for deletes rejected while the object is still in use.")
                    .optional()
                    .with_default(json!(DEFAULT_DELETE_RETRIES)),
            )
            .with_attribute(
                "delete_retry_interval",
                SchemaAttribute::number()
                    .with_description("Seconds between delete attempts.")
                    .optional()
                    .with_default(json!(DEFAULT_DELETE_RETRY_INTERVAL_SECS)),
            )
            .with_description("Infoblox NIOS DHCP and IPAM provider");

        let mut schema = ProviderSchema::new(provider_block);

        for (name, resource) in &self.resources {
            schema = schema.with_resource(name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(name, data_source.schema());
        }

        schema
    }

    fn parse_config(params: &Value) -> Result<ProviderConfig, Diagnostic> {
        match params.get("config") {
            None | Some(Value::Null) => Ok(ProviderConfig::default()),
            Some(config) => serde_json::from_value(config.clone()).map_err(|e| {
                Diagnostic::error("Invalid provider configuration").with_detail(&e.to_string())
            }),
        }
    }

    /// Configure the provider
    fn configure(&self, config: ProviderConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let resolved = match config.resolve() {
            Ok(resolved) => resolved,
            Err(e) => return vec![e.into()],
        };

        let client = match WapiClient::new(&resolved) {
            Ok(client) => client,
            Err(e) => {
                return vec![Diagnostic::error("Failed to create WAPI client").with_detail(&e.to_string())];
            }
        };

        // Connectivity and credentials check
        match self.runtime.block_on(client.schema()) {
            Ok(info) => {
                info!(
                    "Connected to {} (WAPI {})",
                    client.base_url(),
                    info.requested_version.as_deref().unwrap_or(&resolved.wapi_version)
                );
                if !info.supported_versions.is_empty()
                    && !info.supported_versions.contains(&resolved.wapi_version)
                {
                    warn!(
                        "WAPI version {} not in supported list {:?}",
                        resolved.wapi_version, info.supported_versions
                    );
                    diagnostics.push(
                        Diagnostic::warning("Unsupported WAPI version")
                            .with_detail(&format!(
                                "The Grid Master does not list WAPI version {} as supported.",
                                resolved.wapi_version
                            ))
                            .with_attribute(vec!["wapi_version".to_string()]),
                    );
                }
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Unable to connect to NIOS")
                        .with_detail(&format!("{}: {}", client.base_url(), e)),
                );
                return diagnostics;
            }
        }

        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Some(client);

        diagnostics
    }

    /// Get the configured client
    fn get_client(&self) -> Result<WapiClient, Diagnostic> {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Diagnostic::error("Provider not configured"))
    }

    /// Handle an RPC request
    pub fn handle_request(&self, input: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => {
                return serde_json::to_string(&RpcResponse::error(
                    0,
                    -32700,
                    &format!("Parse error: {}", e),
                ))
                .unwrap_or_default();
            }
        };

        debug!("Handling {}", request.method);

        if request.jsonrpc != "2.0" {
            return serde_json::to_string(&RpcResponse::error(
                request.id,
                -32600,
                &format!("Invalid Request: unsupported jsonrpc version {:?}", request.jsonrpc),
            ))
            .unwrap_or_default();
        }

        let response = match request.method.as_str() {
            "GetProviderSchema" => self.handle_get_schema(request.id),
            "ValidateProviderConfig" => self.handle_validate_provider(request.id, &request.params),
            "ConfigureProvider" => self.handle_configure(request.id, &request.params),
            "ValidateResourceConfig" => self.handle_validate_resource(request.id, &request.params),
            "ValidateDataResourceConfig" => {
                self.handle_validate_data_source(request.id, &request.params)
            }
            "PlanResourceChange" => self.handle_plan_resource(request.id, &request.params),
            "ApplyResourceChange" => self.handle_apply_resource(request.id, &request.params),
            "ReadResource" => self.handle_read_resource(request.id, &request.params),
            "ImportResourceState" => self.handle_import_resource(request.id, &request.params),
            "ReadDataSource" => self.handle_read_data_source(request.id, &request.params),
            "StopProvider" => RpcResponse::success(request.id, json!({})),
            _ => RpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            serde_json::to_string(&RpcResponse::error(
                request.id,
                -32603,
                &format!("Serialization error: {}", e),
            ))
            .unwrap_or_default()
        })
    }

    /// Handle GetProviderSchema
    fn handle_get_schema(&self, id: i64) -> RpcResponse {
        match serde_json::to_value(self.get_schema()) {
            Ok(schema) => RpcResponse::success(id, schema),
            Err(e) => RpcResponse::error(id, -32603, &format!("Serialization error: {}", e)),
        }
    }

    /// Handle ValidateProviderConfig
    fn handle_validate_provider(&self, id: i64, params: &Value) -> RpcResponse {
        let diagnostics = match Self::parse_config(params) {
            Ok(config) => match config.resolve() {
                Ok(_) => Vec::new(),
                Err(e) => vec![e.into()],
            },
            Err(diag) => vec![diag],
        };

        RpcResponse::diagnostics(id, &diagnostics)
    }

    /// Handle ConfigureProvider
    fn handle_configure(&self, id: i64, params: &Value) -> RpcResponse {
        let diagnostics = match Self::parse_config(params) {
            Ok(config) => self.configure(config),
            Err(diag) => vec![diag],
        };

        if diagnostics.iter().any(Diagnostic::is_error) {
            warn!("Provider configuration failed");
        }

        RpcResponse::diagnostics(id, &diagnostics)
    }

    /// Handle ValidateResourceConfig
    fn handle_validate_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type(id, "resource", type_name);
        };

        let config = state_from_param(params, "config").unwrap_or_default();
        RpcResponse::diagnostics(id, &resource.validate(&config))
    }

    /// Handle ValidateDataResourceConfig
    fn handle_validate_data_source(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(data_source) = self.data_sources.get(type_name) else {
            return unknown_type(id, "data source", type_name);
        };

        let config = state_from_param(params, "config").unwrap_or_default();
        RpcResponse::diagnostics(id, &data_source.validate(&config))
    }

    /// Handle PlanResourceChange
    fn handle_plan_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type(id, "resource", type_name);
        };

        let prior_state = state_from_param(params, "prior_state");

        // Destroy plans carry no proposed state
        let Some(proposed_state) = state_from_param(params, "proposed_new_state") else {
            return RpcResponse::success(
                id,
                json!({
                    "planned_state": null,
                    "requires_replace": [],
                    "diagnostics": []
                }),
            );
        };

        match resource.plan_change(prior_state.as_ref(), &proposed_state) {
            Ok(planned) => RpcResponse::success(
                id,
                json!({
                    "planned_state": planned.state.values,
                    "requires_replace": planned.requires_replace,
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, &diagnostics),
        }
    }

    /// Handle ApplyResourceChange
    fn handle_apply_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type(id, "resource", type_name);
        };

        let client = match self.get_client() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, &[diag]),
        };

        let planned_state = state_from_param(params, "planned_state");
        let prior_state = state_from_param(params, "prior_state");

        let result = self.runtime.block_on(async {
            match (prior_state, planned_state) {
                (Some(prior), None) => resource.delete(&client, &prior).await.map(|_| None),
                (None, Some(planned)) => resource.create(&client, &planned).await.map(Some),
                (Some(prior), Some(planned)) => {
                    resource.update(&client, &prior, &planned).await.map(Some)
                }
                (None, None) => Ok(None),
            }
        });

        match result {
            Ok(new_state) => RpcResponse::success(
                id,
                json!({
                    "new_state": new_state.map(|s| s.values),
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, &diagnostics),
        }
    }

    /// Handle ReadResource
    fn handle_read_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type(id, "resource", type_name);
        };

        let client = match self.get_client() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, &[diag]),
        };

        let current_state = state_from_param(params, "current_state").unwrap_or_default();

        let result = self
            .runtime
            .block_on(async { resource.read(&client, &current_state).await });

        match result {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "new_state": state.map(|s| s.values),
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, &diagnostics),
        }
    }

    /// Handle ImportResourceState
    fn handle_import_resource(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(resource) = self.resources.get(type_name) else {
            return unknown_type(id, "resource", type_name);
        };

        let resource_id = params.get("id").and_then(Value::as_str).unwrap_or("");
        if resource_id.is_empty() {
            return RpcResponse::diagnostics(
                id,
                &[Diagnostic::error("Import requires the object reference as the ID")],
            );
        }

        let client = match self.get_client() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, &[diag]),
        };

        let result = self
            .runtime
            .block_on(async { resource.import(&client, resource_id).await });

        match result {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "imported_resources": [{
                        "type_name": type_name,
                        "state": state.values
                    }],
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, &diagnostics),
        }
    }

    /// Handle ReadDataSource
    fn handle_read_data_source(&self, id: i64, params: &Value) -> RpcResponse {
        let type_name = type_name(params);
        let Some(data_source) = self.data_sources.get(type_name) else {
            return unknown_type(id, "data source", type_name);
        };

        let client = match self.get_client() {
            Ok(c) => c,
            Err(diag) => return RpcResponse::diagnostics(id, &[diag]),
        };

        let config = state_from_param(params, "config").unwrap_or_default();

        let result = self
            .runtime
            .block_on(async { data_source.read(&client, &config).await });

        match result {
            Ok(state) => RpcResponse::success(
                id,
                json!({
                    "state": state.values,
                    "diagnostics": []
                }),
            ),
            Err(diagnostics) => RpcResponse::diagnostics(id, &diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn call(provider: &NiosProvider, method: &str, params: Value) -> Value {
        let request = json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params});
        let response = provider.handle_request(&request.to_string());
        serde_json::from_str(&response).unwrap()
    }

    /// Mock server running on its own runtime so the provider can block on requests
    fn mock_server() -> (tokio::runtime::Runtime, MockServer) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        (runtime, server)
    }

    fn provider_config(url: &str) -> Value {
        json!({
            "nios_host_url": url,
            "nios_username": "admin",
            "nios_password": "infoblox",
            "wapi_version": "2.13.6",
            "insecure": false,
            "timeout": 5,
            "delete_retries": 2,
            "delete_retry_interval": 0
        })
    }

    fn mount_schema(runtime: &tokio::runtime::Runtime, server: &MockServer) {
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/wapi/v2.13.6/"))
                .and(query_param("_schema", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "requested_version": "2.13.6",
                    "supported_versions": ["2.12.3", "2.13.6"]
                })))
                .mount(server),
        );
    }

    #[test]
    fn test_provider_creation() {
        let provider = NiosProvider::new().unwrap();
        assert_eq!(provider.resources.len(), 19);
        assert_eq!(provider.data_sources.len(), 19);
    }

    #[test]
    fn test_provider_schema() {
        let provider = NiosProvider::new().unwrap();
        let schema = provider.get_schema();

        assert!(schema.provider.attributes.contains_key("nios_host_url"));
        assert!(schema.provider.attributes.contains_key("nios_password"));
        assert!(schema.provider.attributes["nios_password"].sensitive);
        assert!(schema.resource_schemas.contains_key("nios_dhcp_option_space"));
        assert!(schema.data_source_schemas.contains_key("nios_ipam_network"));
    }

    #[test]
    fn test_handle_get_schema() {
        let provider = NiosProvider::new().unwrap();
        let response = provider.handle_request(
            r#"{"jsonrpc":"2.0","id":1,"method":"GetProviderSchema","params":{}}"#,
        );

        assert!(response.contains("provider"));
        assert!(response.contains("resource_schemas"));
        assert!(response.contains("data_source_schemas"));
    }

    #[test]
    fn test_handle_unknown_method() {
        let provider = NiosProvider::new().unwrap();
        let response = provider.handle_request(
            r#"{"jsonrpc":"2.0","id":1,"method":"UnknownMethod","params":{}}"#,
        );

        assert!(response.contains("error"));
        assert!(response.contains("Method not found"));
        assert!(response.contains("-32601"));
    }

    #[test]
    fn test_handle_wrong_jsonrpc_version() {
        let provider = NiosProvider::new().unwrap();
        let response: Value = serde_json::from_str(&provider.handle_request(
            r#"{"jsonrpc":"1.0","id":3,"method":"GetProviderSchema","params":{}}"#,
        ))
        .unwrap();

        assert_eq!(response["id"], json!(3));
        assert_eq!(response["error"]["code"], json!(-32600));
        assert!(response.get("result").is_none());
    }

    #[test]
    fn test_handle_parse_error() {
        let provider = NiosProvider::new().unwrap();
        let response: Value = serde_json::from_str(&provider.handle_request("{not json")).unwrap();
        assert_eq!(response["error"]["code"], json!(-32700));
    }

    #[test]
    fn test_validate_resource_config() {
        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "ValidateResourceConfig",
            json!({
                "type_name": "nios_dhcp_range",
                "config": {"start_addr": "10.0.0.10", "end_addr": "10.0.0.999"}
            }),
        );

        let diagnostics = response["result"]["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["attribute"], json!(["end_addr"]));
    }

    #[test]
    fn test_validate_unknown_data_source() {
        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "ValidateDataResourceConfig",
            json!({"type_name": "nios_dns_record_a", "config": {}}),
        );

        let diagnostics = response["result"]["diagnostics"].as_array().unwrap();
        assert!(diagnostics[0]["summary"]
            .as_str()
            .unwrap()
            .contains("Unknown data source type"));
    }

    #[test]
    fn test_validate_provider_config_rejects_bad_url() {
        let provider = NiosProvider::new().unwrap();
        let mut config = provider_config("ftp://gm.example.com");
        config["timeout"] = json!(5);

        let response = call(&provider, "ValidateProviderConfig", json!({"config": config}));
        let diagnostics = response["result"]["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0]["attribute"], json!(["nios_host_url"]));
    }

    #[test]
    fn test_apply_requires_configuration() {
        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "ApplyResourceChange",
            json!({
                "type_name": "nios_ipam_network_view",
                "prior_state": null,
                "planned_state": {"name": "lab"}
            }),
        );

        assert_eq!(
            response["result"]["diagnostics"][0]["summary"],
            json!("Provider not configured")
        );
    }

    #[test]
    fn test_plan_reports_replacement() {
        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "PlanResourceChange",
            json!({
                "type_name": "nios_dhcp_mac_filter_address",
                "prior_state": {
                    "ref": "macfilteraddress/abc",
                    "filter": "guests",
                    "mac": "aa:bb:cc:dd:ee:ff"
                },
                "proposed_new_state": {
                    "filter": "staff",
                    "mac": "aa:bb:cc:dd:ee:ff"
                }
            }),
        );

        assert_eq!(response["result"]["requires_replace"], json!([["filter"]]));
        assert_eq!(
            response["result"]["planned_state"]["ref"],
            json!("macfilteraddress/abc")
        );
    }

    #[test]
    fn test_plan_destroy() {
        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "PlanResourceChange",
            json!({
                "type_name": "nios_ipam_network_view",
                "prior_state": {"ref": "networkview/abc", "name": "lab"},
                "proposed_new_state": null
            }),
        );

        assert_eq!(response["result"]["planned_state"], Value::Null);
    }

    #[test]
    fn test_configure_reports_auth_failure() {
        let (runtime, server) = mock_server();
        runtime.block_on(
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(401).set_body_string("Authorization Required"))
                .mount(&server),
        );

        let provider = NiosProvider::new().unwrap();
        let response = call(
            &provider,
            "ConfigureProvider",
            json!({"config": provider_config(&server.uri())}),
        );

        let diagnostics = response["result"]["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics[0]["summary"], json!("Unable to connect to NIOS"));
        assert!(provider.get_client().is_err());
    }

    #[test]
    fn test_configure_then_read_removed_resource() {
        let (runtime, server) = mock_server();
        mount_schema(&runtime, &server);
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/wapi/v2.13.6/dhcpoptionspace/gone"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server),
        );

        let provider = NiosProvider::new().unwrap();
        let configured = call(
            &provider,
            "ConfigureProvider",
            json!({"config": provider_config(&server.uri())}),
        );
        assert_eq!(configured["result"]["diagnostics"], json!([]));

        let response = call(
            &provider,
            "ReadResource",
            json!({
                "type_name": "nios_dhcp_option_space",
                "current_state": {"ref": "dhcpoptionspace/gone", "name": "custom"}
            }),
        );

        assert_eq!(response["result"]["new_state"], Value::Null);
        assert_eq!(response["result"]["diagnostics"], json!([]));
    }

    #[test]
    fn test_read_data_source_through_protocol() {
        let (runtime, server) = mock_server();
        mount_schema(&runtime, &server);
        runtime.block_on(
            Mock::given(method("GET"))
                .and(path("/wapi/v2.13.6/networkview"))
                .and(query_param("name", "lab"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "result": [{"_ref": "networkview/abc:lab/false", "name": "lab", "is_default": false}]
                })))
                .mount(&server),
        );

        let provider = NiosProvider::new().unwrap();
        call(
            &provider,
            "ConfigureProvider",
            json!({"config": provider_config(&server.uri())}),
        );

        let response = call(
            &provider,
            "ReadDataSource",
            json!({
                "type_name": "nios_ipam_network_view",
                "config": {"filters": {"name": "lab"}}
            }),
        );

        let result = &response["result"]["state"]["result"];
        assert_eq!(result[0]["name"], json!("lab"));
        assert_eq!(result[0]["is_default"], json!(false));
    }
}
