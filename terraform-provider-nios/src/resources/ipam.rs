//! IPAM object types: networks, network containers and network views

use crate::resources::dhcp::{
    self, comment, disable, inheritable, ipv6_domain_fields, ipv6_lifetimes, member_fields, options, template,
};
use crate::resources::fields::Field;
use crate::resources::ObjectDefinition;
use crate::validators::Validator;

const NETWORK_TARGET: &[&str] = &["network"];

fn ipv4_cidr() -> Field {
    Field::string("network", "The network address in IPv4 Address/CIDR format.")
        .optional_computed()
        .force_new()
        .validate(Validator::Ipv4Cidr)
}

fn ipv6_cidr() -> Field {
    Field::string("network", "The network address in IPv6 Address/CIDR format.")
        .optional_computed()
        .force_new()
        .validate(Validator::Ipv6Cidr)
}

fn members() -> Field {
    Field::object_list("members", "A list of members or Microsoft servers that serve DHCP for this network.", member_fields())
        .optional()
        .tagged("dhcpmember")
}

fn utilization() -> Field {
    Field::integer("utilization", "The network utilization in percentage.").read_only()
}

fn authority() -> [Field; 2] {
    inheritable(Field::bool("authority", "Authority for the DHCP network."), "use_authority")
}

fn enable_ddns() -> [Field; 2] {
    inheritable(
        Field::bool("enable_ddns", "The dynamic DNS updates flag of a DHCP network object."),
        "use_enable_ddns",
    )
}

pub fn network() -> ObjectDefinition {
    ObjectDefinition::new("nios_ipam_network", "network", "Manages an IPv4 network.")
        .fields([
            ipv4_cidr(),
            dhcp::network_view(),
            comment(),
            disable(),
            members(),
            Field::bool("unmanaged", "Determines whether the DHCP IPv4 Network is unmanaged or not.").optional_computed(),
            Field::string("network_container", "The network container to which this network belongs (if any).")
                .read_only(),
            utilization(),
            template(),
        ])
        .fields(authority())
        .fields(enable_ddns())
        .fields(inheritable(
            Field::integer("lease_scavenge_time", "Number of seconds after a lease expires before it is deleted; -1 disables scavenging.")
                .validate(Validator::IntRange(-1, 2_147_483_647)),
            "use_lease_scavenge_time",
        ))
        .fields(options())
        .with_extattrs()
        .with_func_call(NETWORK_TARGET)
}

pub fn network_container() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_ipam_network_container",
        "networkcontainer",
        "Manages an IPv4 network container.",
    )
    .fields([
        ipv4_cidr(),
        dhcp::network_view(),
        comment(),
        Field::string("network_container", "The network container to which this network container belongs (if any).")
            .read_only(),
        utilization(),
    ])
    .fields(authority())
    .fields(enable_ddns())
    .fields(options())
    .with_extattrs()
    .with_func_call(NETWORK_TARGET)
}

pub fn ipv6_network() -> ObjectDefinition {
    ObjectDefinition::new("nios_ipam_ipv6_network", "ipv6network", "Manages an IPv6 network.")
        .fields([
            ipv6_cidr(),
            dhcp::network_view(),
            comment(),
            disable(),
            members(),
            Field::bool("unmanaged", "Determines whether the DHCP IPv6 Network is unmanaged or not.").optional_computed(),
            Field::string("network_container", "The network container to which this network belongs (if any).")
                .read_only(),
            template(),
        ])
        .fields(ipv6_domain_fields())
        .fields(ipv6_lifetimes())
        .fields(options())
        .with_extattrs()
        .with_func_call(NETWORK_TARGET)
}

pub fn ipv6_network_container() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_ipam_ipv6_network_container",
        "ipv6networkcontainer",
        "Manages an IPv6 network container.",
    )
    .fields([
        ipv6_cidr(),
        dhcp::network_view(),
        comment(),
        Field::string("network_container", "The network container to which this network container belongs (if any).")
            .read_only(),
        utilization(),
    ])
    .fields(ipv6_domain_fields())
    .fields(ipv6_lifetimes())
    .fields(options())
    .with_extattrs()
    .with_func_call(NETWORK_TARGET)
}

pub fn network_view() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_ipam_network_view",
        "networkview",
        "Manages a network view.",
    )
    .fields([
        Field::string("name", "Name of the network view.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        comment(),
        Field::bool("is_default", "The NIOS appliance provides one default network view.").read_only(),
    ])
    .with_extattrs()
    .with_delete_retry()
}

pub fn definitions() -> Vec<ObjectDefinition> {
    vec![
        network(),
        network_container(),
        ipv6_network(),
        ipv6_network_container(),
        network_view(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, RetryPolicy};
    use crate::client::WapiClient;
    use crate::resources::{Resource, ResourceState, WapiResource};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state(value: Value) -> ResourceState {
        ResourceState::from_object(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_definitions() {
        let defs = definitions();
        assert_eq!(defs.len(), 5);
        for def in defs.iter().filter(|d| d.wapi_type != "networkview") {
            assert_eq!(def.func_targets, &["network"]);
        }
        assert!(network_view().delete_retry);
    }

    #[test]
    fn test_network_requires_address_or_func_call() {
        let res = WapiResource::new(Arc::new(network()));

        let diags = res.validate(&state(json!({"comment": "office"})));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(vec!["network".to_string()]));

        let diags = res.validate(&state(json!({"network": "10.1.0.1/24"})));
        assert_eq!(diags.len(), 1);

        let diags = res.validate(&state(json!({
            "network": "10.1.0.0/24",
            "func_call": {
                "attribute_name": "network",
                "object_function": "next_available_network",
                "result_field": "networks"
            }
        })));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Conflicting configuration");
    }

    #[test]
    fn test_network_view_change_forces_replacement() {
        let res = WapiResource::new(Arc::new(network()));
        let prior = state(json!({
            "ref": "network/abc",
            "network": "10.1.0.0/24",
            "network_view": "default"
        }));
        let proposed = state(json!({
            "network": "10.1.0.0/24",
            "network_view": "lab"
        }));

        let planned = res.plan_change(Some(&prior), &proposed).unwrap();
        assert_eq!(planned.requires_replace, vec![vec!["network_view".to_string()]]);
    }

    #[test]
    fn test_network_address_change_forces_replacement() {
        for def in [network(), network_container()] {
            let res = WapiResource::new(Arc::new(def));
            let prior = state(json!({
                "ref": "network/abc",
                "network": "10.0.0.0/24",
                "network_view": "default"
            }));
            let proposed = state(json!({"network": "10.1.0.0/24"}));

            let planned = res.plan_change(Some(&prior), &proposed).unwrap();
            assert_eq!(planned.requires_replace, vec![vec!["network".to_string()]]);
        }

        let res = WapiResource::new(Arc::new(ipv6_network()));
        let prior = state(json!({
            "ref": "ipv6network/abc",
            "network": "2001:db8::/64",
            "network_view": "default"
        }));
        let proposed = state(json!({"network": "2001:db8:1::/64"}));
        let planned = res.plan_change(Some(&prior), &proposed).unwrap();
        assert_eq!(planned.requires_replace, vec![vec!["network".to_string()]]);
    }

    #[test]
    fn test_allocated_network_is_kept_without_replacement() {
        let res = WapiResource::new(Arc::new(network()));
        let func_call = json!({
            "attribute_name": "network",
            "object_function": "next_available_network",
            "result_field": "networks"
        });
        let prior = state(json!({
            "ref": "network/abc",
            "network": "10.0.4.0/24",
            "network_view": "default",
            "func_call": func_call
        }));
        let proposed = state(json!({"func_call": func_call}));

        let planned = res.plan_change(Some(&prior), &proposed).unwrap();
        assert!(planned.requires_replace.is_empty());
        assert_eq!(planned.state.get_string("network"), Some("10.0.4.0/24".to_string()));
    }

    #[tokio::test]
    async fn test_create_next_available_network() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/wapi/v2.13.6/network"))
            .and(body_partial_json(json!({
                "network": {
                    "_object_function": "next_available_network",
                    "_object": "networkcontainer",
                    "_object_parameters": {"network": "10.0.0.0/16"},
                    "_result_field": "networks",
                    "_parameters": {"cidr": 24}
                },
                "network_view": "default"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "result": {
                    "_ref": "network/ZG5z:10.0.4.0/24/default",
                    "network": "10.0.4.0/24",
                    "network_view": "default",
                    "network_container": "10.0.0.0/16",
                    "utilization": 0,
                    "extattrs": {"Terraform Internal ID": {"value": "id-1"}}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = WapiClient::new(&ClientConfig {
            host_url: server.uri(),
            username: "admin".to_string(),
            password: "infoblox".to_string(),
            wapi_version: "2.13.6".to_string(),
            insecure: false,
            timeout: Duration::from_secs(5),
            delete_retry: RetryPolicy::default(),
        })
        .unwrap();

        let res = WapiResource::new(Arc::new(network()));
        let created = res
            .create(
                &client,
                &state(json!({
                    "network_view": "default",
                    "func_call": {
                        "attribute_name": "network",
                        "object_function": "next_available_network",
                        "object": "networkcontainer",
                        "object_parameters": {"network": "10.0.0.0/16"},
                        "result_field": "networks",
                        "parameters": {"cidr": "24"}
                    }
                })),
            )
            .await
            .unwrap();

        assert_eq!(created.get_string("network"), Some("10.0.4.0/24".to_string()));
        assert_eq!(created.get_string("network_container"), Some("10.0.0.0/16".to_string()));
        assert!(created.get("extattrs").is_none());
        assert_eq!(
            created.get("extattrs_all"),
            Some(&json!({"Terraform Internal ID": "id-1"}))
        );
    }
}
