//! DHCP object types

use crate::resources::fields::Field;
use crate::resources::ObjectDefinition;
use crate::validators::Validator;
use serde_json::json;

const SERVER_ASSOCIATION_TYPES: &[&str] = &["NONE", "MEMBER", "FAILOVER", "MS_SERVER", "MS_FAILOVER"];
const ADDRESS_TYPES: &[&str] = &["ADDRESS", "PREFIX", "BOTH"];

const OPTION_DATA_TYPES: &[&str] = &[
    "8-bit signed integer",
    "8-bit unsigned integer",
    "8-bit unsigned integer (1,2,4,8)",
    "16-bit signed integer",
    "16-bit unsigned integer",
    "32-bit signed integer",
    "32-bit unsigned integer",
    "array of 8-bit integer",
    "array of 8-bit unsigned integer",
    "array of 16-bit integer",
    "array of 16-bit unsigned integer",
    "array of 32-bit integer",
    "array of 32-bit unsigned integer",
    "array of ip-address",
    "array of ip-address pair",
    "boolean",
    "boolean array of ip-address",
    "boolean-text",
    "domain-list",
    "domain-name",
    "encapsulated",
    "ip-address",
    "string",
    "text",
];

// ============================================================================
// Shared attributes
// ============================================================================

/// A field together with the `use_*` flag that makes NIOS prefer it over the
/// inherited value
pub(crate) fn inheritable(field: Field, flag: &'static str) -> [Field; 2] {
    let description = format!("Use flag for: {}", field.name);
    [
        field.optional().use_flag(flag),
        Field::bool(flag, &description).optional_computed(),
    ]
}

pub(crate) fn comment() -> Field {
    Field::string("comment", "Comment for the object; maximum 256 characters.")
        .optional()
        .validate(Validator::Length(0, 256))
}

pub(crate) fn disable() -> Field {
    Field::bool("disable", "Determines whether the object is disabled.").default(json!(false))
}

pub(crate) fn network_view() -> Field {
    Field::string("network_view", "The name of the network view in which this object resides.")
        .default(json!("default"))
        .force_new()
}

/// Template applied at creation only; the WAPI never returns it
pub(crate) fn template() -> Field {
    Field::string("template", "If set on creation, the object is created according to the values specified in the template.")
        .optional()
        .create_only()
        .write_only()
}

pub(crate) fn options() -> [Field; 2] {
    inheritable(
        Field::options("options", "An array of DHCP option structs that lists the DHCP options associated with the object."),
        "use_options",
    )
}

pub(crate) fn member_fields() -> Vec<Field> {
    vec![
        Field::string("name", "The host name of the Grid member.").optional(),
        Field::string("ipv4addr", "The IPv4 address of the Grid member.")
            .optional()
            .validate(Validator::Ipv4Address),
        Field::string("ipv6addr", "The IPv6 address of the Grid member.")
            .optional()
            .validate(Validator::Ipv6Address),
    ]
}

fn exclusion_fields() -> Vec<Field> {
    vec![
        Field::string("start_address", "The IP address of the start of the exclusion range.").required(),
        Field::string("end_address", "The IP address of the end of the exclusion range.").required(),
        Field::string("comment", "Comment for the exclusion range.").optional(),
    ]
}

fn boot_fields() -> Vec<Field> {
    [
        inheritable(Field::string("bootfile", "The bootfile name for the object."), "use_bootfile"),
        inheritable(Field::string("bootserver", "The bootserver address for the object."), "use_bootserver"),
        inheritable(
            Field::string("nextserver", "The name in FQDN and/or IPv4 address of the next server in the host boot process."),
            "use_nextserver",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn ddns_fields() -> Vec<Field> {
    [
        inheritable(
            Field::bool("enable_ddns", "Determines whether the DHCP server sends DDNS updates to DNS servers."),
            "use_enable_ddns",
        ),
        inheritable(
            Field::string("ddns_domainname", "The dynamic DNS domain name the appliance uses."),
            "use_ddns_domainname",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn deny_bootp() -> [Field; 2] {
    inheritable(
        Field::bool("deny_bootp", "If set to true, BOOTP settings are disabled and BOOTP requests will be denied."),
        "use_deny_bootp",
    )
}

fn lease_scavenge_time() -> [Field; 2] {
    inheritable(
        Field::integer("lease_scavenge_time", "Number of seconds after a lease expires before it is deleted; -1 disables scavenging.")
            .validate(Validator::IntRange(-1, 2_147_483_647)),
        "use_lease_scavenge_time",
    )
}

pub(crate) fn ipv6_lifetimes() -> Vec<Field> {
    [
        inheritable(
            Field::integer("preferred_lifetime", "The preferred lifetime value in seconds."),
            "use_preferred_lifetime",
        ),
        inheritable(
            Field::integer("valid_lifetime", "The valid lifetime value in seconds."),
            "use_valid_lifetime",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub(crate) fn ipv6_domain_fields() -> Vec<Field> {
    [
        inheritable(
            Field::string("domain_name", "The domain name of the IPv6 object."),
            "use_domain_name",
        ),
        inheritable(
            Field::string_list("domain_name_servers", "The IPv6 addresses of DNS recursive name servers handed to clients."),
            "use_domain_name_servers",
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

// ============================================================================
// Object types
// ============================================================================

pub fn fixed_address() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_fixed_address",
        "fixedaddress",
        "Manages a DHCP IPv4 fixed address.",
    )
    .fields([
        Field::string("ipv4addr", "The IPv4 address of the fixed address.")
            .optional_computed()
            .validate(Validator::Ipv4Address),
        Field::string("mac", "The MAC address value for this fixed address.")
            .optional_computed()
            .validate(Validator::MacAddress),
        Field::string("match_client", "The match client for the fixed address.")
            .default(json!("MAC_ADDRESS"))
            .validate(Validator::OneOf(&["MAC_ADDRESS", "CLIENT_ID", "RESERVED", "CIRCUIT_ID", "REMOTE_ID"])),
        Field::string("agent_circuit_id", "The agent circuit ID for the fixed address.").optional(),
        Field::string("agent_remote_id", "The agent remote ID for the fixed address.").optional(),
        Field::string("dhcp_client_identifier", "The DHCP client ID for the fixed address.").optional(),
        Field::string("name", "This field contains the name of this fixed address.")
            .optional()
            .validate(Validator::NoSurroundingWhitespace),
        Field::string("network", "The network to which this fixed address belongs, in IPv4 Address/CIDR format.")
            .optional_computed()
            .validate(Validator::Ipv4Cidr),
        network_view(),
        comment(),
        disable(),
        Field::string("ddns_hostname", "The DDNS host name for this fixed address.").optional(),
        template(),
    ])
    .fields(boot_fields())
    .fields(ddns_fields())
    .fields(deny_bootp())
    .fields(options())
    .with_extattrs()
    .with_func_call(&["ipv4addr"])
}

pub fn ipv6_fixed_address() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_ipv6_fixed_address",
        "ipv6fixedaddress",
        "Manages a DHCP IPv6 fixed address.",
    )
    .fields([
        Field::string("ipv6addr", "The IPv6 address for this IPv6 fixed address.")
            .optional_computed()
            .validate(Validator::Ipv6Address),
        Field::string("address_type", "The address type value for this IPv6 fixed address.")
            .default(json!("ADDRESS"))
            .validate(Validator::OneOf(ADDRESS_TYPES)),
        Field::string("ipv6prefix", "The IPv6 Address prefix of the IPv6 fixed address.").optional(),
        Field::integer("ipv6prefix_bits", "Prefix bits of the IPv6 fixed address.")
            .optional()
            .validate(Validator::IntRange(0, 128)),
        Field::string("duid", "The DUID value for this IPv6 fixed address.")
            .optional_computed()
            .validate(Validator::Duid),
        Field::string("match_client", "The match client for the IPv6 fixed address.")
            .default(json!("DUID"))
            .validate(Validator::OneOf(&["DUID", "MAC_ADDRESS"])),
        Field::string("mac_address", "The MAC address value for this IPv6 fixed address.")
            .optional()
            .validate(Validator::MacAddress),
        Field::string("name", "This field contains the name of this IPv6 fixed address.").optional(),
        Field::string("network", "The network to which this IPv6 fixed address belongs, in IPv6 Address/CIDR format.")
            .optional_computed()
            .validate(Validator::Ipv6Cidr),
        network_view(),
        comment(),
        disable(),
        template(),
    ])
    .fields(ipv6_domain_fields())
    .fields(ipv6_lifetimes())
    .fields(options())
    .with_extattrs()
    .with_func_call(&["ipv6addr"])
}

pub fn range() -> ObjectDefinition {
    ObjectDefinition::new("nios_dhcp_range", "range", "Manages a DHCP IPv4 range.")
        .fields([
            Field::string("start_addr", "The IPv4 Address starting address of the range.")
                .required()
                .validate(Validator::Ipv4Address),
            Field::string("end_addr", "The IPv4 Address end address of the range.")
                .required()
                .validate(Validator::Ipv4Address),
            Field::string("network", "The network to which this range belongs, in IPv4 Address/CIDR format.")
                .optional_computed()
                .validate(Validator::Ipv4Cidr),
            network_view(),
            Field::string("name", "This field contains the name of the Microsoft scope.").optional(),
            comment(),
            disable(),
            Field::string("server_association_type", "The type of server that is going to serve the range.")
                .default(json!("NONE"))
                .validate(Validator::OneOf(SERVER_ASSOCIATION_TYPES)),
            Field::object("member", "The member that will provide service for this range.", member_fields())
                .optional()
                .tagged("dhcpmember"),
            Field::string("failover_association", "The name of the failover association.").optional(),
            Field::object_list(
                "exclude",
                "These are ranges of IP addresses that the appliance does not use to assign to clients.",
                exclusion_fields(),
            )
            .optional()
            .tagged("exclusionrange"),
            Field::bool("deny_all_clients", "If True, send NAK forcing the client to take the new address.")
                .optional_computed(),
            template(),
        ])
        .fields(boot_fields())
        .fields(ddns_fields())
        .fields(deny_bootp())
        .fields(lease_scavenge_time())
        .fields(options())
        .with_extattrs()
}

pub fn ipv6_range() -> ObjectDefinition {
    ObjectDefinition::new("nios_dhcp_ipv6_range", "ipv6range", "Manages a DHCP IPv6 range.")
        .fields([
            Field::string("address_type", "Type of a DHCP IPv6 Range object.")
                .default(json!("ADDRESS"))
                .validate(Validator::OneOf(ADDRESS_TYPES)),
            Field::string("start_addr", "The IPv6 Address starting address of the range.")
                .optional_computed()
                .validate(Validator::Ipv6Address),
            Field::string("end_addr", "The IPv6 Address ending address of the range.")
                .optional_computed()
                .validate(Validator::Ipv6Address),
            Field::string("ipv6_start_prefix", "The starting IPv6 Address prefix in the range.").optional(),
            Field::string("ipv6_end_prefix", "The ending IPv6 Address prefix in the range.").optional(),
            Field::integer("ipv6_prefix_bits", "Prefix bits of the range.")
                .optional()
                .validate(Validator::IntRange(0, 128)),
            Field::string("network", "The network this range belongs to, in IPv6 Address/CIDR format.")
                .required()
                .validate(Validator::Ipv6Cidr),
            network_view(),
            Field::string("name", "This field contains the name of the range.").optional(),
            comment(),
            disable(),
            Field::string("server_association_type", "The type of server that is going to serve the range.")
                .default(json!("NONE"))
                .validate(Validator::OneOf(&["NONE", "MEMBER"])),
            Field::object("member", "The member that will provide service for this range.", member_fields())
                .optional()
                .tagged("dhcpmember"),
            Field::object_list(
                "exclude",
                "These are ranges of IPv6 addresses that the appliance does not use to assign to clients.",
                exclusion_fields(),
            )
            .optional()
            .tagged("exclusionrange"),
            template(),
        ])
        .fields(inheritable(
            Field::bool("recycle_leases", "If the field is set to True, the leases are kept in the Recycle Bin until one week after expiration."),
            "use_recycle_leases",
        ))
        .with_extattrs()
}

pub fn shared_network() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_shared_network",
        "sharednetwork",
        "Manages a DHCP IPv4 shared network.",
    )
    .fields([
        Field::string("name", "The name of the IPv4 shared network.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::ref_list("networks", "A list of networks belonging to the shared network.").required(),
        network_view(),
        comment(),
        disable(),
    ])
    .fields(inheritable(
        Field::bool("authority", "Authority for the shared network."),
        "use_authority",
    ))
    .fields(boot_fields())
    .fields(ddns_fields())
    .fields(lease_scavenge_time())
    .fields(options())
    .with_extattrs()
}

pub fn ipv6_shared_network() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_ipv6_shared_network",
        "ipv6sharednetwork",
        "Manages a DHCP IPv6 shared network.",
    )
    .fields([
        Field::string("name", "The name of the IPv6 shared network.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::ref_list("networks", "A list of IPv6 networks belonging to the shared network.").required(),
        network_view(),
        comment(),
        disable(),
    ])
    .fields(ipv6_domain_fields())
    .fields(ipv6_lifetimes())
    .fields(options())
    .with_extattrs()
}

pub fn range_template() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_range_template",
        "rangetemplate",
        "Manages a DHCP range template.",
    )
    .fields([
        Field::string("name", "The name of a range template object.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::integer("number_of_addresses", "The number of addresses for this range.")
            .required()
            .validate(Validator::IntRange(1, i64::from(u32::MAX))),
        Field::integer("offset", "The start address offset for this range.")
            .required()
            .validate(Validator::IntRange(0, i64::from(u32::MAX))),
        comment(),
        Field::string("server_association_type", "The type of server that is going to serve the range.")
            .default(json!("NONE"))
            .validate(Validator::OneOf(SERVER_ASSOCIATION_TYPES)),
        Field::object("member", "The member that will provide service for the range.", member_fields())
            .optional()
            .tagged("dhcpmember"),
        Field::string("failover_association", "The name of the failover association.").optional(),
        Field::object_list(
            "exclude",
            "These are ranges of IP addresses that the appliance does not use to assign to clients.",
            vec![
                Field::integer("offset", "The address offset of the exclusion range.").required(),
                Field::integer("number_of_addresses", "The number of addresses in the exclusion range.").required(),
                Field::string("comment", "Comment for the exclusion range.").optional(),
            ],
        )
        .optional()
        .tagged("exclusionrangetemplate"),
        Field::bool("cloud_api_compatible", "This flag controls whether this template can be used to create network objects in a cloud-computing deployment.")
            .optional_computed(),
    ])
    .fields(boot_fields())
    .fields(ddns_fields())
    .fields(options())
    .with_extattrs()
}

pub fn fixed_address_template() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_fixed_address_template",
        "fixedaddresstemplate",
        "Manages a DHCP fixed address template.",
    )
    .fields([
        Field::string("name", "The name of a fixed address template object.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::integer("number_of_addresses", "The number of addresses for this fixed address template.")
            .optional()
            .validate(Validator::IntRange(0, i64::from(u32::MAX))),
        Field::integer("offset", "The start address offset for this fixed address template.")
            .optional()
            .validate(Validator::IntRange(0, i64::from(u32::MAX))),
        comment(),
    ])
    .fields(boot_fields())
    .fields(ddns_fields())
    .fields(options())
    .with_extattrs()
}

pub fn option_space() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_option_space",
        "dhcpoptionspace",
        "Manages a DHCP option space.",
    )
    .fields([
        Field::string("name", "The name of a DHCP option space.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        comment(),
        Field::string_list("option_definitions", "The list of DHCP option definition objects.").read_only(),
        Field::string("space_type", "The type of the option space.").read_only(),
    ])
    .with_delete_retry()
}

pub fn option_definition() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_option_definition",
        "dhcpoptiondefinition",
        "Manages a DHCP option definition.",
    )
    .fields([
        Field::string("name", "The name of a DHCP option definition.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::integer("code", "The code of a DHCP option definition.")
            .required()
            .validate(Validator::IntRange(1, 254)),
        Field::string("type", "The data type of the Grid DHCP option.")
            .required()
            .validate(Validator::OneOf(OPTION_DATA_TYPES)),
        Field::string("space", "The space of a DHCP option definition.")
            .default(json!("DHCP"))
            .force_new(),
    ])
}

pub fn filter_mac() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_filter_mac",
        "filtermac",
        "Manages a DHCP MAC address filter.",
    )
    .fields([
        Field::string("name", "The name of a DHCP MAC Filter object.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        comment(),
        Field::integer("default_mac_address_expiration", "The default MAC expiration time of the DHCP MAC Address Filter object.")
            .optional_computed(),
        Field::bool("enforce_expiration_times", "The flag to enforce MAC address expiration of the DHCP MAC Address Filter object.")
            .optional_computed(),
        Field::integer("lease_time", "The length of time the DHCP server leases an IP address to a client.").optional(),
        Field::bool("never_expires", "Determines if DHCP MAC Filter never expires or automatically expires.")
            .optional_computed(),
        Field::string("reserved_for_infoblox", "This is reserved for writing comments related to the particular MAC address filter.")
            .optional(),
        Field::options("options", "An array of DHCP option structs that lists the DHCP options associated with the object.")
            .optional(),
    ])
    .with_extattrs()
}

pub fn mac_filter_address() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_mac_filter_address",
        "macfilteraddress",
        "Manages a MAC address in a DHCP MAC address filter.",
    )
    .fields([
        Field::string("filter", "Name of the DHCP Filter MAC object associated with this MAC address.")
            .required()
            .force_new(),
        Field::string("mac", "MAC Address.")
            .required()
            .validate(Validator::MacAddress),
        comment(),
        Field::integer("expiration_time", "The absolute UNIX time (in seconds) since the address was last authenticated.")
            .optional(),
        Field::bool("never_expires", "Determines if the MAC address expiration is disabled.").optional_computed(),
        Field::string("fingerprint", "DHCP fingerprint for the address.").read_only(),
        Field::integer("authentication_time", "Absolute UNIX time (in seconds) since the address was last authenticated.")
            .read_only(),
        Field::string("guest_first_name", "First name of the guest.").optional(),
        Field::string("guest_last_name", "Last name of the guest.").optional(),
        Field::string("guest_email", "Email address of the guest.").optional(),
        Field::string("guest_phone", "Phone number of the guest.").optional(),
        Field::string("username", "Username for authenticated DHCP purposes.").optional(),
        Field::string("reserved_for_infoblox", "Reserved for writing comments related to the particular MAC address filter.")
            .optional(),
    ])
    .with_extattrs()
}

pub fn filter_option() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_filter_option",
        "filteroption",
        "Manages a DHCP option filter.",
    )
    .fields([
        Field::string("name", "The name of the DHCP filter.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        comment(),
        Field::string("expression", "The conditional expression of a DHCP filter.").optional(),
        Field::options("option_list", "An array of DHCP option structs that lists the DHCP options associated with the object.")
            .optional(),
        Field::string("option_space", "The option space for this DHCP filter.").optional_computed(),
        Field::bool("apply_as_class", "Determines if apply as class is enabled or not.").optional_computed(),
        Field::string("bootfile", "A name of boot file of a DHCP filter.").optional(),
        Field::string("bootserver", "Determines the boot server of a DHCP filter.").optional(),
        Field::string("next_server", "Determines the next server of a DHCP filter.").optional(),
        Field::integer("lease_time", "Determines the lease time of a DHCP filter.").optional(),
        Field::integer("pxe_lease_time", "Determines the PXE lease time of a DHCP filter.").optional(),
    ])
    .with_extattrs()
}

pub fn roaming_host() -> ObjectDefinition {
    ObjectDefinition::new(
        "nios_dhcp_roaming_host",
        "roaminghost",
        "Manages a DHCP roaming host.",
    )
    .fields([
        Field::string("name", "The name of this DHCP roaming host.")
            .required()
            .validate(Validator::NoSurroundingWhitespace),
        Field::string("address_type", "The address type for this roaming host.")
            .default(json!("IPV4"))
            .validate(Validator::OneOf(&["IPV4", "IPV6", "BOTH"])),
        Field::string("mac", "The MAC address for this roaming host.")
            .optional()
            .validate(Validator::MacAddress),
        Field::string("match_client", "The match-client value for this roaming host.")
            .default(json!("MAC_ADDRESS"))
            .validate(Validator::OneOf(&["MAC_ADDRESS", "CLIENT_ID"])),
        Field::string("dhcp_client_identifier", "The DHCP client ID for the roaming host.").optional(),
        Field::string("ipv6_duid", "The DUID value for this roaming host.")
            .optional()
            .validate(Validator::Duid),
        network_view(),
        comment(),
        disable(),
        template(),
    ])
    .fields(boot_fields())
    .fields(ddns_fields())
    .fields(deny_bootp())
    .fields(options())
    .with_extattrs()
}

pub fn definitions() -> Vec<ObjectDefinition> {
    vec![
        fixed_address(),
        ipv6_fixed_address(),
        range(),
        ipv6_range(),
        shared_network(),
        ipv6_shared_network(),
        range_template(),
        fixed_address_template(),
        option_space(),
        option_definition(),
        filter_mac(),
        mac_filter_address(),
        filter_option(),
        roaming_host(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::fields::{self, Operation};
    use crate::resources::{Resource, ResourceState, WapiResource};
    use serde_json::{Map, Value};
    use std::sync::Arc;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_inheritable_pairs_flag() {
        let [field, flag] = inheritable(Field::string("bootfile", "Boot file"), "use_bootfile");
        assert_eq!(field.use_flag, Some("use_bootfile"));
        assert!(field.attribute.optional);
        assert_eq!(flag.name, "use_bootfile");
        assert!(flag.attribute.computed);
    }

    #[test]
    fn test_definitions_are_unique() {
        let defs = definitions();
        assert_eq!(defs.len(), 14);

        for def in &defs {
            let mut names: Vec<&str> = def.fields.iter().map(|f| f.name).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate field in {}", def.type_name);
        }
    }

    #[test]
    fn test_option_types_have_no_extattrs() {
        assert!(!option_space().extattrs);
        assert!(option_space().delete_retry);
        assert!(!option_definition().extattrs);
        assert!(!option_space().return_fields().contains(&"extattrs".to_string()));
    }

    #[test]
    fn test_range_request_body() {
        let state = obj(json!({
            "start_addr": "10.0.0.10",
            "end_addr": "10.0.0.50",
            "network": "10.0.0.0/24",
            "network_view": "default",
            "server_association_type": "MEMBER",
            "member": {"name": "infoblox.localdomain", "ipv4addr": null, "ipv6addr": null},
            "exclude": [{"start_address": "10.0.0.20", "end_address": "10.0.0.25", "comment": null}],
            "bootfile": "pxelinux.0",
            "use_bootfile": null,
            "template": "tmpl"
        }));

        let body = fields::expand(&range().fields, &state, Operation::Create);
        assert_eq!(body["member"], json!({"_struct": "dhcpmember", "name": "infoblox.localdomain"}));
        assert_eq!(
            body["exclude"],
            json!([{"_struct": "exclusionrange", "start_address": "10.0.0.20", "end_address": "10.0.0.25"}])
        );
        assert_eq!(body["use_bootfile"], json!(true));
        assert_eq!(body["template"], json!("tmpl"));

        let update = fields::expand(&range().fields, &state, Operation::Update);
        assert!(update.get("template").is_none());
    }

    #[test]
    fn test_fixed_address_validation() {
        let res = WapiResource::new(Arc::new(fixed_address()));
        let config = ResourceState::from_object(obj(json!({
            "ipv4addr": "10.0.0.5",
            "mac": "not-a-mac",
            "match_client": "SOMETHING",
            "options": [{"name": "ntp-servers", "value": "10.0.0.1", "use_option": true}]
        })));

        let diags = res.validate(&config);
        let paths: Vec<Vec<String>> = diags.iter().filter_map(|d| d.attribute.clone()).collect();
        assert!(paths.contains(&vec!["mac".to_string()]));
        assert!(paths.contains(&vec!["match_client".to_string()]));
        assert!(paths.contains(&vec!["options".to_string(), "0".to_string(), "use_option".to_string()]));
    }

    #[test]
    fn test_filter_option_maps_option_list() {
        let response = obj(json!({
            "_ref": "filteroption/abc",
            "name": "pxe",
            "option_list": [
                {"name": "dhcp-lease-time", "num": 51, "value": "600", "vendor_class": "DHCP", "use_option": false},
                {"name": "domain-name", "num": 15, "value": "example.com", "vendor_class": "DHCP"}
            ]
        }));
        let prior = obj(json!({"option_list": [{"name": "domain-name", "value": "example.com"}]}));

        let state = filter_option().flatten(&response, Some(&prior));
        assert_eq!(state["option_list"].as_array().map(Vec::len), Some(1));
        assert_eq!(state["option_list"][0]["num"], json!(15));
    }

    #[test]
    fn test_option_definition_requires_code_and_type() {
        let res = WapiResource::new(Arc::new(option_definition()));
        let diags = res.validate(&ResourceState::from_object(obj(json!({
            "name": "custom-option",
            "code": 300,
            "type": "string"
        }))));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute, Some(vec!["code".to_string()]));
    }
}
