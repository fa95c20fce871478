//! Attribute validators
//!
//! Checked during `ValidateResourceConfig`. A null value always passes; the
//! required/optional check is separate.

use regex::Regex;
use serde_json::Value;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

static MAC_ADDRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").unwrap()
});

static DUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{1,2}:)+[0-9A-Fa-f]{1,2}$").unwrap()
});

/// Validation result type
pub type ValidationResult = Result<(), String>;

#[derive(Debug, Clone)]
pub enum Validator {
    Ipv4Address,
    Ipv6Address,
    Ipv4Cidr,
    Ipv6Cidr,
    MacAddress,
    Duid,
    OneOf(&'static [&'static str]),
    IntRange(i64, i64),
    Length(usize, usize),
    NoSurroundingWhitespace,
}

impl Validator {
    pub fn check(&self, value: &Value) -> ValidationResult {
        if value.is_null() {
            return Ok(());
        }

        match self {
            Validator::IntRange(min, max) => {
                let n = as_integer(value).ok_or_else(|| "expected a whole number".to_string())?;
                validate_int_range(n, *min, *max)
            }
            _ => {
                let s = value
                    .as_str()
                    .ok_or_else(|| "expected a string value".to_string())?;
                self.check_str(s)
            }
        }
    }

    fn check_str(&self, s: &str) -> ValidationResult {
        match self {
            Validator::Ipv4Address => validate_ipv4_address(s),
            Validator::Ipv6Address => validate_ipv6_address(s),
            Validator::Ipv4Cidr => validate_ipv4_cidr(s),
            Validator::Ipv6Cidr => validate_ipv6_cidr(s),
            Validator::MacAddress => validate_mac_address(s),
            Validator::Duid => validate_duid(s),
            Validator::OneOf(allowed) => validate_one_of(s, allowed),
            Validator::Length(min, max) => validate_length(s, *min, *max),
            Validator::NoSurroundingWhitespace => validate_no_surrounding_whitespace(s),
            Validator::IntRange(..) => Err("expected a whole number".to_string()),
        }
    }
}

/// Accept integral JSON numbers, including `3.0` as Terraform may send
pub fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

pub fn validate_ipv4_address(s: &str) -> ValidationResult {
    s.parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| format!("{:?} is not a valid IPv4 address", s))
}

pub fn validate_ipv6_address(s: &str) -> ValidationResult {
    s.parse::<Ipv6Addr>()
        .map(|_| ())
        .map_err(|_| format!("{:?} is not a valid IPv6 address", s))
}

fn split_cidr(s: &str) -> Option<(&str, u32)> {
    let (addr, prefix) = s.split_once('/')?;
    let prefix = prefix.parse::<u32>().ok()?;
    Some((addr, prefix))
}

pub fn validate_ipv4_cidr(s: &str) -> ValidationResult {
    let invalid = || format!("{:?} is not a valid IPv4 network in CIDR notation", s);
    let (addr, prefix) = split_cidr(s).ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    if prefix > 32 {
        return Err(invalid());
    }

    let host_mask = if prefix == 32 { 0 } else { u32::MAX >> prefix };
    if u32::from(addr) & host_mask != 0 {
        return Err(format!("{:?} has host bits set", s));
    }
    Ok(())
}

pub fn validate_ipv6_cidr(s: &str) -> ValidationResult {
    let invalid = || format!("{:?} is not a valid IPv6 network in CIDR notation", s);
    let (addr, prefix) = split_cidr(s).ok_or_else(invalid)?;
    let addr: Ipv6Addr = addr.parse().map_err(|_| invalid())?;
    if prefix > 128 {
        return Err(invalid());
    }

    let host_mask = if prefix == 128 { 0 } else { u128::MAX >> prefix };
    if u128::from(addr) & host_mask != 0 {
        return Err(format!("{:?} has host bits set", s));
    }
    Ok(())
}

pub fn validate_mac_address(s: &str) -> ValidationResult {
    if MAC_ADDRESS_REGEX.is_match(s) {
        Ok(())
    } else {
        Err(format!(
            "{:?} is not a valid MAC address, expected the form aa:bb:cc:dd:ee:ff",
            s
        ))
    }
}

pub fn validate_duid(s: &str) -> ValidationResult {
    if DUID_REGEX.is_match(s) {
        Ok(())
    } else {
        Err(format!("{:?} is not a valid DHCPv6 DUID", s))
    }
}

pub fn validate_one_of(s: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.contains(&s) {
        Ok(())
    } else {
        Err(format!(
            "{:?} must be one of: {}",
            s,
            allowed
                .iter()
                .map(|a| format!("{:?}", a))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}

pub fn validate_int_range(n: i64, min: i64, max: i64) -> ValidationResult {
    if n < min || n > max {
        Err(format!("value must be between {} and {}, got {}", min, max, n))
    } else {
        Ok(())
    }
}

pub fn validate_length(s: &str, min: usize, max: usize) -> ValidationResult {
    let len = s.chars().count();
    if len < min || len > max {
        Err(format!(
            "length must be between {} and {} characters, got {}",
            min, max, len
        ))
    } else {
        Ok(())
    }
}

pub fn validate_no_surrounding_whitespace(s: &str) -> ValidationResult {
    if s.trim() != s {
        Err(format!("{:?} must not have leading or trailing whitespace", s))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_always_passes() {
        assert!(Validator::MacAddress.check(&Value::Null).is_ok());
        assert!(Validator::IntRange(1, 2).check(&Value::Null).is_ok());
    }

    #[test]
    fn test_ip_addresses() {
        assert!(validate_ipv4_address("10.0.0.1").is_ok());
        assert!(validate_ipv4_address("10.0.0.256").is_err());
        assert!(validate_ipv4_address("2001:db8::1").is_err());
        assert!(validate_ipv6_address("2001:db8::1").is_ok());
        assert!(validate_ipv6_address("10.0.0.1").is_err());
    }

    #[test]
    fn test_cidrs() {
        assert!(validate_ipv4_cidr("10.0.0.0/24").is_ok());
        assert!(validate_ipv4_cidr("10.0.0.1/32").is_ok());
        assert!(validate_ipv4_cidr("0.0.0.0/0").is_ok());
        assert!(validate_ipv4_cidr("10.0.0.1/24").is_err());
        assert!(validate_ipv4_cidr("10.0.0.0/33").is_err());
        assert!(validate_ipv4_cidr("10.0.0.0").is_err());

        assert!(validate_ipv6_cidr("2001:db8::/64").is_ok());
        assert!(validate_ipv6_cidr("2001:db8::1/64").is_err());
        assert!(validate_ipv6_cidr("2001:db8::/129").is_err());
    }

    #[test]
    fn test_mac_and_duid() {
        assert!(validate_mac_address("aa:bb:cc:dd:ee:ff").is_ok());
        assert!(validate_mac_address("AA-BB-CC-DD-EE-FF").is_ok());
        assert!(validate_mac_address("aabb.ccdd.eeff").is_err());
        assert!(validate_duid("00:01:00:01:2a:3b").is_ok());
        assert!(validate_duid("not-a-duid").is_err());
    }

    #[test]
    fn test_one_of_and_length() {
        assert!(validate_one_of("MEMBER", &["NONE", "MEMBER"]).is_ok());
        let err = validate_one_of("member", &["NONE", "MEMBER"]).unwrap_err();
        assert!(err.contains("\"NONE\", \"MEMBER\""));

        assert!(validate_length("abc", 1, 3).is_ok());
        assert!(validate_length("", 1, 3).is_err());
        assert!(validate_no_surrounding_whitespace(" name").is_err());
        assert!(validate_no_surrounding_whitespace("name").is_ok());
    }

    #[test]
    fn test_check_types() {
        assert!(Validator::IntRange(1, 254).check(&json!(51)).is_ok());
        assert!(Validator::IntRange(1, 254).check(&json!(51.0)).is_ok());
        assert!(Validator::IntRange(1, 254).check(&json!(255)).is_err());
        assert!(Validator::IntRange(1, 254).check(&json!("51")).is_err());
        assert!(Validator::Ipv4Address.check(&json!(10)).is_err());
    }
}
