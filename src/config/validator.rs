//! Config validation.

use crate::config::BootstrapConfig;
use crate::error::ConfigError;
use crate::models::{InstallSource, NetworkConfig};
use crate::orchestrator::phases::DIRECTOR_TOOL;
use std::collections::HashSet;
use std::net::Ipv4Addr;

/// Parse a dotted-quad IPv4 address.
pub fn validate_ipv4(field: &str, value: &str) -> Result<Ipv4Addr, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::ValidationFailed(format!(
            "{} cannot be empty",
            field
        )));
    }

    value.parse::<Ipv4Addr>().map_err(|_| {
        ConfigError::ValidationFailed(format!(
            "{} must be an IPv4 address, got: {}",
            field, value
        ))
    })
}

/// Parse `a.b.c.d/len` into its network address and prefix length.
pub fn validate_cidr(field: &str, value: &str) -> Result<(Ipv4Addr, u8), ConfigError> {
    let (addr, len) = value.split_once('/').ok_or_else(|| {
        ConfigError::ValidationFailed(format!(
            "{} must be in CIDR notation (a.b.c.d/len), got: {}",
            field, value
        ))
    })?;

    let addr = validate_ipv4(field, addr)?;
    let len: u8 = len.parse().map_err(|_| {
        ConfigError::ValidationFailed(format!(
            "{} prefix length must be a number, got: {}",
            field, len
        ))
    })?;

    if len > 32 {
        return Err(ConfigError::ValidationFailed(format!(
            "{} prefix length must be at most 32, got: {}",
            field, len
        )));
    }

    Ok((addr, len))
}

fn prefix_mask(len: u8) -> u32 {
    if len == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(len))
    }
}

/// Whether `addr` falls inside `network/len`.
pub fn cidr_contains(network: Ipv4Addr, len: u8, addr: Ipv4Addr) -> bool {
    let mask = prefix_mask(len);
    (u32::from(network) & mask) == (u32::from(addr) & mask)
}

/// NAT network CIDR plus DHCP server and range consistency.
pub fn validate_network(network: &NetworkConfig) -> Result<(), ConfigError> {
    if network.name.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Network name cannot be empty".to_string(),
        ));
    }

    let (net, len) = validate_cidr("network.cidr", &network.cidr)?;

    if !network.dhcp_enabled {
        return Ok(());
    }

    let dhcp = &network.dhcp;
    let server = validate_ipv4("network.dhcp.server_ip", &dhcp.server_ip)?;
    let lower = validate_ipv4("network.dhcp.lower_ip", &dhcp.lower_ip)?;
    let upper = validate_ipv4("network.dhcp.upper_ip", &dhcp.upper_ip)?;
    validate_ipv4("network.dhcp.netmask", &dhcp.netmask)?;

    for (name, addr) in [("server_ip", server), ("lower_ip", lower), ("upper_ip", upper)] {
        if !cidr_contains(net, len, addr) {
            return Err(ConfigError::ConflictDetected(format!(
                "DHCP {} {} is outside network {}",
                name, addr, network.cidr
            )));
        }
    }

    if u32::from(lower) > u32::from(upper) {
        return Err(ConfigError::ConflictDetected(format!(
            "DHCP range is inverted: lower {} is above upper {}",
            lower, upper
        )));
    }

    Ok(())
}

/// Tool list: unique non-empty names and http(s) sources.
pub fn validate_tools(config: &BootstrapConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for tool in &config.tools {
        if tool.name.is_empty() || tool.name.contains('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "Tool name '{}' must be a non-empty file name",
                tool.name
            )));
        }

        if !seen.insert(tool.name.as_str()) {
            return Err(ConfigError::ConflictDetected(format!(
                "Tool '{}' is declared more than once",
                tool.name
            )));
        }

        let url = tool.source.url();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::ValidationFailed(format!(
                "Tool '{}' source must be an http(s) URL, got: {}",
                tool.name, url
            )));
        }

        if let InstallSource::Archive { member, .. } = &tool.source {
            if member.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Tool '{}' archive member cannot be empty",
                    tool.name
                )));
            }
        }
    }

    if !seen.contains(DIRECTOR_TOOL) {
        return Err(ConfigError::ValidationFailed(format!(
            "Tool list must include '{}'",
            DIRECTOR_TOOL
        )));
    }

    Ok(())
}

/// Comprehensive validation of all config params.
pub fn validate_all(config: &BootstrapConfig) -> Result<(), ConfigError> {
    validate_network(&config.network)?;

    let director = &config.director;
    let internal_ip = validate_ipv4("director.internal_ip", &director.internal_ip)?;
    validate_ipv4("director.internal_gw", &director.internal_gw)?;
    let (net, len) = validate_cidr("director.internal_cidr", &director.internal_cidr)?;
    if !cidr_contains(net, len, internal_ip) {
        return Err(ConfigError::ConflictDetected(format!(
            "Director IP {} is outside its network {}",
            internal_ip, director.internal_cidr
        )));
    }

    if director.base_manifest.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Director base manifest cannot be empty".to_string(),
        ));
    }

    if director.overlays.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Director overlay list cannot be empty".to_string(),
        ));
    }

    validate_cidr("route.subnet", &config.route.subnet)?;
    validate_ipv4("route.gateway", &config.route.gateway)?;
    validate_ipv4("dev_vm.gateway_address", &config.dev_vm.gateway_address)?;

    if config.dev_vm.name_prefix.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Development VM name prefix cannot be empty".to_string(),
        ));
    }

    if config.repository.url.is_empty() || config.repository.directory.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Repository url and directory must be set".to_string(),
        ));
    }

    validate_tools(config)?;
    Ok(())
}

/// Validate config (alias for validate_all).
pub fn validate_config(config: &BootstrapConfig) -> Result<(), ConfigError> {
    validate_all(config)
}
