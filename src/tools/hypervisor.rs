//! `VBoxManage` adapter.

use super::{classify, Hypervisor, ToolOutcome};
use crate::error::CommandError;
use crate::models::NetworkConfig;
use crate::system::{self, Invocation};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// `list runningvms` line: `"name" {uuid}`
static RUNNING_VM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"(.+)"\s+\{[0-9A-Fa-f-]+\}\s*$"#).expect("valid regex"));

const ALREADY_EXISTS: &[&str] = &["already exist"];

/// Parse the output of `VBoxManage list runningvms`.
pub fn parse_running_vms(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| RUNNING_VM_LINE.captures(line.trim()))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Production hypervisor driven through the `VBoxManage` command.
#[derive(Debug, Clone)]
pub struct VBoxManage {
    program: PathBuf,
}

impl VBoxManage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        VBoxManage {
            program: program.into(),
        }
    }

    fn command(&self) -> Invocation {
        Invocation::new(&self.program)
    }

    /// `natnetwork add --netname N --network CIDR --enable --dhcp on|off`
    pub fn nat_network_invocation(&self, network: &NetworkConfig) -> Invocation {
        self.command().args([
            "natnetwork",
            "add",
            "--netname",
            network.name.as_str(),
            "--network",
            network.cidr.as_str(),
            "--enable",
            "--dhcp",
            if network.dhcp_enabled { "on" } else { "off" },
        ])
    }

    /// `dhcpserver add --netname N --ip S --netmask M --lowerip L --upperip U --enable`
    pub fn dhcp_server_invocation(&self, network: &NetworkConfig) -> Invocation {
        let dhcp = &network.dhcp;
        self.command().args([
            "dhcpserver",
            "add",
            "--netname",
            network.name.as_str(),
            "--ip",
            dhcp.server_ip.as_str(),
            "--netmask",
            dhcp.netmask.as_str(),
            "--lowerip",
            dhcp.lower_ip.as_str(),
            "--upperip",
            dhcp.upper_ip.as_str(),
            "--enable",
        ])
    }
}

#[async_trait]
impl Hypervisor for VBoxManage {
    async fn version(&self) -> Result<String, CommandError> {
        let out = system::run(&self.command().arg("--version")).await?;
        Ok(out.stdout.trim().to_string())
    }

    async fn running_vms(&self) -> Result<Vec<String>, CommandError> {
        let out = system::run(&self.command().args(["list", "runningvms"])).await?;
        Ok(parse_running_vms(&out.stdout))
    }

    async fn create_nat_network(&self, network: &NetworkConfig) -> ToolOutcome {
        classify(
            system::run(&self.nat_network_invocation(network)).await,
            ALREADY_EXISTS,
        )
    }

    async fn add_dhcp_server(&self, network: &NetworkConfig) -> ToolOutcome {
        classify(
            system::run(&self.dhcp_server_invocation(network)).await,
            ALREADY_EXISTS,
        )
    }
}
