//! Host network adapter: interface discovery and routing table edits.

use super::{classify, HostNetwork, ToolOutcome};
use crate::error::CommandError;
use crate::system::{self, Invocation};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

/// `ip -o -4 addr show` line: `3: vboxnet0    inet 192.168.11.1/24 brd ...`
static IP_ADDR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+:\s+(\S+)\s+inet\s+(\d{1,3}(?:\.\d{1,3}){3})/").expect("Invalid ip addr regex")
});
/// `ifconfig` interface header: `vboxnet0: flags=8943<UP,...> mtu 1500`
static IFCONFIG_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\s:]+):\s+flags=").expect("Invalid ifconfig header regex"));
/// `ifconfig` address line: `\tinet 192.168.11.1 netmask 0xffffff00 ...`
static IFCONFIG_INET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+inet\s+(?:addr:)?(\d{1,3}(?:\.\d{1,3}){3})\b").expect("Invalid ifconfig inet regex")
});

const NO_SUCH_ROUTE: &[&str] = &["no such process", "not in table", "cannot find"];
const ROUTE_EXISTS: &[&str] = &["file exists", "route already in table"];

/// Routing command family of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFlavor {
    /// Linux `ip` / `ip route`
    Iproute2,
    /// macOS `ifconfig` / `route`
    Bsd,
}

impl RouteFlavor {
    pub fn native() -> Self {
        if cfg!(target_os = "macos") {
            RouteFlavor::Bsd
        } else {
            RouteFlavor::Iproute2
        }
    }
}

/// Find the interface carrying `address` in `ip -o -4 addr show` output.
pub fn parse_ip_addr(output: &str, address: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let caps = IP_ADDR_LINE.captures(line)?;
        (&caps[2] == address).then(|| caps[1].to_string())
    })
}

/// Find the interface carrying `address` in `ifconfig` output.
pub fn parse_ifconfig(output: &str, address: &str) -> Option<String> {
    let mut current: Option<&str> = None;
    for line in output.lines() {
        if let Some(caps) = IFCONFIG_HEADER.captures(line) {
            current = caps.get(1).map(|m| m.as_str());
        } else if let Some(caps) = IFCONFIG_INET.captures(line) {
            if &caps[1] == address {
                return current.map(str::to_string);
            }
        }
    }
    None
}

/// Production host network driven through system commands.
#[derive(Debug, Clone)]
pub struct SystemHost {
    flavor: RouteFlavor,
    /// Prefix for routing-table mutations (e.g. `sudo`)
    privilege: Option<String>,
}

impl SystemHost {
    pub fn new(flavor: RouteFlavor, privilege: Option<String>) -> Self {
        SystemHost { flavor, privilege }
    }

    pub fn native(privilege: Option<String>) -> Self {
        Self::new(RouteFlavor::native(), privilege)
    }

    pub fn address_invocation(&self) -> Invocation {
        match self.flavor {
            RouteFlavor::Iproute2 => Invocation::new("ip").args(["-o", "-4", "addr", "show"]),
            RouteFlavor::Bsd => Invocation::new("ifconfig"),
        }
    }

    pub fn delete_route_invocation(&self, subnet: &str) -> Invocation {
        let inv = match self.flavor {
            RouteFlavor::Iproute2 => Invocation::new("ip").args(["route", "del", subnet]),
            RouteFlavor::Bsd => Invocation::new("route").args(["delete", "-net", subnet]),
        };
        inv.privileged(self.privilege.as_deref())
    }

    pub fn add_route_invocation(&self, subnet: &str, gateway: &str) -> Invocation {
        let inv = match self.flavor {
            RouteFlavor::Iproute2 => Invocation::new("ip").args(["route", "add", subnet, "via", gateway]),
            RouteFlavor::Bsd => Invocation::new("route").args(["add", "-net", subnet, gateway]),
        };
        inv.privileged(self.privilege.as_deref())
    }
}

#[async_trait]
impl HostNetwork for SystemHost {
    async fn interface_with_address(&self, address: &str) -> Result<Option<String>, CommandError> {
        let out = system::run(&self.address_invocation()).await?;
        Ok(match self.flavor {
            RouteFlavor::Iproute2 => parse_ip_addr(&out.stdout, address),
            RouteFlavor::Bsd => parse_ifconfig(&out.stdout, address),
        })
    }

    async fn delete_route(&self, subnet: &str) -> ToolOutcome {
        classify(
            system::run(&self.delete_route_invocation(subnet)).await,
            NO_SUCH_ROUTE,
        )
    }

    async fn add_route(&self, subnet: &str, gateway: &str) -> ToolOutcome {
        classify(
            system::run(&self.add_route_invocation(subnet, gateway)).await,
            ROUTE_EXISTS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP_OUTPUT: &str = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever
2: eth0    inet 10.1.4.17/22 brd 10.1.7.255 scope global dynamic eth0\\       valid_lft 86000sec
5: vboxnet1    inet 192.168.11.1/24 brd 192.168.11.255 scope global vboxnet1\\       valid_lft forever
";

    const IFCONFIG_OUTPUT: &str = "\
lo0: flags=8049<UP,LOOPBACK,RUNNING,MULTICAST> mtu 16384
\tinet 127.0.0.1 netmask 0xff000000
en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether 8c:85:90:00:00:00
\tinet 10.1.4.17 netmask 0xfffffc00 broadcast 10.1.7.255
vboxnet0: flags=8943<UP,BROADCAST,RUNNING,PROMISC,SIMPLEX,MULTICAST> mtu 1500
\tether 0a:00:27:00:00:00
\tinet 192.168.11.1 netmask 0xffffff00 broadcast 192.168.11.255
";

    #[test]
    fn test_parse_ip_addr_finds_interface() {
        assert_eq!(
            parse_ip_addr(IP_OUTPUT, "192.168.11.1"),
            Some("vboxnet1".to_string())
        );
        assert_eq!(parse_ip_addr(IP_OUTPUT, "192.168.11.2"), None);
    }

    #[test]
    fn test_parse_ip_addr_no_prefix_match() {
        // 10.1.4.1 must not match 10.1.4.17
        assert_eq!(parse_ip_addr(IP_OUTPUT, "10.1.4.1"), None);
    }

    #[test]
    fn test_parse_ifconfig_finds_interface() {
        assert_eq!(
            parse_ifconfig(IFCONFIG_OUTPUT, "192.168.11.1"),
            Some("vboxnet0".to_string())
        );
        assert_eq!(parse_ifconfig(IFCONFIG_OUTPUT, "10.1.4.17"), Some("en0".to_string()));
        assert_eq!(parse_ifconfig(IFCONFIG_OUTPUT, "192.168.11.6"), None);
    }

    #[test]
    fn test_route_invocations_linux() {
        let host = SystemHost::new(RouteFlavor::Iproute2, Some("sudo".into()));
        assert_eq!(
            host.delete_route_invocation("10.144.0.0/16").display(),
            "sudo ip route del 10.144.0.0/16"
        );
        assert_eq!(
            host.add_route_invocation("10.144.0.0/16", "192.168.11.6").display(),
            "sudo ip route add 10.144.0.0/16 via 192.168.11.6"
        );
    }

    #[test]
    fn test_route_invocations_bsd_unprivileged() {
        let host = SystemHost::new(RouteFlavor::Bsd, None);
        assert_eq!(
            host.delete_route_invocation("10.144.0.0/16").display(),
            "route delete -net 10.144.0.0/16"
        );
        assert_eq!(
            host.add_route_invocation("10.144.0.0/16", "192.168.11.6").display(),
            "route add -net 10.144.0.0/16 192.168.11.6"
        );
        assert_eq!(host.address_invocation().display(), "ifconfig");
    }
}
