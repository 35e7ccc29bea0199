//! Network interface collector.
//!
//! Addresses come from getifaddrs on Unix and from `sysinfo` elsewhere. On
//! Linux, interface statistics (up flag, link speed) are read for every name
//! in /proc/net/dev from /sys/class/net/<iface>/{flags,speed}.

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::HostPaths;
use crate::error::ProbeError;
use crate::format::NOT_AVAILABLE;
use crate::section::Section;

/// IFF_UP bit of the interface flags.
const IFF_UP: u64 = 0x1;

/// Address family of an interface address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Inet,
    Inet6,
    Link,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Inet => write!(f, "AF_INET"),
            AddressFamily::Inet6 => write!(f, "AF_INET6"),
            AddressFamily::Link if cfg!(any(target_os = "linux", target_os = "android")) => {
                write!(f, "AF_PACKET")
            }
            AddressFamily::Link => write!(f, "AF_LINK"),
        }
    }
}

/// An address bound to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub family: AddressFamily,
    pub address: String,
    pub netmask: Option<String>,
}

impl InterfaceAddress {
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text("Family", self.family.to_string());
        section.text("Address", &self.address);
        section.text(
            "Netmask",
            self.netmask.as_deref().unwrap_or(NOT_AVAILABLE),
        );
        section
    }
}

/// An interface and all of its addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub addresses: Vec<InterfaceAddress>,
    /// IFF_UP as reported alongside the addresses, when known.
    pub up_flag: Option<bool>,
}

/// Link state of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceStats {
    pub is_up: bool,
    /// Link speed in Mbps, 0 when unknown.
    pub speed_mbps: u64,
}

/// Builds the network section. Interfaces without a stats entry are shown as
/// down with no speed.
pub fn network_section(
    interfaces: &[Interface],
    stats: &HashMap<String, InterfaceStats>,
) -> Section {
    let mut section = Section::new();
    for iface in interfaces {
        let entry = stats.get(&iface.name);

        let mut group = Section::new();
        group.text(
            "Status",
            if entry.map(|s| s.is_up).unwrap_or(false) {
                "UP"
            } else {
                "DOWN"
            },
        );
        group.text(
            "Speed",
            match entry {
                Some(s) if s.speed_mbps > 0 => format!("{} Mbps", s.speed_mbps),
                _ => NOT_AVAILABLE.to_string(),
            },
        );
        group.list(
            "Addresses",
            iface.addresses.iter().map(InterfaceAddress::to_section).collect(),
        );
        section.group(iface.name.clone(), group);
    }
    section
}

/// Netmask for a prefix length, in the notation of the address family.
pub fn prefix_to_netmask(addr: &IpAddr, prefix: u8) -> String {
    match addr {
        IpAddr::V4(_) => {
            let bits = u32::MAX.checked_shl(32 - u32::from(prefix.min(32))).unwrap_or(0);
            Ipv4Addr::from(bits).to_string()
        }
        IpAddr::V6(_) => {
            let bits = u128::MAX.checked_shl(128 - u32::from(prefix.min(128))).unwrap_or(0);
            Ipv6Addr::from(bits).to_string()
        }
    }
}

fn format_mac(octets: &[u8]) -> String {
    octets
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Interface names listed in /proc/net/dev.
pub fn parse_netdev_names(content: &str) -> Vec<String> {
    content
        .lines()
        // Skip the first two header lines
        .skip(2)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Reads link state for every interface in /proc/net/dev.
pub fn read_interface_stats(paths: &HostPaths) -> Result<HashMap<String, InterfaceStats>, ProbeError> {
    let netdev = paths.proc("net/dev");
    let content = std::fs::read_to_string(&netdev).map_err(|e| ProbeError::from_io(&netdev, e))?;

    let mut stats = HashMap::new();
    for name in parse_netdev_names(&content) {
        let class_dir = paths.sys("class/net").join(&name);

        let is_up = match super::read_trimmed(&class_dir.join("flags")) {
            Ok(raw) => u64::from_str_radix(raw.trim_start_matches("0x"), 16)
                .map(|flags| flags & IFF_UP != 0)
                .unwrap_or(false),
            Err(e) => {
                tracing::debug!("No flags for {}: {}", name, e);
                false
            }
        };

        // Reading speed of a down or virtual link fails with EINVAL.
        let speed_mbps = super::read_number(&class_dir.join("speed"))
            .ok()
            .filter(|s| *s > 0)
            .map(|s| s as u64)
            .unwrap_or(0);

        stats.insert(name, InterfaceStats { is_up, speed_mbps });
    }

    Ok(stats)
}

/// Reads interface addresses with getifaddrs, grouped by interface in
/// first-seen order.
#[cfg(unix)]
pub fn read_interfaces() -> Result<Vec<Interface>, ProbeError> {
    use nix::net::if_::InterfaceFlags;

    let addrs = nix::ifaddrs::getifaddrs()
        .map_err(|e| ProbeError::Command(format!("getifaddrs: {}", e)))?;

    let mut interfaces: Vec<Interface> = Vec::new();
    for ifaddr in addrs {
        let idx = match interfaces.iter().position(|i| i.name == ifaddr.interface_name) {
            Some(idx) => idx,
            None => {
                interfaces.push(Interface {
                    name: ifaddr.interface_name.clone(),
                    addresses: Vec::new(),
                    up_flag: Some(ifaddr.flags.contains(InterfaceFlags::IFF_UP)),
                });
                interfaces.len() - 1
            }
        };

        let Some(address) = ifaddr.address.as_ref() else {
            continue;
        };
        let netmask = ifaddr.netmask.as_ref();

        let entry = if let Some(v4) = address.as_sockaddr_in() {
            InterfaceAddress {
                family: AddressFamily::Inet,
                address: v4.ip().to_string(),
                netmask: netmask
                    .and_then(|m| m.as_sockaddr_in())
                    .map(|m| m.ip().to_string()),
            }
        } else if let Some(v6) = address.as_sockaddr_in6() {
            InterfaceAddress {
                family: AddressFamily::Inet6,
                address: v6.ip().to_string(),
                netmask: netmask
                    .and_then(|m| m.as_sockaddr_in6())
                    .map(|m| m.ip().to_string()),
            }
        } else if let Some(mac) = address.as_link_addr().and_then(|l| l.addr()) {
            InterfaceAddress {
                family: AddressFamily::Link,
                address: format_mac(&mac),
                netmask: None,
            }
        } else {
            continue;
        };

        interfaces[idx].addresses.push(entry);
    }

    Ok(interfaces)
}

#[cfg(not(unix))]
pub fn read_interfaces() -> Result<Vec<Interface>, ProbeError> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    let mut interfaces: Vec<Interface> = networks
        .iter()
        .map(|(name, data)| {
            let mut addresses = vec![InterfaceAddress {
                family: AddressFamily::Link,
                address: data.mac_address().to_string(),
                netmask: None,
            }];
            addresses.extend(data.ip_networks().iter().map(|ip| InterfaceAddress {
                family: match ip.addr {
                    IpAddr::V4(_) => AddressFamily::Inet,
                    IpAddr::V6(_) => AddressFamily::Inet6,
                },
                address: ip.addr.to_string(),
                netmask: Some(prefix_to_netmask(&ip.addr, ip.prefix)),
            }));
            Interface {
                name: name.clone(),
                addresses,
                up_flag: None,
            }
        })
        .collect();
    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}

/// Link state per interface for this platform.
///
/// Linux reads sysfs; other hosts fall back to the up flag seen with the
/// addresses and report no speed.
pub fn collect_stats(
    paths: &HostPaths,
    interfaces: &[Interface],
) -> HashMap<String, InterfaceStats> {
    if cfg!(target_os = "linux") {
        match read_interface_stats(paths) {
            Ok(stats) => return stats,
            Err(e) => tracing::warn!("Interface statistics unavailable: {}", e),
        }
    }

    interfaces
        .iter()
        .filter_map(|iface| {
            iface.up_flag.map(|is_up| {
                (
                    iface.name.clone(),
                    InterfaceStats {
                        is_up,
                        speed_mbps: 0,
                    },
                )
            })
        })
        .collect()
}
