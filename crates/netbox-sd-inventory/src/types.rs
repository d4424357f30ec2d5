//! Inventory type definitions

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Deserializer};

use crate::custom_field::CustomFieldMap;

/// Status value of a device or VM that may be used as a target
pub const STATUS_DEVICE_ACTIVE: &str = "active";

// ============================================================================
// Helpers
// ============================================================================

/// Inventory IDs arrive as strings over GraphQL and as numbers over REST.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id '{s}'"))),
        RawId::Number(n) => Ok(n),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A nested object that is only referenced by its name
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Name {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn name_of(value: &Option<Name>) -> &str {
    value.as_ref().map_or("", |n| n.name.as_str())
}

// ============================================================================
// Devices & VMs
// ============================================================================

/// A device or virtual machine
///
/// VMs share this type; `is_virtual` is set by the client for records that came
/// from a VM-scoped query. VMs have no rack, serial number or asset tag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Device {
    /// Inventory ID
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    /// Device name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Primary legacy IP
    #[serde(default)]
    pub primary_ip4: Option<IpAddress>,
    /// Primary IPv6
    #[serde(default)]
    pub primary_ip6: Option<IpAddress>,
    /// Custom fields
    #[serde(default)]
    pub custom_fields: CustomFieldMap,
    #[serde(default)]
    pub rack: Option<Name>,
    #[serde(default)]
    pub site: Option<Name>,
    #[serde(default)]
    pub role: Option<Name>,
    #[serde(default)]
    pub tenant: Option<Name>,
    #[serde(default)]
    pub platform: Option<Name>,
    /// Serial number
    #[serde(default, rename = "serial", deserialize_with = "null_as_default")]
    pub serial_number: String,
    /// Asset tag
    #[serde(default, deserialize_with = "null_as_default")]
    pub asset_tag: String,
    /// Lifecycle status (`active`, `offline`, `planned`, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Name>,
    /// Whether this record is a virtual machine
    #[serde(skip)]
    pub is_virtual: bool,
}

impl Device {
    /// Whether the device is marked active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_DEVICE_ACTIVE)
    }

    #[must_use]
    pub fn rack_name(&self) -> &str {
        name_of(&self.rack)
    }

    #[must_use]
    pub fn site_name(&self) -> &str {
        name_of(&self.site)
    }

    #[must_use]
    pub fn role_name(&self) -> &str {
        name_of(&self.role)
    }

    #[must_use]
    pub fn tenant_name(&self) -> &str {
        name_of(&self.tenant)
    }

    #[must_use]
    pub fn platform_name(&self) -> &str {
        name_of(&self.platform)
    }
}

// ============================================================================
// Interfaces
// ============================================================================

/// A device or VM interface
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Interface {
    /// Inventory ID
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    /// Interface name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Whether the interface is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Custom fields of the interface itself
    #[serde(default)]
    pub custom_fields: CustomFieldMap,
    /// Owning device or VM
    #[serde(default)]
    pub device: Option<Device>,
    /// Tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Name>,
    /// Whether this is a VM interface
    #[serde(skip)]
    pub is_virtual: bool,
}

// ============================================================================
// Services
// ============================================================================

/// A service bound to a device or a VM
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Service {
    /// Inventory ID
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    /// Service name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Owning device (mutually exclusive with `virtual_machine`)
    #[serde(default)]
    pub device: Option<Device>,
    /// Owning VM (mutually exclusive with `device`)
    #[serde(default)]
    pub virtual_machine: Option<Device>,
    /// Ports the service listens on
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<u16>,
    /// Addresses the service is bound to
    #[serde(default, deserialize_with = "null_as_default")]
    pub ipaddresses: Vec<IpAddress>,
    /// `tcp`, `udp` or `sctp`
    #[serde(default)]
    pub protocol: Option<String>,
    /// Custom fields of the service itself
    #[serde(default)]
    pub custom_fields: CustomFieldMap,
}

impl Service {
    /// The device or VM owning this service
    #[must_use]
    pub fn node(&self) -> Option<&Device> {
        self.virtual_machine.as_ref().or(self.device.as_ref())
    }

    /// Whether the service is bound to a VM
    #[must_use]
    pub fn is_on_vm(&self) -> bool {
        self.virtual_machine.is_some()
    }
}

// ============================================================================
// IP addresses
// ============================================================================

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("4"),
            IpFamily::V6 => f.write_str("6"),
        }
    }
}

/// Lifecycle status of an IP address
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum IpStatus {
    Active,
    Reserved,
    Deprecated,
    Dhcp,
    Slaac,
    /// Any status this crate doesn't know about
    Other(String),
}

impl From<String> for IpStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => IpStatus::Active,
            "reserved" => IpStatus::Reserved,
            "deprecated" => IpStatus::Deprecated,
            "dhcp" => IpStatus::Dhcp,
            "slaac" => IpStatus::Slaac,
            _ => IpStatus::Other(value),
        }
    }
}

/// VRF an address lives in. Addresses in the global table have none.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vrf {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// An IP address as stored in the inventory (usually in CIDR notation)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpAddress {
    /// Inventory ID
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: u64,
    /// Address, e.g. `2001:db8::1/64`
    pub address: String,
    /// Lifecycle status
    pub status: IpStatus,
    /// VRF
    #[serde(default)]
    pub vrf: Option<Vrf>,
}

impl IpAddress {
    /// Create an address without ID or VRF
    pub fn new(address: impl Into<String>, status: IpStatus) -> Self {
        Self {
            id: 0,
            address: address.into(),
            status,
            vrf: None,
        }
    }

    /// The address without its prefix length
    #[must_use]
    pub fn host(&self) -> &str {
        match self.address.rsplit_once('/') {
            Some((host, prefix)) if prefix.chars().all(|c| c.is_ascii_digit()) => host,
            _ => &self.address,
        }
    }

    /// Address family, or `None` when the address can't be parsed at all
    #[must_use]
    pub fn family(&self) -> Option<IpFamily> {
        match self.host().parse::<IpAddr>().ok()? {
            IpAddr::V4(_) => Some(IpFamily::V4),
            IpAddr::V6(_) => Some(IpFamily::V6),
        }
    }

    /// Whether the status allows using the address as a target
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(
            self.status,
            IpStatus::Active | IpStatus::Dhcp | IpStatus::Slaac
        )
    }
}
