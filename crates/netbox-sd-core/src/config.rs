//! Group configuration
//!
//! `GroupConfig` is the shape found in the configuration file. It is turned
//! into an immutable [`Group`] by [`validate_groups`] before any worker starts.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use netbox_sd_inventory::IpFamily;

use crate::error::ConfigError;
use crate::labels::{LABEL_PREFIX, LabelSet};

// ============================================================================
// Raw configuration
// ============================================================================

/// One group as written in the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Output file
    #[serde(default)]
    pub file: String,
    /// `device_tag`, `interface_tag` or `service`
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Tag or service name to look for
    #[serde(default, rename = "match")]
    pub match_value: String,
    /// Overrides the global scan interval
    pub scan_interval: Option<String>,
    /// Static labels added to every target
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Port appended to every target address
    pub port: Option<i64>,
    /// Selection flags
    #[serde(default)]
    pub flags: FlagsConfig,
    /// Label filters
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

/// Selection flags as written in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagsConfig {
    /// Also look at virtual machines
    #[serde(default = "default_include_vms")]
    pub include_vms: bool,
    /// `any`, `inet` or `inet6`
    #[serde(default = "default_inet_family")]
    pub inet_family: String,
    /// Return every usable address instead of one
    #[serde(default)]
    pub all_addresses: bool,
}

fn default_include_vms() -> bool {
    true
}

fn default_inet_family() -> String {
    "any".to_string()
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            include_vms: default_include_vms(),
            inet_family: default_inet_family(),
            all_addresses: false,
        }
    }
}

/// A filter as written in the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Label the filter looks at
    #[serde(default)]
    pub label: String,
    /// Regular expression
    #[serde(default, rename = "match")]
    pub pattern: String,
    /// Invert the match
    #[serde(default)]
    pub negate: bool,
}

// ============================================================================
// Validated configuration
// ============================================================================

/// How a group selects inventory records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Devices and VMs carrying a tag
    DeviceTag,
    /// Interfaces carrying a tag
    InterfaceTag,
    /// Services with a given name
    Service,
}

impl GroupKind {
    /// Parse the configuration value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "device_tag" => Some(GroupKind::DeviceTag),
            "interface_tag" => Some(GroupKind::InterfaceTag),
            "service" => Some(GroupKind::Service),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::DeviceTag => "device_tag",
            GroupKind::InterfaceTag => "interface_tag",
            GroupKind::Service => "service",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address families a group accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InetFamily {
    #[default]
    Any,
    /// Legacy IP only
    Inet,
    /// IPv6 only
    Inet6,
}

impl InetFamily {
    /// Parse the configuration value
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "any" => Some(InetFamily::Any),
            "inet" => Some(InetFamily::Inet),
            "inet6" => Some(InetFamily::Inet6),
            _ => None,
        }
    }

    /// Whether addresses of `family` are accepted
    #[must_use]
    pub fn allows(self, family: IpFamily) -> bool {
        matches!(
            (self, family),
            (InetFamily::Any, _) | (InetFamily::Inet, IpFamily::V4) | (InetFamily::Inet6, IpFamily::V6)
        )
    }
}

/// Selection flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    pub include_vms: bool,
    pub inet_family: InetFamily,
    pub all_addresses: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            include_vms: true,
            inet_family: InetFamily::Any,
            all_addresses: false,
        }
    }
}

/// A compiled label filter
#[derive(Debug, Clone)]
pub struct Filter {
    /// Label the filter looks at
    pub label: String,
    /// Compiled expression
    pub regex: Regex,
    /// Invert the match
    pub negate: bool,
}

/// A validated group
#[derive(Debug, Clone)]
pub struct Group {
    /// Output file, also the group's identity
    pub file: String,
    pub kind: GroupKind,
    /// Tag or service name
    pub match_value: String,
    pub scan_interval: Duration,
    /// Static labels, applied after all derived labels
    pub labels: LabelSet,
    pub port: Option<u16>,
    pub flags: Flags,
    pub filters: Vec<Filter>,
}

impl Group {
    /// Create a group with default flags, no labels, no port and no filters
    pub fn new(file: impl Into<String>, kind: GroupKind, match_value: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            match_value: match_value.into(),
            scan_interval: Duration::from_secs(60),
            labels: LabelSet::new(),
            port: None,
            flags: Flags::default(),
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Parse a scan interval such as `30s`, `5m` or `1h30m`
///
/// # Errors
/// Fails for unparsable and zero durations.
pub fn parse_interval(value: &str, scope: &str) -> Result<Duration, ConfigError> {
    let bad = |reason: String| ConfigError::BadScanInterval {
        scope: scope.to_string(),
        value: value.to_string(),
        reason,
    };

    let interval = humantime::parse_duration(value).map_err(|e| bad(e.to_string()))?;
    if interval.is_zero() {
        return Err(bad("must be greater than zero".to_string()));
    }
    Ok(interval)
}

impl GroupConfig {
    /// Validate one group. `index` is only used for error reporting.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self, index: usize, default_interval: Duration) -> Result<Group, ConfigError> {
        let missing = |key| ConfigError::MissingGroupValue { group: index, key };

        if self.file.is_empty() {
            return Err(missing("file"));
        }
        if self.kind.is_empty() {
            return Err(missing("type"));
        }
        if self.match_value.is_empty() {
            return Err(missing("match"));
        }

        let kind = GroupKind::parse(&self.kind).ok_or_else(|| ConfigError::BadGroupType {
            group: index,
            value: self.kind.clone(),
        })?;

        let scan_interval = match &self.scan_interval {
            Some(value) => parse_interval(value, &format!("group {index}"))?,
            None => default_interval,
        };

        let port = self
            .port
            .map(|p| {
                u16::try_from(p).map_err(|_| ConfigError::BadPort {
                    group: index,
                    value: p,
                })
            })
            .transpose()?;

        let inet_family =
            InetFamily::parse(&self.flags.inet_family).ok_or_else(|| ConfigError::BadInetFamily {
                group: index,
                value: self.flags.inet_family.clone(),
            })?;

        let filters = self
            .filters
            .iter()
            .enumerate()
            .map(|(i, f)| f.compile(index, i))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Group {
            file: self.file.clone(),
            kind,
            match_value: self.match_value.clone(),
            scan_interval,
            labels: self.labels.clone(),
            port,
            flags: Flags {
                include_vms: self.flags.include_vms,
                inet_family,
                all_addresses: self.flags.all_addresses,
            },
            filters,
        })
    }
}

impl FilterConfig {
    fn compile(&self, group: usize, filter: usize) -> Result<Filter, ConfigError> {
        if !self.label.starts_with(LABEL_PREFIX) {
            return Err(ConfigError::BadFilterLabel {
                group,
                filter,
                label: self.label.clone(),
            });
        }

        let regex = Regex::new(&self.pattern).map_err(|source| ConfigError::BadFilterMatch {
            group,
            filter,
            source,
        })?;

        Ok(Filter {
            label: self.label.clone(),
            regex,
            negate: self.negate,
        })
    }
}

/// Validate all groups and make sure no two of them share an output file
///
/// # Errors
/// Returns the first problem found, in file order.
pub fn validate_groups(
    groups: &[GroupConfig],
    default_interval: Duration,
) -> Result<Vec<Group>, ConfigError> {
    if groups.is_empty() {
        return Err(ConfigError::MissingRequired("groups"));
    }

    let mut known_files = HashSet::new();
    let mut validated = Vec::with_capacity(groups.len());

    for (index, raw) in groups.iter().enumerate() {
        if !raw.file.is_empty() && !known_files.insert(raw.file.as_str()) {
            return Err(ConfigError::DuplicateFile {
                group: index,
                file: raw.file.clone(),
            });
        }
        validated.push(raw.validate(index, default_interval)?);
    }

    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(file: &str, kind: &str) -> GroupConfig {
        GroupConfig {
            file: file.to_string(),
            kind: kind.to_string(),
            match_value: "node_exporter".to_string(),
            ..Default::default()
        }
    }

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_defaults_applied() {
        let group = raw("a.yml", "device_tag").validate(0, MINUTE).unwrap();

        assert_eq!(group.kind, GroupKind::DeviceTag);
        assert_eq!(group.scan_interval, MINUTE);
        assert_eq!(group.flags, Flags::default());
        assert!(group.flags.include_vms);
        assert_eq!(group.port, None);
    }

    #[test]
    fn test_group_interval_overrides_global() {
        let mut cfg = raw("a.yml", "service");
        cfg.scan_interval = Some("1m30s".to_string());

        let group = cfg.validate(0, MINUTE).unwrap();
        assert_eq!(group.scan_interval, Duration::from_secs(90));
    }

    #[test]
    fn test_missing_values() {
        let mut cfg = raw("", "service");
        assert!(matches!(
            cfg.validate(3, MINUTE),
            Err(ConfigError::MissingGroupValue { group: 3, key: "file" })
        ));

        cfg.file = "x.yml".to_string();
        cfg.match_value.clear();
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::MissingGroupValue { key: "match", .. })
        ));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(
            raw("a.yml", "rack_tag").validate(1, MINUTE),
            Err(ConfigError::BadGroupType { group: 1, .. })
        ));

        let mut cfg = raw("a.yml", "device_tag");
        cfg.port = Some(65536);
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadPort { value: 65536, .. })
        ));

        cfg.port = Some(-1);
        assert!(matches!(cfg.validate(0, MINUTE), Err(ConfigError::BadPort { .. })));

        cfg.port = Some(0);
        assert_eq!(cfg.validate(0, MINUTE).unwrap().port, Some(0));

        let mut cfg = raw("a.yml", "device_tag");
        cfg.flags.inet_family = "ipx".to_string();
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadInetFamily { .. })
        ));

        let mut cfg = raw("a.yml", "device_tag");
        cfg.scan_interval = Some("soon".to_string());
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadScanInterval { .. })
        ));

        cfg.scan_interval = Some("0s".to_string());
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadScanInterval { .. })
        ));
    }

    #[test]
    fn test_filters() {
        let mut cfg = raw("a.yml", "device_tag");
        cfg.filters.push(FilterConfig {
            label: "netbox_site".to_string(),
            pattern: "^fra".to_string(),
            negate: true,
        });
        let group = cfg.validate(0, MINUTE).unwrap();
        assert_eq!(group.filters.len(), 1);
        assert!(group.filters[0].negate);

        cfg.filters.push(FilterConfig {
            label: "site".to_string(),
            pattern: ".*".to_string(),
            negate: false,
        });
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadFilterLabel { filter: 1, .. })
        ));

        cfg.filters[1] = FilterConfig {
            label: "netbox_role".to_string(),
            pattern: "([".to_string(),
            negate: false,
        };
        assert!(matches!(
            cfg.validate(0, MINUTE),
            Err(ConfigError::BadFilterMatch { filter: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_files() {
        let groups = vec![raw("a.yml", "service"), raw("a.yml", "device_tag")];
        assert!(matches!(
            validate_groups(&groups, MINUTE),
            Err(ConfigError::DuplicateFile { group: 1, .. })
        ));

        assert!(matches!(
            validate_groups(&[], MINUTE),
            Err(ConfigError::MissingRequired("groups"))
        ));
    }

    #[test]
    fn test_inet_family_allows() {
        assert!(InetFamily::Any.allows(IpFamily::V4));
        assert!(InetFamily::Any.allows(IpFamily::V6));
        assert!(InetFamily::Inet.allows(IpFamily::V4));
        assert!(!InetFamily::Inet.allows(IpFamily::V6));
        assert!(!InetFamily::Inet6.allows(IpFamily::V4));
    }
}
