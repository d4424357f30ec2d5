//! Address selection

use tracing::warn;

use netbox_sd_inventory::{IpAddress, IpFamily};

use crate::config::{Flags, InetFamily};

/// Which and how many addresses a group exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPolicy {
    pub family: InetFamily,
    pub all_addresses: bool,
}

impl From<&Flags> for AddressPolicy {
    fn from(flags: &Flags) -> Self {
        Self {
            family: flags.inet_family,
            all_addresses: flags.all_addresses,
        }
    }
}

/// Pick the addresses to expose from `candidates`, in input order
///
/// Only addresses with status active, dhcp or slaac of an accepted family are
/// considered. With `all_addresses` every such address is returned once
/// (deduplicated by address). Otherwise at most one is returned: the first
/// IPv6 address, or the first legacy address if there is no IPv6 one.
///
/// An address that can't be parsed at all empties the whole result.
pub fn select_addresses<'a, I>(candidates: I, policy: AddressPolicy) -> Vec<&'a IpAddress>
where
    I: IntoIterator<Item = Option<&'a IpAddress>>,
{
    let mut first_v6 = None;
    let mut first_v4 = None;
    let mut result: Vec<&IpAddress> = Vec::new();

    for addr in candidates.into_iter().flatten() {
        if !addr.is_usable() {
            continue;
        }

        let Some(family) = addr.family() else {
            warn!(address = %addr.address, "got unsupported address family from inventory");
            return Vec::new();
        };

        if !policy.family.allows(family) {
            continue;
        }

        let first = match family {
            IpFamily::V6 => &mut first_v6,
            IpFamily::V4 => &mut first_v4,
        };
        if first.is_none() {
            *first = Some(addr);
        }

        if policy.all_addresses && !result.iter().any(|a| a.address == addr.address) {
            result.push(addr);
        }
    }

    if result.is_empty()
        && let Some(addr) = first_v6.or(first_v4)
    {
        result.push(addr);
    }

    result
}
