//! Target records and their file_sd representation

use serde::Serialize;

use netbox_sd_inventory::{IpAddress, IpFamily};

use crate::labels::LabelSet;

/// One entry of a file_sd target file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetRecord {
    /// `host:port` or bare host strings
    pub targets: Vec<String>,
    /// Labels shared by all targets of this record
    pub labels: LabelSet,
}

/// Format an address as a scrape endpoint
///
/// The prefix length is dropped. IPv6 hosts are bracketed when a port is
/// appended.
#[must_use]
pub fn endpoint(addr: &IpAddress, port: Option<u16>) -> String {
    match (port, addr.family()) {
        (None, _) => addr.host().to_string(),
        (Some(port), Some(IpFamily::V4)) => format!("{}:{port}", addr.host()),
        (Some(port), _) => format!("[{}]:{port}", addr.host()),
    }
}

/// Format every address with the same optional port
#[must_use]
pub fn endpoints(addrs: &[&IpAddress], port: Option<u16>) -> Vec<String> {
    addrs.iter().map(|a| endpoint(a, port)).collect()
}

/// Serialize records into the YAML document read by file_sd
///
/// # Panics
/// Panics if serialization fails. Records only hold strings, so a failure
/// here is a bug and not a runtime condition.
#[must_use]
pub fn render_targets(records: &[TargetRecord]) -> String {
    match serde_yaml::to_string(records) {
        Ok(yaml) => yaml,
        Err(e) => panic!("serializing targets to yaml failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbox_sd_inventory::IpStatus;

    #[test]
    fn test_endpoint() {
        let v4 = IpAddress::new("192.0.2.1/24", IpStatus::Active);
        let v6 = IpAddress::new("2001:db8::1/64", IpStatus::Active);

        assert_eq!(endpoint(&v4, None), "192.0.2.1");
        assert_eq!(endpoint(&v4, Some(9100)), "192.0.2.1:9100");
        assert_eq!(endpoint(&v6, None), "2001:db8::1");
        assert_eq!(endpoint(&v6, Some(9100)), "[2001:db8::1]:9100");
        assert_eq!(endpoints(&[&v4, &v6], Some(0)), ["192.0.2.1:0", "[2001:db8::1]:0"]);
    }

    #[test]
    fn test_render_shape() {
        let mut labels = LabelSet::new();
        labels.insert("netbox_site".to_string(), "fra1".to_string());
        labels.insert("env".to_string(), "prod".to_string());

        let records = vec![TargetRecord {
            targets: vec!["[2001:db8::1]:9100".to_string()],
            labels,
        }];

        let yaml = render_targets(&records);
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let entry = &parsed[0];
        assert_eq!(entry["targets"][0].as_str(), Some("[2001:db8::1]:9100"));
        assert_eq!(entry["labels"]["netbox_site"].as_str(), Some("fra1"));

        // label keys are sorted
        assert!(yaml.find("env").unwrap() < yaml.find("netbox_site").unwrap());
    }

    #[test]
    fn test_render_empty() {
        let parsed: serde_yaml::Value = serde_yaml::from_str(&render_targets(&[])).unwrap();
        assert_eq!(parsed.as_sequence().map(Vec::len), Some(0));
    }
}
