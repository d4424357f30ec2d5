//! HTTP client for the NetBox API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{InventoryError, Result};
use crate::query::{GraphQuery, queries};
use crate::traits::InventorySource;
use crate::types::{Device, Interface, IpAddress, Service};

/// Oldest NetBox release whose GraphQL schema matches the queries in this crate
pub const MIN_NETBOX_VERSION: (u64, u64, u64) = (4, 0, 10);

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "netbox-version")]
    version: String,
}

/// HTTP client for a NetBox instance
#[derive(Debug, Clone)]
pub struct NetboxClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl NetboxClient {
    /// Create a new client
    ///
    /// `allow_insecure` disables TLS certificate verification.
    ///
    /// # Errors
    /// Returns an error if the URL or token is empty, the URL is invalid, or the
    /// underlying HTTP client can't be built.
    pub fn new(base_url: &str, token: &str, allow_insecure: bool) -> Result<Self> {
        if base_url.is_empty() {
            return Err(InventoryError::MissingSetting("base_url"));
        }
        if token.is_empty() {
            return Err(InventoryError::MissingSetting("api_token"));
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(allow_insecure)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Self::with_client(base_url, token, client)
    }

    /// Create a new client with a custom `reqwest::Client`
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid.
    pub fn with_client(base_url: &str, token: &str, client: Client) -> Result<Self> {
        // keep any path prefix when joining endpoint paths
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            token: token.to_string(),
        })
    }

    /// Build a full URL from a relative path
    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Check that the API is reachable, the token is accepted and the NetBox
    /// version is supported
    ///
    /// # Errors
    /// Returns `InvalidToken` on any non-200 answer and `IncompatibleVersion`
    /// for releases older than [`MIN_NETBOX_VERSION`].
    #[instrument(skip(self), fields(url = %self.base_url))]
    pub async fn verify_connectivity(&self) -> Result<String> {
        let url = self.url("api/status/")?;
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        if response.status().as_u16() != 200 {
            return Err(InventoryError::InvalidToken);
        }

        let body = response.text().await?;
        let status: StatusResponse = serde_json::from_str(&body)?;

        if !is_compatible(&status.version) {
            return Err(InventoryError::IncompatibleVersion(status.version));
        }

        debug!(version = %status.version, "netbox is compatible");
        Ok(status.version)
    }

    /// Run a list query and decode the records found under its result key
    async fn graphql<T: DeserializeOwned>(&self, query: &GraphQuery) -> Result<Vec<T>> {
        let url = self.url("graphql/")?;
        let body = json!({ "query": query.build() });

        debug!(query = %query, "sending GraphQL query");

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, self.auth_header())
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(InventoryError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InventoryError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        parse_list(&text, query.result_key())
    }
}

/// Decode a GraphQL response body into the list stored under `key`
fn parse_list<T: DeserializeOwned>(body: &str, key: &str) -> Result<Vec<T>> {
    let response: GraphQlResponse = serde_json::from_str(body)?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(InventoryError::GraphQl(messages.join("; ")));
    }

    match response.data.and_then(|mut data| data.remove(key)) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => Ok(serde_json::from_value(list)?),
    }
}

/// Parse `major.minor.patch`, ignoring a leading `v` and any suffix after `-`
fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let version = version.trim().trim_start_matches('v');
    let core = version.split(['-', '+']).next()?;

    let mut parts = core.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some((major, minor, patch))
}

fn is_compatible(version: &str) -> bool {
    parse_version(version).is_some_and(|v| v >= MIN_NETBOX_VERSION)
}

fn mark_virtual(mut devices: Vec<Device>) -> Vec<Device> {
    for dev in &mut devices {
        dev.is_virtual = true;
    }
    devices
}

#[async_trait]
impl InventorySource for NetboxClient {
    async fn devices_by_tag(&self, tag: &str) -> Result<Vec<Device>> {
        self.graphql(&queries::devices_by_tag(tag)).await
    }

    async fn vms_by_tag(&self, tag: &str) -> Result<Vec<Device>> {
        let vms = self.graphql(&queries::vms_by_tag(tag)).await?;
        Ok(mark_virtual(vms))
    }

    async fn interfaces_by_tag(&self, tag: &str) -> Result<Vec<Interface>> {
        self.graphql(&queries::interfaces_by_tag(tag)).await
    }

    async fn vm_interfaces_by_tag(&self, tag: &str) -> Result<Vec<Interface>> {
        let mut interfaces: Vec<Interface> =
            self.graphql(&queries::vm_interfaces_by_tag(tag)).await?;
        for iface in &mut interfaces {
            iface.is_virtual = true;
            if let Some(vm) = iface.device.as_mut() {
                vm.is_virtual = true;
            }
        }
        Ok(interfaces)
    }

    async fn services_by_name(&self, name: &str) -> Result<Vec<Service>> {
        let mut services: Vec<Service> = self.graphql(&queries::services_by_name(name)).await?;
        for svc in &mut services {
            if let Some(vm) = svc.virtual_machine.as_mut() {
                vm.is_virtual = true;
            }
        }
        Ok(services)
    }

    async fn interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>> {
        self.graphql(&queries::interface_addresses(id)).await
    }

    async fn vm_interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>> {
        self.graphql(&queries::vm_interface_addresses(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IpStatus;

    #[test]
    fn test_client_requires_settings() {
        assert!(matches!(
            NetboxClient::new("", "token", false),
            Err(InventoryError::MissingSetting("base_url"))
        ));
        assert!(matches!(
            NetboxClient::new("https://netbox.example.com", "", false),
            Err(InventoryError::MissingSetting("api_token"))
        ));
    }

    #[test]
    fn test_url_keeps_prefix() {
        let client =
            NetboxClient::with_client("https://example.com/netbox", "t", Client::new()).unwrap();
        assert_eq!(
            client.url("graphql/").unwrap().as_str(),
            "https://example.com/netbox/graphql/"
        );

        let client = NetboxClient::with_client("https://example.com", "t", Client::new()).unwrap();
        assert_eq!(
            client.url("api/status/").unwrap().as_str(),
            "https://example.com/api/status/"
        );
    }

    #[test]
    fn test_version_compatibility() {
        assert!(is_compatible("4.0.10"));
        assert!(is_compatible("4.1.0"));
        assert!(is_compatible("v4.2.3-Docker-3.0.2"));
        assert!(!is_compatible("4.0.9"));
        assert!(!is_compatible("3.7.8"));
        assert!(!is_compatible("garbage"));
        assert_eq!(parse_version("4.1"), Some((4, 1, 0)));
    }

    #[test]
    fn test_parse_list() {
        let body = r#"{"data": {"ip_address_list": [
            {"id": "1", "address": "10.0.0.1/24", "status": "active", "vrf": null},
            {"id": "2", "address": "2001:db8::1/64", "status": "dhcp", "vrf": {"id": "7", "name": "mgmt"}}
        ]}}"#;

        let ips: Vec<IpAddress> = parse_list(body, "ip_address_list").unwrap();
        assert_eq!(ips.len(), 2);
        assert_eq!(ips[1].status, IpStatus::Dhcp);
        assert_eq!(ips[1].vrf.as_ref().unwrap().name, "mgmt");
    }

    #[test]
    fn test_parse_list_null_is_empty() {
        let body = r#"{"data": {"device_list": null}}"#;
        let devs: Vec<Device> = parse_list(body, "device_list").unwrap();
        assert!(devs.is_empty());
    }

    #[test]
    fn test_parse_list_errors() {
        let body = r#"{"data": null, "errors": [{"message": "bad field"}, {"message": "worse"}]}"#;
        let err = parse_list::<Device>(body, "device_list").unwrap_err();
        assert!(matches!(err, InventoryError::GraphQl(ref m) if m == "bad field; worse"));

        let err = parse_list::<Device>("not json", "device_list").unwrap_err();
        assert!(matches!(err, InventoryError::Decode(_)));

        let body = r#"{"data": {"device_list": [{"id": "x"}]}}"#;
        assert!(parse_list::<Device>(body, "device_list").is_err());
    }
}
