//! Inventory source trait

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Device, Interface, IpAddress, Service};

/// Read operations the target pipeline needs from an inventory
///
/// Every call returns either the complete collection or an error. Records from
/// the VM-scoped calls have `is_virtual` set.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn devices_by_tag(&self, tag: &str) -> Result<Vec<Device>>;
    async fn vms_by_tag(&self, tag: &str) -> Result<Vec<Device>>;
    async fn interfaces_by_tag(&self, tag: &str) -> Result<Vec<Interface>>;
    async fn vm_interfaces_by_tag(&self, tag: &str) -> Result<Vec<Interface>>;
    async fn services_by_name(&self, name: &str) -> Result<Vec<Service>>;
    async fn interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>>;
    async fn vm_interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>>;
}
