//! netbox-sd-inventory: NetBox inventory access
//!
//! Data model for devices, VMs, interfaces, services and IP addresses, the
//! [`InventorySource`] trait the target pipeline reads through, and
//! [`NetboxClient`], its GraphQL implementation.

pub mod client;
pub mod custom_field;
pub mod error;
pub mod query;
pub mod traits;
pub mod types;

pub use client::NetboxClient;
pub use custom_field::{CustomField, CustomFieldError, CustomFieldMap, CustomFieldType};
pub use error::{InventoryError, Result};
pub use traits::InventorySource;
pub use types::{Device, Interface, IpAddress, IpFamily, IpStatus, Name, Service, Vrf};
