#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use netbox_sd_core::{Recorder, TargetSink, TargetState};
use netbox_sd_inventory::{
    Device, Interface, InventoryError, InventorySource, IpAddress, IpStatus, Name, Result, Service,
};

// ============================================================================
// Inventory
// ============================================================================

#[derive(Default)]
pub struct MockInventory {
    pub devices: Vec<Device>,
    pub vms: Vec<Device>,
    pub interfaces: Vec<Interface>,
    pub vm_interfaces: Vec<Interface>,
    pub services: Vec<Service>,
    pub addresses: HashMap<u64, Vec<IpAddress>>,
    pub vm_addresses: HashMap<u64, Vec<IpAddress>>,
    /// Fail every list query
    pub fail: AtomicBool,
    /// Fail only the VM list queries
    pub fail_vms: AtomicBool,
    /// Interface IDs whose address lookup fails
    pub broken_interfaces: Vec<u64>,
    pub vm_queries: AtomicUsize,
    /// Time every device query takes
    pub delay: Option<Duration>,
}

impl MockInventory {
    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(InventoryError::UnexpectedStatus {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn check_vms(&self) -> Result<()> {
        self.check()?;
        self.vm_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_vms.load(Ordering::SeqCst) {
            return Err(InventoryError::GraphQl("virtual machines unavailable".to_string()));
        }
        Ok(())
    }

    fn lookup(&self, map: &HashMap<u64, Vec<IpAddress>>, id: u64) -> Result<Vec<IpAddress>> {
        self.check()?;
        if self.broken_interfaces.contains(&id) {
            return Err(InventoryError::GraphQl("boom".to_string()));
        }
        Ok(map.get(&id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl InventorySource for MockInventory {
    async fn devices_by_tag(&self, _tag: &str) -> Result<Vec<Device>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(self.devices.clone())
    }

    async fn vms_by_tag(&self, _tag: &str) -> Result<Vec<Device>> {
        self.check_vms()?;
        Ok(self.vms.clone())
    }

    async fn interfaces_by_tag(&self, _tag: &str) -> Result<Vec<Interface>> {
        self.check()?;
        Ok(self.interfaces.clone())
    }

    async fn vm_interfaces_by_tag(&self, _tag: &str) -> Result<Vec<Interface>> {
        self.check_vms()?;
        Ok(self.vm_interfaces.clone())
    }

    async fn services_by_name(&self, _name: &str) -> Result<Vec<Service>> {
        self.check()?;
        Ok(self.services.clone())
    }

    async fn interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>> {
        self.lookup(&self.addresses, id)
    }

    async fn vm_interface_addresses(&self, id: u64) -> Result<Vec<IpAddress>> {
        self.lookup(&self.vm_addresses, id)
    }
}

// ============================================================================
// Recorder
// ============================================================================

#[derive(Default)]
pub struct MockRecorder {
    pub states: Mutex<Vec<(String, TargetState)>>,
    pub skipped: Mutex<Vec<(String, usize)>>,
    pub update_errors: AtomicUsize,
    pub write_errors: AtomicUsize,
    pub target_counts: Mutex<Vec<usize>>,
    pub cycles: AtomicUsize,
}

impl MockRecorder {
    pub fn state_of(&self, name: &str) -> Option<TargetState> {
        self.states
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, s)| *s)
    }
}

impl Recorder for MockRecorder {
    fn target_state(&self, _group: &str, node: &Device, state: TargetState) {
        self.states.lock().unwrap().push((node.name.clone(), state));
    }

    fn addresses_skipped(&self, _group: &str, node_name: &str, count: usize) {
        self.skipped
            .lock()
            .unwrap()
            .push((node_name.to_string(), count));
    }

    fn update_error(&self, _group: &str) {
        self.update_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn write_error(&self, _group: &str) {
        self.write_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn target_count(&self, _group: &str, count: usize) {
        self.target_counts.lock().unwrap().push(count);
    }

    fn cycle_finished(&self, _group: &str, _duration: Duration, _finished_at: DateTime<Utc>) {
        self.cycles.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Keeps the last written document in memory
#[derive(Default)]
pub struct MemorySink {
    pub written: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn last(&self) -> Option<String> {
        self.written.lock().unwrap().last().map(|(_, d)| d.clone())
    }
}

#[async_trait]
impl TargetSink for MemorySink {
    async fn write(&self, path: &Path, data: Vec<u8>) -> io::Result<()> {
        let data = String::from_utf8(data).map_err(io::Error::other)?;
        self.written
            .lock()
            .unwrap()
            .push((path.display().to_string(), data));
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl TargetSink for FailingSink {
    async fn write(&self, _path: &Path, _data: Vec<u8>) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn ip(address: &str) -> IpAddress {
    IpAddress::new(address, IpStatus::Active)
}

pub fn device(id: u64, name: &str) -> Device {
    Device {
        id,
        name: name.to_string(),
        status: "active".to_string(),
        rack: Some(Name::new("r1")),
        site: Some(Name::new("fra1")),
        role: Some(Name::new("server")),
        tenant: Some(Name::new("ops")),
        platform: Some(Name::new("linux")),
        serial_number: format!("SN{id}"),
        asset_tag: format!("AT{id}"),
        primary_ip4: Some(ip(&format!("192.0.2.{id}/24"))),
        primary_ip6: Some(ip(&format!("2001:db8::{id}/64"))),
        ..Default::default()
    }
}

pub fn vm(id: u64, name: &str) -> Device {
    Device {
        rack: None,
        serial_number: String::new(),
        asset_tag: String::new(),
        is_virtual: true,
        ..device(id, name)
    }
}

pub fn interface(id: u64, name: &str, owner: Device) -> Interface {
    Interface {
        id,
        name: name.to_string(),
        enabled: true,
        is_virtual: owner.is_virtual,
        device: Some(owner),
        ..Default::default()
    }
}
