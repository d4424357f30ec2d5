//! Targets for services with a given name

use tracing::{debug, info, instrument, warn};

use netbox_sd_inventory::Result;

use super::Assembler;
use crate::labels::{LABEL_SERVICE, LabelSet};
use crate::select::select_addresses;
use crate::state::TargetState;
use crate::target::{TargetRecord, endpoint};

impl Assembler<'_> {
    /// Ports a service is exposed on
    ///
    /// A configured group port replaces the service's ports. Without
    /// `all_addresses` only the first port is kept.
    fn service_ports(&self, ports: &[u16]) -> Vec<u16> {
        let mut ports = match self.group.port {
            Some(port) => vec![port],
            None => ports.to_vec(),
        };
        if !self.group.flags.all_addresses {
            ports.truncate(1);
        }
        ports
    }

    #[instrument(skip(self), fields(group = %self.group.file, service = %self.group.match_value))]
    pub(super) async fn by_service(&self) -> Result<Vec<TargetRecord>> {
        let services = self
            .inventory
            .services_by_name(&self.group.match_value)
            .await?;
        debug!(count = services.len(), "got services");

        let mut records = Vec::new();

        for svc in &services {
            let Some(node) = svc.node() else {
                warn!(service = %svc.name, id = svc.id, "service has no device or VM, skipping");
                continue;
            };

            if svc.is_on_vm() && !self.group.flags.include_vms {
                debug!(node = %node.name, "service runs on a VM and VMs are excluded, skipping");
                self.observe(node, TargetState::SkippedOther);
                continue;
            }

            if !node.is_active() {
                info!(node = %node.name, status = %node.status, "device is not marked as active, skipping");
                self.observe(node, TargetState::SkippedBadStatus);
                continue;
            }

            let mut base = LabelSet::new();
            base.insert(LABEL_SERVICE.to_string(), svc.name.clone());

            let labels = match self.labels_for(node, base, Some(&svc.custom_fields)) {
                Ok(labels) => labels,
                Err(state) => {
                    self.observe(node, state);
                    continue;
                }
            };

            let selected = select_addresses(svc.ipaddresses.iter().map(Some), self.policy());

            if selected.is_empty() {
                debug!(node = %node.name, service = %svc.name, "no usable address, skipping");
                self.observe(node, TargetState::SkippedNoValidIp);
                continue;
            }

            let ports = self.service_ports(&svc.ports);
            let targets = selected
                .iter()
                .flat_map(|addr| ports.iter().map(move |port| endpoint(addr, Some(*port))))
                .collect();

            self.observe(node, TargetState::Active);
            self.observe_skipped_addresses(node, svc.ipaddresses.len(), selected.len());

            records.push(TargetRecord { targets, labels });
        }

        Ok(records)
    }
}
