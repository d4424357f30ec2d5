//! Targets for interfaces carrying a tag

use tracing::{debug, info, instrument, warn};

use netbox_sd_inventory::Result;

use super::Assembler;
use crate::labels::LabelSet;
use crate::select::select_addresses;
use crate::state::TargetState;
use crate::target::{TargetRecord, endpoints};

impl Assembler<'_> {
    #[instrument(skip(self), fields(group = %self.group.file, tag = %self.group.match_value))]
    pub(super) async fn by_interface_tag(&self) -> Result<Vec<TargetRecord>> {
        let tag = &self.group.match_value;

        let mut interfaces = self.inventory.interfaces_by_tag(tag).await?;
        if self.group.flags.include_vms {
            interfaces.extend(self.inventory.vm_interfaces_by_tag(tag).await?);
        }
        debug!(count = interfaces.len(), "got interfaces");

        let mut records = Vec::new();

        for iface in &interfaces {
            let Some(node) = iface.device.as_ref() else {
                warn!(interface = %iface.name, id = iface.id, "interface has no device, skipping");
                continue;
            };

            if !node.is_active() || !iface.enabled {
                info!(
                    node = %node.name,
                    interface = %iface.name,
                    enabled = iface.enabled,
                    "device not active or interface disabled, skipping"
                );
                self.observe(node, TargetState::SkippedBadStatus);
                continue;
            }

            let labels = match self.labels_for(node, LabelSet::new(), Some(&iface.custom_fields)) {
                Ok(labels) => labels,
                Err(state) => {
                    self.observe(node, state);
                    continue;
                }
            };

            let lookup = if iface.is_virtual {
                self.inventory.vm_interface_addresses(iface.id).await
            } else {
                self.inventory.interface_addresses(iface.id).await
            };

            let addrs = match lookup {
                Ok(addrs) => addrs,
                Err(e) => {
                    warn!(
                        node = %node.name,
                        interface = %iface.name,
                        error = %e,
                        "failed to get interface addresses, skipping"
                    );
                    self.observe(node, TargetState::SkippedNoValidIp);
                    continue;
                }
            };

            let selected = select_addresses(addrs.iter().map(Some), self.policy());

            if selected.is_empty() {
                debug!(node = %node.name, interface = %iface.name, "no usable address, skipping");
                self.observe(node, TargetState::SkippedNoValidIp);
                continue;
            }

            self.observe(node, TargetState::Active);
            self.observe_skipped_addresses(node, addrs.len(), selected.len());

            records.push(TargetRecord {
                targets: endpoints(&selected, self.group.port),
                labels,
            });
        }

        Ok(records)
    }
}
