//! Targets for devices and VMs carrying a tag

use tracing::{debug, info, instrument};

use netbox_sd_inventory::Result;

use super::Assembler;
use crate::labels::LabelSet;
use crate::select::select_addresses;
use crate::state::TargetState;
use crate::target::{TargetRecord, endpoints};

impl Assembler<'_> {
    #[instrument(skip(self), fields(group = %self.group.file, tag = %self.group.match_value))]
    pub(super) async fn by_device_tag(&self) -> Result<Vec<TargetRecord>> {
        let tag = &self.group.match_value;

        let mut nodes = self.inventory.devices_by_tag(tag).await?;
        if self.group.flags.include_vms {
            nodes.extend(self.inventory.vms_by_tag(tag).await?);
        }
        debug!(count = nodes.len(), "got devices");

        let mut records = Vec::new();

        for node in &nodes {
            if !node.is_active() {
                info!(node = %node.name, status = %node.status, "device is not marked as active, skipping");
                self.observe(node, TargetState::SkippedBadStatus);
                continue;
            }

            let labels = match self.labels_for(node, LabelSet::new(), None) {
                Ok(labels) => labels,
                Err(state) => {
                    self.observe(node, state);
                    continue;
                }
            };

            // primary IPv6 first so it wins when only one address is exposed
            let candidates = [node.primary_ip6.as_ref(), node.primary_ip4.as_ref()];
            let selected = select_addresses(candidates, self.policy());

            if selected.is_empty() {
                debug!(node = %node.name, "no usable primary address, skipping");
                self.observe(node, TargetState::SkippedNoValidIp);
                continue;
            }

            self.observe(node, TargetState::Active);
            self.observe_skipped_addresses(node, candidates.len(), selected.len());

            records.push(TargetRecord {
                targets: endpoints(&selected, self.group.port),
                labels,
            });
        }

        Ok(records)
    }
}
