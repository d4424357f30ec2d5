//! Target assembly
//!
//! Turns the inventory records matched by a group into target records. Each
//! group kind has its own variant; all of them follow the same order of checks:
//! status, labels (including custom fields), filters, addresses. The first
//! failing check decides the item's [`TargetState`] and the item is left out.
//!
//! A failing inventory query aborts the whole assembly.

mod device;
mod interface;
mod service;

use tracing::{debug, info};

use netbox_sd_inventory::{CustomFieldMap, Device, InventorySource, Result};

use crate::config::{Group, GroupKind};
use crate::filter;
use crate::labels::{LABEL_IS_VM, LabelSet, custom_field_labels, node_labels};
use crate::recorder::Recorder;
use crate::select::AddressPolicy;
use crate::state::TargetState;
use crate::target::TargetRecord;

/// Builds the target records of one group for one cycle
pub struct Assembler<'a> {
    group: &'a Group,
    inventory: &'a dyn InventorySource,
    recorder: &'a dyn Recorder,
}

impl<'a> Assembler<'a> {
    pub fn new(
        group: &'a Group,
        inventory: &'a dyn InventorySource,
        recorder: &'a dyn Recorder,
    ) -> Self {
        Self {
            group,
            inventory,
            recorder,
        }
    }

    /// Query the inventory and build all target records for the group
    ///
    /// # Errors
    /// Returns the first inventory query error. Per-item problems are recorded
    /// and skipped instead.
    pub async fn assemble(&self) -> Result<Vec<TargetRecord>> {
        match self.group.kind {
            GroupKind::DeviceTag => self.by_device_tag().await,
            GroupKind::InterfaceTag => self.by_interface_tag().await,
            GroupKind::Service => self.by_service().await,
        }
    }

    fn policy(&self) -> AddressPolicy {
        AddressPolicy::from(&self.group.flags)
    }

    fn observe(&self, node: &Device, state: TargetState) {
        self.recorder.target_state(&self.group.file, node, state);
    }

    fn observe_skipped_addresses(&self, node: &Device, candidates: usize, selected: usize) {
        self.recorder.addresses_skipped(
            &self.group.file,
            &node.name,
            candidates.saturating_sub(selected),
        );
    }

    /// Build the full label set of an item and run the group's filters on it
    ///
    /// `base` holds variant specific labels. Node custom fields are applied
    /// first, then `own_fields` of the interface or service, then the VM marker
    /// and finally the group's static labels.
    fn labels_for(
        &self,
        node: &Device,
        mut base: LabelSet,
        own_fields: Option<&CustomFieldMap>,
    ) -> std::result::Result<LabelSet, TargetState> {
        let group = &self.group.file;
        base.extend(node_labels(node));

        for fields in std::iter::once(&node.custom_fields).chain(own_fields) {
            match custom_field_labels(fields) {
                Ok(labels) => base.extend(labels),
                Err(e) => {
                    info!(group = %group, node = %node.name, error = %e, "failed to parse custom fields, skipping");
                    return Err(TargetState::SkippedBadCustomField);
                }
            }
        }

        if node.is_virtual {
            base.insert(LABEL_IS_VM.to_string(), "true".to_string());
        }

        base.extend(
            self.group
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        if !filter::matches(&self.group.filters, &base) {
            debug!(group = %group, node = %node.name, "doesn't match filters, skipping");
            return Err(TargetState::SkippedNotMatchingFilters);
        }

        Ok(base)
    }
}
