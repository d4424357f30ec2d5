//! Prometheus exporter for the group workers

use std::time::Duration;

use chrono::{DateTime, Utc};
use prometheus::{
    Encoder, GaugeVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

use netbox_sd_core::{Recorder, TargetState};
use netbox_sd_inventory::Device;

const NAMESPACE: &str = "netbox_sd";

const TARGET_LABELS: &[&str] = &[
    "group",
    "netbox_name",
    "netbox_rack",
    "netbox_site",
    "netbox_tenant",
    "netbox_role",
    "netbox_serial_number",
    "netbox_asset_tag",
];

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE)
}

/// Recorder backed by a Prometheus registry
pub struct PrometheusRecorder {
    registry: Registry,
    group_count: IntGauge,
    target_state: GaugeVec,
    update_timestamp: GaugeVec,
    update_error: IntCounterVec,
    write_error: IntCounterVec,
    update_duration: IntGaugeVec,
    target_count: IntGaugeVec,
    addresses_skipped: IntGaugeVec,
}

impl PrometheusRecorder {
    /// Create and register all metrics
    ///
    /// # Errors
    /// Fails if a metric can't be created or registered
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let info = GaugeVec::new(opts("info", "netbox-sd build information"), &["version"])?;
        let group_count = IntGauge::with_opts(opts("group_count", "Number of configured groups"))?;
        let target_state = GaugeVec::new(
            opts(
                "target_state",
                "State of an inventory item (1 active, 0 other, -1 bad status, -2 bad custom field, -3 no valid ip, -4 filtered)",
            ),
            TARGET_LABELS,
        )?;
        let update_timestamp = GaugeVec::new(
            opts("update_timestamp", "Unix time of the last finished cycle"),
            &["group"],
        )?;
        let update_error = IntCounterVec::new(
            opts("update_error", "Cycles discarded because an inventory query failed"),
            &["group"],
        )?;
        let write_error = IntCounterVec::new(
            opts("write_error", "Cycles whose target file couldn't be written"),
            &["group"],
        )?;
        let update_duration = IntGaugeVec::new(
            opts("update_duration_nanoseconds", "Duration of the last cycle"),
            &["group"],
        )?;
        let target_count = IntGaugeVec::new(
            opts("target_count", "Records in the target file"),
            &["group"],
        )?;
        let addresses_skipped = IntGaugeVec::new(
            opts("addresses_skipped", "Candidate addresses not used for an item"),
            &["group", "netbox_name"],
        )?;

        registry.register(Box::new(info.clone()))?;
        registry.register(Box::new(group_count.clone()))?;
        registry.register(Box::new(target_state.clone()))?;
        registry.register(Box::new(update_timestamp.clone()))?;
        registry.register(Box::new(update_error.clone()))?;
        registry.register(Box::new(write_error.clone()))?;
        registry.register(Box::new(update_duration.clone()))?;
        registry.register(Box::new(target_count.clone()))?;
        registry.register(Box::new(addresses_skipped.clone()))?;

        info.with_label_values(&[env!("CARGO_PKG_VERSION")]).set(1.0);

        Ok(Self {
            registry,
            group_count,
            target_state,
            update_timestamp,
            update_error,
            write_error,
            update_duration,
            target_count,
            addresses_skipped,
        })
    }

    /// Set the number of configured groups
    pub fn set_group_count(&self, count: usize) {
        self.group_count.set(saturating_i64(count));
    }

    /// Render all metrics in the text exposition format
    ///
    /// # Errors
    /// Fails if the encoder rejects a metric family
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Recorder for PrometheusRecorder {
    fn target_state(&self, group: &str, node: &Device, state: TargetState) {
        self.target_state
            .with_label_values(&[
                group,
                node.name.as_str(),
                node.rack_name(),
                node.site_name(),
                node.tenant_name(),
                node.role_name(),
                node.serial_number.as_str(),
                node.asset_tag.as_str(),
            ])
            .set(state.value());
    }

    fn addresses_skipped(&self, group: &str, node_name: &str, count: usize) {
        self.addresses_skipped
            .with_label_values(&[group, node_name])
            .set(saturating_i64(count));
    }

    fn update_error(&self, group: &str) {
        self.update_error.with_label_values(&[group]).inc();
    }

    fn write_error(&self, group: &str) {
        self.write_error.with_label_values(&[group]).inc();
    }

    fn target_count(&self, group: &str, count: usize) {
        self.target_count
            .with_label_values(&[group])
            .set(saturating_i64(count));
    }

    #[allow(clippy::cast_precision_loss)]
    fn cycle_finished(&self, group: &str, duration: Duration, finished_at: DateTime<Utc>) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.update_duration.with_label_values(&[group]).set(nanos);
        self.update_timestamp
            .with_label_values(&[group])
            .set(finished_at.timestamp() as f64);
    }
}
