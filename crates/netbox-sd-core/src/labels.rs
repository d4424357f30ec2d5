//! Target labels

use std::collections::BTreeMap;

use netbox_sd_inventory::{CustomFieldError, CustomFieldMap, CustomFieldType, Device};

/// Label name to value, sorted by name
pub type LabelSet = BTreeMap<String, String>;

/// Prefix of every label derived from the inventory
pub const LABEL_PREFIX: &str = "netbox_";

pub const LABEL_NAME: &str = "netbox_name";
pub const LABEL_RACK: &str = "netbox_rack";
pub const LABEL_SITE: &str = "netbox_site";
pub const LABEL_TENANT: &str = "netbox_tenant";
pub const LABEL_ROLE: &str = "netbox_role";
pub const LABEL_PLATFORM: &str = "netbox_platform";
pub const LABEL_SERIAL_NUMBER: &str = "netbox_serial_number";
pub const LABEL_ASSET_TAG: &str = "netbox_asset_tag";
pub const LABEL_SERVICE: &str = "netbox_service";
/// Set to `true` on targets backed by a virtual machine
pub const LABEL_IS_VM: &str = "is_vm";

/// Labels describing the device or VM a target belongs to
#[must_use]
pub fn node_labels(node: &Device) -> LabelSet {
    [
        (LABEL_NAME, node.name.as_str()),
        (LABEL_RACK, node.rack_name()),
        (LABEL_SITE, node.site_name()),
        (LABEL_TENANT, node.tenant_name()),
        (LABEL_ROLE, node.role_name()),
        (LABEL_PLATFORM, node.platform_name()),
        (LABEL_SERIAL_NUMBER, node.serial_number.as_str()),
        (LABEL_ASSET_TAG, node.asset_tag.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Turn custom fields into `netbox_<name>` labels
///
/// Numbers are truncated to integers, booleans become `true`/`false`.
///
/// # Errors
/// Fails as a whole if any one field can't be converted; no partial set is
/// returned.
#[allow(clippy::cast_possible_truncation)]
pub fn custom_field_labels(fields: &CustomFieldMap) -> Result<LabelSet, CustomFieldError> {
    fields
        .iter()
        .map(|(key, field)| {
            let value = match field.datatype {
                CustomFieldType::Text => field.as_text()?.to_string(),
                CustomFieldType::Number => (field.as_number()? as i64).to_string(),
                CustomFieldType::Boolean => field.as_bool()?.to_string(),
                CustomFieldType::Unsupported => {
                    return Err(CustomFieldError::CannotConvert {
                        declared: CustomFieldType::Unsupported,
                        requested: CustomFieldType::Text,
                    });
                }
            };
            Ok((format!("{LABEL_PREFIX}{key}"), value))
        })
        .collect()
}
