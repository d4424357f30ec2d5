//! GraphQL query builder for the inventory API

use std::fmt;

/// GraphQL query builder
///
/// Builds single-root list queries such as
/// `{device_list(filters: {tag: "x"}){id name}}`.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    /// Root field
    root: String,
    /// Alias the result is returned under
    alias: Option<String>,
    /// Plain arguments
    args: Vec<String>,
    /// Arguments placed inside a `filters: {..}` object
    filters: Vec<String>,
    /// Selection set
    fields: String,
}

/// Escape a value for use inside a double quoted GraphQL string
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl GraphQuery {
    /// Create a new query for a root field
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            alias: None,
            args: Vec::new(),
            filters: Vec::new(),
            fields: "id".to_string(),
        }
    }

    /// Return the result under a different key
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Add a string argument
    #[must_use]
    pub fn arg(mut self, name: &str, value: &str) -> Self {
        self.args.push(format!("{name}: \"{}\"", escape(value)));
        self
    }

    /// Add a string argument to the `filters` object
    #[must_use]
    pub fn filter(mut self, name: &str, value: &str) -> Self {
        self.filters.push(format!("{name}: \"{}\"", escape(value)));
        self
    }

    /// Set the selection set
    #[must_use]
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = fields.into();
        self
    }

    /// Key the result is found under in the response `data` object
    #[must_use]
    pub fn result_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.root)
    }

    /// Build the query string
    #[must_use]
    pub fn build(&self) -> String {
        let mut args = self.args.clone();
        if !self.filters.is_empty() {
            args.push(format!("filters: {{{}}}", self.filters.join(", ")));
        }

        let head = match &self.alias {
            Some(alias) => format!("{alias}: {}", self.root),
            None => self.root.clone(),
        };

        if args.is_empty() {
            format!("{{{head}{{{}}}}}", self.fields)
        } else {
            format!("{{{head}({}){{{}}}}}", args.join(", "), self.fields)
        }
    }
}

impl fmt::Display for GraphQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.build())
    }
}

/// Predefined queries used by the client
pub mod queries {
    use super::GraphQuery;

    fn ip_fields() -> &'static str {
        "id address status vrf {id name}"
    }

    fn device_fields() -> String {
        let ip = ip_fields();
        format!(
            "id name primary_ip4 {{{ip}}} primary_ip6 {{{ip}}} custom_fields rack {{name}} \
             site {{name}} role {{name}} tenant {{name}} platform {{name}} serial asset_tag \
             status tags {{name}}"
        )
    }

    fn vm_fields() -> String {
        let ip = ip_fields();
        format!(
            "id name primary_ip4 {{{ip}}} primary_ip6 {{{ip}}} custom_fields site {{name}} \
             tenant {{name}} platform {{name}} role {{name}} status tags {{name}}"
        )
    }

    /// Devices carrying a tag
    #[must_use]
    pub fn devices_by_tag(tag: &str) -> GraphQuery {
        GraphQuery::new("device_list")
            .filter("tag", tag)
            .fields(device_fields())
    }

    /// VMs carrying a tag
    #[must_use]
    pub fn vms_by_tag(tag: &str) -> GraphQuery {
        GraphQuery::new("virtual_machine_list")
            .arg("tag", tag)
            .fields(vm_fields())
    }

    /// Device interfaces carrying a tag
    #[must_use]
    pub fn interfaces_by_tag(tag: &str) -> GraphQuery {
        GraphQuery::new("interface_list").arg("tag", tag).fields(format!(
            "id name enabled custom_fields device {{{}}} tags {{name}}",
            device_fields()
        ))
    }

    /// VM interfaces carrying a tag, shaped like device interfaces
    #[must_use]
    pub fn vm_interfaces_by_tag(tag: &str) -> GraphQuery {
        GraphQuery::new("vm_interface_list")
            .alias("interface_list")
            .arg("tag", tag)
            .fields(format!(
                "id name enabled custom_fields device: virtual_machine {{{}}} tags {{name}}",
                vm_fields()
            ))
    }

    /// Addresses assigned to a device interface
    #[must_use]
    pub fn interface_addresses(id: u64) -> GraphQuery {
        GraphQuery::new("ip_address_list")
            .arg("interface_id", &id.to_string())
            .fields(ip_fields())
    }

    /// Addresses assigned to a VM interface
    #[must_use]
    pub fn vm_interface_addresses(id: u64) -> GraphQuery {
        GraphQuery::new("ip_address_list")
            .arg("vminterface_id", &id.to_string())
            .fields(ip_fields())
    }

    /// Services with a given name
    #[must_use]
    pub fn services_by_name(name: &str) -> GraphQuery {
        GraphQuery::new("service_list").arg("name", name).fields(format!(
            "id name device {{{}}} virtual_machine {{{}}} ports ipaddresses {{{}}} protocol custom_fields",
            device_fields(),
            vm_fields(),
            ip_fields()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_query() {
        let q = GraphQuery::new("device_list").fields("id name");
        assert_eq!(q.build(), "{device_list{id name}}");
        assert_eq!(q.result_key(), "device_list");
    }

    #[test]
    fn test_query_with_filters() {
        let q = GraphQuery::new("device_list")
            .filter("tag", "node_exporter")
            .fields("id");
        assert_eq!(
            q.build(),
            r#"{device_list(filters: {tag: "node_exporter"}){id}}"#
        );
    }

    #[test]
    fn test_query_with_alias() {
        let q = GraphQuery::new("vm_interface_list")
            .alias("interface_list")
            .arg("tag", "x")
            .fields("id");
        assert_eq!(
            q.build(),
            r#"{interface_list: vm_interface_list(tag: "x"){id}}"#
        );
        assert_eq!(q.result_key(), "interface_list");
    }

    #[test]
    fn test_escape_quotes() {
        let q = GraphQuery::new("service_list")
            .arg("name", r#"a"b"#)
            .fields("id");
        assert_eq!(q.build(), r#"{service_list(name: "a\"b"){id}}"#);
    }

    #[test]
    fn test_predefined_queries() {
        let q = queries::interface_addresses(42);
        assert!(q.build().starts_with(r#"{ip_address_list(interface_id: "42")"#));

        let q = queries::vm_interfaces_by_tag("t");
        assert!(q.build().contains("device: virtual_machine {"));

        let q = queries::services_by_name("ssh");
        assert!(q.build().contains("ipaddresses {id address status vrf {id name}}"));
    }
}
