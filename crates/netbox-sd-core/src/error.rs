//! Core error types for netbox-sd-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core actor operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Group not found in registry
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// A group writing to the same file is already registered
    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),
}

/// Errors found while loading and validating the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No configuration path given
    #[error("missing config file path")]
    MissingFile,

    /// Configuration file could not be read
    #[error("failed to read config file {path}: {source}")]
    ReadingFile {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or has the wrong shape
    #[error("failed to parse config file: {0}")]
    ParsingFile(String),

    /// A required global value is empty or missing
    #[error("global configuration: missing required value '{0}'")]
    MissingRequired(&'static str),

    /// A required group value is empty or missing
    #[error("group {group}: missing required value '{key}'")]
    MissingGroupValue {
        /// Index of the group in the config file
        group: usize,
        /// Name of the missing key
        key: &'static str,
    },

    /// `base_url` doesn't use TLS
    #[error("base_url must start with https and support tls")]
    BaseUrlMissingTls,

    /// Scan interval can't be parsed or is zero
    #[error("{scope}: bad scan_interval '{value}': {reason}")]
    BadScanInterval {
        /// `global` or `group <n>`
        scope: String,
        /// Configured value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Two groups write to the same file
    #[error("group {group}: duplicate file name '{file}'")]
    DuplicateFile {
        /// Index of the second group using the file
        group: usize,
        /// Output file
        file: String,
    },

    /// Unknown group type
    #[error("group {group}: bad group type '{value}'")]
    BadGroupType {
        /// Index of the group
        group: usize,
        /// Configured value
        value: String,
    },

    /// Port outside `0..=65535`
    #[error("group {group}: bad port {value}")]
    BadPort {
        /// Index of the group
        group: usize,
        /// Configured value
        value: i64,
    },

    /// Unknown `inet_family`
    #[error("group {group}: bad inet_family '{value}'")]
    BadInetFamily {
        /// Index of the group
        group: usize,
        /// Configured value
        value: String,
    },

    /// Filter label doesn't start with `netbox_`
    #[error("group {group}, filter {filter}: bad label '{label}' (must start with 'netbox_')")]
    BadFilterLabel {
        /// Index of the group
        group: usize,
        /// Index of the filter within the group
        filter: usize,
        /// Configured label
        label: String,
    },

    /// Filter regex doesn't compile
    #[error("group {group}, filter {filter}: bad filter match: {source}")]
    BadFilterMatch {
        /// Index of the group
        group: usize,
        /// Index of the filter within the group
        filter: usize,
        /// Compilation error
        #[source]
        source: regex::Error,
    },
}
