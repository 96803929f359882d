//! Binder error types.

use miette::Diagnostic;
use mq_binder_admin::MqError;
use thiserror::Error;

/// Failure to turn a logical binding into concrete destination names.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ResolutionError {
    /// The logical destination name is blank.
    #[error("destination name must not be empty")]
    #[diagnostic(code(binder::empty_destination))]
    EmptyDestination,

    /// A partitioned consumer's instance index is outside its instance count.
    #[error("instance index {instance_index} is out of range for instance count {instance_count}")]
    #[diagnostic(
        code(binder::instance_index),
        help("instance-index must be less than instance-count")
    )]
    InstanceIndexOutOfRange {
        /// Configured instance index.
        instance_index: u32,
        /// Configured instance count.
        instance_count: u32,
    },

    /// A resolved partition index does not fit a partition key.
    #[error("partition index {index} is too large for a partition key")]
    #[diagnostic(code(binder::partition_index))]
    PartitionIndexOutOfRange {
        /// The resolved partition index.
        index: u32,
    },

    /// A producer was configured with zero partitions.
    #[error("partition count must be at least 1")]
    #[diagnostic(code(binder::partition_count))]
    ZeroPartitions,
}

/// Failure while provisioning a producer or consumer destination.
#[derive(Debug, Error, Diagnostic)]
pub enum ProvisioningError {
    /// Name resolution failed; the resolver's error is passed through.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolution(#[from] ResolutionError),

    /// An administrative call against the queue manager failed.
    #[error("failed to provision '{destination}' (reason {}): {source}", .source.reason_code())]
    #[diagnostic(code(binder::provisioning_failed))]
    Admin {
        /// The logical destination being provisioned.
        destination: String,
        /// The broker error.
        #[source]
        source: MqError,
    },
}

impl ProvisioningError {
    pub(crate) fn admin(destination: &str, source: MqError) -> Self {
        Self::Admin {
            destination: destination.to_string(),
            source,
        }
    }

    /// MQ reason code of the underlying broker error, if any.
    pub fn reason_code(&self) -> Option<u32> {
        match self {
            Self::Admin { source, .. } => Some(source.reason_code()),
            Self::Resolution(_) => None,
        }
    }
}

/// Failure to load or validate binder configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration file '{path}': {source}")]
    #[diagnostic(code(binder::config_io))]
    Io {
        /// The file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(binder::config_parse))]
    Parse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration value for '{field}': {message}")]
    #[diagnostic(code(binder::config_invalid))]
    Invalid {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}
