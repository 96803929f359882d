//! Per-binding producer and consumer properties.

use serde::{Deserialize, Serialize};

/// Properties of an output binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProducerProperties {
    /// Consumer groups whose queues must exist before the first send.
    #[serde(default)]
    pub required_groups: Vec<String>,
    /// Number of partitions (1 = unpartitioned).
    #[serde(default = "default_count")]
    pub partition_count: u32,
}

impl ProducerProperties {
    /// Properties for an unpartitioned producer with the given groups.
    pub fn with_groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_groups: groups.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether messages are spread over more than one partition.
    pub fn is_partitioned(&self) -> bool {
        self.partition_count > 1
    }
}

impl Default for ProducerProperties {
    fn default() -> Self {
        Self {
            required_groups: Vec::new(),
            partition_count: default_count(),
        }
    }
}

/// Properties of an input binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsumerProperties {
    /// Whether this consumer reads one partition of a partitioned destination.
    #[serde(default)]
    pub partitioned: bool,
    /// Index of this consumer instance.
    #[serde(default)]
    pub instance_index: u32,
    /// Number of consumer instances.
    #[serde(default = "default_count")]
    pub instance_count: u32,
    /// Dead-letter queue for this consumer, overriding the binder-wide one.
    #[serde(default)]
    pub dlq_name: Option<String>,
}

impl Default for ConsumerProperties {
    fn default() -> Self {
        Self {
            partitioned: false,
            instance_index: 0,
            instance_count: default_count(),
            dlq_name: None,
        }
    }
}

fn default_count() -> u32 {
    1
}
