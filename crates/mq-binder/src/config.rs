//! Binder configuration: queue manager connection, dead-letter queue, and
//! the bindings to provision.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::naming::DEFAULT_ANONYMOUS_PREFIX;
use crate::properties::{ConsumerProperties, ProducerProperties};
use crate::sanitize::sanitise_object_name;

/// Default binder-wide dead-letter queue.
pub const DEFAULT_DLQ_NAME: &str = "Spring.Cloud.Stream.dlq";

/// Top-level binder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BinderConfig {
    /// Dead-letter queue ensured before every consumer binding.
    #[serde(default = "default_dlq_name")]
    pub dead_letter_queue_name: String,
    /// Prefix for generated anonymous consumer group names.
    #[serde(default = "default_anonymous_prefix")]
    pub anonymous_group_prefix: String,
    /// Queue manager connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Output bindings.
    #[serde(default)]
    pub producers: Vec<ProducerBinding>,
    /// Input bindings.
    #[serde(default)]
    pub consumers: Vec<ConsumerBinding>,
}

/// How the client reaches the queue manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Client connection over TCP through a server-connection channel.
    #[default]
    Client,
    /// Shared-memory bindings to a queue manager on the same host.
    Bindings,
}

/// Queue manager connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionConfig {
    /// Host name of the queue manager listener.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listener port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Queue manager name.
    #[serde(default = "default_queue_manager")]
    pub queue_manager: String,
    /// Server-connection channel.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Transport type.
    #[serde(default)]
    pub transport: TransportType,
    /// User ID; credentials are only sent when this is non-blank.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for `username`.
    #[serde(default)]
    pub password: Option<String>,
}

/// A configured output binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProducerBinding {
    /// Logical destination name.
    pub name: String,
    /// Producer properties.
    #[serde(flatten)]
    pub properties: ProducerProperties,
}

/// A configured input binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerBinding {
    /// Logical destination name.
    pub name: String,
    /// Consumer group; anonymous when absent.
    #[serde(default)]
    pub group: Option<String>,
    /// Consumer properties.
    #[serde(flatten)]
    pub properties: ConsumerProperties,
}

impl BinderConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.queue_manager.trim().is_empty() {
            return Err(invalid("connection.queue-manager", "must not be empty"));
        }
        if self.connection.transport == TransportType::Client {
            if self.connection.port == 0 {
                return Err(invalid("connection.port", "must not be 0"));
            }
            if self.connection.host.trim().is_empty() {
                return Err(invalid("connection.host", "must not be empty"));
            }
        }
        if sanitise_object_name(&self.dead_letter_queue_name).is_empty() {
            return Err(invalid(
                "dead-letter-queue-name",
                "contains no characters legal in an MQ object name",
            ));
        }
        for producer in &self.producers {
            if producer.properties.partition_count == 0 {
                return Err(invalid(
                    &format!("producers.{}.partition-count", producer.name),
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }
}

impl ConnectionConfig {
    /// Credentials to present, if a non-blank user ID is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self.username.as_deref() {
            Some(user) if !user.trim().is_empty() => {
                Some((user, self.password.as_deref().unwrap_or_default()))
            }
            _ => None,
        }
    }

    /// MQ connection name, `host(port)`.
    pub fn connection_name(&self) -> String {
        format!("{}({})", self.host, self.port)
    }
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            dead_letter_queue_name: default_dlq_name(),
            anonymous_group_prefix: default_anonymous_prefix(),
            connection: ConnectionConfig::default(),
            producers: Vec::new(),
            consumers: Vec::new(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            queue_manager: default_queue_manager(),
            channel: default_channel(),
            transport: TransportType::default(),
            username: None,
            password: None,
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn default_dlq_name() -> String {
    DEFAULT_DLQ_NAME.to_string()
}

fn default_anonymous_prefix() -> String {
    DEFAULT_ANONYMOUS_PREFIX.to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1414
}

fn default_queue_manager() -> String {
    "QM1".to_string()
}

fn default_channel() -> String {
    "DEV.APP.SVRCONN".to_string()
}
