//! IBM MQ destination provisioning for a stream binder.
//!
//! Before a producer or consumer binding carries traffic, the queue manager
//! must hold the objects it relies on. This crate provides:
//!
//! - **Provisioning**: [`MqProvisioningProvider`] ensures topics, group
//!   queues, subscriptions and the dead-letter queue exist
//! - **Naming**: [`DestinationNameResolver`] maps bindings, groups and
//!   partitions to name candidates; [`sanitise_object_name`] makes them
//!   legal MQ object names
//! - **Configuration**: [`BinderConfig`] loaded from TOML
//!
//! ## Example
//!
//! ```rust
//! use mq_binder::{
//!     DefaultDestinationNameResolver, MqProvisioningProvider, ProducerProperties,
//!     ProvisioningProvider,
//! };
//! use mq_binder_admin::{QueueManager, QueueManagerAdmin};
//!
//! let provider = MqProvisioningProvider::new(
//!     QueueManagerAdmin::new(QueueManager::new("QM1")),
//!     DefaultDestinationNameResolver::new(),
//! );
//! let dest = provider
//!     .provision_producer_destination("orders", &ProducerProperties::with_groups(["billing"]))
//!     .unwrap();
//!
//! assert_eq!(dest.name(), Some("orders"));
//! assert!(provider.admin().mqsc_script().contains("DEFINE QLOCAL('orders.billing')"));
//! ```

pub mod config;
pub mod error;
pub mod naming;
pub mod properties;
pub mod provisioner;
pub mod sanitize;

pub use config::{BinderConfig, ConnectionConfig, ConsumerBinding, ProducerBinding, TransportType};
pub use error::{ConfigError, ProvisioningError, ResolutionError};
pub use naming::{
    AnonymousNamingStrategy, Base64UrlNamingStrategy, DefaultDestinationNameResolver,
    DestinationNameResolver, DestinationNames,
};
pub use properties::{ConsumerProperties, ProducerProperties};
pub use provisioner::{
    ConsumerDestination, MqProvisioningProvider, ProducerDestination, ProvisioningProvider,
    UNPARTITIONED,
};
pub use sanitize::{sanitise_object_name, MAX_OBJECT_NAME_LENGTH};
