//! Destination provisioning: make sure the queue manager holds the topics,
//! queues and subscriptions a binding needs before traffic starts.
//!
//! A producer binding on `orders` with required groups `billing` and `audit`
//! provisions:
//!
//! ```text
//! DEFINE TOPIC('orders') TOPICSTR('orders') NOREPLACE
//! DEFINE QLOCAL('orders.billing') NOREPLACE
//! DEFINE SUB('orders.billing') TOPICSTR('orders') DEST('orders.billing') NOREPLACE
//! DEFINE QLOCAL('orders.audit') NOREPLACE
//! DEFINE SUB('orders.audit') TOPICSTR('orders') DEST('orders.audit') NOREPLACE
//! ```
//!
//! A consumer binding on `orders` with group `billing` defines the
//! dead-letter queue first, then the same `orders.billing` queue and
//! subscription. It does not need the topic object to exist.
//!
//! Calls are not transactional. When a step fails, the objects created by
//! earlier steps stay on the queue manager; provisioning the same binding
//! again converges because every create is create-if-absent.

use std::collections::BTreeMap;

use mq_binder_admin::{BrokerAdmin, MqError, QueueHandle, TopicHandle};
use tracing::{debug, info, warn};

use crate::config::{BinderConfig, DEFAULT_DLQ_NAME};
use crate::error::{ProvisioningError, ResolutionError};
use crate::naming::DestinationNameResolver;
use crate::properties::{ConsumerProperties, ProducerProperties};
use crate::sanitize::sanitise_object_name;

/// Partition key used for a topic that is not partitioned.
pub const UNPARTITIONED: i32 = -1;

/// Provisions broker objects for producer and consumer bindings.
pub trait ProvisioningProvider {
    /// Consumer binding properties.
    type ConsumerProperties;
    /// Producer binding properties.
    type ProducerProperties;

    /// Ensure every object a producer on `name` publishes through exists.
    fn provision_producer_destination(
        &self,
        name: &str,
        properties: &Self::ProducerProperties,
    ) -> Result<ProducerDestination, ProvisioningError>;

    /// Ensure the queue a consumer group on `name` reads from exists.
    fn provision_consumer_destination(
        &self,
        name: &str,
        group: &str,
        properties: &Self::ConsumerProperties,
    ) -> Result<ConsumerDestination, ProvisioningError>;
}

/// The topics a producer publishes to, keyed by partition.
///
/// The key is the partition index, or [`UNPARTITIONED`] for an unpartitioned
/// destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerDestination {
    partition_topics: BTreeMap<i32, TopicHandle>,
}

impl ProducerDestination {
    /// Name of the unpartitioned topic.
    pub fn name(&self) -> Option<&str> {
        self.partition_topics
            .get(&UNPARTITIONED)
            .map(|t| t.name.as_str())
    }

    /// Name of the topic serving `partition`.
    pub fn name_for_partition(&self, partition: i32) -> Option<&str> {
        self.partition_topics
            .get(&partition)
            .map(|t| t.name.as_str())
    }

    /// Topic handle for `partition` (or [`UNPARTITIONED`]).
    pub fn topic(&self, partition: i32) -> Option<&TopicHandle> {
        self.partition_topics.get(&partition)
    }

    /// All partition topics in key order.
    pub fn partition_topics(&self) -> &BTreeMap<i32, TopicHandle> {
        &self.partition_topics
    }
}

/// The queue a consumer reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerDestination {
    queue: QueueHandle,
}

impl ConsumerDestination {
    /// Queue name.
    pub fn name(&self) -> &str {
        &self.queue.name
    }

    /// Queue handle.
    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }
}

/// [`ProvisioningProvider`] for IBM MQ.
#[derive(Debug, Clone)]
pub struct MqProvisioningProvider<A, R> {
    admin: A,
    resolver: R,
    dead_letter_queue_name: String,
}

impl<A: BrokerAdmin, R: DestinationNameResolver> MqProvisioningProvider<A, R> {
    /// Provider using the default dead-letter queue.
    pub fn new(admin: A, resolver: R) -> Self {
        Self {
            admin,
            resolver,
            dead_letter_queue_name: DEFAULT_DLQ_NAME.to_string(),
        }
    }

    /// Provider using the dead-letter queue from `config`.
    pub fn with_config(admin: A, resolver: R, config: &BinderConfig) -> Self {
        Self::new(admin, resolver).with_dead_letter_queue(&config.dead_letter_queue_name)
    }

    /// Override the binder-wide dead-letter queue.
    pub fn with_dead_letter_queue(mut self, name: &str) -> Self {
        self.dead_letter_queue_name = name.to_string();
        self
    }

    /// Binder-wide dead-letter queue name (sanitised).
    pub fn dead_letter_queue_name(&self) -> String {
        sanitise_object_name(&self.dead_letter_queue_name)
    }

    /// The admin client this provider issues commands through.
    pub fn admin(&self) -> &A {
        &self.admin
    }

    /// Clear and delete the binder-wide dead-letter queue.
    ///
    /// A queue that does not exist is not an error.
    pub fn deprovision_dead_letter_queue(&self) -> Result<(), ProvisioningError> {
        let dlq = self.dead_letter_queue_name();
        info!(queue = %dlq, "Deprovisioning dead-letter queue");

        let result = self
            .admin
            .clear_queue(&dlq)
            .and_then(|cleared| {
                debug!(queue = %dlq, messages = cleared, "Cleared dead-letter queue");
                self.admin.delete_queue(&dlq)
            });
        match result {
            Ok(()) => Ok(()),
            Err(MqError::UnknownObject { .. }) => {
                debug!(queue = %dlq, "Dead-letter queue already gone");
                Ok(())
            }
            Err(e) => Err(ProvisioningError::admin(&dlq, e)),
        }
    }
}

impl<A: BrokerAdmin, R: DestinationNameResolver> ProvisioningProvider for MqProvisioningProvider<A, R> {
    type ConsumerProperties = ConsumerProperties;
    type ProducerProperties = ProducerProperties;

    fn provision_producer_destination(
        &self,
        name: &str,
        properties: &ProducerProperties,
    ) -> Result<ProducerDestination, ProvisioningError> {
        info!(destination = %name, "Provisioning producer destination");

        let name_sets = self
            .resolver
            .resolve_topic_and_queue_names_for_required_groups(name, properties)?;
        let admin_err = |e| ProvisioningError::admin(name, e);

        let mut partition_topics = BTreeMap::new();
        for names in name_sets {
            let key = partition_key(names.partition_index)?;
            let topic_name = sanitise_object_name(&names.topic_name);
            let topic = self.admin.create_topic(&topic_name).map_err(admin_err)?;

            for group in &names.group_names {
                let queue_name = sanitise_object_name(&format!("{topic_name}.{group}"));
                self.admin.create_queue(&queue_name).map_err(admin_err)?;
                self.admin
                    .subscribe_queue_to_topic(&topic_name, &queue_name)
                    .map_err(admin_err)?;
                debug!(topic = %topic_name, queue = %queue_name, "Group queue subscribed");
            }

            if let Some(previous) = partition_topics.insert(key, topic) {
                warn!(
                    destination = %name,
                    partition = key,
                    replaced = %previous.name,
                    "Partition resolved to more than one topic; keeping the last"
                );
            }
        }

        Ok(ProducerDestination { partition_topics })
    }

    fn provision_consumer_destination(
        &self,
        name: &str,
        group: &str,
        properties: &ConsumerProperties,
    ) -> Result<ConsumerDestination, ProvisioningError> {
        info!(destination = %name, group = %group, "Provisioning consumer destination");
        let admin_err = |e| ProvisioningError::admin(name, e);

        let dlq = match properties.dlq_name.as_deref() {
            Some(dlq) if !dlq.trim().is_empty() => sanitise_object_name(dlq),
            _ => self.dead_letter_queue_name(),
        };
        self.admin.create_queue(&dlq).map_err(admin_err)?;

        let queue_name = self
            .resolver
            .resolve_queue_name_for_input_group(group, properties)?;
        let topic_name =
            sanitise_object_name(&self.resolver.resolve_queue_name_for_input_group(name, properties)?);

        let queue_name = sanitise_object_name(&format!("{topic_name}.{queue_name}"));
        let queue = self.admin.create_queue(&queue_name).map_err(admin_err)?;
        self.admin
            .subscribe_queue_to_topic(&topic_name, &queue_name)
            .map_err(admin_err)?;

        Ok(ConsumerDestination { queue })
    }
}

/// Map a resolved partition index to its key. Real partitions are never
/// negative, so they cannot collide with [`UNPARTITIONED`].
fn partition_key(index: Option<u32>) -> Result<i32, ResolutionError> {
    match index {
        None => Ok(UNPARTITIONED),
        Some(index) => {
            i32::try_from(index).map_err(|_| ResolutionError::PartitionIndexOutOfRange { index })
        }
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{DefaultDestinationNameResolver, DestinationNames};
    use mq_binder_admin::{AdminCommand, QueueManager, QueueManagerAdmin};

    fn provider() -> MqProvisioningProvider<QueueManagerAdmin, DefaultDestinationNameResolver> {
        MqProvisioningProvider::new(
            QueueManagerAdmin::new(QueueManager::new("QM1")),
            DefaultDestinationNameResolver::new(),
        )
    }

    /// Resolver returning canned name sets.
    struct Canned(Vec<DestinationNames>);

    impl DestinationNameResolver for Canned {
        fn resolve_topic_and_queue_names_for_required_groups(
            &self,
            _name: &str,
            _properties: &ProducerProperties,
        ) -> Result<Vec<DestinationNames>, ResolutionError> {
            Ok(self.0.clone())
        }

        fn resolve_queue_name_for_input_group(
            &self,
            name_or_group: &str,
            _properties: &ConsumerProperties,
        ) -> Result<String, ResolutionError> {
            Ok(name_or_group.to_string())
        }
    }

    #[test]
    fn test_producer_creates_topic_queues_and_subscriptions() {
        let provider = provider();
        let dest = provider
            .provision_producer_destination("T", &ProducerProperties::with_groups(["g1", "g2"]))
            .unwrap();

        assert_eq!(dest.name(), Some("T"));
        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.topic_names(), vec!["T"]);
        assert_eq!(qm.queue_names(), vec!["T.g1", "T.g2"]);
        assert_eq!(qm.subscriptions().for_topic("T").count(), 2);
        assert_eq!(qm.subscriptions().get("T.g2").unwrap().dest_queue, "T.g2");
    }

    #[test]
    fn test_producer_without_groups_creates_only_topic() {
        let provider = provider();
        provider
            .provision_producer_destination("events", &ProducerProperties::default())
            .unwrap();
        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.topic_names(), vec!["events"]);
        assert!(qm.queue_names().is_empty());
    }

    #[test]
    fn test_producer_names_are_sanitised() {
        let provider = provider();
        let dest = provider
            .provision_producer_destination(
                "order-events",
                &ProducerProperties::with_groups(["th!s->>-is-a-g-r$up"]),
            )
            .unwrap();
        assert_eq!(dest.name(), Some("orderevents"));
        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.queue_names(), vec!["orderevents.thsisagrup"]);
    }

    #[test]
    fn test_partitioned_producer_keys_by_partition() {
        let provider = provider();
        let props = ProducerProperties {
            required_groups: vec!["g".to_string()],
            partition_count: 2,
        };
        let dest = provider.provision_producer_destination("T", &props).unwrap();
        assert_eq!(dest.name(), None);
        assert_eq!(dest.name_for_partition(0), Some("T0"));
        assert_eq!(dest.name_for_partition(1), Some("T1"));
        assert_eq!(dest.partition_topics().len(), 2);
    }

    #[test]
    fn test_duplicate_partition_last_write_wins() {
        let provider = MqProvisioningProvider::new(
            QueueManagerAdmin::new(QueueManager::new("QM1")),
            Canned(vec![
                DestinationNames::partitioned("first", vec![], 0),
                DestinationNames::partitioned("second", vec![], 0),
            ]),
        );
        let dest = provider
            .provision_producer_destination("x", &ProducerProperties::default())
            .unwrap();
        assert_eq!(dest.partition_topics().len(), 1);
        assert_eq!(dest.name_for_partition(0), Some("second"));
        // Both topics were still created on the broker.
        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.topic_names(), vec!["first", "second"]);
    }

    #[test]
    fn test_oversized_partition_index_rejected() {
        let provider = MqProvisioningProvider::new(
            QueueManagerAdmin::new(QueueManager::new("QM1")),
            Canned(vec![
                DestinationNames::new("plain", vec![]),
                DestinationNames::partitioned("huge", vec![], u32::MAX),
            ]),
        );
        let err = provider
            .provision_producer_destination("x", &ProducerProperties::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::Resolution(ResolutionError::PartitionIndexOutOfRange {
                index: u32::MAX
            })
        ));

        // The oversized topic is never defined.
        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.topic_names(), vec!["plain"]);
    }

    #[test]
    fn test_partition_key_bounds() {
        assert_eq!(partition_key(None).unwrap(), UNPARTITIONED);
        assert_eq!(partition_key(Some(0)).unwrap(), 0);
        assert_eq!(partition_key(Some(i32::MAX as u32)).unwrap(), i32::MAX);
        assert!(partition_key(Some(i32::MAX as u32 + 1)).is_err());
    }

    #[test]
    fn test_consumer_creates_dlq_then_queue() {
        let provider = provider();
        let dest = provider
            .provision_consumer_destination("T", "g1", &ConsumerProperties::default())
            .unwrap();
        assert_eq!(dest.name(), "T.g1");

        let issued = provider.admin().issued_commands();
        assert_eq!(
            issued[0],
            AdminCommand::DefineQueue {
                name: "Spring.Cloud.Stream.dlq".to_string()
            }
        );
        assert_eq!(issued[1].object_name(), "T.g1");
    }

    #[test]
    fn test_consumer_dlq_override() {
        let provider = provider().with_dead_letter_queue("BINDER.DLQ");
        let props = ConsumerProperties {
            dlq_name: Some("billing-dlq".to_string()),
            ..Default::default()
        };
        provider
            .provision_consumer_destination("T", "billing", &props)
            .unwrap();
        let qm = provider.admin().queue_manager().unwrap();
        assert!(qm.get_queue("billingdlq").is_ok());
        assert!(qm.get_queue("BINDER.DLQ").is_err());
    }

    #[test]
    fn test_consumer_matches_producer_queue() {
        let provider = provider();
        provider
            .provision_producer_destination("T", &ProducerProperties::with_groups(["g1"]))
            .unwrap();
        let dest = provider
            .provision_consumer_destination("T", "g1", &ConsumerProperties::default())
            .unwrap();
        assert_eq!(dest.name(), "T.g1");

        let qm = provider.admin().queue_manager().unwrap();
        assert_eq!(qm.queue_names(), vec!["Spring.Cloud.Stream.dlq", "T.g1"]);
        assert_eq!(qm.subscriptions().len(), 1);
    }

    #[test]
    fn test_consumer_failure_keeps_dlq() {
        let provider = provider();
        provider
            .admin()
            .queue_manager()
            .unwrap()
            .revoke_authority("T.g1");

        let err = provider
            .provision_consumer_destination("T", "g1", &ConsumerProperties::default())
            .unwrap_err();
        assert_eq!(err.reason_code(), Some(2035));

        let qm = provider.admin().queue_manager().unwrap();
        assert!(qm.get_queue("Spring.Cloud.Stream.dlq").is_ok());
        assert!(qm.get_queue("T.g1").is_err());
    }

    #[test]
    fn test_consumer_resolution_error_propagates() {
        let provider = provider();
        let props = ConsumerProperties {
            partitioned: true,
            instance_index: 3,
            instance_count: 2,
            ..Default::default()
        };
        let err = provider
            .provision_consumer_destination("T", "g1", &props)
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::Resolution(ResolutionError::InstanceIndexOutOfRange { .. })
        ));
        assert_eq!(err.reason_code(), None);
    }

    #[test]
    fn test_deprovision_dlq() {
        let provider = provider();
        provider.deprovision_dead_letter_queue().unwrap();

        provider
            .provision_consumer_destination("T", "g1", &ConsumerProperties::default())
            .unwrap();
        provider.deprovision_dead_letter_queue().unwrap();
        let qm = provider.admin().queue_manager().unwrap();
        assert!(qm.get_queue("Spring.Cloud.Stream.dlq").is_err());
    }
}
