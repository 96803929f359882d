//! Destination naming: turns a logical binding (destination name, consumer
//! groups, partitions) into topic and queue name candidates.
//!
//! The provisioner only depends on [`DestinationNameResolver`]; the naming
//! policy can be replaced without touching the administrative calls.
//! [`DefaultDestinationNameResolver`] implements the binder's standard
//! convention:
//!
//! | binding | topic | group queues |
//! |---|---|---|
//! | unpartitioned producer `orders` | `orders` | `g` for each required group |
//! | partitioned producer, partition `i` | `orders-i` | `g-i` |
//! | consumer group `g` | | `g`, or `g-<instance>` when partitioned |
//! | anonymous consumer | | generated by the [`AnonymousNamingStrategy`] |

use base64::Engine;
use uuid::Uuid;

use crate::error::ResolutionError;
use crate::properties::{ConsumerProperties, ProducerProperties};

/// Default prefix for generated anonymous group names.
pub const DEFAULT_ANONYMOUS_PREFIX: &str = "anonymous.";

/// One topic plus the group queue names that subscribe to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationNames {
    /// Topic name candidate (unsanitised).
    pub topic_name: String,
    /// Group queue name candidates (unsanitised).
    pub group_names: Vec<String>,
    /// Partition served by this topic, `None` if unpartitioned.
    pub partition_index: Option<u32>,
}

impl DestinationNames {
    /// Names for an unpartitioned topic.
    pub fn new(topic_name: impl Into<String>, group_names: Vec<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            group_names,
            partition_index: None,
        }
    }

    /// Names for the topic of partition `index`.
    pub fn partitioned(topic_name: impl Into<String>, group_names: Vec<String>, index: u32) -> Self {
        Self {
            topic_name: topic_name.into(),
            group_names,
            partition_index: Some(index),
        }
    }
}

/// Resolves logical bindings into topic and queue name candidates.
pub trait DestinationNameResolver {
    /// Topic/queue name sets a producer on `name` must provision, one per
    /// partition.
    fn resolve_topic_and_queue_names_for_required_groups(
        &self,
        name: &str,
        properties: &ProducerProperties,
    ) -> Result<Vec<DestinationNames>, ResolutionError>;

    /// Queue name for a consumer group (or destination name) on input.
    fn resolve_queue_name_for_input_group(
        &self,
        name_or_group: &str,
        properties: &ConsumerProperties,
    ) -> Result<String, ResolutionError>;
}

/// Generates names for consumers bound without a group.
pub trait AnonymousNamingStrategy {
    /// A fresh, unique group name.
    fn generate_name(&self) -> String;
}

/// Anonymous names of the form `<prefix><url-safe base64 of a random UUID>`.
#[derive(Debug, Clone)]
pub struct Base64UrlNamingStrategy {
    prefix: String,
}

impl Base64UrlNamingStrategy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for Base64UrlNamingStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_ANONYMOUS_PREFIX)
    }
}

impl AnonymousNamingStrategy for Base64UrlNamingStrategy {
    fn generate_name(&self) -> String {
        let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!("{}{}", self.prefix, b64.encode(Uuid::new_v4().as_bytes()))
    }
}

/// The binder's standard naming convention.
#[derive(Debug, Clone)]
pub struct DefaultDestinationNameResolver<S = Base64UrlNamingStrategy> {
    anonymous: S,
}

impl DefaultDestinationNameResolver {
    /// Resolver generating anonymous names with the default prefix.
    pub fn new() -> Self {
        Self::with_strategy(Base64UrlNamingStrategy::default())
    }
}

impl Default for DefaultDestinationNameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AnonymousNamingStrategy> DefaultDestinationNameResolver<S> {
    /// Resolver generating anonymous names with `anonymous`.
    pub fn with_strategy(anonymous: S) -> Self {
        Self { anonymous }
    }
}

impl<S: AnonymousNamingStrategy> DestinationNameResolver for DefaultDestinationNameResolver<S> {
    fn resolve_topic_and_queue_names_for_required_groups(
        &self,
        name: &str,
        properties: &ProducerProperties,
    ) -> Result<Vec<DestinationNames>, ResolutionError> {
        if name.trim().is_empty() {
            return Err(ResolutionError::EmptyDestination);
        }
        if properties.partition_count == 0 {
            return Err(ResolutionError::ZeroPartitions);
        }

        if !properties.is_partitioned() {
            return Ok(vec![DestinationNames::new(
                name,
                properties.required_groups.clone(),
            )]);
        }

        Ok((0..properties.partition_count)
            .map(|index| {
                let groups = properties
                    .required_groups
                    .iter()
                    .map(|g| format!("{g}-{index}"))
                    .collect();
                DestinationNames::partitioned(format!("{name}-{index}"), groups, index)
            })
            .collect())
    }

    fn resolve_queue_name_for_input_group(
        &self,
        name_or_group: &str,
        properties: &ConsumerProperties,
    ) -> Result<String, ResolutionError> {
        let base = if name_or_group.trim().is_empty() {
            self.anonymous.generate_name()
        } else {
            name_or_group.to_string()
        };

        if !properties.partitioned {
            return Ok(base);
        }
        if properties.instance_index >= properties.instance_count {
            return Err(ResolutionError::InstanceIndexOutOfRange {
                instance_index: properties.instance_index,
                instance_count: properties.instance_count,
            });
        }
        Ok(format!("{base}-{}", properties.instance_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedName(&'static str);

    impl AnonymousNamingStrategy for FixedName {
        fn generate_name(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_unpartitioned_producer() {
        let resolver = DefaultDestinationNameResolver::new();
        let names = resolver
            .resolve_topic_and_queue_names_for_required_groups(
                "orders",
                &ProducerProperties::with_groups(["billing", "audit"]),
            )
            .unwrap();
        assert_eq!(
            names,
            vec![DestinationNames::new(
                "orders",
                vec!["billing".to_string(), "audit".to_string()]
            )]
        );
    }

    #[test]
    fn test_partitioned_producer() {
        let resolver = DefaultDestinationNameResolver::new();
        let props = ProducerProperties {
            required_groups: vec!["billing".to_string()],
            partition_count: 3,
        };
        let names = resolver
            .resolve_topic_and_queue_names_for_required_groups("orders", &props)
            .unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names[2].topic_name, "orders-2");
        assert_eq!(names[2].group_names, vec!["billing-2"]);
        assert_eq!(names[2].partition_index, Some(2));
    }

    #[test]
    fn test_producer_errors() {
        let resolver = DefaultDestinationNameResolver::new();
        assert_eq!(
            resolver
                .resolve_topic_and_queue_names_for_required_groups(" ", &ProducerProperties::default())
                .unwrap_err(),
            ResolutionError::EmptyDestination
        );
        let zero = ProducerProperties {
            partition_count: 0,
            ..Default::default()
        };
        assert_eq!(
            resolver
                .resolve_topic_and_queue_names_for_required_groups("orders", &zero)
                .unwrap_err(),
            ResolutionError::ZeroPartitions
        );
    }

    #[test]
    fn test_consumer_group_names() {
        let resolver = DefaultDestinationNameResolver::with_strategy(FixedName("anon.x"));
        let plain = ConsumerProperties::default();
        assert_eq!(
            resolver.resolve_queue_name_for_input_group("billing", &plain).unwrap(),
            "billing"
        );
        assert_eq!(
            resolver.resolve_queue_name_for_input_group("", &plain).unwrap(),
            "anon.x"
        );

        let partitioned = ConsumerProperties {
            partitioned: true,
            instance_index: 1,
            instance_count: 3,
            ..Default::default()
        };
        assert_eq!(
            resolver
                .resolve_queue_name_for_input_group("billing", &partitioned)
                .unwrap(),
            "billing-1"
        );
    }

    #[test]
    fn test_consumer_instance_out_of_range() {
        let resolver = DefaultDestinationNameResolver::new();
        let props = ConsumerProperties {
            partitioned: true,
            instance_index: 3,
            instance_count: 3,
            ..Default::default()
        };
        assert!(matches!(
            resolver.resolve_queue_name_for_input_group("billing", &props),
            Err(ResolutionError::InstanceIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_base64_anonymous_names() {
        let strategy = Base64UrlNamingStrategy::default();
        let a = strategy.generate_name();
        let b = strategy.generate_name();
        assert_ne!(a, b);
        assert!(a.starts_with(DEFAULT_ANONYMOUS_PREFIX));
        // 16 UUID bytes encode to 22 unpadded base64 characters.
        assert_eq!(a.len(), DEFAULT_ANONYMOUS_PREFIX.len() + 22);
        assert!(!a.contains('='));
    }
}
