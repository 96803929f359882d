//! Publish/subscribe administrative objects: topic objects and the
//! subscriptions that route a topic into a destination queue.
//!
//! Only the administrative side is modelled here: which topic strings exist
//! and which queues are subscribed to them. Publication delivery belongs to
//! the message transport.

use std::collections::BTreeMap;

use crate::core::{validate_object_name, MqError};

// ---------------------------------------------------------------------------
//  Topic objects
// ---------------------------------------------------------------------------

/// An administrative topic object (DEFINE TOPIC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicObject {
    /// Object name.
    pub name: String,
    /// Topic string the object anchors in the topic tree.
    pub topic_string: String,
}

impl TopicObject {
    pub(crate) fn new(name: &str, topic_string: &str) -> Self {
        Self {
            name: name.to_string(),
            topic_string: topic_string.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
//  Subscriptions
// ---------------------------------------------------------------------------

/// A durable administrative subscription (DEFINE SUB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Unique subscription name.
    pub sub_name: String,
    /// Topic string subscribed to (TOPICSTR).
    pub topic_string: String,
    /// Destination queue (DEST).
    pub dest_queue: String,
}

/// All subscriptions known to a queue manager, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    subscriptions: BTreeMap<String, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription. Fails if the name is taken.
    pub fn subscribe(&mut self, sub: Subscription) -> Result<&Subscription, MqError> {
        validate_object_name(&sub.sub_name)?;
        if self.subscriptions.contains_key(&sub.sub_name) {
            return Err(MqError::ObjectAlreadyExists {
                name: sub.sub_name,
            });
        }
        let name = sub.sub_name.clone();
        Ok(self.subscriptions.entry(name).or_insert(sub))
    }

    /// Get a subscription by name.
    pub fn get(&self, sub_name: &str) -> Option<&Subscription> {
        self.subscriptions.get(sub_name)
    }

    /// Subscriptions on topic string `topic`.
    pub fn for_topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Subscription> + 'a {
        self.subscriptions
            .values()
            .filter(move |s| s.topic_string == topic)
    }

    /// Total subscription count.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether there are no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str, topic: &str, queue: &str) -> Subscription {
        Subscription {
            sub_name: name.to_string(),
            topic_string: topic.to_string(),
            dest_queue: queue.to_string(),
        }
    }

    #[test]
    fn test_subscribe_and_lookup() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe(sub("ORDERS.billing", "ORDERS", "ORDERS.billing"))
            .unwrap();
        assert_eq!(reg.len(), 1);
        let s = reg.get("ORDERS.billing").unwrap();
        assert_eq!(s.dest_queue, "ORDERS.billing");
        assert_eq!(s.topic_string, "ORDERS");
    }

    #[test]
    fn test_duplicate_subscription() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe(sub("S1", "T", "Q")).unwrap();
        let err = reg.subscribe(sub("S1", "T", "Q")).unwrap_err();
        assert_eq!(err.reason_code(), 4001);
    }

    #[test]
    fn test_for_topic() {
        let mut reg = SubscriptionRegistry::new();
        reg.subscribe(sub("A.g1", "A", "A.g1")).unwrap();
        reg.subscribe(sub("A.g2", "A", "A.g2")).unwrap();
        reg.subscribe(sub("B.g1", "B", "B.g1")).unwrap();

        assert_eq!(reg.for_topic("A").count(), 2);
        assert_eq!(reg.for_topic("B").count(), 1);
        assert_eq!(reg.for_topic("nope").count(), 0);
    }
}
