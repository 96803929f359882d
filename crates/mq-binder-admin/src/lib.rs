//! IBM MQ administration for the stream binder.
//!
//! This crate provides:
//!
//! - **Queue Manager**: local queues, topic objects, and subscriptions with
//!   MQ object-name validation and reason codes
//! - **Admin Commands**: DEFINE for QLOCAL, TOPIC and SUB, CLEAR and DELETE
//!   for QLOCAL, rendered as MQSC
//! - **Publish/Subscribe objects**: topic objects and administrative
//!   subscriptions routing a topic into a destination queue
//! - **Broker Admin**: the create-if-absent client surface the provisioner
//!   uses, with a journal of issued commands
//!
//! ## Example
//!
//! ```rust
//! use mq_binder_admin::{BrokerAdmin, QueueManager, QueueManagerAdmin};
//!
//! let admin = QueueManagerAdmin::new(QueueManager::new("QM1"));
//! admin.create_topic("ORDERS").unwrap();
//! admin.create_queue("ORDERS.billing").unwrap();
//! admin.subscribe_queue_to_topic("ORDERS", "ORDERS.billing").unwrap();
//!
//! assert!(admin.mqsc_script().contains("DEFINE SUB('ORDERS.billing')"));
//! ```

pub mod admin;
pub mod command;
pub mod core;
pub mod pubsub;

pub use self::core::{
    is_object_name_char, validate_object_name, MqError, Queue, QueueManager, QueueType,
    MQ_OBJECT_NAME_LENGTH,
};
pub use admin::{BrokerAdmin, QueueHandle, QueueManagerAdmin, TopicHandle};
pub use command::{AdminCommand, CommandOutcome};
pub use pubsub::{Subscription, SubscriptionRegistry, TopicObject};
