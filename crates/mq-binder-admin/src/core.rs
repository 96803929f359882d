//! Queue manager model: local queues, topic objects, subscriptions, and the
//! reason codes the command server reports.

use std::collections::{BTreeMap, HashSet, VecDeque};

use miette::Diagnostic;
use thiserror::Error;

use crate::pubsub::{SubscriptionRegistry, TopicObject};

/// Maximum length of an MQ object name (queues, topics, subscriptions).
pub const MQ_OBJECT_NAME_LENGTH: usize = 48;

/// Default maximum queue depth for newly defined local queues.
pub const DEFAULT_MAX_DEPTH: u32 = 5000;

// ---------------------------------------------------------------------------
//  Errors
// ---------------------------------------------------------------------------

/// Errors reported by the queue manager's command server.
///
/// Every variant carries the MQ reason code the real command server would
/// return for the same condition; see [`MqError::reason_code`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum MqError {
    /// The connection to the queue manager was lost (MQRC 2009).
    #[error("connection to queue manager broken")]
    #[diagnostic(code(mq::connection_broken))]
    ConnectionBroken,

    /// The caller lacks authority for the object (MQRC 2035).
    #[error("not authorized to administer '{object}'")]
    #[diagnostic(code(mq::not_authorized), help("Grant +crt/+chg authority on the object"))]
    NotAuthorized {
        /// The object name the command referred to.
        object: String,
    },

    /// The queue is at its maximum depth (MQRC 2053).
    #[error("queue '{name}' is full")]
    #[diagnostic(code(mq::queue_full))]
    QueueFull {
        /// The queue name.
        name: String,
    },

    /// A queue cannot be deleted while it holds messages (MQRC 2055).
    #[error("queue '{name}' is not empty (depth {depth})")]
    #[diagnostic(code(mq::queue_not_empty), help("CLEAR QLOCAL before deleting"))]
    QueueNotEmpty {
        /// The queue name.
        name: String,
        /// Current depth.
        depth: u32,
    },

    /// The queue manager is not running (MQRC 2059).
    #[error("queue manager '{qmgr}' is not available")]
    #[diagnostic(code(mq::qmgr_not_available))]
    QueueManagerUnavailable {
        /// The queue manager name.
        qmgr: String,
    },

    /// The named object does not exist (MQRC 2085).
    #[error("unknown object name '{name}'")]
    #[diagnostic(code(mq::unknown_object))]
    UnknownObject {
        /// The missing object name.
        name: String,
    },

    /// The object name breaks MQ naming rules (MQRC 2152).
    #[error("invalid object name '{name}': {reason}")]
    #[diagnostic(code(mq::object_name_error))]
    InvalidObjectName {
        /// The rejected name.
        name: String,
        /// Which rule was broken.
        reason: String,
    },

    /// An object of the same name and type already exists (MQRCCF 4001).
    #[error("object '{name}' already exists")]
    #[diagnostic(code(mq::object_already_exists))]
    ObjectAlreadyExists {
        /// The duplicate object name.
        name: String,
    },
}

impl MqError {
    /// MQ reason code for this error.
    pub fn reason_code(&self) -> u32 {
        match self {
            Self::ConnectionBroken => 2009,
            Self::NotAuthorized { .. } => 2035,
            Self::QueueFull { .. } => 2053,
            Self::QueueNotEmpty { .. } => 2055,
            Self::QueueManagerUnavailable { .. } => 2059,
            Self::UnknownObject { .. } => 2085,
            Self::InvalidObjectName { .. } => 2152,
            Self::ObjectAlreadyExists { .. } => 4001,
        }
    }
}

/// Validate an object name against MQ naming rules.
///
/// Names are 1 to 48 characters from `A-Z a-z 0-9 . / _ %`.
pub fn validate_object_name(name: &str) -> Result<(), MqError> {
    if name.is_empty() {
        return Err(MqError::InvalidObjectName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.len() > MQ_OBJECT_NAME_LENGTH {
        return Err(MqError::InvalidObjectName {
            name: name.to_string(),
            reason: format!("longer than {MQ_OBJECT_NAME_LENGTH} characters"),
        });
    }
    if let Some(bad) = name.chars().find(|c| !is_object_name_char(*c)) {
        return Err(MqError::InvalidObjectName {
            name: name.to_string(),
            reason: format!("character '{bad}' is not allowed"),
        });
    }
    Ok(())
}

/// Whether `c` may appear in an MQ object name.
pub fn is_object_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '%')
}

// ---------------------------------------------------------------------------
//  Queues
// ---------------------------------------------------------------------------

/// Queue type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueType {
    /// Local queue (QLOCAL).
    #[default]
    Local,
}

/// A local queue.
#[derive(Debug, Clone)]
pub struct Queue {
    /// Queue name.
    pub name: String,
    /// Queue type.
    pub queue_type: QueueType,
    /// Maximum depth (MAXDEPTH).
    pub max_depth: u32,
    messages: VecDeque<Vec<u8>>,
}

impl Queue {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue_type: QueueType::Local,
            max_depth: DEFAULT_MAX_DEPTH,
            messages: VecDeque::new(),
        }
    }

    /// Current queue depth.
    pub fn depth(&self) -> u32 {
        self.messages.len() as u32
    }

    /// Put a message body on the queue.
    pub fn put(&mut self, data: Vec<u8>) -> Result<(), MqError> {
        if self.depth() >= self.max_depth {
            return Err(MqError::QueueFull {
                name: self.name.clone(),
            });
        }
        self.messages.push_back(data);
        Ok(())
    }

    /// Remove all messages, returning how many were discarded.
    pub fn clear(&mut self) -> u32 {
        let depth = self.depth();
        self.messages.clear();
        depth
    }
}

// ---------------------------------------------------------------------------
//  Queue manager
// ---------------------------------------------------------------------------

/// An in-process queue manager holding the administrative objects the
/// binder provisions.
#[derive(Debug)]
pub struct QueueManager {
    /// Queue manager name.
    pub name: String,
    /// Whether the queue manager accepts commands.
    pub running: bool,
    queues: BTreeMap<String, Queue>,
    topics: BTreeMap<String, TopicObject>,
    subscriptions: SubscriptionRegistry,
    revoked: HashSet<String>,
}

impl QueueManager {
    /// Create a running queue manager with no objects.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            running: true,
            queues: BTreeMap::new(),
            topics: BTreeMap::new(),
            subscriptions: SubscriptionRegistry::new(),
            revoked: HashSet::new(),
        }
    }

    /// Stop the queue manager; subsequent commands fail with 2059.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Restart a stopped queue manager.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Revoke define/delete authority on an object name.
    pub fn revoke_authority(&mut self, object: &str) {
        self.revoked.insert(object.to_string());
    }

    /// Restore authority on an object name.
    pub fn grant_authority(&mut self, object: &str) {
        self.revoked.remove(object);
    }

    pub(crate) fn check_available(&self) -> Result<(), MqError> {
        if self.running {
            Ok(())
        } else {
            Err(MqError::QueueManagerUnavailable {
                qmgr: self.name.clone(),
            })
        }
    }

    pub(crate) fn check_authority(&self, object: &str) -> Result<(), MqError> {
        if self.revoked.contains(object) {
            Err(MqError::NotAuthorized {
                object: object.to_string(),
            })
        } else {
            Ok(())
        }
    }

    // -- queues --

    /// DEFINE QLOCAL: define a new local queue.
    pub fn define_queue(&mut self, name: &str) -> Result<&Queue, MqError> {
        validate_object_name(name)?;
        if self.queues.contains_key(name) {
            return Err(MqError::ObjectAlreadyExists {
                name: name.to_string(),
            });
        }
        Ok(self
            .queues
            .entry(name.to_string())
            .or_insert_with(|| Queue::new(name)))
    }

    /// DELETE QLOCAL: delete an empty local queue.
    pub fn delete_queue(&mut self, name: &str) -> Result<(), MqError> {
        let queue = self.get_queue(name)?;
        if queue.depth() > 0 {
            return Err(MqError::QueueNotEmpty {
                name: name.to_string(),
                depth: queue.depth(),
            });
        }
        self.queues.remove(name);
        Ok(())
    }

    /// Look up a queue by name.
    pub fn get_queue(&self, name: &str) -> Result<&Queue, MqError> {
        self.queues.get(name).ok_or_else(|| MqError::UnknownObject {
            name: name.to_string(),
        })
    }

    /// Look up a queue by name for modification.
    pub fn get_queue_mut(&mut self, name: &str) -> Result<&mut Queue, MqError> {
        self.queues
            .get_mut(name)
            .ok_or_else(|| MqError::UnknownObject {
                name: name.to_string(),
            })
    }

    /// Names of all defined queues, sorted.
    pub fn queue_names(&self) -> Vec<&str> {
        self.queues.keys().map(String::as_str).collect()
    }

    // -- topics --

    /// DEFINE TOPIC: define a topic object for a topic string.
    pub fn define_topic(&mut self, name: &str, topic_string: &str) -> Result<&TopicObject, MqError> {
        validate_object_name(name)?;
        if self.topics.contains_key(name) {
            return Err(MqError::ObjectAlreadyExists {
                name: name.to_string(),
            });
        }
        Ok(self
            .topics
            .entry(name.to_string())
            .or_insert_with(|| TopicObject::new(name, topic_string)))
    }

    /// Look up a topic object by name.
    pub fn get_topic(&self, name: &str) -> Result<&TopicObject, MqError> {
        self.topics.get(name).ok_or_else(|| MqError::UnknownObject {
            name: name.to_string(),
        })
    }

    /// Names of all defined topic objects, sorted.
    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    // -- subscriptions --

    /// Administrative subscriptions.
    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub(crate) fn subscriptions_mut(&mut self) -> &mut SubscriptionRegistry {
        &mut self.subscriptions
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
