//! Broker administration: the client-side surface the binder provisions
//! through.
//!
//! [`BrokerAdmin`] is the capability the provisioner depends on.
//! [`QueueManagerAdmin`] implements it by issuing [`AdminCommand`]s to a
//! shared [`QueueManager`] and keeping a journal of everything it sent.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::command::{AdminCommand, CommandOutcome};
use crate::core::{MqError, QueueManager};

/// Reference to a topic object on the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicHandle {
    /// Topic object name.
    pub name: String,
    /// Topic string the object resolves to.
    pub topic_string: String,
}

/// Reference to a local queue on the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueHandle {
    /// Queue name.
    pub name: String,
}

/// Administrative operations against a queue manager.
///
/// Create and subscribe calls are create-if-absent: an object that already
/// exists is not an error. All calls are synchronous.
pub trait BrokerAdmin {
    /// Ensure a topic object named `name` exists.
    fn create_topic(&self, name: &str) -> Result<TopicHandle, MqError>;

    /// Ensure a local queue named `name` exists.
    fn create_queue(&self, name: &str) -> Result<QueueHandle, MqError>;

    /// Ensure `queue_name` receives publications on `topic_name`.
    fn subscribe_queue_to_topic(&self, topic_name: &str, queue_name: &str) -> Result<(), MqError>;

    /// Discard every message on a queue, returning how many were removed.
    fn clear_queue(&self, name: &str) -> Result<u32, MqError>;

    /// Delete an empty queue.
    fn delete_queue(&self, name: &str) -> Result<(), MqError>;
}

impl<T: BrokerAdmin + ?Sized> BrokerAdmin for Arc<T> {
    fn create_topic(&self, name: &str) -> Result<TopicHandle, MqError> {
        (**self).create_topic(name)
    }

    fn create_queue(&self, name: &str) -> Result<QueueHandle, MqError> {
        (**self).create_queue(name)
    }

    fn subscribe_queue_to_topic(&self, topic_name: &str, queue_name: &str) -> Result<(), MqError> {
        (**self).subscribe_queue_to_topic(topic_name, queue_name)
    }

    fn clear_queue(&self, name: &str) -> Result<u32, MqError> {
        (**self).clear_queue(name)
    }

    fn delete_queue(&self, name: &str) -> Result<(), MqError> {
        (**self).delete_queue(name)
    }
}

// ---------------------------------------------------------------------------
//  Queue-manager-backed implementation
// ---------------------------------------------------------------------------

/// [`BrokerAdmin`] backed by an in-process [`QueueManager`].
///
/// Clones share the same queue manager and journal.
#[derive(Debug, Clone)]
pub struct QueueManagerAdmin {
    qmgr: Arc<Mutex<QueueManager>>,
    journal: Arc<Mutex<Vec<AdminCommand>>>,
}

impl QueueManagerAdmin {
    /// Administer a queue manager owned by this client.
    pub fn new(qmgr: QueueManager) -> Self {
        Self::shared(Arc::new(Mutex::new(qmgr)))
    }

    /// Administer a queue manager shared with other clients.
    pub fn shared(qmgr: Arc<Mutex<QueueManager>>) -> Self {
        Self {
            qmgr,
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Lock the underlying queue manager for inspection or setup.
    pub fn queue_manager(&self) -> Result<MutexGuard<'_, QueueManager>, MqError> {
        self.qmgr.lock().map_err(|_| MqError::ConnectionBroken)
    }

    /// Every command issued so far, in order, including failed ones.
    pub fn issued_commands(&self) -> Vec<AdminCommand> {
        self.journal().clone()
    }

    /// The journal rendered as an MQSC script, one command per line.
    pub fn mqsc_script(&self) -> String {
        self.issued_commands()
            .iter()
            .map(|c| format!("{c}\n"))
            .collect()
    }

    fn run(&self, command: AdminCommand) -> Result<CommandOutcome, MqError> {
        let result = {
            let mut qm = self.queue_manager()?;
            debug!(qmgr = %qm.name, command = %command, "Issuing admin command");
            qm.execute(&command)
        };
        self.journal().push(command);
        result
    }

    /// The journal only ever grows by whole entries, so a poisoned lock
    /// still guards a consistent list.
    fn journal(&self) -> MutexGuard<'_, Vec<AdminCommand>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a define command, treating an existing object as success.
    fn ensure(&self, command: AdminCommand) -> Result<(), MqError> {
        match self.run(command) {
            Ok(_) => Ok(()),
            Err(MqError::ObjectAlreadyExists { name }) => {
                debug!(object = %name, "Object already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl BrokerAdmin for QueueManagerAdmin {
    fn create_topic(&self, name: &str) -> Result<TopicHandle, MqError> {
        self.ensure(AdminCommand::DefineTopic {
            name: name.to_string(),
            topic_string: name.to_string(),
        })?;
        let qm = self.queue_manager()?;
        let topic = qm.get_topic(name)?;
        Ok(TopicHandle {
            name: topic.name.clone(),
            topic_string: topic.topic_string.clone(),
        })
    }

    fn create_queue(&self, name: &str) -> Result<QueueHandle, MqError> {
        self.ensure(AdminCommand::DefineQueue {
            name: name.to_string(),
        })?;
        Ok(QueueHandle {
            name: name.to_string(),
        })
    }

    fn subscribe_queue_to_topic(&self, topic_name: &str, queue_name: &str) -> Result<(), MqError> {
        // One subscription per destination queue, named after the queue.
        self.ensure(AdminCommand::DefineSubscription {
            name: queue_name.to_string(),
            topic_string: topic_name.to_string(),
            dest_queue: queue_name.to_string(),
        })
    }

    fn clear_queue(&self, name: &str) -> Result<u32, MqError> {
        match self.run(AdminCommand::ClearQueue {
            name: name.to_string(),
        })? {
            CommandOutcome::Cleared { messages } => Ok(messages),
            _ => Ok(0),
        }
    }

    fn delete_queue(&self, name: &str) -> Result<(), MqError> {
        self.run(AdminCommand::DeleteQueue {
            name: name.to_string(),
        })
        .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
