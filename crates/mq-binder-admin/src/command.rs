//! Administrative commands and the queue manager's command server.
//!
//! Each [`AdminCommand`] is one administrative request. It renders as the
//! equivalent MQSC text through [`std::fmt::Display`], so a journal of issued
//! commands doubles as a `runmqsc` script.

use std::fmt;

use crate::core::{MqError, QueueManager};
use crate::pubsub::Subscription;

/// An administrative command understood by the command server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// DEFINE QLOCAL.
    DefineQueue { name: String },
    /// DEFINE TOPIC.
    DefineTopic { name: String, topic_string: String },
    /// DEFINE SUB on a topic string with an explicit destination queue.
    DefineSubscription {
        name: String,
        topic_string: String,
        dest_queue: String,
    },
    /// CLEAR QLOCAL.
    ClearQueue { name: String },
    /// DELETE QLOCAL.
    DeleteQueue { name: String },
}

impl AdminCommand {
    /// Name of the object the command targets.
    pub fn object_name(&self) -> &str {
        match self {
            Self::DefineQueue { name }
            | Self::DefineTopic { name, .. }
            | Self::DefineSubscription { name, .. }
            | Self::ClearQueue { name }
            | Self::DeleteQueue { name } => name,
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefineQueue { name } => write!(f, "DEFINE QLOCAL('{name}') NOREPLACE"),
            Self::DefineTopic { name, topic_string } => write!(
                f,
                "DEFINE TOPIC('{name}') TOPICSTR('{topic_string}') NOREPLACE"
            ),
            Self::DefineSubscription {
                name,
                topic_string,
                dest_queue,
            } => write!(
                f,
                "DEFINE SUB('{name}') TOPICSTR('{topic_string}') DEST('{dest_queue}') NOREPLACE"
            ),
            Self::ClearQueue { name } => write!(f, "CLEAR QLOCAL('{name}')"),
            Self::DeleteQueue { name } => write!(f, "DELETE QLOCAL('{name}')"),
        }
    }
}

/// What a successful command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// An object was defined.
    Defined,
    /// A queue was cleared of `messages` messages.
    Cleared { messages: u32 },
    /// An object was deleted.
    Deleted,
}

impl QueueManager {
    /// Run one administrative command against this queue manager.
    pub fn execute(&mut self, command: &AdminCommand) -> Result<CommandOutcome, MqError> {
        self.check_available()?;
        self.check_authority(command.object_name())?;

        match command {
            AdminCommand::DefineQueue { name } => {
                self.define_queue(name)?;
                Ok(CommandOutcome::Defined)
            }
            AdminCommand::DefineTopic { name, topic_string } => {
                self.define_topic(name, topic_string)?;
                Ok(CommandOutcome::Defined)
            }
            AdminCommand::DefineSubscription {
                name,
                topic_string,
                dest_queue,
            } => {
                // A topic string needs no topic object; the destination must exist.
                self.get_queue(dest_queue)?;
                self.subscriptions_mut().subscribe(Subscription {
                    sub_name: name.clone(),
                    topic_string: topic_string.clone(),
                    dest_queue: dest_queue.clone(),
                })?;
                Ok(CommandOutcome::Defined)
            }
            AdminCommand::ClearQueue { name } => {
                let messages = self.get_queue_mut(name)?.clear();
                Ok(CommandOutcome::Cleared { messages })
            }
            AdminCommand::DeleteQueue { name } => {
                self.delete_queue(name)?;
                Ok(CommandOutcome::Deleted)
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
