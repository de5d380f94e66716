//! Message, session and history domain types.
//!
//! These are the value objects that flow through the turn pipeline:
//! a customer sends a message → it is masked → context is retrieved →
//! the provider generates a reply → both turns land in the session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Opaque, stable identifier for a customer (e.g. `CUST-001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one conversation thread: a customer plus a session label.
///
/// Two customers never share a key, even when their labels are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub customer: CustomerId,
    pub label: String,
}

impl SessionKey {
    pub fn new(customer: CustomerId, label: impl Into<String>) -> Self {
        Self {
            customer,
            label: label.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.customer, self.label)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The customer
    User,
    /// The support assistant
    Assistant,
    /// Instructions given to the completion service; never stored in history
    System,
}

/// A single message. Messages with role `User` or `Assistant` are the
/// turns recorded in a [`History`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }
}

/// Ordered turns of one session, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    turns: VecDeque<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, then evict from the front until at most `cap` remain.
    pub fn push_bounded(&mut self, turn: Message, cap: usize) {
        self.turns.push_back(turn);
        while self.turns.len() > cap {
            self.turns.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.turns.iter()
    }

    /// Copy the turns out in order.
    pub fn to_vec(&self) -> Vec<Message> {
        self.turns.iter().cloned().collect()
    }
}
