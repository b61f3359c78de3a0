//! Types for the work source module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pending unit of work: a request to run a capture cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Identifier assigned by the queue.
    pub id: String,
    /// Token used to acknowledge (delete) this trigger.
    pub receipt: String,
    /// Message payload, if any. Not interpreted.
    pub body: Option<String>,
    /// When this process received the trigger.
    pub received_at: DateTime<Utc>,
}

impl Trigger {
    /// Creates a trigger received now.
    pub fn new(id: impl Into<String>, receipt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            receipt: receipt.into(),
            body: None,
            received_at: Utc::now(),
        }
    }

    /// Sets the message payload.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// The triggers returned by a single poll, in queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    triggers: Vec<Trigger>,
}

impl Batch {
    /// An empty batch (nothing pending).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trigger> {
        self.triggers.iter()
    }

    /// Identifiers of all triggers, for logging.
    pub fn ids(&self) -> Vec<&str> {
        self.triggers.iter().map(|t| t.id.as_str()).collect()
    }
}

impl From<Vec<Trigger>> for Batch {
    fn from(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }
}

impl FromIterator<Trigger> for Batch {
    fn from_iter<I: IntoIterator<Item = Trigger>>(iter: I) -> Self {
        Self {
            triggers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Trigger;
    type IntoIter = std::slice::Iter<'a, Trigger>;

    fn into_iter(self) -> Self::IntoIter {
        self.triggers.iter()
    }
}
