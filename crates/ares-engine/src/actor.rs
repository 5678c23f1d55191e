//! Identities of the people issuing commands.

use serde::{Deserialize, Serialize};

/// A chat user, rendered as a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<@{}>", self.0)
    }
}

/// A user together with their display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Who they are.
    pub id: UserId,
    /// How they are shown in panels.
    pub name: String,
}

impl Actor {
    /// Create an actor.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
        }
    }

    /// The mention string used in narrations.
    pub fn mention(&self) -> String {
        self.id.to_string()
    }
}
