use common::Outcome;
use serde::{Deserialize, Serialize};

/// Longest note content accepted, in characters.
pub const MAX_NOTE_LENGTH: usize = 500;

/// A free-text note attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    content: String,
}

impl OrderNote {
    pub fn create(content: impl Into<String>) -> Outcome<OrderNote> {
        let content = content.into().trim().to_string();
        if content.is_empty() {
            return Outcome::fail("Note content is required.");
        }
        if content.chars().count() > MAX_NOTE_LENGTH {
            return Outcome::fail(format!(
                "Note content cannot exceed {MAX_NOTE_LENGTH} characters."
            ));
        }
        Outcome::ok_with(Self { content })
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
