//! Markdown export of a conversation.

use chrono::{DateTime, Utc};

use crate::Turn;

/// Serialize turns as Markdown, one `### prompt` block per turn, in order.
#[must_use]
pub fn to_markdown<'a>(turns: impl IntoIterator<Item = &'a Turn>) -> String {
    turns.into_iter().map(Turn::to_markdown).collect()
}

/// The file name for an export created at `at`.
///
/// Derived from the ISO-8601 timestamp, truncated to the minute, with the
/// time separator replaced so the name is valid on every file system, e.g.
/// `chat-2024-05-01T13-37.md`.
#[must_use]
pub fn file_name(at: DateTime<Utc>) -> String {
    format!("chat-{}.md", at.format("%Y-%m-%dT%H-%M"))
}
