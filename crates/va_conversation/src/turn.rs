//! Defines the [`Turn`] structure.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The stream finished, either with a terminal marker or by ending.
    Completed,

    /// The user cancelled the request. The response holds the partial text
    /// received before the cancellation.
    Aborted,

    /// The request failed. The response is empty.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted => f.write_str("aborted"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// One prompt/response exchange in the conversation.
///
/// A turn is created in flight, with an empty response, and sealed once its
/// request has ended. Only [`History`](crate::History) can seal a turn, and a
/// sealed turn never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    prompt: String,
    response: String,
    model: String,
    timestamp: DateTime<Utc>,
    outcome: Option<Outcome>,
    priming: bool,
}

impl Turn {
    pub(crate) fn new(prompt: String, model: String, priming: bool) -> Self {
        Self {
            prompt,
            response: String::new(),
            model,
            timestamp: Utc::now(),
            outcome: None,
            priming,
        }
    }

    pub(crate) fn seal(&mut self, response: String, outcome: Outcome) {
        self.response = response;
        self.outcome = Some(outcome);
    }

    /// The user-submitted prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The model response. Empty while the turn is in flight.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The model used for this turn.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// How the turn ended, `None` while in flight.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether this is an agreement priming turn.
    ///
    /// Priming turns are part of the history, but are not shown in the
    /// conversation transcript.
    #[must_use]
    pub fn is_priming(&self) -> bool {
        self.priming
    }

    /// Render the turn as a Markdown block: the prompt as a heading, followed
    /// by the response.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("### {}\n\n{}\n\n", self.prompt, self.response)
    }
}
