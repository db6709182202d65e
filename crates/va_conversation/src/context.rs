//! Prior-context selection for new requests.

use crate::{History, Message};

/// Builds the message list sent with a request, prepending a sliding window
/// of prior turns ("attention") to the new prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextWindow {
    /// Number of prior sealed turns to include.
    pub depth: usize,
}

impl ContextWindow {
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    /// Build the messages for a request with `prompt`.
    ///
    /// Each of the last [`depth`](Self::depth) sealed turns contributes its
    /// response as an assistant message followed by its prompt as a user
    /// message, oldest turn first. The new prompt is always the last message.
    /// A depth larger than the history is clamped.
    #[must_use]
    pub fn build(&self, history: &History, prompt: &str) -> Vec<Message> {
        let window = history.window_ending_before(self.depth);

        let mut messages = Vec::with_capacity(window.len() * 2 + 1);
        for turn in window {
            messages.push(Message::assistant(turn.response()));
            messages.push(Message::user(turn.prompt()));
        }
        messages.push(Message::user(prompt));

        messages
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::Outcome;

    fn history() -> History {
        let mut history = History::new();
        for (prompt, response) in [("A?", "A!"), ("B?", "B!")] {
            let turn = history.append(prompt, "m").unwrap();
            history
                .seal(turn, response.to_owned(), Outcome::Completed)
                .unwrap();
        }

        history
    }

    #[test]
    fn test_depth_zero_sends_only_the_prompt() {
        let mut history = history();
        let _turn = history.append("C?", "m").unwrap();

        let messages = ContextWindow::new(0).build(&history, "C?");

        assert_eq!(messages, vec![Message::user("C?")]);
    }

    #[test]
    fn test_turns_are_ordered_oldest_first() {
        let mut history = history();
        let _turn = history.append("C?", "m").unwrap();

        let messages = ContextWindow::new(2).build(&history, "C?");

        assert_eq!(messages, vec![
            Message::assistant("A!"),
            Message::user("A?"),
            Message::assistant("B!"),
            Message::user("B?"),
            Message::user("C?"),
        ]);
    }

    #[test]
    fn test_depth_is_clamped_to_history() {
        let mut history = History::new();
        let turn = history.append("A?", "m").unwrap();
        history
            .seal(turn, "A!".to_owned(), Outcome::Completed)
            .unwrap();
        let _turn = history.append("B?", "m").unwrap();

        assert_eq!(
            ContextWindow::new(10).build(&history, "B?"),
            ContextWindow::new(1).build(&history, "B?")
        );
        assert_eq!(ContextWindow::new(10).build(&history, "B?").len(), 3);
    }

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();

        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
