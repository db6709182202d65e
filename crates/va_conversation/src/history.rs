//! The ordered log of conversation turns.

use tracing::{debug, trace};

use crate::{
    Outcome, Turn,
    error::{Error, Result},
};

/// A handle to the in-flight turn of a [`History`].
///
/// Returned by [`History::append`], consumed by [`History::seal`]. There is
/// at most one live handle per history, and it cannot be cloned, so the
/// in-flight turn is never addressed by position.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an in-flight turn must be sealed"]
pub struct ActiveTurn {
    seq: u64,
}

/// Ordered, chronological log of [`Turn`]s.
///
/// At most one turn is in flight (unsealed) at any time, and it is always
/// the last one.
#[derive(Debug, Default)]
pub struct History {
    turns: Vec<Turn>,

    /// Sequence number of the in-flight turn, if any.
    in_flight: Option<u64>,

    next_seq: u64,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new turn for `prompt`, using `model`.
    ///
    /// Fails if another turn is still in flight, or if the prompt is empty.
    pub fn append(&mut self, prompt: &str, model: &str) -> Result<ActiveTurn> {
        self.push(prompt, model, false)
    }

    /// Like [`History::append`], but marks the turn as an agreement priming
    /// turn.
    pub fn append_priming(&mut self, prompt: &str, model: &str) -> Result<ActiveTurn> {
        self.push(prompt, model, true)
    }

    fn push(&mut self, prompt: &str, model: &str, priming: bool) -> Result<ActiveTurn> {
        if self.in_flight.is_some() {
            return Err(Error::TurnInFlight);
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(Error::EmptyPrompt);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight = Some(seq);
        self.turns
            .push(Turn::new(prompt.to_owned(), model.to_owned(), priming));

        trace!(seq, model, priming, len = self.turns.len(), "Appended turn.");
        Ok(ActiveTurn { seq })
    }

    /// Seal the in-flight turn with its final response.
    pub fn seal(&mut self, turn: ActiveTurn, response: String, outcome: Outcome) -> Result<()> {
        if self.in_flight != Some(turn.seq) {
            return Err(Error::StaleTurn);
        }

        let last = self.turns.last_mut().ok_or(Error::StaleTurn)?;
        last.seal(response, outcome);
        self.in_flight = None;

        debug!(seq = turn.seq, %outcome, len = last.response().len(), "Sealed turn.");
        Ok(())
    }

    /// Remove and return the most recent turn.
    ///
    /// Returns `None` if the history is empty, or if the most recent turn is
    /// still in flight.
    pub fn pop_last(&mut self) -> Option<Turn> {
        if self.in_flight.is_some() {
            debug!("Refusing to pop the in-flight turn.");
            return None;
        }

        self.turns.pop()
    }

    /// The last `n` sealed turns preceding the in-flight turn, oldest first.
    ///
    /// If fewer than `n` sealed turns exist, all of them are returned.
    #[must_use]
    pub fn window_ending_before(&self, n: usize) -> &[Turn] {
        let sealed = self.sealed();
        &sealed[sealed.len().saturating_sub(n)..]
    }

    /// All sealed turns, oldest first.
    #[must_use]
    pub fn sealed(&self) -> &[Turn] {
        let end = self.turns.len() - usize::from(self.in_flight.is_some());
        &self.turns[..end]
    }

    /// All turns, including the in-flight turn, oldest first.
    #[must_use]
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// The in-flight turn, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&Turn> {
        self.in_flight.and(self.turns.last())
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
