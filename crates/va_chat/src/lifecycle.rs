//! The lifecycle of a single request.
//!
//! A submission moves through [`Phase::Sending`] and [`Phase::Streaming`]
//! and ends as completed, aborted or failed. Whatever the end, its turn is
//! sealed into the history and the chat returns to [`Phase::Idle`].

use futures::StreamExt as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use va_client::{Backend, ChatRequest};
use va_conversation::{ContextWindow, History, Outcome as TurnOutcome};
use va_stream::{ChunkAggregator, StreamEvent, decode};

use crate::{
    AbortHandle, AgreementGate, Notice, Phase, Render, Session,
    error::Result,
};

/// How a submission ended, if it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was sent: the prompt was empty, or there was nothing to redo.
    Ignored,

    Completed,

    /// The request was cancelled. The partial response was kept.
    Aborted,
}

/// How streaming a response ended.
enum Streamed {
    Completed(String),
    Aborted(String),
}

/// A conversation with a remote model.
#[derive(Debug)]
pub struct Chat<B> {
    backend: B,
    session: Session,
    gate: AgreementGate,
    history: History,
    handle: AbortHandle,
}

impl<B: Backend> Chat<B> {
    pub fn new(backend: B, session: Session, gate: AgreementGate) -> Self {
        Self {
            backend,
            session,
            gate,
            history: History::new(),
            handle: AbortHandle::default(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.handle.phase()
    }

    /// A handle to cancel requests of this chat from elsewhere.
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.clone()
    }

    /// Switch to another model.
    ///
    /// Gated models have to be primed again, even if they were primed before.
    pub fn select_model(&mut self, model: impl Into<String>) {
        let model = model.into();
        self.session.agreed = self.gate.agreed_after_switch(&model);
        info!(%model, agreed = self.session.agreed, "Selected model.");

        self.session.model = model;
    }

    /// Set the number of prior turns sent as context.
    pub fn set_attention(&mut self, depth: usize) {
        debug!(depth, "Changed attention.");
        self.session.attention = depth;
    }

    /// Submit a prompt, streaming the response into `render`.
    ///
    /// For gated models that did not yet agree, the agreement prompt is sent
    /// first, and the user prompt only follows once it completed.
    ///
    /// A failed request still leaves a (sealed, empty) turn in the history.
    pub async fn submit<R>(&mut self, prompt: &str, render: &mut R) -> Result<Outcome>
    where
        R: Render + ?Sized,
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            debug!("Ignoring empty prompt.");
            return Ok(Outcome::Ignored);
        }

        let (_guard, token) = self.handle.begin();
        let model = self.session.model.clone();

        if self.gate.needs_priming(&model, self.session.agreed) {
            info!(%model, "Model requires agreement, sending priming prompt.");
            render.notice(Notice::PrimingSent);

            let priming = self.gate.prompt().to_owned();
            match self.exchange(&priming, &model, true, render, &token).await? {
                Outcome::Completed => {}
                outcome => return Ok(outcome),
            }

            tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!("Aborted while waiting for agreement to settle.");
                    self.handle.set_phase(Phase::Aborted);
                    render.notice(Notice::Aborted);
                    return Ok(Outcome::Aborted);
                }
                () = tokio::time::sleep(self.gate.settle_delay()) => {}
            }

            self.session.agreed = true;
            render.notice(Notice::PrimingAccepted);
        }

        self.exchange(prompt, &model, false, render, &token).await
    }

    /// Remove the most recent turn and submit its prompt again.
    pub async fn redo<R>(&mut self, render: &mut R) -> Result<Outcome>
    where
        R: Render + ?Sized,
    {
        let Some(turn) = self.history.pop_last() else {
            debug!("Nothing to redo.");
            return Ok(Outcome::Ignored);
        };

        info!(prompt = turn.prompt(), "Redoing last turn.");
        self.submit(turn.prompt(), render).await
    }

    /// Run a single turn: append it, stream its response and seal it.
    async fn exchange<R>(
        &mut self,
        prompt: &str,
        model: &str,
        priming: bool,
        render: &mut R,
        token: &CancellationToken,
    ) -> Result<Outcome>
    where
        R: Render + ?Sized,
    {
        let messages = ContextWindow::new(self.session.attention).build(&self.history, prompt);
        let turn = if priming {
            self.history.append_priming(prompt, model)?
        } else {
            self.history.append(prompt, model)?
        };

        if let Some(turn) = self.history.in_flight() {
            render.begin(turn);
        }

        let request = ChatRequest::new(messages);
        let (response, outcome, error) = match self.stream(model, &request, render, token).await {
            Ok(Streamed::Completed(text)) => (text, TurnOutcome::Completed, None),
            Ok(Streamed::Aborted(text)) => (text, TurnOutcome::Aborted, None),
            Err(error) => (String::new(), TurnOutcome::Failed, Some(error)),
        };

        self.handle.set_phase(match outcome {
            TurnOutcome::Completed => Phase::Completed,
            TurnOutcome::Aborted => Phase::Aborted,
            TurnOutcome::Failed => Phase::Failed,
        });
        self.history.seal(turn, response, outcome)?;

        if outcome == TurnOutcome::Aborted {
            render.notice(Notice::Aborted);
        }
        if let Some(turn) = self.history.last() {
            render.finish(turn);
        }

        match (outcome, error) {
            (_, Some(error)) => {
                warn!(%error, "Request failed.");
                Err(error)
            }
            (TurnOutcome::Aborted, None) => Ok(Outcome::Aborted),
            (_, None) => Ok(Outcome::Completed),
        }
    }

    async fn stream<R>(
        &self,
        model: &str,
        request: &ChatRequest,
        render: &mut R,
        token: &CancellationToken,
    ) -> Result<Streamed>
    where
        R: Render + ?Sized,
    {
        self.handle.set_phase(Phase::Sending);
        let bytes = tokio::select! {
            biased;
            () = token.cancelled() => return Ok(Streamed::Aborted(String::new())),
            result = self.backend.send(model, request) => result?,
        };

        self.handle.set_phase(Phase::Streaming);
        let mut events = std::pin::pin!(decode(bytes));
        let mut aggregator = ChunkAggregator::new(|text: &str| render.update(text));

        loop {
            let event = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(len = aggregator.text().len(), "Aborted while streaming.");
                    return Ok(Streamed::Aborted(aggregator.finalize()));
                }
                event = events.next() => event,
            };

            match event {
                Some(Ok(StreamEvent::Delta(delta))) => aggregator.append(&delta),
                Some(Ok(StreamEvent::Malformed { line, reason })) => {
                    warn!(%line, %reason, "Skipping malformed event.");
                }
                Some(Ok(StreamEvent::Done)) | None => break,
                Some(Err(error)) => return Err(error.into()),
            }
        }

        Ok(Streamed::Completed(aggregator.finalize()))
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
