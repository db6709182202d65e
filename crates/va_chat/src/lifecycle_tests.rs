use std::{collections::VecDeque, time::Duration};

use assert_matches::assert_matches;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt as _, stream};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use va_client::ByteStream;
use va_conversation::{Message, Turn};

use super::*;
use crate::{AbortHandle, Error};

const OPEN: &str = "@cf/mistral/mistral-7b-instruct-v0.1";
const GATED: &str = "@cf/meta/llama-3.2-11b-vision-instruct";

/// A scripted reply of the [`Scripted`] backend.
enum Reply {
    /// Stream these chunks, then end.
    Chunks(Vec<&'static str>),

    /// Stream these chunks, then stall forever.
    Stall(Vec<&'static str>),

    Unauthorized,
}

impl Reply {
    fn ok() -> Self {
        Self::Chunks(vec!["data: {\"response\":\"ok\"}\n", "data: [DONE]\n"])
    }
}

fn chunks(
    chunks: Vec<&'static str>,
) -> impl Stream<Item = std::result::Result<Bytes, va_client::Error>> + Send {
    stream::iter(
        chunks
            .into_iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes()))),
    )
}

/// A backend answering requests from a script, recording what was sent.
#[derive(Default)]
struct Scripted {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(String, Vec<Message>)>>,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<(String, Vec<Message>)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Backend for Scripted {
    async fn send(
        &self,
        model: &str,
        request: &ChatRequest,
    ) -> std::result::Result<ByteStream, va_client::Error> {
        self.requests
            .lock()
            .push((model.to_owned(), request.messages.clone()));

        match self.replies.lock().pop_front() {
            Some(Reply::Chunks(c)) => Ok(Box::pin(chunks(c))),
            Some(Reply::Stall(c)) => Ok(Box::pin(chunks(c).chain(stream::pending()))),
            Some(Reply::Unauthorized) => Err(va_client::Error::Unauthorized),
            None => Ok(Box::pin(stream::empty())),
        }
    }
}

/// Records everything rendered, optionally aborting once a given text was
/// rendered or the priming turn finished.
#[derive(Default)]
struct Recorder {
    begun: Vec<(String, bool)>,
    updates: Vec<String>,
    notices: Vec<Notice>,
    finished: Vec<Turn>,
    abort_at: Option<(&'static str, AbortHandle)>,
    abort_after_priming: Option<AbortHandle>,
}

impl Render for Recorder {
    fn begin(&mut self, turn: &Turn) {
        self.begun.push((turn.prompt().to_owned(), turn.is_priming()));
    }

    fn update(&mut self, text: &str) {
        self.updates.push(text.to_owned());

        if let Some((at, handle)) = &self.abort_at {
            if *at == text {
                assert!(handle.abort());
            }
        }
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn finish(&mut self, turn: &Turn) {
        self.finished.push(turn.clone());

        if let Some(handle) = &self.abort_after_priming {
            if turn.is_priming() {
                assert!(handle.abort());
            }
        }
    }
}

fn chat(replies: impl IntoIterator<Item = Reply>) -> Chat<Scripted> {
    Chat::new(
        Scripted::new(replies),
        Session::new(OPEN),
        AgreementGate::new([GATED], "agree", Duration::from_millis(1)),
    )
}

#[test_log::test(tokio::test)]
async fn test_submit_seals_one_turn() {
    let reply = Reply::Chunks(vec![
        "data: {\"response\":\"He\"}\n",
        "data: {\"resp",
        "onse\":\"llo\"}\n",
        "data: [DONE]\n",
    ]);
    let mut chat = chat([reply]);
    let mut render = Recorder::default();

    let outcome = chat.submit("Say hello", &mut render).await.unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(chat.history().len(), 1);
    assert_eq!(chat.phase(), Phase::Idle);

    let turn = chat.history().last().unwrap();
    assert_eq!(turn.response(), "Hello");
    assert_eq!(turn.model(), OPEN);
    assert_eq!(turn.outcome(), Some(TurnOutcome::Completed));

    assert_eq!(render.updates, vec!["He", "Hello"]);
    assert_eq!(render.begun, vec![("Say hello".to_owned(), false)]);
    assert_eq!(render.finished.len(), 1);
    assert!(render.notices.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_empty_prompt_is_ignored() {
    let mut chat = chat([]);
    let mut render = Recorder::default();

    let outcome = chat.submit("  \n\t", &mut render).await.unwrap();

    assert_eq!(outcome, Outcome::Ignored);
    assert!(chat.history().is_empty());
    assert!(chat.backend().requests().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_malformed_events_are_skipped() {
    let reply = Reply::Chunks(vec![
        "data: {\"response\":\"a\"}\n",
        "data: {not json}\n",
        ": keep-alive\n",
        "data: {\"response\":\"b\"}\n",
        "data: [DONE]\n",
    ]);
    let mut chat = chat([reply]);

    chat.submit("x", &mut Recorder::default()).await.unwrap();

    assert_eq!(chat.history().last().unwrap().response(), "ab");
}

#[test_log::test(tokio::test)]
async fn test_stream_without_terminal_marker_completes() {
    let mut chat = chat([Reply::Chunks(vec!["data: {\"response\":\"partial\"}"])]);

    let outcome = chat.submit("x", &mut Recorder::default()).await.unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(chat.history().last().unwrap().response(), "partial");
}

#[test_log::test(tokio::test)]
async fn test_abort_keeps_partial_response() {
    let mut chat = chat([Reply::Stall(vec![
        "data: {\"response\":\"Hel\"}\n",
    ])]);
    let mut render = Recorder {
        abort_at: Some(("Hel", chat.abort_handle())),
        ..Default::default()
    };

    let outcome = chat.submit("Say hello", &mut render).await.unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(chat.phase(), Phase::Idle);
    assert!(!chat.abort_handle().abort());

    let turn = chat.history().last().unwrap();
    assert_eq!(turn.response(), "Hel");
    assert_eq!(turn.outcome(), Some(TurnOutcome::Aborted));
    assert_eq!(render.notices, vec![Notice::Aborted]);
}

#[test_log::test(tokio::test)]
async fn test_unauthorized_seals_empty_turn() {
    let mut chat = chat([Reply::Unauthorized, Reply::ok()]);
    let mut render = Recorder::default();

    let error = chat.submit("x", &mut render).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert_eq!(error.to_string(), "401 Unauthorized, invalid API key.");
    assert_eq!(chat.phase(), Phase::Idle);

    let turn = chat.history().last().unwrap();
    assert_eq!(turn.response(), "");
    assert_eq!(turn.outcome(), Some(TurnOutcome::Failed));

    // The chat is usable again.
    assert_eq!(
        chat.submit("y", &mut render).await.unwrap(),
        Outcome::Completed
    );
    assert_eq!(chat.history().len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_transport_error_mid_stream_fails_turn() {
    struct Broken;

    #[async_trait]
    impl Backend for Broken {
        async fn send(
            &self,
            _model: &str,
            _request: &ChatRequest,
        ) -> std::result::Result<ByteStream, va_client::Error> {
            Ok(Box::pin(stream::iter([
                Ok(Bytes::from_static(b"data: {\"response\":\"Hi\"}\n")),
                Err(va_client::Error::Config("connection reset".to_owned())),
            ])))
        }
    }

    let mut chat = Chat::new(
        Broken,
        Session::new(OPEN),
        AgreementGate::new([GATED], "agree", Duration::ZERO),
    );
    let mut render = Recorder::default();

    let error = chat.submit("x", &mut render).await.unwrap_err();

    assert_matches!(error, Error::Client(va_client::Error::Config(_)));
    assert_eq!(render.updates, vec!["Hi"]);
    assert_eq!(chat.history().last().unwrap().response(), "");
    assert_eq!(
        chat.history().last().unwrap().outcome(),
        Some(TurnOutcome::Failed)
    );
}

#[test_log::test(tokio::test)]
async fn test_redo_replaces_last_turn() {
    let mut chat = chat([Reply::ok(), Reply::ok()]);
    let mut render = Recorder::default();

    assert_eq!(chat.redo(&mut render).await.unwrap(), Outcome::Ignored);

    chat.submit("again?", &mut render).await.unwrap();
    assert_eq!(chat.history().len(), 1);

    assert_eq!(chat.redo(&mut render).await.unwrap(), Outcome::Completed);
    assert_eq!(chat.history().len(), 1);
    assert_eq!(chat.history().last().unwrap().prompt(), "again?");

    let requests = chat.backend().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
}

#[test_log::test(tokio::test)]
async fn test_attention_sends_prior_turns() {
    let mut chat = chat([
        Reply::ok(),
        Reply::ok(),
        Reply::ok(),
    ]);
    let mut render = Recorder::default();

    chat.submit("A?", &mut render).await.unwrap();
    chat.submit("B?", &mut render).await.unwrap();
    chat.set_attention(1);
    chat.submit("C?", &mut render).await.unwrap();

    let requests = chat.backend().requests();
    assert_eq!(requests[1].1, vec![Message::user("B?")]);
    assert_eq!(requests[2].1, vec![
        Message::assistant("ok"),
        Message::user("B?"),
        Message::user("C?"),
    ]);
}

#[test_log::test(tokio::test)]
async fn test_gated_model_is_primed_once() {
    let mut chat = chat([
        Reply::ok(),
        Reply::ok(),
        Reply::ok(),
    ]);
    let mut render = Recorder::default();

    chat.select_model(GATED);
    assert!(!chat.session().agreed);

    chat.submit("first", &mut render).await.unwrap();
    chat.submit("second", &mut render).await.unwrap();

    assert!(chat.session().agreed);
    assert_eq!(render.notices, vec![
        Notice::PrimingSent,
        Notice::PrimingAccepted
    ]);
    assert_eq!(render.begun, vec![
        ("agree".to_owned(), true),
        ("first".to_owned(), false),
        ("second".to_owned(), false),
    ]);

    let models: Vec<_> = chat.backend().requests().into_iter().map(|r| r.0).collect();
    assert_eq!(models, vec![GATED, GATED, GATED]);
    assert!(chat.history().get(0).unwrap().is_priming());
}

#[test_log::test(tokio::test)]
async fn test_switching_back_requires_priming_again() {
    let mut chat = chat([]);

    chat.select_model(GATED);
    chat.session.agreed = true;
    chat.select_model(OPEN);
    assert!(chat.session().agreed);

    chat.select_model(GATED);
    assert!(!chat.session().agreed);
}

#[test_log::test(tokio::test)]
async fn test_failed_priming_blocks_prompt() {
    let mut chat = chat([Reply::Unauthorized]);
    chat.select_model(GATED);
    let mut render = Recorder::default();

    let error = chat.submit("first", &mut render).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert!(!chat.session().agreed);
    assert_eq!(chat.history().len(), 1);
    assert!(chat.history().last().unwrap().is_priming());
    assert_eq!(chat.backend().requests().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_aborted_priming_blocks_prompt() {
    let mut chat = chat([Reply::Stall(vec!["data: {\"response\":\"o\"}\n"])]);
    chat.select_model(GATED);
    let mut render = Recorder {
        abort_at: Some(("o", chat.abort_handle())),
        ..Default::default()
    };

    let outcome = chat.submit("first", &mut render).await.unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert!(!chat.session().agreed);
    assert_eq!(chat.history().len(), 1);
    assert_eq!(render.notices, vec![Notice::PrimingSent, Notice::Aborted]);
}

#[test_log::test(tokio::test)]
async fn test_abort_during_settle_delay_keeps_priming_turn() {
    let mut chat = Chat::new(
        Scripted::new([Reply::ok(), Reply::ok()]),
        Session::new(GATED),
        AgreementGate::new([GATED], "agree", Duration::from_secs(30)),
    );
    let mut render = Recorder {
        abort_after_priming: Some(chat.abort_handle()),
        ..Default::default()
    };

    let outcome = chat.submit("first", &mut render).await.unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert!(!chat.session().agreed);
    assert_eq!(chat.phase(), Phase::Idle);
    assert_eq!(chat.backend().requests().len(), 1);
    assert_eq!(render.notices, vec![Notice::PrimingSent, Notice::Aborted]);

    assert_eq!(chat.history().len(), 1);
    let turn = chat.history().last().unwrap();
    assert!(turn.is_priming());
    assert_eq!(turn.response(), "ok");
    assert_eq!(turn.outcome(), Some(TurnOutcome::Completed));
}

#[test_log::test(tokio::test)]
async fn test_abort_before_response_seals_empty_turn() {
    struct Unanswered;

    #[async_trait]
    impl Backend for Unanswered {
        async fn send(
            &self,
            _model: &str,
            _request: &ChatRequest,
        ) -> std::result::Result<ByteStream, va_client::Error> {
            futures::future::pending().await
        }
    }

    let mut chat = Chat::new(
        Unanswered,
        Session::new(OPEN),
        AgreementGate::new([GATED], "agree", Duration::ZERO),
    );
    let handle = chat.abort_handle();
    let aborter = tokio::spawn(async move {
        while !handle.abort() {
            tokio::task::yield_now().await;
        }
    });
    let mut render = Recorder::default();

    let outcome = chat.submit("x", &mut render).await.unwrap();
    aborter.await.unwrap();

    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(chat.phase(), Phase::Idle);
    assert!(render.updates.is_empty());
    assert_eq!(render.notices, vec![Notice::Aborted]);

    let turn = chat.history().last().unwrap();
    assert_eq!(turn.response(), "");
    assert_eq!(turn.outcome(), Some(TurnOutcome::Aborted));
}
