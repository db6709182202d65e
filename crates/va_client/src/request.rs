use serde::Serialize;
use va_conversation::Message;

/// Body of a streaming chat request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Always `true`, responses are consumed as an event stream.
    pub stream: bool,

    /// Prior context followed by the new prompt, oldest first.
    pub messages: Vec<Message>,
}

impl ChatRequest {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            stream: true,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_request() {
        let request = ChatRequest::new(vec![Message::assistant("Hi."), Message::user("Hello")]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "stream": true,
                "messages": [
                    { "role": "assistant", "content": "Hi." },
                    { "role": "user", "content": "Hello" },
                ],
            })
        );
    }
}
