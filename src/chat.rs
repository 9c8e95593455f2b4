use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{ChatReply, ChatRequest};

const ROUTINE_PREFIX: &str = "Generate a personalized beauty routine using these products: ";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat endpoint unreachable: {0}")]
    Transport(String),
    #[error("Chat endpoint returned malformed JSON: {0}")]
    Decode(String),
    #[error("Chat endpoint returned neither a reply nor an error")]
    EmptyReply,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Conversation so far, oldest first. Lives only for the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// What the user asked for; decides whether the reply is offered for copying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Routine,
    FollowUp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// The backend answered; `copyable` asks the view to offer "Copy Routine".
    Reply { text: String, copyable: bool },
    /// The backend reported an error, recorded as an assistant turn.
    BackendError { message: String },
}

/// The remote completion service.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;
}

/// Posts `{input, history}` as JSON and decodes `{reply}` or `{error, details}`.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ChatError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        debug!(endpoint = %self.endpoint, turns = request.history.len(), "Posting chat request");
        // Error bodies arrive with non-2xx statuses, so the status is not checked.
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| ChatError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            warn!(%status, "Chat endpoint body is not valid JSON");
            ChatError::Decode(e.to_string())
        })
    }
}

/// The prompt sent when the user asks for a routine.
pub fn routine_prompt<S: AsRef<str>>(names: &[S]) -> String {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    format!("{ROUTINE_PREFIX}{}", names.join(", "))
}

#[derive(Debug, Default)]
pub struct ChatSession {
    transcript: Transcript,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Records the user turn and builds the request carrying the whole transcript.
    pub fn prepare(&mut self, input: &str) -> ChatRequest {
        self.transcript.push(Turn::user(input));
        ChatRequest {
            input: input.to_string(),
            history: self.transcript.turns().to_vec(),
        }
    }

    /// Records the assistant turn for a decoded response.
    pub fn apply(&mut self, reply: ChatReply, kind: RequestKind) -> Result<ChatOutcome, ChatError> {
        if let Some(message) = reply.error_message() {
            info!(%message, "Chat backend reported an error");
            self.transcript.push(Turn::assistant(message.clone()));
            return Ok(ChatOutcome::BackendError { message });
        }
        let text = reply.reply.ok_or(ChatError::EmptyReply)?;
        self.transcript.push(Turn::assistant(text.clone()));
        Ok(ChatOutcome::Reply { text, copyable: kind == RequestKind::Routine })
    }

    /// Sends one user input and records the answer. Transport and decode
    /// failures leave only the user turn behind.
    pub async fn submit<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        input: &str,
        kind: RequestKind,
    ) -> Result<ChatOutcome, ChatError> {
        let request = self.prepare(input);
        let reply = backend.send(&request).await?;
        self.apply(reply, kind)
    }
}
