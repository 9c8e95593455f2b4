pub mod chat;
pub mod config;
pub mod filter;
pub mod guard;
pub mod io;
pub mod markdown;
pub mod orchestrator;
pub mod product;
pub mod selection;
pub mod server;
pub mod storage;
pub mod view;

pub use chat::{
    ChatBackend, ChatError, ChatOutcome, ChatSession, HttpChatBackend, RequestKind, Role, Transcript,
    Turn,
};
pub use config::AdvisorConfig;
pub use filter::FilterState;
pub use guard::TopicGuard;
pub use io::{ChatReply, ChatRequest};
pub use orchestrator::{Advisor, Answer, Submission};
pub use product::{Catalog, Product};
pub use selection::SelectionSet;
pub use storage::{MemorySelectionStore, SelectionStore, SledSelectionStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Catalog load failed: {0}")]
    Catalog(String),
    #[error("Catalog violated the product schema: {0}")]
    Schema(String),
    #[error("Chat failure: {0}")]
    Chat(#[from] ChatError),
    #[error("No selected product at position {0}")]
    SelectionIndex(usize),
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
    #[error("No products selected")]
    EmptySelection,
    #[error("A chat request is already in flight")]
    RequestInFlight,
    #[error("Chat exchange task failed: {0}")]
    Task(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = AdvisorError> = std::result::Result<T, E>;
