//! Retrieval-augmented answering of Formula 1 questions.
//!
//! A question is detected, translated into English, used to retrieve chunks,
//! answered by the chat model and translated back into the asker's language.

mod context;
mod postprocess;
mod response;

pub use context::{format_context, ContextBuilder};
pub use postprocess::{post_process, TRIM_KEYWORDS};
pub use response::{ChatResponse, RagEngine, SourceRef};
