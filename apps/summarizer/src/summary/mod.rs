// Resume summarization: a bounded continuation loop over a `TextGenerator`.
// All LLM calls go through llm_client; nothing here talks HTTP.

pub mod prompts;
pub mod summarizer;

pub use summarizer::{summarize, Summary, SummarySettings};
