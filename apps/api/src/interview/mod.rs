// Interview answer scoring and question generation.
// All LLM calls go through llm_client; facial and text analysis live in their own modules.

pub mod analyzer;
pub mod content_feedback;
pub mod handlers;
pub mod prompts;
pub mod questions;
