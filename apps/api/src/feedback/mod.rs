// Feedback pipeline: prompt → two model drafts → truncate → render.
// All model calls go through llm_client::CompletionModel.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod render;
pub mod sections;
pub mod truncate;
