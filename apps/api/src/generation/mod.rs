// CV generation: query extraction, prompt building, one LLM call.
// All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
