// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting instructions.

/// Instruction appended to every prompt that expects a JSON object back.
pub const JSON_ONLY_INSTRUCTION: &str = "Output only valid JSON. \
    Send the JSON as raw text without markdown (no ```json fences).";

/// Instruction that keeps the model from inventing details.
pub const FACTS_ONLY_INSTRUCTION: &str =
    "Do not imagine anything; use only the facts provided by the user.";
