// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// CV prompt template.
/// Replace: {name}, {experience}, {education}, {tech_stack},
///          {facts_only_instruction}, {json_only_instruction}
pub const CV_PROMPT_TEMPLATE: &str = r#"You are a CV assistant. Generate a JSON CV for the following person:

Name: {name}
Experience: {experience}
Education: {education}
Tech stack: {tech_stack}

Format:
{
  "name": "Person Name",
  "intro": "...short self-intro...",
  "experience": "...detailed...",
  "education": "...detailed...",
  "tech_stack": ["...", "..."],
  "summary": "...summary of strengths...",
  "wishes": "...kind letter, what the person wants to find in the company ..."
}

{json_only_instruction} {facts_only_instruction}"#;
