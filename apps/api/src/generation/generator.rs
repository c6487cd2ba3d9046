//! CV Generation: turns the four collected fields into a model prompt and
//! returns the model's raw text.
//!
//! The output is NOT guaranteed to be valid JSON. Repairing it is the chat
//! front end's job; this service only relays what the model produced.

use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::CV_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{FACTS_ONLY_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::llm_client::LlmClient;

/// The person details a CV is generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct CvRequest {
    pub name: String,
    pub experience: String,
    pub education: String,
    pub tech_stack: Vec<String>,
}

impl CvRequest {
    /// Builds a request from raw query pairs. `tech_stack` may repeat; the
    /// other keys take their last occurrence. Unknown keys are ignored.
    pub fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut name = None;
        let mut experience = None;
        let mut education = None;
        let mut tech_stack = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "name" => name = Some(value),
                "experience" => experience = Some(value),
                "education" => education = Some(value),
                "tech_stack" => tech_stack.push(value),
                _ => {}
            }
        }

        if tech_stack.is_empty() {
            return Err(AppError::Validation(
                "Missing query parameter: tech_stack".to_string(),
            ));
        }

        Ok(CvRequest {
            name: required(name, "name")?,
            experience: required(experience, "experience")?,
            education: required(education, "education")?,
            tech_stack,
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing query parameter: {key}")))
}

/// Fills the CV prompt template with the request fields.
pub fn build_cv_prompt(request: &CvRequest) -> String {
    let tech_stack = request.tech_stack.join(", ");
    fill_template(
        CV_PROMPT_TEMPLATE,
        &[
            ("name", request.name.as_str()),
            ("experience", request.experience.as_str()),
            ("education", request.education.as_str()),
            ("tech_stack", tech_stack.as_str()),
            ("json_only_instruction", JSON_ONLY_INSTRUCTION),
            ("facts_only_instruction", FACTS_ONLY_INSTRUCTION),
        ],
    )
}

/// Replaces each `{key}` placeholder with its value in one left-to-right pass.
/// Substituted text is never scanned again; unknown `{...}` spans are kept.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let substitution = tail[1..].find('}').and_then(|end| {
            let key = &tail[1..1 + end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end + 2))
        });
        match substitution {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Prompts the model once and returns its trimmed text.
pub async fn generate_cv(llm: &LlmClient, request: &CvRequest) -> Result<String, AppError> {
    info!(
        "Generating CV ({} tech stack entries)",
        request.tech_stack.len()
    );
    let prompt = build_cv_prompt(request);
    let text = llm.generate(&prompt).await?;
    info!("CV generated ({} chars)", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_request() -> CvRequest {
        CvRequest {
            name: "Ann Lee".to_string(),
            experience: "5 years backend at Acme".to_string(),
            education: "BSc Computer Science".to_string(),
            tech_stack: vec!["Go".to_string(), "SQL".to_string()],
        }
    }

    #[test]
    fn test_from_query_pairs_collects_repeated_tech_stack() {
        let request = CvRequest::from_query_pairs(pairs(&[
            ("name", "Ann Lee"),
            ("experience", "5 years backend at Acme"),
            ("education", "BSc Computer Science"),
            ("tech_stack", "Go"),
            ("tech_stack", "SQL"),
        ]))
        .unwrap();
        assert_eq!(request, sample_request());
    }

    #[test]
    fn test_from_query_pairs_requires_tech_stack() {
        let err = CvRequest::from_query_pairs(pairs(&[
            ("name", "Ann"),
            ("experience", "x"),
            ("education", "y"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("tech_stack"));
    }

    #[test]
    fn test_from_query_pairs_reports_missing_field() {
        let err = CvRequest::from_query_pairs(pairs(&[
            ("name", "Ann"),
            ("education", "y"),
            ("tech_stack", "Go"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("experience"));
    }

    #[test]
    fn test_from_query_pairs_ignores_unknown_keys() {
        let request = CvRequest::from_query_pairs(pairs(&[
            ("name", "Ann Lee"),
            ("experience", "5 years backend at Acme"),
            ("education", "BSc Computer Science"),
            ("tech_stack", "Go"),
            ("tech_stack", "SQL"),
            ("utm_source", "bot"),
        ]))
        .unwrap();
        assert_eq!(request, sample_request());
    }

    #[test]
    fn test_prompt_contains_fields_and_schema() {
        let prompt = build_cv_prompt(&sample_request());
        assert!(prompt.contains("Name: Ann Lee"));
        assert!(prompt.contains("Experience: 5 years backend at Acme"));
        assert!(prompt.contains("Education: BSc Computer Science"));
        assert!(prompt.contains("Tech stack: Go, SQL"));
        for field in [
            "\"name\"",
            "\"intro\"",
            "\"experience\"",
            "\"education\"",
            "\"tech_stack\"",
            "\"summary\"",
            "\"wishes\"",
        ] {
            assert!(prompt.contains(field), "prompt is missing {field}");
        }
        assert!(prompt.contains(JSON_ONLY_INSTRUCTION));
        assert!(prompt.contains(FACTS_ONLY_INSTRUCTION));
        assert!(!prompt.contains("{name}"));
    }

    #[test]
    fn test_placeholder_text_in_user_fields_is_kept_verbatim() {
        let request = CvRequest {
            experience: "Wrote {name} templates".to_string(),
            tech_stack: vec!["{education}".to_string()],
            ..sample_request()
        };
        let prompt = build_cv_prompt(&request);
        assert!(prompt.contains("Name: Ann Lee\n"));
        assert!(prompt.contains("Experience: Wrote {name} templates\n"));
        assert!(prompt.contains("Tech stack: {education}\n"));
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        assert_eq!(
            fill_template("{\"a\": 1} {x} {y", &[("x", "X")]),
            "{\"a\": 1} X {y"
        );
    }
}
