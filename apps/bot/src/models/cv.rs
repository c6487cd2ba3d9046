use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

/// Keys every generated CV must carry, in rendering order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "name",
    "intro",
    "experience",
    "education",
    "tech_stack",
    "summary",
    "wishes",
];

/// The four fields collected from the user, sent to the CV backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvRequest {
    pub name: String,
    pub experience: String,
    pub education: String,
    pub tech_stack: Vec<String>,
}

impl CvRequest {
    /// Query pairs for `GET /generate_cv`; `tech_stack` repeats once per skill.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("name", self.name.as_str()),
            ("experience", self.experience.as_str()),
            ("education", self.education.as_str()),
        ];
        pairs.extend(self.tech_stack.iter().map(|s| ("tech_stack", s.as_str())));
        pairs
    }
}

/// A generated CV, validated against the seven-field schema.
///
/// Text fields accept whatever shape the model chose: arrays of strings are
/// joined line by line, other scalars keep their JSON text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CvRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub intro: String,
    #[serde(deserialize_with = "lenient_text")]
    pub experience: String,
    #[serde(deserialize_with = "lenient_text")]
    pub education: String,
    #[serde(deserialize_with = "lenient_list")]
    pub tech_stack: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub summary: String,
    #[serde(deserialize_with = "lenient_text")]
    pub wishes: String,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("CV JSON is not an object")]
    NotAnObject,

    #[error("CV JSON is missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("CV JSON has invalid field values: {0}")]
    InvalidValue(#[from] serde_json::Error),
}

impl CvRecord {
    /// Parses normalized JSON and checks the required fields.
    pub fn from_normalized(json: &str) -> Result<Self, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        let object = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !object.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            error!("Missing fields in JSON: {missing:?}");
            return Err(SchemaError::MissingFields(missing));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Skills joined for display.
    pub fn tech_stack_text(&self) -> String {
        self.tech_stack.join(", ")
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_text(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_text).collect(),
        Value::String(s) => s.split(',').map(|s| s.trim().to_string()).collect(),
        Value::Null => Vec::new(),
        other => vec![value_to_text(other)],
    };
    Ok(items.into_iter().filter(|s: &String| !s.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_cv() -> Value {
        json!({
            "name": "Ann Lee",
            "intro": "Backend engineer.",
            "experience": "5 years at Acme.",
            "education": "BSc Computer Science.",
            "tech_stack": ["Go", "SQL"],
            "summary": "Strong communicator.",
            "wishes": "A kind team."
        })
    }

    #[test]
    fn test_full_record_parses() {
        let record = CvRecord::from_value(full_cv()).unwrap();
        assert_eq!(record.name, "Ann Lee");
        assert_eq!(record.tech_stack, vec!["Go", "SQL"]);
        assert_eq!(record.tech_stack_text(), "Go, SQL");
    }

    #[test]
    fn test_missing_wishes_is_rejected() {
        let mut cv = full_cv();
        cv.as_object_mut().unwrap().remove("wishes");
        match CvRecord::from_value(cv).unwrap_err() {
            SchemaError::MissingFields(missing) => assert_eq!(missing, vec!["wishes"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_all_missing_fields_are_listed_in_order() {
        let err = CvRecord::from_value(json!({"name": "Ann", "intro": "Hi"})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "CV JSON is missing fields: experience, education, tech_stack, summary, wishes"
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut cv = full_cv();
        cv["hobbies"] = json!(["chess"]);
        assert!(CvRecord::from_value(cv).is_ok());
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            CvRecord::from_normalized("[1, 2]").unwrap_err(),
            SchemaError::NotAnObject
        ));
    }

    #[test]
    fn test_text_fields_are_coerced() {
        let mut cv = full_cv();
        cv["experience"] = json!(["Acme 2019-2024", "Initech 2017-2019"]);
        cv["education"] = json!(null);
        cv["summary"] = json!(42);
        let record = CvRecord::from_value(cv).unwrap();
        assert_eq!(record.experience, "Acme 2019-2024\nInitech 2017-2019");
        assert_eq!(record.education, "");
        assert_eq!(record.summary, "42");
    }

    #[test]
    fn test_tech_stack_string_is_split() {
        let mut cv = full_cv();
        cv["tech_stack"] = json!("Rust, Go , ,SQL");
        let record = CvRecord::from_value(cv).unwrap();
        assert_eq!(record.tech_stack, vec!["Rust", "Go", "SQL"]);
    }

    #[test]
    fn test_query_pairs_repeat_tech_stack() {
        let request = CvRequest {
            name: "Ann".to_string(),
            experience: "5y".to_string(),
            education: "BSc".to_string(),
            tech_stack: vec!["Go".to_string(), "SQL".to_string()],
        };
        assert_eq!(
            request.query_pairs(),
            vec![
                ("name", "Ann"),
                ("experience", "5y"),
                ("education", "BSc"),
                ("tech_stack", "Go"),
                ("tech_stack", "SQL"),
            ]
        );
    }
}
