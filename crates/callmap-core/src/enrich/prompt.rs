//! Request payloads for documentation generation.

use crate::enrich::schema::ResponseSchema;

/// One generation request: the prompt text plus the reply shape it demands.
#[derive(Debug, Clone)]
pub struct DocRequest {
    pub prompt: String,
    pub schema: ResponseSchema,
}

impl DocRequest {
    /// Build the request for one batch of a class.
    ///
    /// `class_code` is appended verbatim after the instructions; when the
    /// source table has no row for the class the code section is omitted.
    pub fn for_batch(class_key: &str, methods: &[String], class_code: Option<&str>) -> Self {
        let schema = ResponseSchema::for_batch(class_key, methods);
        let prompt = build_prompt(class_key, methods, class_code);
        Self { prompt, schema }
    }
}

fn build_prompt(class_key: &str, methods: &[String], class_code: Option<&str>) -> String {
    let method_lines = if methods.is_empty() {
        "  (none)".to_string()
    } else {
        methods
            .iter()
            .map(|m| format!("  - {m}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut prompt = format!(
        r#"You are a Java documentation assistant. Write Oracle-style JavaDoc for the class and methods listed below.

Reply with a single JSON object and nothing else. Use the fully qualified names below as keys:
  "{class_key}": JavaDoc for the class
  "<method name>": JavaDoc for that method

Each value is a complete JavaDoc comment (/** ... */) containing a concise description, <p> paragraph breaks where useful, @param for every parameter, @return when a value is returned, @throws for declared exceptions, and @see for closely related types. Mention instance fields a method relies on, with their types. Do not rewrite the code.

Class:
  {class_key}

Methods:
{method_lines}
"#
    );

    if let Some(code) = class_code {
        prompt.push_str("\nSource:\n");
        prompt.push_str(code);
        if !code.ends_with('\n') {
            prompt.push('\n');
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_class_and_methods() {
        let methods = vec!["com.a.B.bar".to_string(), "com.a.B.foo".to_string()];
        let request = DocRequest::for_batch("com.a.B", &methods, Some("class B {}"));
        assert!(request.prompt.contains("  com.a.B\n"));
        assert!(request.prompt.contains("  - com.a.B.bar\n  - com.a.B.foo"));
        assert!(request.prompt.ends_with("Source:\nclass B {}\n"));
        assert_eq!(request.schema.len(), 3);
        assert_eq!(request.schema.class_key(), "com.a.B");
    }

    #[test]
    fn test_prompt_without_code() {
        let request = DocRequest::for_batch("com.a.B", &[], None);
        assert!(!request.prompt.contains("Source:"));
        assert!(request.prompt.contains("(none)"));
        assert_eq!(request.schema.len(), 1);
    }
}
