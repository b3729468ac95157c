//! Prompt templates for advisor interactions.

/// System prompt shared by chat-style providers.
pub fn system_prompt() -> &'static str {
    "You are a data mapping expert. You match spreadsheet column headers to \
     the fields of a known schema and answer with JSON only."
}

/// Build a prompt asking for a header -> field mapping.
pub fn map_headers_prompt(headers: &[String], expected_fields: &[String]) -> String {
    let headers_json = serde_json::to_string(headers).unwrap_or_else(|_| "[]".to_string());
    let fields_json = serde_json::to_string(expected_fields).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Map the provided headers to the expected schema fields.

## Provided Headers
{}

## Expected Schema
{}

## Task
Map each provided header to the expected field it represents. Handle
variations in naming, spacing, and common abbreviations.

Respond with a JSON object whose keys are the provided headers exactly as
given and whose values are expected field names:
{{
  "providedHeader1": "expectedField1",
  "providedHeader2": null
}}

Map a header to null if it matches no expected field. Use each expected field
at most once and never invent field names."#,
        headers_json, fields_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_headers_and_fields() {
        let prompt = map_headers_prompt(
            &["wid".to_string(), "skill set".to_string()],
            &["WorkerID".to_string(), "Skills".to_string()],
        );
        assert!(prompt.contains(r#"["wid","skill set"]"#));
        assert!(prompt.contains(r#"["WorkerID","Skills"]"#));
        assert!(prompt.contains("null"));
    }
}
