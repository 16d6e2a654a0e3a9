//! Output format tests.
//!
//! A tool call always succeeds at the protocol level and yields exactly one
//! text item: the image URL, or an empty string when generation failed.

use rmcp::model::{CallToolResult, Content, RawContent};

/// Validates that a generation result has the single-text shape.
fn validate_tool_result(result: &CallToolResult) -> Result<(), String> {
    if result.is_error == Some(true) {
        return Err("Generation results are never protocol errors".to_string());
    }

    match result.content.as_slice() {
        [content] => validate_content(content),
        other => Err(format!("Expected exactly one content item, got {}", other.len())),
    }
}

/// Validates that a Content item is text holding an empty string or a URL.
fn validate_content(content: &Content) -> Result<(), String> {
    match &content.raw {
        RawContent::Text(text_content) => validate_url_text(&text_content.text),
        _ => Err("Generation output must be text content".to_string()),
    }
}

/// Empty text is the failure signal; anything else must look like an http(s) URL.
fn validate_url_text(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Ok(());
    }
    let rest = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"))
        .ok_or_else(|| format!("Expected an http(s) URL, got: {}", text))?;
    if rest.is_empty() || rest.chars().any(char::is_whitespace) {
        return Err(format!("Malformed URL: {}", text));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieai_mcp_common::Config;
    use kieai_mcp_flux::{FluxGenerateParams, FluxServer, GenerationOutcome};

    #[test]
    fn test_url_text_is_valid() {
        let result = CallToolResult::success(vec![Content::text("https://tempfile.aiquickdraw.com/f/abc.png")]);
        assert!(validate_tool_result(&result).is_ok());
    }

    #[test]
    fn test_empty_text_is_valid() {
        let result = CallToolResult::success(vec![Content::text("")]);
        assert!(validate_tool_result(&result).is_ok());
    }

    #[test]
    fn test_non_url_text_fails() {
        let result = CallToolResult::success(vec![Content::text("Image generated!")]);
        assert!(validate_tool_result(&result).is_err());
    }

    #[test]
    fn test_image_content_fails() {
        let content = Content::image("base64data", "image/png");
        assert!(validate_content(&content).is_err());
    }

    #[test]
    fn test_multiple_items_fail() {
        let result = CallToolResult::success(vec![
            Content::text("https://a.example/1.png"),
            Content::text("https://a.example/2.png"),
        ]);
        assert!(validate_tool_result(&result).is_err());
    }

    #[test]
    fn test_error_result_fails() {
        let result = CallToolResult::error(vec![Content::text("boom")]);
        assert!(validate_tool_result(&result).is_err());
    }

    #[test]
    fn test_outcome_text_mapping() {
        assert_eq!(GenerationOutcome::Empty.into_text(), "");
        assert_eq!(
            GenerationOutcome::Success("https://a.example/x.png".to_string()).into_text(),
            "https://a.example/x.png"
        );
    }

    /// Without a key the server still answers with one empty text item.
    #[tokio::test]
    async fn test_server_output_without_key() {
        let server = FluxServer::new(Config::new(None));
        let result = server
            .generate_image(FluxGenerateParams::new("A red bicycle leaning on a wall"))
            .await
            .unwrap();

        assert!(validate_tool_result(&result).is_ok());
        match &result.content[0].raw {
            RawContent::Text(text) => assert!(text.text.is_empty()),
            other => panic!("Expected text content, got {:?}", other),
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy to generate plausible result URLs
    fn url_strategy() -> impl Strategy<Value = String> {
        ("(http|https)", "[a-z]{3,12}\\.[a-z]{2,4}", "[a-zA-Z0-9_/-]{1,40}")
            .prop_map(|(scheme, host, path)| format!("{}://{}/{}.png", scheme, host, path))
    }

    proptest! {
        /// Any URL wrapped as a single text item passes
        #[test]
        fn url_output_passes(url in url_strategy()) {
            let result = CallToolResult::success(vec![Content::text(url)]);
            let validation = validate_tool_result(&result);
            prop_assert!(validation.is_ok(), "URL output should pass: {:?}", validation.err());
            prop_assert!(!result.is_error.unwrap_or(false), "Should not be marked as error");
        }

        /// Free text without a scheme is rejected
        #[test]
        fn plain_text_fails(text in "[a-zA-Z ]{1,50}") {
            let result = CallToolResult::success(vec![Content::text(text)]);
            prop_assert!(validate_tool_result(&result).is_err());
        }
    }
}
