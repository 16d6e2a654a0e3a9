//! Input parameter validation tests.
//!
//! For any tool invocation with invalid parameters, the server returns an
//! MCP `invalid_params` error with validation details and never reaches
//! the generation handler.

/// Build a tool argument object from a JSON value.
pub fn arguments(value: serde_json::Value) -> Option<rmcp::model::JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieai_mcp_flux::server::parse_tool_arguments;
    use kieai_mcp_flux::{AspectRatio, FluxGenerateParams, Resolution};
    use rmcp::model::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_params_validation_rejects_short_prompt() {
        let result = FluxGenerateParams::new("ab").validate();
        assert!(result.is_err(), "Should reject a two character prompt");

        let errors = result.unwrap_err();
        assert!(
            errors.iter().any(|e| e.field == "prompt"),
            "Should have prompt validation error"
        );
    }

    #[test]
    fn test_params_validation_rejects_long_prompt() {
        let errors = FluxGenerateParams::new("x".repeat(5001)).validate().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "prompt"));
    }

    #[test]
    fn test_params_validation_accepts_boundaries() {
        assert!(FluxGenerateParams::new("abc").validate().is_ok());
        assert!(FluxGenerateParams::new("x".repeat(5000)).validate().is_ok());
    }

    #[test]
    fn test_unknown_aspect_ratio_is_invalid_params() {
        let err = parse_tool_arguments(arguments(json!({
            "prompt": "A cat in a hat",
            "aspect_ratio": "21:9"
        })))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_resolution_is_invalid_params() {
        let err = parse_tool_arguments(arguments(json!({
            "prompt": "A cat in a hat",
            "resolution": "8K"
        })))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_missing_prompt_is_invalid_params() {
        let err = parse_tool_arguments(arguments(json!({ "resolution": "1K" }))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("prompt"), "Message should name the field: {}", err.message);
    }

    #[test]
    fn test_short_prompt_is_invalid_params() {
        let err = parse_tool_arguments(arguments(json!({ "prompt": "hi" }))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("prompt"));
    }

    #[test]
    fn test_non_string_prompt_is_invalid_params() {
        let err = parse_tool_arguments(arguments(json!({ "prompt": 42 }))).unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_defaults_applied() {
        let params = parse_tool_arguments(arguments(json!({ "prompt": "A cat in a hat" }))).unwrap();
        assert_eq!(params.aspect_ratio, AspectRatio::Square);
        assert_eq!(params.resolution, Resolution::OneK);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use kieai_mcp_flux::FluxGenerateParams;
    use kieai_mcp_flux::handler::{VALID_ASPECT_RATIOS, VALID_RESOLUTIONS};
    use kieai_mcp_flux::server::parse_tool_arguments;
    use proptest::prelude::*;
    use serde_json::json;

    /// Prompts within the accepted character range
    fn valid_prompt_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ,.]{3,200}"
    }

    /// Aspect ratio strings the tool does not accept
    fn invalid_aspect_ratio_strategy() -> impl Strategy<Value = String> {
        "[0-9]{1,2}:[0-9]{1,2}".prop_filter("Must not be a supported ratio", |s| {
            !VALID_ASPECT_RATIOS.contains(&s.as_str())
        })
    }

    proptest! {
        /// Any supported combination parses and validates
        #[test]
        fn valid_arguments_are_accepted(
            prompt in valid_prompt_strategy(),
            ratio in prop::sample::select(VALID_ASPECT_RATIOS),
            resolution in prop::sample::select(VALID_RESOLUTIONS),
        ) {
            let params = parse_tool_arguments(arguments(json!({
                "prompt": prompt,
                "aspect_ratio": ratio,
                "resolution": resolution,
            })));
            prop_assert!(params.is_ok(), "Should accept: {:?}", params.err());
            let params = params.unwrap();
            prop_assert_eq!(params.aspect_ratio.as_str(), ratio);
            prop_assert_eq!(params.resolution.as_str(), resolution);
        }

        /// Unsupported aspect ratios are always rejected
        #[test]
        fn invalid_aspect_ratio_is_rejected(
            prompt in valid_prompt_strategy(),
            ratio in invalid_aspect_ratio_strategy(),
        ) {
            let result = parse_tool_arguments(arguments(json!({
                "prompt": prompt,
                "aspect_ratio": ratio,
            })));
            prop_assert!(result.is_err());
        }

        /// Prompt length is counted in characters
        #[test]
        fn prompt_length_bounds_hold(len in 0usize..20) {
            let prompt = "é".repeat(len);
            let accepted = FluxGenerateParams::new(prompt).validate().is_ok();
            prop_assert_eq!(accepted, len >= 3);
        }
    }
}
