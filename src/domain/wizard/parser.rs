//! Schema parsing with a single sanitized retry.

use super::errors::ParseError;
use super::extractor::extract_json_candidate;
use super::reply::RawEngineReply;
use super::response::WizardResponse;
use super::sanitizer::sanitize;

/// A successfully parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Response with step content already unescaped.
    pub response: WizardResponse,
    /// True when the strict parse failed and the sanitized candidate was used.
    pub repaired: bool,
}

/// Extracts, parses and normalizes an engine reply.
///
/// The extracted candidate is parsed strictly first. On failure it is passed
/// through [`sanitize`] and parsed exactly once more; if that also fails the
/// result is [`ParseError::Persistent`], carrying the full raw reply so it can
/// be logged. Step content is unescaped before returning.
pub fn parse_wizard_response(reply: &RawEngineReply) -> Result<ParsedReply, ParseError> {
    let candidate = extract_json_candidate(reply.as_str())?;

    let (response, repaired) = match serde_json::from_str::<WizardResponse>(candidate) {
        Ok(response) => (response, false),
        Err(strict_error) => {
            tracing::debug!(error = %strict_error, "strict parse failed, sanitizing");
            let sanitized = sanitize(candidate);
            match serde_json::from_str::<WizardResponse>(&sanitized) {
                Ok(response) => {
                    tracing::info!("engine reply recovered by sanitizer");
                    (response, true)
                }
                Err(sanitized_error) => {
                    return Err(ParseError::Persistent {
                        raw_reply: reply.as_str().to_string(),
                        strict_error: strict_error.to_string(),
                        sanitized_error: sanitized_error.to_string(),
                    });
                }
            }
        }
    };

    Ok(ParsedReply {
        response: response.normalize_step_content(),
        repaired,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wizard::errors::ExtractionError;
    use crate::domain::wizard::response::ResponseStatus;

    fn reply(text: &str) -> RawEngineReply {
        RawEngineReply::new(text)
    }

    mod strict_path {
        use super::*;

        #[test]
        fn parses_clean_insufficient_information() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"INSUFFICIENT_INFORMATION","missing_information":["Which stack?","Who are the users?"],"phases":[]}"#,
            ))
            .unwrap();

            assert!(!parsed.repaired);
            assert_eq!(
                parsed.response.status,
                ResponseStatus::InsufficientInformation
            );
            assert_eq!(
                parsed.response.missing_information,
                vec!["Which stack?", "Who are the users?"]
            );
        }

        #[test]
        fn parses_reply_wrapped_in_prose() {
            let parsed = parse_wizard_response(&reply(
                "Sure!\n{\"status\":\"OK\",\"phases\":[{\"phase_id\":\"PHASE_1\",\"title\":\"PROBLEM MODELING\",\"steps\":[]}]}\nBye",
            ))
            .unwrap();

            assert!(parsed.response.is_complete());
            assert_eq!(parsed.response.phases[0].title, "PROBLEM MODELING");
        }

        #[test]
        fn unescapes_literal_sequences_in_step_content() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"OK","phases":[{"phase_id":"PHASE_3","title":"IMPLEMENTATION","steps":[{"step_id":"1","label":"IMPLEMENTATION","content":"a\\nb \\\"q\\\""}]}]}"#,
            ))
            .unwrap();

            assert_eq!(parsed.response.phases[0].steps[0].content, "a\nb \"q\"");
        }
    }

    mod repair_path {
        use super::*;

        #[test]
        fn recovers_raw_newline_in_content() {
            let parsed = parse_wizard_response(&reply(
                "{\"status\":\"OK\",\"phases\":[{\"phase_id\":\"PHASE_3\",\"title\":\"IMPLEMENTATION\",\"steps\":[{\"step_id\":\"1\",\"label\":\"IMPLEMENTATION\",\"content\":\"line1\nline2\"}]}]}",
            ))
            .unwrap();

            assert!(parsed.repaired);
            assert_eq!(parsed.response.phases[0].steps[0].content, "line1\nline2");
        }

        #[test]
        fn recovers_unescaped_attribute() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"OK","phases":[{"phase_id":"PHASE_3","title":"IMPLEMENTATION","steps":[{"step_id":"1","label":"IMPLEMENTATION","content":"<img width = "200">"}]}]}"#,
            ))
            .unwrap();

            assert!(parsed.repaired);
            assert_eq!(
                parsed.response.phases[0].steps[0].content,
                "<img width=\"200\">"
            );
        }
    }

    mod tolerated_shapes {
        use super::*;

        #[test]
        fn string_missing_information_parses_strictly() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"OK","missing_information":"","phases":[{"phase_id":"PHASE_1","title":"PROBLEM MODELING","steps":[]}]}"#,
            ))
            .unwrap();

            assert!(!parsed.repaired);
            assert!(parsed.response.is_complete());
            assert!(parsed.response.missing_information.is_empty());
        }

        #[test]
        fn numeric_title_parses_strictly() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"OK","phases":[{"phase_id":"PHASE_1","title":1,"steps":[]}]}"#,
            ))
            .unwrap();

            assert!(!parsed.repaired);
            assert_eq!(parsed.response.phases[0].title, "1");
        }

        #[test]
        fn doubled_quote_after_trailing_space_is_repaired() {
            let parsed = parse_wizard_response(&reply(
                r#"{"status":"OK","phases":[{"phase_id":"PHASE_1","title":"T","steps":[{"step_id":"1","label":"a","content":"done ""  , "x":1}]}]}"#,
            ))
            .unwrap();

            assert!(parsed.repaired);
            assert_eq!(parsed.response.phases[0].steps[0].content, "done ");
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn empty_reply_is_extraction_error() {
            assert_eq!(
                parse_wizard_response(&reply("   ")),
                Err(ParseError::Extraction(ExtractionError::EmptyResponse))
            );
        }

        #[test]
        fn prose_reply_has_no_json_structure() {
            assert_eq!(
                parse_wizard_response(&reply("I need more details.")),
                Err(ParseError::Extraction(ExtractionError::NoJsonStructure))
            );
        }

        #[test]
        fn unrepairable_reply_is_persistent_with_full_raw_text() {
            let raw = "Result: {\"status\": OK, [[[ }";
            match parse_wizard_response(&reply(raw)) {
                Err(ParseError::Persistent {
                    raw_reply,
                    strict_error,
                    sanitized_error,
                }) => {
                    assert_eq!(raw_reply, raw);
                    assert!(!strict_error.is_empty());
                    assert!(!sanitized_error.is_empty());
                }
                other => panic!("expected persistent error, got {other:?}"),
            }
        }

        #[test]
        fn greedy_span_with_trailing_brace_prose_fails_persistently() {
            let raw = r#"{"status":"OK","phases":[]} and then {x}"#;
            assert!(matches!(
                parse_wizard_response(&reply(raw)),
                Err(ParseError::Persistent { .. })
            ));
        }
    }
}
