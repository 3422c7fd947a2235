//! Property-based tests for the catalog and the wire translation layer
//!
//! - Coerced temperatures are always members of the allowed list
//! - Allowed temperatures survive coercion unchanged
//! - Response normalization preserves choice order and content

use super::models::all_models;
use super::openai::{OpenAIChoice, OpenAIMessage, OpenAIResponse, OpenAiTransport};
use proptest::prelude::*;

proptest! {
    #[test]
    fn coerced_temperature_is_allowed(t in -5.0f32..5.0, idx in 0usize..3) {
        let model = &all_models()[idx];
        let coerced = model.coerce_temperature(t);
        prop_assert!(model.allows_temperature(coerced));
    }

    #[test]
    fn allowed_temperature_is_fixed_point(idx in 0usize..3, pick in 0usize..8) {
        let model = &all_models()[idx];
        let t = model.allowed_temperatures[pick % model.allowed_temperatures.len()];
        prop_assert!((model.coerce_temperature(t) - t).abs() < f32::EPSILON);
    }

    #[test]
    fn normalization_preserves_content(contents in prop::collection::vec("[a-zA-Z0-9 {}:\",.]{0,40}", 0..5)) {
        let resp = OpenAIResponse {
            choices: contents
                .iter()
                .map(|c| OpenAIChoice {
                    message: OpenAIMessage {
                        role: "assistant".to_string(),
                        content: Some(c.clone()),
                    },
                })
                .collect(),
            usage: None,
        };

        let completion = OpenAiTransport::normalize_response(resp);
        prop_assert_eq!(completion.messages.len(), contents.len());
        for (msg, expected) in completion.messages.iter().zip(&contents) {
            prop_assert_eq!(&msg.content, expected);
        }
        prop_assert_eq!(completion.text(), contents.first().cloned().unwrap_or_default());
    }
}
