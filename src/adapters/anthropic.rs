use serde_json::{Value, json};

use super::{EncodedImage, FamilyAdapter, Reply, count};
use crate::bedrock::ModelRequest;
use crate::cost::UsageCounts;
use crate::prompt::{Prompt, TRANSCRIPTION_TOOL};
use crate::registry::ModelSpec;

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Claude models via the Anthropic messages format. Structured output is
/// forced through a single tool whose input schema is the prompt's fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnthropicAdapter;

impl FamilyAdapter for AnthropicAdapter {
    fn build_request(&self, prompt: &Prompt, image: &EncodedImage, spec: &ModelSpec) -> ModelRequest {
        let structured = spec.supports_structured_output && !prompt.fields.is_empty();
        let text = if structured {
            prompt.tool_text()
        } else {
            prompt.free_text()
        };

        let mut body = json!({
            "anthropic_version": ANTHROPIC_VERSION,
            "max_tokens": spec.max_tokens,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.media_type(),
                            "data": image.data,
                        }
                    },
                    {"type": "text", "text": text}
                ]
            }]
        });

        if structured {
            body["tools"] = json!([{
                "name": TRANSCRIPTION_TOOL,
                "description": "Record the transcribed label fields.",
                "input_schema": prompt.json_schema(),
            }]);
            body["tool_choice"] = json!({"type": "tool", "name": TRANSCRIPTION_TOOL});
        }

        ModelRequest { body, structured }
    }

    fn reply(&self, body: &Value) -> Option<Reply> {
        let blocks = body.get("content")?.as_array()?;

        let tool_input = blocks
            .iter()
            .filter(|b| b["type"] == "tool_use")
            .find_map(|b| b.get("input")?.as_object().cloned());
        if let Some(input) = tool_input {
            return Some(Reply::Structured(input));
        }

        let text: Vec<&str> = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect();
        let text = text.join("\n");
        (!text.trim().is_empty()).then_some(Reply::Text(text))
    }

    fn usage(&self, body: &Value) -> Option<UsageCounts> {
        let usage = body.get("usage")?;
        Some(UsageCounts {
            input_tokens: count(usage, &["input_tokens"])?,
            output_tokens: count(usage, &["output_tokens"]).unwrap_or(0),
        })
    }
}
