use serde_json::{Value, json};

use super::{EncodedImage, FamilyAdapter, Reply, count};
use crate::bedrock::ModelRequest;
use crate::cost::UsageCounts;
use crate::prompt::{Prompt, TRANSCRIPTION_TOOL};
use crate::registry::ModelSpec;

const USER_INSTRUCTION: &str =
    "Transcribe the label in this image and provide the requested information.";

/// Amazon Nova models via the `messages-v1` schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NovaAdapter;

impl FamilyAdapter for NovaAdapter {
    fn build_request(&self, prompt: &Prompt, image: &EncodedImage, spec: &ModelSpec) -> ModelRequest {
        let structured = spec.supports_structured_output && !prompt.fields.is_empty();
        let system = if structured {
            prompt.tool_text()
        } else {
            prompt.free_text()
        };

        let mut body = json!({
            "schemaVersion": "messages-v1",
            "system": [{"text": system}],
            "messages": [{
                "role": "user",
                "content": [
                    {"image": {"format": image.format, "source": {"bytes": image.data}}},
                    {"text": USER_INSTRUCTION}
                ]
            }],
            "inferenceConfig": {
                "max_new_tokens": spec.max_tokens,
                "temperature": 0,
                "top_p": 0.1,
                "top_k": 20
            }
        });

        if structured {
            body["toolConfig"] = json!({
                "tools": [{
                    "toolSpec": {
                        "name": TRANSCRIPTION_TOOL,
                        "description": "Record the transcribed label fields.",
                        "inputSchema": {"json": prompt.json_schema()}
                    }
                }],
                "toolChoice": {"tool": {"name": TRANSCRIPTION_TOOL}}
            });
        }

        ModelRequest { body, structured }
    }

    fn reply(&self, body: &Value) -> Option<Reply> {
        let blocks = body.pointer("/output/message/content")?.as_array()?;

        let tool_input = blocks
            .iter()
            .find_map(|b| b.pointer("/toolUse/input")?.as_object().cloned());
        if let Some(input) = tool_input {
            return Some(Reply::Structured(input));
        }

        let text: Vec<&str> = blocks.iter().filter_map(|b| b["text"].as_str()).collect();
        let text = text.join("\n");
        (!text.trim().is_empty()).then_some(Reply::Text(text))
    }

    fn usage(&self, body: &Value) -> Option<UsageCounts> {
        let usage = body.get("usage")?;
        Some(UsageCounts {
            input_tokens: count(usage, &["inputTokens"])?,
            output_tokens: count(usage, &["outputTokens"]).unwrap_or(0),
        })
    }
}
