use serde_json::{Value, json};

use super::{EncodedImage, FamilyAdapter, Reply, count};
use crate::bedrock::ModelRequest;
use crate::cost::UsageCounts;
use crate::prompt::Prompt;
use crate::registry::ModelSpec;

/// Mistral (Pixtral) models via the chat-completions format. Structured
/// output uses JSON mode rather than tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MistralAdapter;

impl FamilyAdapter for MistralAdapter {
    fn build_request(&self, prompt: &Prompt, image: &EncodedImage, spec: &ModelSpec) -> ModelRequest {
        let structured = spec.supports_structured_output && !prompt.fields.is_empty();
        let mut body = json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt.free_text()},
                    {"type": "image_url", "image_url": {"url": image.data_uri()}}
                ]
            }],
            "max_tokens": spec.max_tokens,
            "temperature": 0
        });
        if structured {
            body["response_format"] = json!({"type": "json_object"});
        }
        ModelRequest { body, structured }
    }

    fn reply(&self, body: &Value) -> Option<Reply> {
        let text = body
            .pointer("/choices/0/message/content")
            .or_else(|| body.pointer("/outputs/0/text"))?
            .as_str()?;
        (!text.trim().is_empty()).then(|| Reply::Text(text.to_string()))
    }

    fn usage(&self, body: &Value) -> Option<UsageCounts> {
        let usage = body.get("usage")?;
        Some(UsageCounts {
            input_tokens: count(usage, &["prompt_tokens", "input_tokens"])?,
            output_tokens: count(usage, &["completion_tokens", "output_tokens"]).unwrap_or(0),
        })
    }
}
