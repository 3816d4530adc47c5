use serde_json::{Value, json};

use super::{EncodedImage, FamilyAdapter, Reply, count};
use crate::bedrock::ModelRequest;
use crate::cost::UsageCounts;
use crate::prompt::Prompt;
use crate::registry::ModelSpec;

/// Meta Llama vision models. These take a raw chat-templated prompt and have
/// no native structured output, so the reply is always free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LlamaAdapter;

fn chat_template(model_id: &str, text: &str) -> String {
    if model_id.contains("llama4") {
        format!(
            "<|begin_of_text|><|header_start|>user<|header_end|>\n\n<|image|>{text}<|eot|>\
             <|header_start|>assistant<|header_end|>\n\n"
        )
    } else {
        format!(
            "<|begin_of_text|><|start_header_id|>user<|end_header_id|>\n\n<|image|>{text}<|eot_id|>\
             <|start_header_id|>assistant<|end_header_id|>\n\n"
        )
    }
}

impl FamilyAdapter for LlamaAdapter {
    fn build_request(&self, prompt: &Prompt, image: &EncodedImage, spec: &ModelSpec) -> ModelRequest {
        let body = json!({
            "prompt": chat_template(&spec.model_id, &prompt.free_text()),
            "images": [image.data],
            "max_gen_len": spec.max_tokens,
            "temperature": 0,
            "top_p": 0.9
        });
        ModelRequest {
            body,
            structured: false,
        }
    }

    fn reply(&self, body: &Value) -> Option<Reply> {
        let text = body.get("generation")?.as_str()?;
        (!text.trim().is_empty()).then(|| Reply::Text(text.to_string()))
    }

    fn usage(&self, body: &Value) -> Option<UsageCounts> {
        Some(UsageCounts {
            input_tokens: count(body, &["prompt_token_count"])?,
            output_tokens: count(body, &["generation_token_count"]).unwrap_or(0),
        })
    }
}
