//! Per-family model adapters.
//!
//! Every backend family speaks a different request/response dialect. The
//! [`FamilyAdapter`] trait captures just those differences (request body,
//! where the reply and the token counts live); [`Adapter`] wraps the family
//! selected from a [`ModelSpec`] and provides the shared contract used by the
//! orchestrator: build, invoke, parse, price.

mod anthropic;
mod extract;
mod llama;
mod mistral;
mod nova;

use base64::{Engine as _, engine::general_purpose};
use serde_json::{Map, Value};

use crate::bedrock::{InvocationError, ModelInvoker, ModelRequest, RawResponse};
use crate::cost::{CostInfo, UsageCounts, compute_cost};
use crate::error::{LabelscribeError, ParseError};
use crate::prompt::Prompt;
use crate::registry::{ModelFamily, ModelSpec};
use crate::state_machine::TranscriptionFields;

pub use anthropic::AnthropicAdapter;
pub use extract::{structure_object, structure_text};
pub use llama::LlamaAdapter;
pub use mistral::MistralAdapter;
pub use nova::NovaAdapter;

/// Image bytes encoded for embedding in a JSON request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Short format name (`jpeg`, `png`, `gif`, `webp`).
    pub format: &'static str,
    pub data: String,
}

impl EncodedImage {
    pub fn encode(bytes: &[u8]) -> Self {
        Self {
            format: sniff_format(bytes),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn media_type(&self) -> String {
        format!("image/{}", self.format)
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type(), self.data)
    }
}

fn sniff_format(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        _ => "jpeg",
    }
}

/// Model reply content, before it is mapped onto the prompt's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Native structured output (tool call arguments).
    Structured(Map<String, Value>),
    Text(String),
}

/// What differs between model families.
pub trait FamilyAdapter {
    fn build_request(&self, prompt: &Prompt, image: &EncodedImage, spec: &ModelSpec) -> ModelRequest;

    /// Pull the reply content out of the response body.
    fn reply(&self, body: &Value) -> Option<Reply>;

    /// Token counts reported in the response body.
    fn usage(&self, body: &Value) -> Option<UsageCounts>;
}

/// Adapter selected for one model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    Anthropic(AnthropicAdapter),
    Nova(NovaAdapter),
    Llama(LlamaAdapter),
    Mistral(MistralAdapter),
}

impl Adapter {
    pub fn for_family(family: ModelFamily) -> Self {
        match family {
            ModelFamily::Anthropic => Adapter::Anthropic(AnthropicAdapter),
            ModelFamily::Nova => Adapter::Nova(NovaAdapter),
            ModelFamily::Llama => Adapter::Llama(LlamaAdapter),
            ModelFamily::Mistral => Adapter::Mistral(MistralAdapter),
        }
    }

    pub fn for_spec(spec: &ModelSpec) -> Result<Self, LabelscribeError> {
        spec.family().map(Self::for_family).ok_or_else(|| {
            LabelscribeError::Config(format!(
                "no adapter for model {}: unknown model family",
                spec.model_id
            ))
        })
    }

    fn family(&self) -> &dyn FamilyAdapter {
        match self {
            Adapter::Anthropic(a) => a,
            Adapter::Nova(a) => a,
            Adapter::Llama(a) => a,
            Adapter::Mistral(a) => a,
        }
    }

    pub fn build_request(&self, prompt: &Prompt, image_bytes: &[u8], spec: &ModelSpec) -> ModelRequest {
        let image = EncodedImage::encode(image_bytes);
        self.family().build_request(prompt, &image, spec)
    }

    /// Send the request to the inference profile when the model is routed through one,
    /// otherwise to the model id.
    pub async fn invoke(
        &self,
        invoker: &impl ModelInvoker,
        request: &ModelRequest,
        spec: &ModelSpec,
    ) -> Result<RawResponse, InvocationError> {
        invoker
            .invoke_model(spec.invocation_target(), &request.body)
            .await
    }

    pub fn parse_response(
        &self,
        raw: &RawResponse,
        prompt: &Prompt,
    ) -> Result<(TranscriptionFields, UsageCounts), ParseError> {
        let usage = self.usage(raw).unwrap_or_default();
        let expected = prompt.field_names();

        let fields = match self.family().reply(&raw.body) {
            Some(Reply::Structured(object)) => structure_object(&object, &expected)?,
            Some(Reply::Text(text)) => structure_text(&text, &expected)?,
            None => return Err(ParseError("the reply contained no content".to_string())),
        };
        Ok((fields, usage))
    }

    /// Token counts from the reply body, else from the response headers.
    pub fn usage(&self, raw: &RawResponse) -> Option<UsageCounts> {
        self.family().usage(&raw.body).or(raw.header_usage)
    }

    pub fn compute_cost(&self, usage: UsageCounts, spec: &ModelSpec) -> CostInfo {
        compute_cost(usage, &spec.pricing)
    }
}

/// Read a token count that may be stored under one of several keys.
pub(crate) fn count(value: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| value.get(*k).and_then(Value::as_u64))
}
