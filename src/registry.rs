//! Read-only catalogue of the models a run can target.
//!
//! The registry is a pre-computed JSON array of [`ModelSpec`] records
//! (`model_info/vision_models.json` by default). Nothing here talks to the
//! remote service.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LabelscribeError;

/// Model family, which decides the request/response wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Anthropic,
    Nova,
    Llama,
    Mistral,
}

impl ModelFamily {
    /// Infer the family from a Bedrock model or inference-profile id.
    pub fn from_model_id(model_id: &str) -> Option<Self> {
        let id = model_id.to_lowercase();
        if id.contains("anthropic.claude") {
            Some(ModelFamily::Anthropic)
        } else if id.contains("amazon.nova") {
            Some(ModelFamily::Nova)
        } else if id.contains("meta.llama") {
            Some(ModelFamily::Llama)
        } else if id.contains("mistral.") {
            Some(ModelFamily::Mistral)
        } else {
            None
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::Anthropic => write!(f, "anthropic"),
            ModelFamily::Nova => write!(f, "nova"),
            ModelFamily::Llama => write!(f, "llama"),
            ModelFamily::Mistral => write!(f, "mistral"),
        }
    }
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(rename = "input", default)]
    pub input_per_million: f64,
    #[serde(rename = "output", default)]
    pub output_per_million: f64,
}

fn default_max_tokens() -> u32 {
    4096
}

/// Description of one selectable backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub model_id: String,
    #[serde(alias = "modelName")]
    pub display_name: String,
    #[serde(default)]
    pub family: Option<ModelFamily>,
    #[serde(default)]
    pub supports_structured_output: bool,
    #[serde(default)]
    pub supports_inference_profile: bool,
    #[serde(default)]
    pub inference_profile_id: Option<String>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ModelSpec {
    /// Family from the record, falling back to the model id.
    pub fn family(&self) -> Option<ModelFamily> {
        self.family.or_else(|| ModelFamily::from_model_id(&self.model_id))
    }

    /// Id to invoke: the inference profile when the model is routed through one.
    pub fn invocation_target(&self) -> &str {
        match (&self.inference_profile_id, self.supports_inference_profile) {
            (Some(profile), true) if !profile.trim().is_empty() => profile,
            _ => &self.model_id,
        }
    }
}

/// Collection of [`ModelSpec`] records loaded from the registry file.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn from_json(json: &str) -> Result<Self, LabelscribeError> {
        let models: Vec<ModelSpec> = serde_json::from_str(json)?;
        Ok(Self { models })
    }

    pub fn load(path: &Path) -> Result<Self, LabelscribeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LabelscribeError::Config(format!("cannot read model registry {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Look a model up by id, profile id or display name (case-insensitive).
    pub fn find(&self, key: &str) -> Result<&ModelSpec, LabelscribeError> {
        let key = key.trim();
        self.models
            .iter()
            .find(|m| {
                m.model_id == key
                    || m.inference_profile_id.as_deref() == Some(key)
                    || m.display_name.eq_ignore_ascii_case(key)
            })
            .ok_or_else(|| LabelscribeError::UnknownModel(key.to_string()))
    }
}
