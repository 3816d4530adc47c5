//! Tipos de dados trocados com o endpoint `InvokeModel` do Bedrock.
//!
//! O corpo da requisição varia por família de modelo e é montado pelos
//! adaptadores; aqui ficam apenas os envelopes comuns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cost::UsageCounts;

/// Requisição pronta para envio: o corpo JSON no formato da família do modelo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Corpo JSON enviado sem alterações para `/model/{id}/invoke`.
    pub body: Value,
    /// Indica se a requisição pediu saída estruturada nativa (ferramenta ou `response_format`).
    pub structured: bool,
}

/// Resposta bruta do modelo, guardada sem modificações.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    /// Corpo JSON devolvido pelo modelo.
    pub body: Value,
    /// Contagem de tokens informada nos cabeçalhos
    /// `x-amzn-bedrock-input-token-count` / `x-amzn-bedrock-output-token-count`, se presentes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_usage: Option<UsageCounts>,
}

impl RawResponse {
    pub fn new(body: Value) -> Self {
        Self {
            body,
            header_usage: None,
        }
    }

    pub fn with_header_usage(mut self, usage: Option<UsageCounts>) -> Self {
        self.header_usage = usage;
        self
    }
}
