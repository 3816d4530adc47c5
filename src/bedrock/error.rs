//! Tipos de erro para o cliente do Bedrock Runtime.
//!
//! Define [`InvocationError`], que carrega um [`InvocationKind`] classificado a
//! partir do status HTTP, do cabeçalho `x-amzn-ErrorType` e da mensagem de erro.
//! Usa `thiserror` para derivar `Display` e `Error`.

use std::fmt;

use thiserror::Error;

use crate::state_machine::{FailureKind, JobError};

/// Categoria de falha de uma invocação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// HTTP 429 ou cota excedida.
    Throttled,
    /// O modelo ou o perfil de inferência não atende esta requisição.
    Unsupported,
    /// Credencial ausente, inválida ou sem acesso ao modelo.
    Auth,
    /// Falha de rede, conexão recusada ou timeout.
    Network,
    Unknown,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationKind::Throttled => write!(f, "throttled"),
            InvocationKind::Unsupported => write!(f, "unsupported"),
            InvocationKind::Auth => write!(f, "auth"),
            InvocationKind::Network => write!(f, "network"),
            InvocationKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<InvocationKind> for FailureKind {
    fn from(kind: InvocationKind) -> Self {
        match kind {
            InvocationKind::Throttled => FailureKind::Throttled,
            InvocationKind::Unsupported => FailureKind::Unsupported,
            InvocationKind::Auth => FailureKind::Auth,
            InvocationKind::Network => FailureKind::Network,
            InvocationKind::Unknown => FailureKind::Unknown,
        }
    }
}

/// Erro de invocação do modelo, já classificado.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct InvocationError {
    pub kind: InvocationKind,
    pub message: String,
}

impl InvocationError {
    pub fn new(kind: InvocationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifica uma resposta HTTP de erro do Bedrock.
    ///
    /// `error_type` é o valor de `x-amzn-ErrorType` (ex.: `ThrottlingException:http://...`).
    pub fn from_response(status: u16, error_type: Option<&str>, message: &str) -> Self {
        let error_type = error_type
            .and_then(|t| t.split(':').next())
            .unwrap_or_default();
        let lower = message.to_lowercase();

        let kind = match (status, error_type) {
            (429, _) | (_, "ThrottlingException" | "ServiceQuotaExceededException") => {
                InvocationKind::Throttled
            }
            (401 | 403, _)
            | (_, "AccessDeniedException" | "UnrecognizedClientException" | "ExpiredTokenException") => {
                InvocationKind::Auth
            }
            (404, _) | (_, "ResourceNotFoundException") => InvocationKind::Unsupported,
            (408 | 504, _) | (_, "ModelTimeoutException") => InvocationKind::Network,
            (400, _) | (_, "ValidationException")
                if lower.contains("inference profile")
                    || lower.contains("on-demand throughput")
                    || lower.contains("not supported")
                    || lower.contains("doesn't support")
                    || lower.contains("does not support") =>
            {
                InvocationKind::Unsupported
            }
            _ if lower.contains("quota exceeded") || lower.contains("too many requests") => {
                InvocationKind::Throttled
            }
            _ => InvocationKind::Unknown,
        };

        let message = if error_type.is_empty() {
            format!("status {status}: {message}")
        } else {
            format!("{error_type} (status {status}): {message}")
        };
        Self { kind, message }
    }
}

impl From<reqwest::Error> for InvocationError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            InvocationKind::Network
        } else {
            InvocationKind::Unknown
        };
        Self::new(kind, err.to_string())
    }
}

impl From<InvocationError> for JobError {
    fn from(err: InvocationError) -> Self {
        JobError::new(err.kind.into(), err.message)
    }
}
