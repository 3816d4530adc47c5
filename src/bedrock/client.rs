use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;

use super::error::{InvocationError, InvocationKind};
use super::types::RawResponse;
use crate::cost::UsageCounts;

/// Something that can send a request body to a model and return its raw reply.
#[allow(async_fn_in_trait)]
pub trait ModelInvoker {
    /// `target` is a model id or an inference-profile id.
    async fn invoke_model(&self, target: &str, body: &Value) -> Result<RawResponse, InvocationError>;
}

/// Client for the Bedrock Runtime `InvokeModel` REST endpoint, authenticated with a
/// Bedrock API key sent as a bearer token.
pub struct BedrockClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl BedrockClient {
    pub fn new(api_key: String, region: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_base_url(
            api_key,
            format!("https://bedrock-runtime.{region}.amazonaws.com"),
            timeout,
        )
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url,
        })
    }

    fn invoke_url(&self, target: &str) -> Result<Url, InvocationError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            InvocationError::new(InvocationKind::Unknown, format!("invalid endpoint {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                InvocationError::new(
                    InvocationKind::Unknown,
                    format!("endpoint cannot be a base URL: {}", self.base_url),
                )
            })?
            .pop_if_empty()
            .push("model")
            .push(target)
            .push("invoke");
        Ok(url)
    }
}

fn header_count(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

impl ModelInvoker for BedrockClient {
    async fn invoke_model(&self, target: &str, body: &Value) -> Result<RawResponse, InvocationError> {
        let url = self.invoke_url(target)?;
        tracing::debug!(%url, invocation_target = target, "invoking model");

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();

        if !status.is_success() {
            let error_type = headers
                .get("x-amzn-errortype")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .or_else(|| v.get("Message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(text);
            let err = InvocationError::from_response(status.as_u16(), error_type.as_deref(), &message);
            tracing::warn!(
                invocation_target = target,
                status = status.as_u16(),
                kind = %err.kind,
                "model invocation failed"
            );
            return Err(err);
        }

        let body = response.json::<Value>().await?;
        let header_usage = match (
            header_count(&headers, "x-amzn-bedrock-input-token-count"),
            header_count(&headers, "x-amzn-bedrock-output-token-count"),
        ) {
            (Some(input_tokens), Some(output_tokens)) => Some(UsageCounts {
                input_tokens,
                output_tokens,
            }),
            _ => None,
        };

        Ok(RawResponse::new(body).with_header_usage(header_usage))
    }
}
