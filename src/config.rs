//! Configuração do labelscribe carregada a partir de `labelscribe.toml`.
//!
//! A struct [`LabelscribeConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `AWS_BEARER_TOKEN_BEDROCK` e `AWS_REGION` têm
//! precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::LabelscribeError;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "labelscribe.toml";

/// Configuração de nível superior carregada de `labelscribe.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelscribeConfig {
    /// Chave de API do Bedrock, enviada como bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Região AWS do endpoint do Bedrock Runtime.
    #[serde(default = "default_region")]
    pub region: String,

    /// URL base alternativa para o runtime (proxy, endpoint VPC, testes).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Máximo de tentativas de invocação por job.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pausa a execução imediatamente quando uma imagem não pode ser baixada.
    #[serde(default)]
    pub pause_on_fetch_failure: bool,

    /// Timeout de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Caminho do registro de modelos (JSON).
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Diretório raiz dos resultados.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Diretório de cache das imagens baixadas; sem cache se ausente.
    #[serde(default)]
    pub image_cache_dir: Option<PathBuf>,
}

// Região padrão: us-east-1.
fn default_region() -> String {
    "us-east-1".to_string()
}

// Tentativas máximas padrão: 3.
fn default_max_attempts() -> u32 {
    3
}

// Timeout padrão: 120s, respostas de modelos de visão podem demorar.
fn default_request_timeout_secs() -> u64 {
    120
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("model_info/vision_models.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("transcriptions")
}

impl Default for LabelscribeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            region: default_region(),
            endpoint: None,
            max_attempts: default_max_attempts(),
            pause_on_fetch_failure: false,
            request_timeout_secs: default_request_timeout_secs(),
            registry_path: default_registry_path(),
            output_dir: default_output_dir(),
            image_cache_dir: None,
        }
    }
}

impl LabelscribeConfig {
    /// Carrega a configuração de `labelscribe.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self, LabelscribeError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho específico e aplica as variáveis de ambiente.
    pub fn load_from(path: &Path) -> Result<Self, LabelscribeError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(
            std::env::var("AWS_BEARER_TOKEN_BEDROCK").ok(),
            std::env::var("AWS_REGION").ok(),
        );
        Ok(config)
    }

    /// Lê apenas o arquivo, sem consultar o ambiente.
    fn from_file(path: &Path) -> Result<Self, LabelscribeError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<LabelscribeConfig>(&contents)?)
    }

    // Variáveis de ambiente têm precedência sobre o arquivo; valores vazios são ignorados.
    fn apply_env(&mut self, api_key: Option<String>, region: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            self.region = region;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Falha cedo quando não há credencial para invocar modelos.
    pub fn require_api_key(&self) -> Result<&str, LabelscribeError> {
        if self.api_key.trim().is_empty() {
            return Err(LabelscribeError::Config(
                "no Bedrock API key: set AWS_BEARER_TOKEN_BEDROCK or api_key in labelscribe.toml"
                    .to_string(),
            ));
        }
        Ok(&self.api_key)
    }
}
