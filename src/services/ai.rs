use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::config::IntegrationsConfig;
use crate::services::integration::{http_client, read_json, IntegrationError};

/// A text-in, text-out generative model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, IntegrationError>;
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client(config)?,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, IntegrationError> {
        let api_key = self.api_key.as_deref().ok_or(IntegrationError::NotConfigured("Gemini"))?;

        let response = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
            .send()
            .await?;
        let body = read_json(response).await?;

        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| IntegrationError::InvalidResponse("model response has no text".to_string()))
    }
}

const PRICE_LIST_PROMPT: &str = r#"Você é um assistente que extrai dados estruturados de listas de preços de fornecedores de produtos Apple.

Regras:
1. Cada linha com produto e preço vira um objeto JSON.
2. Campos: "productName" (ex.: "iPhone 15 Pro Max"), "model" (ex.: "A3106" ou null), "capacity" (ex.: "256GB"), "color" (ou null), "condition" ("novo", "seminovo" ou "vitrine"), "price" (número, sem símbolo de moeda).
3. Normalize nomes: "IP" ou "iph" significam "iPhone"; "PM" significa "Pro Max"; "128" significa "128GB".
4. Preços no formato brasileiro ("5.299,00") devem virar números (5299.00).
5. Se uma linha listar várias cores para o mesmo preço, gere um objeto por cor.
6. Ignore linhas sem preço, cabeçalhos e mensagens promocionais.
7. Responda APENAS com um array JSON, sem texto adicional.

Lista de preços:
"#;

pub fn build_prompt(text: &str) -> String {
    format!("{}{}", PRICE_LIST_PROMPT, text)
}

/// Removes markdown code fences (```json ... ```), keeping their contents.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the first balanced `[...]` substring that parses as JSON, trying
/// each `[` in turn so bracketed prose before the payload is skipped.
pub fn extract_json_array(text: &str) -> Option<&str> {
    text.match_indices('[')
        .filter_map(|(start, _)| balanced_array_at(text, start))
        .find(|candidate| serde_json::from_str::<Value>(candidate).is_ok())
}

/// The bracket-balanced slice opening at `start`. Brackets inside string
/// literals are ignored.
fn balanced_array_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turns a supplier's free-text price list into structured rows via the model.
pub struct PriceListParser {
    generator: Arc<dyn TextGenerator>,
}

impl PriceListParser {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn parse(&self, text: &str) -> Result<Value, IntegrationError> {
        let raw = self.generator.generate(&build_prompt(text)).await?;
        debug!("Model returned {} characters", raw.len());
        parse_model_output(&raw)
    }
}

pub fn parse_model_output(raw: &str) -> Result<Value, IntegrationError> {
    let cleaned = strip_code_fences(raw);
    let array = extract_json_array(&cleaned)
        .ok_or_else(|| IntegrationError::Parse("No JSON array found in model response".to_string()))?;

    serde_json::from_str::<Value>(array)
        .map_err(|e| IntegrationError::Parse(format!("Model response is not valid JSON: {}", e)))
}
