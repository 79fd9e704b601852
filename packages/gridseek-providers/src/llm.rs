use std::time::Duration;

use reqwest::{Client, header::HeaderMap};
use serde_json::Value;

use gridseek_config::LlmProviderConfig;

use crate::{BoxFuture, Error, LlmProvider, Result};

/// Chat-completions client for OpenAI-compatible endpoints, including Gemini's
/// `/v1beta/openai` surface.
#[derive(Clone, Debug)]
pub struct LlmClient {
	provider_id: String,
	client: Client,
	url: String,
	headers: HeaderMap,
	temperature: f32,
}
impl LlmClient {
	pub fn new(cfg: &LlmProviderConfig) -> Result<Self> {
		let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
		let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

		Ok(Self {
			provider_id: cfg.provider_id.clone(),
			client,
			url,
			headers,
			temperature: cfg.temperature,
		})
	}

	pub fn provider_id(&self) -> &str {
		&self.provider_id
	}

	pub async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
		let body = serde_json::json!({
			"model": model,
			"temperature": self.temperature,
			"messages": [{ "role": "user", "content": prompt }],
		});
		let res = self.client.post(&self.url).headers(self.headers.clone()).json(&body).send().await?;
		let json: Value = res.error_for_status()?.json().await?;

		tracing::debug!(provider = %self.provider_id, model, "Model call completed.");

		parse_completion_text(&json)
	}
}
impl LlmProvider for LlmClient {
	fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
		Box::pin(self.complete(model, prompt))
	}
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing choices[0].message.content.".to_string(),
		})?;

	if let Some(text) = content.as_str() {
		return Ok(text.to_string());
	}

	// Some gateways return content as a list of typed parts.
	if let Some(parts) = content.as_array() {
		let text: String = parts
			.iter()
			.filter_map(|part| part.get("text").and_then(|t| t.as_str()))
			.collect::<Vec<_>>()
			.join("");

		if !text.is_empty() {
			return Ok(text);
		}
	}

	Err(Error::InvalidResponse { message: "Completion content is not text.".to_string() })
}
