pub mod llm;

mod error;

pub use error::{Error, Result};
pub use llm::LlmClient;

use std::{future::Future, pin::Pin};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The single operation the search pipeline needs from a generative model: send a prompt,
/// get back the raw response text.
pub trait LlmProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(&'a self, model: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};
		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}
	Ok(headers)
}
