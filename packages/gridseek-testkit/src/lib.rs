//! Test doubles shared by the gridseek crates: a scripted model and ready-made configs.

use std::{
	collections::VecDeque,
	future,
	path::PathBuf,
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};

use gridseek_config::{Config, LlmProviderConfig, Providers, Search, Service};
use gridseek_providers::{BoxFuture, Error, LlmProvider, Result};

/// One scripted model reply.
#[derive(Clone, Debug)]
pub enum Reply {
	/// Raw response text, returned as-is.
	Text(String),
	/// A provider failure with this message.
	Fail(String),
	/// A call that never completes.
	Hang,
}
impl Reply {
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(text.into())
	}

	pub fn json(value: Value) -> Self {
		Self::Text(value.to_string())
	}

	pub fn fenced(value: Value) -> Self {
		Self::Text(format!("```json\n{value:#}\n```"))
	}
}

/// An [`LlmProvider`] that answers calls from a fixed script, in order, and records every
/// prompt it receives. Calls past the end of the script fail.
pub struct ScriptedLlm {
	replies: Mutex<VecDeque<Reply>>,
	prompts: Mutex<Vec<String>>,
	calls: AtomicUsize,
}
impl ScriptedLlm {
	pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
		Self {
			replies: Mutex::new(replies.into_iter().collect()),
			prompts: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
		}
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn prompts(&self) -> Vec<String> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn remaining(&self) -> usize {
		self.replies.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl LlmProvider for ScriptedLlm {
	fn generate<'a>(&'a self, _model: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).push(prompt.to_string());

		let reply = self.replies.lock().unwrap_or_else(|err| err.into_inner()).pop_front();

		Box::pin(async move {
			match reply {
				Some(Reply::Text(text)) => Ok(text),
				Some(Reply::Fail(message)) => Err(Error::InvalidResponse { message }),
				Some(Reply::Hang) => future::pending().await,
				None => Err(Error::InvalidResponse { message: "Script exhausted.".to_string() }),
			}
		})
	}
}

pub fn expansion_json() -> Value {
	serde_json::json!({
		"expanded_query": "gross margin and profitability metrics",
		"concepts": ["gross margin", "profitability"],
		"metrics": ["gross margin %"],
		"formulas": ["(revenue - cogs) / revenue"]
	})
}

pub fn result_item_json(concept_name: &str, relevance: Value) -> Value {
	serde_json::json!({
		"concept_name": concept_name,
		"location": format!("Dashboard Sheet, {concept_name}"),
		"value_formula": "0.6",
		"formula": null,
		"relevance": relevance,
		"explanation": format!("{concept_name} matches the query."),
		"business_context": "Profitability tracking.",
		"cell_location": "B5",
		"sheet_name": "Dashboard",
		"formula_type": "Calculated Metric"
	})
}

/// A complete, valid config with fast retries, suitable for driving the pipeline in tests.
pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			log_dir: None,
			upload_dir: PathBuf::from("uploads"),
			max_upload_bytes: 1_024 * 1_024,
			cors_allowed_origins: gridseek_config::default_cors_allowed_origins(),
		},
		providers: Providers { llm: test_llm_config() },
		search: Search {
			chunk_lines: 2,
			max_attempts: 3,
			retry_backoff_ms: 1,
			max_backoff_ms: 4,
			chunk_failure_policy: "skip".to_string(),
			csv_sheet_name: "Sheet1".to_string(),
		},
	}
}

pub fn test_llm_config() -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "scripted".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "scripted-model".to_string(),
		temperature: 0.0,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	}
}
