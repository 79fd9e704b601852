use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_CORS_ALLOWED_ORIGINS: [&str; 5] = [
	"http://localhost:8000",
	"http://127.0.0.1:8000",
	"http://localhost:8080",
	"http://127.0.0.1:8080",
	"null",
];

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Optional. When set, logs are also written to a daily rolling file in this directory.
	pub log_dir: Option<PathBuf>,
	#[serde(default = "default_upload_dir")]
	pub upload_dir: PathBuf,
	#[serde(default = "default_max_upload_bytes")]
	pub max_upload_bytes: u64,
	/// Browser origins allowed to call the API cross-origin. `"null"` admits pages opened
	/// from `file://`.
	#[serde(default = "default_cors_allowed_origins")]
	pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub llm: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	/// Upper bound on serialized rows per model call.
	pub chunk_lines: usize,
	/// Total model calls allowed per validated response, first attempt included.
	pub max_attempts: u32,
	pub retry_backoff_ms: u64,
	pub max_backoff_ms: u64,
	pub chunk_failure_policy: String,
	/// Sheet label used for CSV uploads, which carry no sheet names of their own.
	pub csv_sheet_name: String,
}
impl Search {
	pub fn failure_policy(&self) -> Option<ChunkFailurePolicy> {
		ChunkFailurePolicy::parse(&self.chunk_failure_policy)
	}
}
impl Default for Search {
	fn default() -> Self {
		Self {
			chunk_lines: 2_000,
			max_attempts: 3,
			retry_backoff_ms: 500,
			max_backoff_ms: 8_000,
			chunk_failure_policy: ChunkFailurePolicy::Skip.as_str().to_string(),
			csv_sheet_name: "Sheet1".to_string(),
		}
	}
}

/// What a search does with a chunk whose model output never validates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkFailurePolicy {
	/// Log the chunk and continue with zero results from it.
	Skip,
	/// Fail the whole request.
	Abort,
}
impl ChunkFailurePolicy {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim() {
			"skip" => Some(Self::Skip),
			"abort" => Some(Self::Abort),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Skip => "skip",
			Self::Abort => "abort",
		}
	}
}

fn default_upload_dir() -> PathBuf {
	PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> u64 {
	25 * 1_024 * 1_024
}

pub fn default_cors_allowed_origins() -> Vec<String> {
	DEFAULT_CORS_ALLOWED_ORIGINS.iter().map(|origin| origin.to_string()).collect()
}
