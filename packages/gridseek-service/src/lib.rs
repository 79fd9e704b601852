pub mod expand;
pub mod rank;
pub mod schema;
pub mod score;
pub mod search;
pub mod validate;

pub use expand::expand_query;
pub use rank::rank_results;
pub use schema::{ExpandedQuery, ResponseSchema, ResultItem};
pub use score::score_chunk;
pub use search::SearchResponse;
pub use validate::{AttemptFailure, RetryPolicy, generate_validated, parse_response, strip_code_fence};

use std::{path::PathBuf, sync::Arc};

use gridseek_config::Config;
use gridseek_providers::{LlmClient, LlmProvider};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unsupported file type: {name}")]
	UnsupportedFile { name: String },
	#[error(transparent)]
	Sheets(#[from] gridseek_sheets::Error),
	#[error("Failed to access {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },
	#[error(
		"LLM response validation failed after retries ({context}, {attempts} attempts): {last_error}"
	)]
	Validation { context: String, attempts: u32, last_error: String },
	#[error("Chunk {chunk_index} failed and the chunk failure policy is abort: {source}")]
	ChunkAborted { chunk_index: usize, source: Box<ServiceError> },
	#[error("Provider error: {0}")]
	Provider(#[from] gridseek_providers::Error),
	#[error("Internal error: {message}")]
	Internal { message: String },
}

/// Runs spreadsheet searches against one configured model.
pub struct SearchService {
	pub cfg: Config,
	pub llm: Arc<dyn LlmProvider>,
}
impl SearchService {
	/// Builds the service with the HTTP model client described by `cfg.providers.llm`.
	pub fn new(cfg: Config) -> ServiceResult<Self> {
		let llm = LlmClient::new(&cfg.providers.llm)?;

		tracing::info!(
			provider = llm.provider_id(),
			model = %cfg.providers.llm.model,
			"Model provider configured."
		);

		Ok(Self { cfg, llm: Arc::new(llm) })
	}

	pub fn with_provider(cfg: Config, llm: Arc<dyn LlmProvider>) -> Self {
		Self { cfg, llm }
	}

	pub fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy::from_config(&self.cfg)
	}
}
