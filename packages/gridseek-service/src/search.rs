use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use gridseek_chunking::{ChunkPlan, ChunkingConfig};
use gridseek_config::ChunkFailurePolicy;
use gridseek_sheets::SpreadsheetKind;

use crate::{
	SearchService, ServiceError, ServiceResult,
	expand::expand_query,
	rank::rank_results,
	schema::ResultItem,
	score::score_chunk,
};

/// The ranked answer to one search, in the shape returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub size: usize,
	pub results: Vec<ResultItem>,
}
impl SearchResponse {
	pub fn new(results: Vec<ResultItem>) -> Self {
		Self { size: results.len(), results }
	}
}

impl SearchService {
	/// Searches an already-serialized record stream, one row object per line.
	pub async fn search_lines(&self, query: &str, lines: &[String]) -> ServiceResult<SearchResponse> {
		let request_id = Uuid::new_v4();
		let span = tracing::info_span!("search", %request_id);

		self.run_search(query, lines).instrument(span).await
	}

	/// Searches a JSONL artifact produced by the normalizer.
	pub async fn search_jsonl(&self, query: &str, path: &Path) -> ServiceResult<SearchResponse> {
		let query = validate_query(query)?;
		let source = path.to_path_buf();
		let lines = tokio::task::spawn_blocking(move || gridseek_sheets::read_jsonl_lines(&source))
			.await
			.map_err(|err| ServiceError::Internal { message: err.to_string() })??;

		self.search_lines(query, &lines).await
	}

	/// Normalizes a spreadsheet next to itself as `<file>.jsonl`, then searches it.
	pub async fn search_file(&self, query: &str, path: &Path) -> ServiceResult<SearchResponse> {
		let query = validate_query(query)?;
		let jsonl = self.prepare_file(path).await?;

		self.search_jsonl(query, &jsonl).await
	}

	/// Runs the normalizer for `path` and returns the JSONL artifact's location.
	pub async fn prepare_file(&self, path: &Path) -> ServiceResult<PathBuf> {
		let name =
			path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
		let kind = SpreadsheetKind::from_file_name(&name)
			.ok_or_else(|| ServiceError::UnsupportedFile { name: name.clone() })?;
		let csv_sheet = self.cfg.search.csv_sheet_name.clone();
		let source = path.to_path_buf();
		let target = jsonl_path_for(path);
		let output = target.clone();
		let rows = tokio::task::spawn_blocking(move || -> ServiceResult<usize> {
			let records = gridseek_sheets::normalize(&source, kind, &csv_sheet)?;

			gridseek_sheets::write_jsonl(&records, &output)?;

			Ok(records.len())
		})
		.await
		.map_err(|err| ServiceError::Internal { message: err.to_string() })??;

		tracing::info!(file = %name, ?kind, rows, "Spreadsheet normalized.");

		Ok(target)
	}

	async fn run_search(&self, query: &str, lines: &[String]) -> ServiceResult<SearchResponse> {
		let query = validate_query(query)?;
		let plan = ChunkPlan::new(lines, &ChunkingConfig { max_lines: self.cfg.search.chunk_lines });
		let policy = self.retry_policy();
		let failure_policy =
			self.cfg.search.failure_policy().unwrap_or(ChunkFailurePolicy::Skip);
		let model = self.cfg.providers.llm.model.as_str();

		tracing::info!(
			query_chars = query.len(),
			lines = lines.len(),
			chunks = plan.len(),
			"Search started."
		);

		if plan.is_empty() {
			tracing::info!("Record stream is empty; nothing to score.");

			return Ok(SearchResponse::new(Vec::new()));
		}

		let expanded = expand_query(self.llm.as_ref(), model, query, &policy).await?;
		let mut per_chunk = Vec::with_capacity(plan.len());
		let mut skipped = 0_usize;

		for chunk in plan.iter() {
			match score_chunk(self.llm.as_ref(), model, query, &expanded, &chunk, &policy).await {
				Ok(items) => per_chunk.push(items),
				Err(err) => match failure_policy {
					ChunkFailurePolicy::Skip => {
						tracing::warn!(
							chunk_index = chunk.chunk_index,
							error = %err,
							"Skipping chunk after validation failure."
						);

						skipped += 1;

						per_chunk.push(Vec::new());
					},
					ChunkFailurePolicy::Abort =>
						return Err(ServiceError::ChunkAborted {
							chunk_index: chunk.chunk_index,
							source: Box::new(err),
						}),
				},
			}
		}

		let results = rank_results(per_chunk);

		tracing::info!(results = results.len(), skipped_chunks = skipped, "Search finished.");

		Ok(SearchResponse::new(results))
	}
}

/// Location of the JSONL artifact for a spreadsheet: the file name with `.jsonl` appended.
pub fn jsonl_path_for(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();

	name.push(".jsonl");

	path.with_file_name(name)
}

fn validate_query(query: &str) -> ServiceResult<&str> {
	let trimmed = query.trim();

	if trimmed.is_empty() {
		return Err(ServiceError::InvalidRequest { message: "query must be non-empty.".to_string() });
	}

	Ok(trimmed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn jsonl_artifact_sits_next_to_the_upload() {
		assert_eq!(
			jsonl_path_for(Path::new("uploads/model.xlsx")),
			PathBuf::from("uploads/model.xlsx.jsonl")
		);
	}

	#[test]
	fn blank_queries_are_rejected() {
		assert!(matches!(validate_query(" \n"), Err(ServiceError::InvalidRequest { .. })));
		assert_eq!(validate_query("  margin ").ok(), Some("margin"));
	}

	#[test]
	fn response_size_matches_results() {
		let response = SearchResponse::new(Vec::new());

		assert_eq!(
			serde_json::to_value(&response).expect("serialize failed"),
			serde_json::json!({ "size": 0, "results": [] })
		);
	}
}
