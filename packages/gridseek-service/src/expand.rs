use gridseek_providers::LlmProvider;

use crate::{
	ServiceResult,
	schema::ExpandedQuery,
	validate::{self, RetryPolicy},
};

pub const EXPANSION_CONTEXT: &str = "query expansion";

pub fn build_expansion_prompt(query: &str) -> String {
	format!(
		"You are a semantic search engine for spreadsheets.\n\
Expand the following query into structured details.\n\n\
Input query: \"{query}\"\n\n\
Return ONLY valid JSON in this format, with no commentary:\n\
{{\n\
  \"expanded_query\": \"expanded query in natural language\",\n\
  \"concepts\": [\"concept1\", \"concept2\"],\n\
  \"metrics\": [\"metric1\", \"metric2\"],\n\
  \"formulas\": [\"formula1\", \"formula2\"]\n\
}}\n"
	)
}

/// Expands the raw query once per search. Failure here fails the whole request.
pub async fn expand_query(
	llm: &dyn LlmProvider,
	model: &str,
	query: &str,
	policy: &RetryPolicy,
) -> ServiceResult<ExpandedQuery> {
	let prompt = build_expansion_prompt(query);
	let expanded: ExpandedQuery =
		validate::generate_validated(llm, model, &prompt, policy, EXPANSION_CONTEXT).await?;

	tracing::info!(
		concepts = expanded.concepts.len(),
		metrics = expanded.metrics.len(),
		formulas = expanded.formulas.len(),
		"Query expanded."
	);

	Ok(expanded)
}
