use gridseek_chunking::Chunk;
use gridseek_providers::LlmProvider;

use crate::{
	ServiceResult,
	schema::{ExpandedQuery, ResultItem},
	validate::{self, RetryPolicy},
};

const RESULT_EXAMPLE: &str = r#"[
  {
    "concept_name": "Gross Margin (Year 1)",
    "location": "Dashboard Sheet, Cell B5 (Key Metrics section)",
    "value_formula": "0.6",
    "formula": "=B4/B3",
    "relevance": 0.95,
    "explanation": "This cell presents the calculated Gross Margin for Year 1, the profitability metric the query asks about.",
    "business_context": "Gross Margin shows profitability after cost of goods sold; 60% indicates a healthy core business.",
    "cell_location": "B5",
    "sheet_name": "Dashboard",
    "formula_type": "Calculated Metric"
  }
]"#;

pub fn scoring_context(chunk_index: usize) -> String {
	format!("chunk {chunk_index} scoring")
}

pub fn build_scoring_prompt(query: &str, expanded: &ExpandedQuery, chunk: &Chunk<'_>) -> String {
	let concepts = list_text(&expanded.concepts);
	let metrics = list_text(&expanded.metrics);
	let formulas = list_text(&expanded.formulas);
	let content = chunk.text();

	format!(
		"You are a semantic search engine. You are given a query and a chunk of spreadsheet rows.\n\
Find the cells in the chunk that are most relevant to the query.\n\n\
The request is: {query}\n\
Expanded intent of query: {expanded_query}\n\
Related concepts to the query: {concepts}\n\
Metrics related to query: {metrics}\n\
Formulas related (if found in the data): {formulas}\n\n\
Return the most relevant results with meaningful context, not just cell references.\n\n\
Ranking factors:\n\
- Semantic relevance: how closely does the content match the concept?\n\
- Business importance: is this a key metric or a supporting calculation?\n\
- Formula sophistication: more sophisticated calculations may be more relevant.\n\
- Data recency: recent data may matter more than historical data.\n\n\
Relevance scale:\n\
The spreadsheet is sent in chunks across separate requests and every result from every chunk\n\
is sorted together by relevance, so scores must be comparable across chunks. Use this\n\
absolute scale and do not rescale relative to this chunk alone:\n\
- 0.9-1.0: the cell directly answers the query.\n\
- 0.6-0.9: the cell is a closely related metric or an input to the answer.\n\
- 0.3-0.6: the cell provides supporting context.\n\
- below 0.3: tangential; omit unless nothing better exists.\n\
If nothing in the chunk is relevant, return an empty list: []\n\n\
Each row below is one JSON object with the sheet name, the row number, and its cells\n\
(cell reference, column header, value, formula).\n\
Document chunk {chunk_index} (rows {first}-{last} of the stream):\n\
{content}\n\n\
Respond with ONLY a JSON list of objects with these fields:\n\
- concept_name: string, the business concept this represents\n\
- location: string, where it is found in human-readable form\n\
- value_formula: string or null, the current value and/or underlying calculation\n\
- formula: string or null, the cell formula if any\n\
- relevance: number between 0.0 and 1.0 on the scale above\n\
- explanation: string, why this matches the query\n\
- business_context: string, the role this plays in the spreadsheet\n\
- cell_location: string, the cell reference such as B5\n\
- sheet_name: string\n\
- formula_type: string\n\n\
Example:\n\
{example}\n",
		expanded_query = expanded.expanded_query,
		chunk_index = chunk.chunk_index,
		first = chunk.start_line + 1,
		last = chunk.end_line(),
		example = RESULT_EXAMPLE,
	)
}

/// Scores one chunk. An `Err` means the chunk never produced a valid response; whether that
/// fails the request is the caller's decision.
pub async fn score_chunk(
	llm: &dyn LlmProvider,
	model: &str,
	query: &str,
	expanded: &ExpandedQuery,
	chunk: &Chunk<'_>,
	policy: &RetryPolicy,
) -> ServiceResult<Vec<ResultItem>> {
	let prompt = build_scoring_prompt(query, expanded, chunk);
	let context = scoring_context(chunk.chunk_index);
	let items: Vec<ResultItem> =
		validate::generate_validated(llm, model, &prompt, policy, &context).await?;

	tracing::info!(chunk_index = chunk.chunk_index, items = items.len(), "Chunk scored.");

	Ok(items)
}

fn list_text(values: &[String]) -> String {
	serde_json::to_string(values).unwrap_or_else(|_| values.join(", "))
}
