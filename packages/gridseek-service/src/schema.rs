use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A shape the model is asked to produce. Deserialization enforces field presence and types;
/// `check` adds the constraints serde cannot express.
pub trait ResponseSchema
where
	Self: DeserializeOwned,
{
	fn check(&self) -> Result<(), String> {
		Ok(())
	}
}

/// Structured restatement of the user's question, produced once per search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpandedQuery {
	pub expanded_query: String,
	pub concepts: Vec<String>,
	pub metrics: Vec<String>,
	pub formulas: Vec<String>,
}
// A blank `expanded_query` is accepted; only the shape is enforced.
impl ResponseSchema for ExpandedQuery {}

/// One spreadsheet location the model judged relevant to the query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
	pub concept_name: String,
	pub location: String,
	#[serde(default)]
	pub value_formula: Option<String>,
	#[serde(default)]
	pub formula: Option<String>,
	/// Global ranking key. Null is accepted and ranks as zero.
	#[serde(default)]
	pub relevance: Option<f64>,
	pub explanation: String,
	pub business_context: String,
	pub cell_location: String,
	pub sheet_name: String,
	pub formula_type: String,
}

impl ResponseSchema for Vec<ResultItem> {
	fn check(&self) -> Result<(), String> {
		for (idx, item) in self.iter().enumerate() {
			if let Some(relevance) = item.relevance
				&& !relevance.is_finite()
			{
				return Err(format!("Item {idx} has a non-finite relevance."));
			}
		}

		Ok(())
	}
}
