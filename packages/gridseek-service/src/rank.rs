use std::cmp::Ordering;

use crate::schema::ResultItem;

/// Sort key for an item; a missing relevance ranks as zero without being rewritten.
pub fn relevance_key(item: &ResultItem) -> f64 {
	item.relevance.unwrap_or(0.0)
}

/// Flattens per-chunk results in chunk order and sorts them by relevance, descending.
///
/// The sort is stable, so equal scores keep chunk order and then in-chunk order.
pub fn rank_results(per_chunk: Vec<Vec<ResultItem>>) -> Vec<ResultItem> {
	let mut results: Vec<ResultItem> = per_chunk.into_iter().flatten().collect();

	results.sort_by(|a, b| {
		relevance_key(b).partial_cmp(&relevance_key(a)).unwrap_or(Ordering::Equal)
	});

	results
}

#[cfg(test)]
mod tests {
	use super::*;

	fn item(name: &str, relevance: Option<f64>) -> ResultItem {
		ResultItem {
			concept_name: name.to_string(),
			location: format!("{name} location"),
			value_formula: None,
			formula: None,
			relevance,
			explanation: String::new(),
			business_context: String::new(),
			cell_location: "A1".to_string(),
			sheet_name: "Sheet1".to_string(),
			formula_type: "Value".to_string(),
		}
	}

	fn names(items: &[ResultItem]) -> Vec<&str> {
		items.iter().map(|item| item.concept_name.as_str()).collect()
	}

	#[test]
	fn merges_chunks_and_sorts_descending() {
		let ranked = rank_results(vec![
			vec![item("a", Some(0.4)), item("b", Some(0.9))],
			Vec::new(),
			vec![item("c", Some(0.7))],
		]);

		assert_eq!(names(&ranked), vec!["b", "c", "a"]);
	}

	#[test]
	fn ties_keep_chunk_then_item_order() {
		let ranked = rank_results(vec![
			vec![item("a", Some(0.5)), item("b", Some(0.5))],
			vec![item("c", Some(0.5)), item("d", Some(0.8))],
		]);

		assert_eq!(names(&ranked), vec!["d", "a", "b", "c"]);
	}

	#[test]
	fn null_relevance_ranks_as_zero_and_is_not_rewritten() {
		let ranked = rank_results(vec![vec![
			item("none", None),
			item("neg", Some(-0.1)),
			item("pos", Some(0.01)),
			item("zero", Some(0.0)),
		]]);

		assert_eq!(names(&ranked), vec!["pos", "none", "zero", "neg"]);
		assert_eq!(ranked[1].relevance, None);
	}

	#[test]
	fn sorting_is_idempotent() {
		let once = rank_results(vec![
			vec![item("a", Some(0.2)), item("b", None), item("c", Some(0.2))],
			vec![item("d", Some(0.6))],
		]);
		let twice = rank_results(vec![once.clone()]);

		assert_eq!(once, twice);
	}
}
