use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A scalar cell value as it appears in the hand-off artifact.
///
/// Dates never appear as their own variant: both readers normalize them to ISO-8601 text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}
impl CellValue {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// Text used when this value sits in the header row.
	pub fn header_text(&self) -> Option<String> {
		match self {
			Self::Null => None,
			Self::Bool(value) => Some(value.to_string()),
			Self::Int(value) => Some(value.to_string()),
			Self::Float(value) => Some(value.to_string()),
			Self::Text(value) => {
				let trimmed = value.trim();

				if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
			},
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
	pub cell: String,
	pub header: Option<String>,
	pub value: CellValue,
	pub formula: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
	pub sheet: String,
	pub row: u32,
	pub cells: Vec<CellRecord>,
}

/// Column letters for a zero-based column index: 0 is `A`, 25 is `Z`, 26 is `AA`.
pub fn column_letters(col: u32) -> String {
	let mut letters = Vec::new();
	let mut n = col as u64;

	loop {
		letters.push(b'A' + (n % 26) as u8);

		if n < 26 {
			break;
		}

		n = n / 26 - 1;
	}

	letters.reverse();

	String::from_utf8(letters).unwrap_or_default()
}

/// `B5`-style reference for a zero-based column and a one-based row.
pub fn cell_reference(col: u32, row: u32) -> String {
	format!("{}{row}", column_letters(col))
}

pub(crate) struct RawCell {
	pub(crate) col: u32,
	pub(crate) value: CellValue,
	pub(crate) formula: Option<String>,
}
impl RawCell {
	fn is_blank(&self) -> bool {
		self.value.is_null() && self.formula.is_none()
	}
}

/// Turns one sheet's rows into records: discovers the header row, then tags every later
/// non-empty row with its headers.
pub(crate) struct SheetAssembler {
	sheet: String,
	headers: Option<HashMap<u32, String>>,
	records: Vec<RowRecord>,
}
impl SheetAssembler {
	pub(crate) fn new(sheet: impl Into<String>) -> Self {
		Self { sheet: sheet.into(), headers: None, records: Vec::new() }
	}

	/// `row` is the one-based spreadsheet row number. A row with any content keeps every cell
	/// it was given, blank ones included, so column positions survive into the record.
	pub(crate) fn push_row(&mut self, row: u32, cells: Vec<RawCell>) {
		if cells.iter().all(RawCell::is_blank) {
			return;
		}

		let Some(headers) = self.headers.as_ref() else {
			self.headers = Some(
				cells
					.iter()
					.filter_map(|cell| cell.value.header_text().map(|text| (cell.col, text)))
					.collect(),
			);

			return;
		};
		let cells = cells
			.into_iter()
			.map(|cell| CellRecord {
				cell: cell_reference(cell.col, row),
				header: headers.get(&cell.col).cloned(),
				value: cell.value,
				formula: cell.formula,
			})
			.collect();

		self.records.push(RowRecord { sheet: self.sheet.clone(), row, cells });
	}

	pub(crate) fn finish(self) -> Vec<RowRecord> {
		if self.headers.is_none() {
			tracing::debug!(sheet = %self.sheet, "Sheet has no non-empty row; skipping.");
		}

		self.records
	}
}
