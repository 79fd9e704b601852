//! Spreadsheet normalization: CSV and Excel files become an ordered stream of row records,
//! each cell tagged with its reference, header, value, and formula.

pub mod dates;
pub mod delimited;
pub mod jsonl;
pub mod record;
pub mod workbook;

mod error;

pub use delimited::{normalize_csv, normalize_csv_str};
pub use error::{Error, Result};
pub use jsonl::{read_jsonl_lines, to_lines, write_jsonl};
pub use record::{CellRecord, CellValue, RowRecord, cell_reference, column_letters};
pub use workbook::normalize_workbook;

use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpreadsheetKind {
	Csv,
	Excel,
}
impl SpreadsheetKind {
	/// Picks the reader from a file name's extension, case-insensitively.
	pub fn from_file_name(name: &str) -> Option<Self> {
		let (_, ext) = name.rsplit_once('.')?;

		match ext.to_ascii_lowercase().as_str() {
			"csv" => Some(Self::Csv),
			"xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
			_ => None,
		}
	}
}

/// Normalizes `path` with the reader for `kind`. `csv_sheet` names the single sheet of a CSV.
pub fn normalize(path: &Path, kind: SpreadsheetKind, csv_sheet: &str) -> Result<Vec<RowRecord>> {
	match kind {
		SpreadsheetKind::Csv => normalize_csv(path, csv_sheet),
		SpreadsheetKind::Excel => normalize_workbook(path),
	}
}

/// Normalizes `path`, choosing the reader from its extension.
pub fn normalize_path(path: &Path, csv_sheet: &str) -> Result<Vec<RowRecord>> {
	let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
	let kind = SpreadsheetKind::from_file_name(&name).ok_or(Error::Unsupported { name })?;

	normalize(path, kind, csv_sheet)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extensions_select_the_reader() {
		assert_eq!(SpreadsheetKind::from_file_name("report.CSV"), Some(SpreadsheetKind::Csv));
		assert_eq!(SpreadsheetKind::from_file_name("model.xlsx"), Some(SpreadsheetKind::Excel));
		assert_eq!(SpreadsheetKind::from_file_name("legacy.xls"), Some(SpreadsheetKind::Excel));
		assert_eq!(SpreadsheetKind::from_file_name("notes.txt"), None);
		assert_eq!(SpreadsheetKind::from_file_name("xlsx"), None);
	}
}
