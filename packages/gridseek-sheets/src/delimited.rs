use std::{fs, path::Path};

use crate::{
	Error, Result,
	dates::parse_text_date,
	record::{CellValue, RawCell, RowRecord, SheetAssembler},
};

/// Normalizes a CSV file. CSV carries no sheet names, so every record is tagged with `sheet`.
pub fn normalize_csv(path: &Path, sheet: &str) -> Result<Vec<RowRecord>> {
	let bytes = fs::read(path).map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;
	let content = decode(bytes);

	normalize_csv_str(&content, sheet)
		.map_err(|err| Error::Csv { path: path.to_path_buf(), source: err })
}

pub fn normalize_csv_str(content: &str, sheet: &str) -> Result<Vec<RowRecord>, csv::Error> {
	let content = content.strip_prefix('\u{feff}').unwrap_or(content);
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(false)
		.flexible(true)
		.from_reader(content.as_bytes());
	let mut assembler = SheetAssembler::new(sheet);
	let mut rows = RowCounter::default();

	for result in reader.records() {
		let record = result?;
		let Some(line) = record.position().map(|pos| pos.line()) else {
			continue;
		};
		let row = rows.next(line, &record);
		let cells = record
			.iter()
			.enumerate()
			.map(|(col, field)| RawCell { col: col as u32, value: type_field(field), formula: None })
			.collect();

		assembler.push_row(row, cells);
	}

	let records = assembler.finish();

	tracing::debug!(sheet, rows = records.len(), "Normalized CSV.");

	Ok(records)
}

/// Maps records to spreadsheet rows. The reader reports physical lines, which run ahead of
/// rows once a quoted field spans several lines; blank lines the reader skips still count as
/// (empty) rows.
#[derive(Default)]
struct RowCounter {
	last: Option<(u64, u64)>,
	embedded_newlines: u64,
}
impl RowCounter {
	fn next(&mut self, line: u64, record: &csv::StringRecord) -> u32 {
		let row = match self.last {
			Some((last_line, last_row)) =>
				last_row + line.saturating_sub(last_line).saturating_sub(self.embedded_newlines),
			None => line,
		};

		self.last = Some((line, row));
		self.embedded_newlines =
			record.iter().map(|field| field.bytes().filter(|byte| *byte == b'\n').count() as u64).sum();

		u32::try_from(row).unwrap_or(u32::MAX)
	}
}

/// UTF-8 first, then Windows-1252, which is what Excel writes for "CSV (Comma delimited)".
fn decode(bytes: Vec<u8>) -> String {
	match String::from_utf8(bytes) {
		Ok(content) => content,
		Err(err) => {
			let bytes = err.into_bytes();
			let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);

			decoded.into_owned()
		},
	}
}

fn type_field(raw: &str) -> CellValue {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return CellValue::Null;
	}
	if let Ok(value) = trimmed.parse::<i64>() {
		return CellValue::Int(value);
	}
	if let Ok(value) = trimmed.parse::<f64>()
		&& value.is_finite()
	{
		return CellValue::Float(value);
	}
	if trimmed.eq_ignore_ascii_case("true") {
		return CellValue::Bool(true);
	}
	if trimmed.eq_ignore_ascii_case("false") {
		return CellValue::Bool(false);
	}
	if let Some(iso) = parse_text_date(trimmed) {
		return CellValue::Text(iso);
	}

	CellValue::Text(trimmed.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fields_are_typed() {
		assert_eq!(type_field(""), CellValue::Null);
		assert_eq!(type_field(" 42 "), CellValue::Int(42));
		assert_eq!(type_field("0.25"), CellValue::Float(0.25));
		assert_eq!(type_field("TRUE"), CellValue::Bool(true));
		assert_eq!(type_field("2024/01/31"), CellValue::Text("2024-01-31".to_string()));
		assert_eq!(type_field("NaN"), CellValue::Text("NaN".to_string()));
		assert_eq!(type_field("Gross margin"), CellValue::Text("Gross margin".to_string()));
	}

	#[test]
	fn windows_1252_bytes_are_decoded() {
		let decoded = decode(vec![b'c', b'a', b'f', 0xE9]);

		assert_eq!(decoded, "café");
	}

	#[test]
	fn leading_blank_lines_do_not_shift_row_numbers() {
		let records = normalize_csv_str(",\nName,Total\nNorth,10\n", "Sheet1").expect("parse failed");

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].row, 3);
		assert_eq!(records[0].cells[0].cell, "A3");
		assert_eq!(records[0].cells[1].header.as_deref(), Some("Total"));
	}

	#[test]
	fn multi_line_quoted_fields_stay_on_one_row() {
		let records = normalize_csv_str("Name,Note\na,\"line1\nline2\"\nb,x\n\nc,\"p\nq\nr\"\nd,y\n", "Sheet1")
			.expect("parse failed");
		let rows: Vec<(u32, &str)> =
			records.iter().map(|record| (record.row, record.cells[0].cell.as_str())).collect();

		assert_eq!(rows, vec![(2, "A2"), (3, "A3"), (5, "A5"), (6, "A6")]);
		assert_eq!(records[0].cells[1].value, CellValue::Text("line1\nline2".to_string()));
	}
}
