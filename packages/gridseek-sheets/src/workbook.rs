use std::{collections::HashMap, path::Path};

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::{
	Error, Result,
	dates::excel_serial_to_iso,
	record::{CellValue, RawCell, RowRecord, SheetAssembler},
};

/// Normalizes every sheet of an Excel-family workbook (xlsx, xlsm, xlsb, xls, ods), in
/// workbook order.
///
/// The workbook is read completely before anything is returned; a sheet that fails to read
/// fails the whole file.
pub fn normalize_workbook(path: &Path) -> Result<Vec<RowRecord>> {
	let mut workbook = open_workbook_auto(path)
		.map_err(|err| Error::Workbook { path: path.to_path_buf(), source: err })?;
	let sheet_names = workbook.sheet_names().to_vec();

	if sheet_names.is_empty() {
		return Err(Error::EmptyWorkbook { path: path.to_path_buf() });
	}

	let mut records = Vec::new();

	for sheet in sheet_names {
		let values = workbook.worksheet_range(&sheet).map_err(|err| Error::Sheet {
			path: path.to_path_buf(),
			sheet: sheet.clone(),
			source: err,
		})?;
		let formulas = match workbook.worksheet_formula(&sheet) {
			Ok(range) => formula_map(&range),
			Err(err) => {
				tracing::warn!(sheet = %sheet, error = %err, "Formula range unavailable; keeping values only.");

				HashMap::new()
			},
		};
		let sheet_records = normalize_sheet(&sheet, &values, &formulas);

		tracing::debug!(sheet = %sheet, rows = sheet_records.len(), "Normalized sheet.");

		records.extend(sheet_records);
	}

	Ok(records)
}

fn normalize_sheet(
	sheet: &str,
	values: &Range<Data>,
	formulas: &HashMap<(u32, u32), String>,
) -> Vec<RowRecord> {
	let mut assembler = SheetAssembler::new(sheet);
	let Some(((first_row, first_col), (last_row, last_col))) = bounds(values, formulas) else {
		return assembler.finish();
	};

	for row in first_row..=last_row {
		let cells = (first_col..=last_col)
			.map(|col| RawCell {
				col,
				value: values.get_value((row, col)).map(cell_value).unwrap_or(CellValue::Null),
				formula: formulas.get(&(row, col)).cloned(),
			})
			.collect();

		assembler.push_row(row + 1, cells);
	}

	assembler.finish()
}

/// Union of the value range and the positions holding formulas, in absolute coordinates.
fn bounds(
	values: &Range<Data>,
	formulas: &HashMap<(u32, u32), String>,
) -> Option<((u32, u32), (u32, u32))> {
	let mut corners: Vec<(u32, u32)> = formulas.keys().copied().collect();

	if let (Some(start), Some(end)) = (values.start(), values.end()) {
		corners.push(start);
		corners.push(end);
	}

	let first_row = corners.iter().map(|(row, _)| *row).min()?;
	let last_row = corners.iter().map(|(row, _)| *row).max()?;
	let first_col = corners.iter().map(|(_, col)| *col).min()?;
	let last_col = corners.iter().map(|(_, col)| *col).max()?;

	Some(((first_row, first_col), (last_row, last_col)))
}

fn formula_map(range: &Range<String>) -> HashMap<(u32, u32), String> {
	let mut out = HashMap::new();
	let Some((start_row, start_col)) = range.start() else {
		return out;
	};

	for (row_idx, row) in range.rows().enumerate() {
		for (col_idx, formula) in row.iter().enumerate() {
			let formula = formula.trim();

			if formula.is_empty() {
				continue;
			}

			let text =
				if formula.starts_with('=') { formula.to_string() } else { format!("={formula}") };

			out.insert((start_row + row_idx as u32, start_col + col_idx as u32), text);
		}
	}

	out
}

fn cell_value(data: &Data) -> CellValue {
	match data {
		Data::Empty => CellValue::Null,
		Data::String(value) =>
			if value.trim().is_empty() {
				CellValue::Null
			} else {
				CellValue::Text(value.clone())
			},
		Data::Int(value) => CellValue::Int(*value),
		Data::Float(value) => float_value(*value),
		Data::Bool(value) => CellValue::Bool(*value),
		Data::DateTime(value) => {
			let serial = value.as_f64();

			excel_serial_to_iso(serial).map(CellValue::Text).unwrap_or_else(|| float_value(serial))
		},
		Data::DateTimeIso(value) | Data::DurationIso(value) => CellValue::Text(value.clone()),
		Data::Error(err) => CellValue::Text(err.to_string()),
	}
}

/// Whole floats come back as integers so `3.0` and `3` serialize the same way.
fn float_value(value: f64) -> CellValue {
	if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
		CellValue::Int(value as i64)
	} else {
		CellValue::Float(value)
	}
}
