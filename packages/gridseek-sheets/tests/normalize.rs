use std::{fs, thread};

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

use gridseek_sheets::{CellValue, Error, RowRecord, SpreadsheetKind};

fn cell_refs(record: &RowRecord) -> Vec<&str> {
	record.cells.iter().map(|cell| cell.cell.as_str()).collect()
}

#[test]
fn three_row_csv_normalizes_to_three_records() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("numbers.csv");

	fs::write(&path, "A,B\n1,2\n3,4\n5,6\n").expect("Failed to write CSV.");

	let records = gridseek_sheets::normalize(&path, SpreadsheetKind::Csv, "Sheet1")
		.expect("Failed to normalize CSV.");

	assert_eq!(records.len(), 3);
	assert_eq!(cell_refs(&records[0]), vec!["A2", "B2"]);
	assert_eq!(cell_refs(&records[1]), vec!["A3", "B3"]);
	assert_eq!(cell_refs(&records[2]), vec!["A4", "B4"]);
	assert_eq!(records[0].sheet, "Sheet1");
	assert_eq!(records[0].row, 2);
	assert_eq!(records[2].cells[1].header.as_deref(), Some("B"));
	assert_eq!(records[2].cells[1].value, CellValue::Int(6));
	assert!(records.iter().flat_map(|record| &record.cells).all(|cell| cell.formula.is_none()));
}

#[test]
fn csv_without_non_empty_rows_yields_nothing() {
	let records =
		gridseek_sheets::normalize_csv_str(",,\n\n , \n", "Sheet1").expect("Failed to parse CSV.");

	assert!(records.is_empty());
}

#[test]
fn csv_dates_are_iso_normalized() {
	let records = gridseek_sheets::normalize_csv_str(
		"Period,Revenue\n2024/01/31,100\n2024-02-29 08:15,120\n",
		"Sheet1",
	)
	.expect("Failed to parse CSV.");

	assert_eq!(records[0].cells[0].value, CellValue::Text("2024-01-31".to_string()));
	assert_eq!(records[1].cells[0].value, CellValue::Text("2024-02-29T08:15:00".to_string()));
}

#[test]
fn workbook_sheets_are_normalized_in_order() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("model.xlsx");
	let mut workbook = Workbook::new();
	let date_format = Format::new().set_num_format("yyyy-mm-dd");
	let date = ExcelDateTime::from_ymd(2024, 1, 15).expect("Invalid date.");
	let dashboard = workbook.add_worksheet();

	dashboard.set_name("Dashboard").expect("Failed to name sheet.");
	dashboard.write_string(0, 0, "Metric").expect("write failed");
	dashboard.write_string(0, 1, "Value").expect("write failed");
	dashboard.write_string(0, 2, "As of").expect("write failed");
	dashboard.write_string(1, 0, "Revenue").expect("write failed");
	dashboard.write_number(1, 1, 1200.0).expect("write failed");
	dashboard.write_datetime_with_format(1, 2, &date, &date_format).expect("write failed");
	dashboard.write_string(2, 0, "Gross profit").expect("write failed");
	dashboard.write_formula(2, 1, "=B2*0.6").expect("write failed");

	let notes = workbook.add_worksheet();

	notes.set_name("Notes").expect("Failed to name sheet.");
	notes.write_string(2, 1, "Comment").expect("write failed");
	notes.write_string(3, 1, "Assumes flat churn").expect("write failed");

	workbook.add_worksheet().set_name("Empty").expect("Failed to name sheet.");
	workbook.save(&path).expect("Failed to save workbook.");

	let records = gridseek_sheets::normalize_path(&path, "Sheet1")
		.expect("Failed to normalize workbook.");

	assert_eq!(records.len(), 3);

	assert_eq!(records[0].sheet, "Dashboard");
	assert_eq!(records[0].row, 2);
	assert_eq!(cell_refs(&records[0]), vec!["A2", "B2", "C2"]);
	assert_eq!(records[0].cells[1].value, CellValue::Int(1200));
	assert_eq!(records[0].cells[2].value, CellValue::Text("2024-01-15".to_string()));
	assert_eq!(records[0].cells[2].header.as_deref(), Some("As of"));

	assert_eq!(records[1].cells[1].cell, "B3");
	assert_eq!(records[1].cells[1].formula.as_deref(), Some("=B2*0.6"));
	assert_eq!(records[1].cells[1].header.as_deref(), Some("Value"));

	assert_eq!(records[2].sheet, "Notes");
	assert_eq!(records[2].row, 4);
	assert_eq!(cell_refs(&records[2]), vec!["B4"]);
	assert_eq!(records[2].cells[0].header.as_deref(), Some("Comment"));
}

#[test]
fn corrupt_workbook_fails_fast() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("broken.xlsx");

	fs::write(&path, b"definitely not a zip archive").expect("Failed to write file.");

	let err = gridseek_sheets::normalize_path(&path, "Sheet1").expect_err("Expected failure.");

	assert!(matches!(err, Error::Workbook { .. }), "Unexpected error: {err}");
}

#[test]
fn unsupported_extension_is_rejected() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("notes.txt");

	fs::write(&path, "A,B\n1,2\n").expect("Failed to write file.");

	let err = gridseek_sheets::normalize_path(&path, "Sheet1").expect_err("Expected failure.");

	assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn jsonl_artifact_matches_the_row_schema() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("numbers.csv.jsonl");
	let records =
		gridseek_sheets::normalize_csv_str("A,B\n1,\n", "Sheet1").expect("Failed to parse CSV.");

	gridseek_sheets::write_jsonl(&records, &path).expect("Failed to write JSONL.");

	let lines = gridseek_sheets::read_jsonl_lines(&path).expect("Failed to read JSONL.");

	assert_eq!(lines.len(), 1);
	assert_eq!(fs::read_dir(dir.path()).expect("Failed to list dir.").count(), 1);

	let parsed: serde_json::Value = serde_json::from_str(&lines[0]).expect("Invalid JSON line.");

	assert_eq!(
		parsed,
		serde_json::json!({
			"sheet": "Sheet1",
			"row": 2,
			"cells": [
				{ "cell": "A2", "header": "A", "value": 1, "formula": null },
				{ "cell": "B2", "header": "B", "value": null, "formula": null }
			]
		})
	);
	assert_eq!(gridseek_sheets::to_lines(&records).expect("serialize failed"), lines);
}

#[test]
fn concurrent_writers_of_one_artifact_all_succeed() {
	let dir = TempDir::new().expect("Failed to create temp dir.");
	let path = dir.path().join("same.csv.jsonl");
	let records = gridseek_sheets::normalize_csv_str("A,B\n1,2\n3,4\n", "Sheet1")
		.expect("Failed to parse CSV.");

	thread::scope(|scope| {
		let (records, path) = (&records, &path);
		let handles: Vec<_> = (0..4)
			.map(|_| {
				scope.spawn(move || {
					(0..30)
						.filter(|_| gridseek_sheets::write_jsonl(records, path).is_err())
						.count()
				})
			})
			.collect();
		let failures: usize =
			handles.into_iter().map(|handle| handle.join().expect("Writer panicked.")).sum();

		assert_eq!(failures, 0);
	});

	let lines = gridseek_sheets::read_jsonl_lines(&path).expect("Failed to read JSONL.");
	let leftovers: Vec<_> = fs::read_dir(dir.path())
		.expect("Failed to list dir.")
		.map(|entry| entry.expect("Bad dir entry.").file_name())
		.collect();

	assert_eq!(lines, gridseek_sheets::to_lines(&records).expect("serialize failed"));
	assert_eq!(leftovers, vec![std::ffi::OsString::from("same.csv.jsonl")]);
}
