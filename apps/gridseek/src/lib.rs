use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;

use gridseek_service::{SearchService, search::jsonl_path_for};
use gridseek_sheets::SpreadsheetKind;

#[derive(Debug, Parser)]
#[command(
	version = gridseek_cli::VERSION,
	rename_all = "kebab",
	styles = gridseek_cli::styles(),
)]
pub struct Args {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Convert a spreadsheet into the JSONL record stream the search pipeline reads.
	Normalize {
		#[arg(long, short = 'i', value_name = "FILE")]
		input: PathBuf,
		/// Defaults to the input path with `.jsonl` appended.
		#[arg(long, short = 'o', value_name = "FILE")]
		output: Option<PathBuf>,
		#[arg(long, value_name = "NAME", default_value = "Sheet1")]
		sheet_name: String,
	},
	/// Run one natural-language search against a spreadsheet or an existing JSONL stream.
	Search {
		#[arg(long, short = 'c', value_name = "FILE")]
		config: PathBuf,
		#[arg(long, short = 'f', value_name = "FILE")]
		file: PathBuf,
		#[arg(long, short = 'q', value_name = "TEXT")]
		query: String,
	},
}

#[derive(Debug, Serialize)]
struct NormalizeOutput {
	input: String,
	output: String,
	rows: usize,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	match args.command {
		Command::Normalize { input, output, sheet_name } => {
			let _guard = gridseek_cli::init_tracing("info", None, "gridseek")?;
			let output = output.unwrap_or_else(|| jsonl_path_for(&input));
			let report = normalize(&input, &output, &sheet_name)?;
			let json = serde_json::to_string_pretty(&report)?;

			println!("{json}");
		},
		Command::Search { config, file, query } => {
			let config = gridseek_config::load(&config)?;
			let _guard = gridseek_cli::init_tracing(
				&config.service.log_level,
				config.service.log_dir.as_deref(),
				"gridseek",
			)?;

			let service = SearchService::new(config)?;
			let response = if is_jsonl(&file) {
				service.search_jsonl(&query, &file).await?
			} else {
				service.search_file(&query, &file).await?
			};
			let json = serde_json::to_string_pretty(&response)?;

			println!("{json}");
		},
	}

	Ok(())
}

fn normalize(input: &Path, output: &Path, sheet_name: &str) -> color_eyre::Result<NormalizeOutput> {
	let name = input.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
	let Some(kind) = SpreadsheetKind::from_file_name(&name) else {
		return Err(eyre::eyre!("Unsupported file type: {name}."));
	};
	let records = gridseek_sheets::normalize(input, kind, sheet_name)?;

	gridseek_sheets::write_jsonl(&records, output)?;

	tracing::info!(input = %input.display(), output = %output.display(), rows = records.len(), "Normalized.");

	Ok(NormalizeOutput {
		input: input.display().to_string(),
		output: output.display().to_string(),
		rows: records.len(),
	})
}

fn is_jsonl(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::TempDir;

	use super::*;

	#[test]
	fn search_requires_config_file_and_query() {
		assert!(Args::try_parse_from(["gridseek", "search", "--file", "a.csv"]).is_err());

		let args = Args::try_parse_from([
			"gridseek", "search", "-c", "gridseek.toml", "-f", "model.xlsx", "-q", "gross margin",
		])
		.expect("Failed to parse args.");

		match args.command {
			Command::Search { config, file, query } => {
				assert_eq!(config, PathBuf::from("gridseek.toml"));
				assert_eq!(file, PathBuf::from("model.xlsx"));
				assert_eq!(query, "gross margin");
			},
			other => panic!("Unexpected command: {other:?}"),
		}
	}

	#[test]
	fn normalize_defaults_sheet_name_and_output() {
		let args = Args::try_parse_from(["gridseek", "normalize", "--input", "data.csv"])
			.expect("Failed to parse args.");

		match args.command {
			Command::Normalize { output, sheet_name, .. } => {
				assert_eq!(output, None);
				assert_eq!(sheet_name, "Sheet1");
			},
			other => panic!("Unexpected command: {other:?}"),
		}
	}

	#[test]
	fn normalize_writes_one_line_per_row() {
		let dir = TempDir::new().expect("Failed to create temp dir.");
		let input = dir.path().join("data.csv");
		let output = dir.path().join("out.jsonl");

		fs::write(&input, "Name,Amount\nalpha,1\nbeta,2\n").expect("Failed to write CSV.");

		let report = normalize(&input, &output, "Ledger").expect("Normalize failed.");
		let lines = gridseek_sheets::read_jsonl_lines(&output).expect("Failed to read JSONL.");

		assert_eq!(report.rows, 2);
		assert_eq!(lines.len(), 2);
		assert!(lines[0].contains("\"sheet\":\"Ledger\""));
	}

	#[test]
	fn normalize_rejects_unknown_extensions() {
		let dir = TempDir::new().expect("Failed to create temp dir.");
		let input = dir.path().join("data.txt");

		fs::write(&input, "a,b\n").expect("Failed to write file.");

		assert!(normalize(&input, &dir.path().join("out.jsonl"), "Sheet1").is_err());
	}

	#[test]
	fn jsonl_inputs_skip_normalization() {
		assert!(is_jsonl(Path::new("cache/model.xlsx.JSONL")));
		assert!(!is_jsonl(Path::new("model.xlsx")));
	}
}
