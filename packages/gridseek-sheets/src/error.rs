use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("I/O failure on {path:?}: {source}")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse CSV {path:?}: {source}")]
	Csv { path: PathBuf, source: csv::Error },
	#[error("Failed to open workbook {path:?}: {source}")]
	Workbook { path: PathBuf, source: calamine::Error },
	#[error("Failed to read sheet {sheet:?} in {path:?}: {source}")]
	Sheet { path: PathBuf, sheet: String, source: calamine::Error },
	#[error("Workbook {path:?} contains no sheets.")]
	EmptyWorkbook { path: PathBuf },
	#[error("Unsupported file type: {name}.")]
	Unsupported { name: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
