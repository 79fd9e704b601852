use std::{
	fs,
	io::{BufWriter, Write},
	path::Path,
};

use tempfile::NamedTempFile;

use crate::{Error, Result, record::RowRecord};

/// Serializes records into the line-delimited hand-off format, one row object per line.
pub fn to_lines(records: &[RowRecord]) -> Result<Vec<String>> {
	records.iter().map(|record| serde_json::to_string(record).map_err(Error::from)).collect()
}

/// Writes records as JSONL. The file is staged under a unique temporary name next to `path`
/// and renamed into place, so a reader never observes a partially written artifact and
/// concurrent writers of the same target never share a staging file.
pub fn write_jsonl(records: &[RowRecord], path: &Path) -> Result<()> {
	let dir = staging_dir(path);
	let io_err = |err| Error::Io { path: path.to_path_buf(), source: err };
	let staged = NamedTempFile::new_in(dir).map_err(io_err)?;
	let mut writer = BufWriter::new(staged);

	for record in records {
		serde_json::to_writer(&mut writer, record)?;
		writer.write_all(b"\n").map_err(io_err)?;
	}

	let staged = writer.into_inner().map_err(|err| io_err(err.into_error()))?;

	staged.persist(path).map_err(|err| io_err(err.error))?;

	Ok(())
}

/// Non-blank lines of a JSONL artifact, in file order.
pub fn read_jsonl_lines(path: &Path) -> Result<Vec<String>> {
	let raw =
		fs::read_to_string(path).map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;

	Ok(raw.lines().filter(|line| !line.trim().is_empty()).map(str::to_string).collect())
}

fn staging_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	}
}
