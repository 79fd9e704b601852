//! Pieces shared by the gridseek binaries: version string, help styling, and logging setup.

use std::path::Path;

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
	EnvFilter, fmt,
	layer::SubscriberExt,
	util::{SubscriberInitExt, TryInitError},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

/// Parses a `log_level` directive, falling back to `info` when it does not parse.
pub fn log_filter(level: &str) -> EnvFilter {
	EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Console output goes to stderr so stdout stays free for
/// command output. With `log_dir`, records are also written to a daily-rolling
/// `<file_prefix>.log` there; keep the returned guard alive or buffered lines are lost.
pub fn init_tracing(
	level: &str,
	log_dir: Option<&Path>,
	file_prefix: &str,
) -> Result<Option<WorkerGuard>, TryInitError> {
	let (file_layer, guard) = match log_dir {
		Some(dir) => {
			let appender = tracing_appender::rolling::daily(dir, format!("{file_prefix}.log"));
			let (writer, guard) = tracing_appender::non_blocking(appender);

			(Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
		},
		None => (None, None),
	};

	tracing_subscriber::registry()
		.with(log_filter(level))
		.with(fmt::layer().with_writer(std::io::stderr))
		.with(file_layer)
		.try_init()?;

	Ok(guard)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn second_install_is_reported_not_fatal() {
		let dir = tempfile::tempdir().expect("Failed to create temp dir.");
		let first = init_tracing("info", Some(dir.path()), "gridseek-test");

		assert!(first.as_ref().is_ok_and(Option::is_some));
		assert!(init_tracing("info", None, "gridseek-test").is_err());
	}
}
