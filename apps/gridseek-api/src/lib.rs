pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = gridseek_cli::VERSION,
	rename_all = "kebab",
	styles = gridseek_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = gridseek_config::load(&args.config)?;
	let _guard = gridseek_cli::init_tracing(
		&config.service.log_level,
		config.service.log_dir.as_deref(),
		"gridseek-api",
	)?;
	let http_addr: SocketAddr = config.service.http_bind.parse()?;

	tokio::fs::create_dir_all(&config.service.upload_dir).await?;

	let upload_dir = config.service.upload_dir.clone();
	let state = AppState::new(config)?;
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, upload_dir = %upload_dir.display(), "HTTP server listening.");

	axum::serve(listener, app).await?;

	Ok(())
}
