// crates.io
use clap::Parser;
// self
use gridseek::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	gridseek::run(args).await
}
