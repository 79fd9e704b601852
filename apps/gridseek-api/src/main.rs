use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = gridseek_api::Args::parse();

	gridseek_api::run(args).await
}
