use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = memvec_api::Args::parse();

	memvec_api::run(args).await
}
