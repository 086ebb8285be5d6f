pub mod cli;
pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use memvec_config::Config;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(version = cli::VERSION, rename_all = "kebab", styles = cli::styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

/// Listen addresses for the public and admin routers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binds {
	pub http: SocketAddr,
	pub admin: SocketAddr,
}
impl Binds {
	/// Parses both binds. The admin router only ever listens on loopback.
	pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
		let http = config.service.http_bind.parse()?;
		let admin: SocketAddr = config.service.admin_bind.parse()?;

		if !admin.ip().is_loopback() {
			return Err(eyre::eyre!("admin_bind must be a loopback address, got {admin}."));
		}

		Ok(Self { http, admin })
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = memvec_config::load(&args.config)?;

	init_tracing(&config);

	let binds = Binds::from_config(&config)?;
	let state = AppState::new(config).await?;
	let http_listener = TcpListener::bind(binds.http).await?;
	let admin_listener = TcpListener::bind(binds.admin).await?;

	tracing::info!(http_addr = %binds.http, admin_addr = %binds.admin, "memvec listening.");

	tokio::try_join!(
		axum::serve(http_listener, routes::router(state.clone())),
		axum::serve(admin_listener, routes::admin_router(state)),
	)?;

	Ok(())
}

fn init_tracing(config: &Config) {
	let filter = EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|err| {
		eprintln!("Invalid log_level {:?}: {err}. Falling back to info.", config.service.log_level);

		EnvFilter::new("info")
	});

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
