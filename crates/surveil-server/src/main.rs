// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Surveil server binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use surveil_server::{build_service, ScanMode, ScanReport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Surveil server - watches GitHub releases and posts webhook digests.
#[derive(Parser, Debug)]
#[command(
	name = "surveil-server",
	about = "GitHub release surveillance server",
	version
)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/surveil/server.toml)
	#[arg(long, env = "SURVEIL_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Run one manual scan, print its summary and exit
	Scan,
	/// Print the last and next scan times and exit
	NextScan,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => surveil_server_config::load_config_with_file(path.clone())?,
		None => surveil_server_config::load_config()?,
	};

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	if config.logging.json {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init();
	}

	tracing::info!(
		database = %config.database.url,
		timezone = %config.scan.timezone,
		"starting surveil-server"
	);

	let pool = surveil_server_db::create_pool(&config.database.url).await?;
	surveil_server_db::run_migrations(&pool).await?;

	let service = build_service(&config, pool).await?;

	match args.command {
		Some(Command::Scan) => {
			if let ScanReport::Completed(summary) = service.trigger_scan(ScanMode::Blocking).await? {
				println!("{}", serde_json::to_string_pretty(&summary)?);
			}
			return Ok(());
		}
		Some(Command::NextScan) => {
			let times = service.scan_times().await?;
			println!("Last scan: {}\nNext scan: {}", times.last, times.next);
			return Ok(());
		}
		Some(Command::Version) | None => {}
	}

	if let Err(e) = service.start_scheduler().await {
		tracing::error!(error = %e, "failed to start scan scheduler");
		return Err(e.into());
	}

	tokio::signal::ctrl_c().await?;
	tracing::info!("Received shutdown signal");
	service.shutdown().await;

	tracing::info!("Server shutdown complete");
	Ok(())
}
