// ABOUTME: Karetek server binary: loads configuration, initializes logging and serves HTTP
// ABOUTME: Command-line flags override the port and database URL from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Karetek Health

//! # Karetek API Server Binary
//!
//! Starts the Karetek telehealth API with database, LLM, speech and storage
//! collaborators built from the environment.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use karetek_server::config::{DatabaseUrl, ServerConfig};
use karetek_server::logging;
use karetek_server::resources::ServerResources;
use karetek_server::server::run_server;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "karetek-server")]
#[command(about = "Karetek - AI health assistant API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&database_url);
    }
    config.validate()?;

    logging::init_from_env()?;

    info!("Starting Karetek API server");
    info!("{}", config.summary());

    let port = config.http_port;
    let resources = Arc::new(ServerResources::from_config(config).await?);

    if let Err(e) = run_server(resources, port).await {
        error!("Server error: {e}");
        return Err(e);
    }

    Ok(())
}
