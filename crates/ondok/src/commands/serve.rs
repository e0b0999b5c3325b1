//! Serve command: run the MCP server on stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use rmcp::ServiceExt;
use tracing::{info, instrument};

use ondok_core::config::{Config, ConfigSources};

use super::{TableArgs, load_tables};
use crate::server::ProjectServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[command(flatten)]
    pub tables: TableArgs,
}

/// Load the tables once and serve MCP requests until the client disconnects.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    args: ServeArgs,
    config: Config,
    sources: ConfigSources,
) -> anyhow::Result<()> {
    let tables = Arc::new(load_tables(&config, &sources, &args.tables)?);
    info!(
        words = tables.vocab.len(),
        ranges = tables.ranges.len(),
        "starting MCP server on stdio"
    );

    let service = ProjectServer::new(tables, &config)
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server")?;
    let reason = service.waiting().await.context("MCP server task failed")?;

    info!(?reason, "MCP server stopped");
    Ok(())
}
