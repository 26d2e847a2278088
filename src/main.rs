// SPDX-License-Identifier: GPL-3.0-or-later

//! Palisade MCP server.
//!
//! Exposes sandboxed filesystem tools over MCP stdio. Every path a client
//! supplies is resolved and checked against the allowed roots given on the
//! command line before any filesystem operation runs.

#![allow(clippy::print_stderr, reason = "CLI tool needs to output to stderr")]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use palisade_mcp::config::Config;
use palisade_mcp::mcp::McpServer;
use palisade_mcp::sandbox::{PathGuard, RootSet};
use palisade_mcp::tools::FsToolHandler;

/// Command-line arguments for Palisade.
#[derive(Parser, Debug)]
#[command(name = "palisade")]
#[command(about = "MCP server exposing sandboxed filesystem tools")]
#[command(version = env!("PALISADE_VERSION"))]
struct Args {
    /// Directories the server is allowed to access.
    #[arg(required = true, value_name = "ROOT")]
    roots: Vec<PathBuf>,

    /// Path to configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Entry point for the Palisade binary.
///
/// # Errors
///
/// Returns an error if a root is unusable or the server fails.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("palisade=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config)?;

    let roots: Vec<PathBuf> = args.roots.iter().map(|root| expand_home(root)).collect();
    for root in &roots {
        if !root.exists() {
            eprintln!("Error: {} does not exist", root.display());
            std::process::exit(1);
        }
        if !root.is_dir() {
            eprintln!("Error: {} is not a directory", root.display());
            std::process::exit(1);
        }
    }

    let roots = RootSet::new(roots, config.case_insensitive_paths)?;

    info!("Starting palisade filesystem server");
    info!(
        "Allowed directories: {}",
        roots
            .iter()
            .map(|root| root.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let handler = FsToolHandler::new(
        PathGuard::new(roots),
        config,
        tokio::runtime::Handle::current(),
    );
    let mut mcp_server = McpServer::new(handler);

    // Run in a blocking task since the MCP server uses synchronous I/O
    let mcp_task = tokio::task::spawn_blocking(move || mcp_server.run());

    tokio::select! {
        res = mcp_task => {
            res?
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}

/// Expands a leading `~` or `~/` to the user's home directory.
fn expand_home(path: &std::path::Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    if text == "~" {
        return dirs::home_dir().unwrap_or_else(|| path.to_path_buf());
    }
    if let Some(rest) = text.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
