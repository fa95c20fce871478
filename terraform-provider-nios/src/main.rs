//! Terraform Provider for Infoblox NIOS
//!
//! Manages DHCP and IPAM objects on a NIOS Grid Master through WAPI,
//! speaking a line-delimited JSON-RPC rendition of the plugin protocol
//! on stdin/stdout.

mod client;
mod config;
mod provider;
mod resources;
mod schema;
mod validators;

use anyhow::Context;
use clap::Parser;
use provider::NiosProvider;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Terraform Provider for Infoblox NIOS
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-nios")]
#[command(about = "Terraform provider for Infoblox NIOS DHCP and IPAM")]
struct Args {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log level requested by Terraform
    #[arg(long, env = "TF_LOG", hide = true)]
    log_level: Option<String>,
}

impl Args {
    fn default_filter(&self) -> String {
        if self.debug {
            return "debug".to_string();
        }
        match self.log_level.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level.to_string(),
            _ => "info".to_string(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("Starting Terraform Provider for NIOS");

    let provider = NiosProvider::new().context("failed to start async runtime")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    for line in stdin.lock().lines() {
        let input = line.context("failed to read request")?;
        if input.trim().is_empty() {
            continue;
        }

        let response = provider.handle_request(&input);
        writeln!(stdout_lock, "{}", response).context("failed to write response")?;
        stdout_lock.flush().context("failed to flush stdout")?;
    }

    tracing::info!("Terraform Provider shutting down");
    Ok(())
}
