//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod jobs;
mod site;

use anyhow::Result;
use clap::Subcommand;
use sitewright_client::SiteClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a site build
    Submit {
        /// Business name; the site slug is derived from it
        business_name: String,

        #[arg(long)]
        niche: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        tel: String,

        /// Address that receives the build outcome
        #[arg(long, env = "SITEWRIGHT_WEBHOOK_URL")]
        webhook_url: String,
    },
    /// Show the status and log of a build
    Log {
        /// Site slug
        slug: String,

        /// Only show the last N lines (0 shows everything)
        #[arg(short = 'n', long, default_value_t = 0)]
        lines: usize,
    },
    /// Poll a build until it completes or fails
    Watch {
        /// Site slug
        slug: String,

        /// Seconds between polls
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Log lines shown on each poll
        #[arg(short = 'n', long, default_value_t = 10)]
        lines: usize,
    },
    /// List runs known to the server
    Jobs,
    /// Check that the server is up
    Health,
}

/// Handle a CLI command
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = SiteClient::new(&config.server_url);

    match command {
        Commands::Submit {
            business_name,
            niche,
            address,
            tel,
            webhook_url,
        } => {
            site::submit(
                &client,
                sitewright_core::domain::request::BuildRequest {
                    business_name,
                    niche,
                    address,
                    tel,
                    webhook_url,
                },
            )
            .await
        }
        Commands::Log { slug, lines } => site::show_log(&client, &slug, lines).await,
        Commands::Watch {
            slug,
            interval,
            lines,
        } => site::watch(&client, &slug, interval, lines).await,
        Commands::Jobs => jobs::list_jobs(&client).await,
        Commands::Health => jobs::health(&client).await,
    }
}
