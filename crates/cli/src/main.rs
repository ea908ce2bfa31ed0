//! Navdana CLI - Banner and report management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List banners
//! nv-cli banners list
//!
//! # Upload a banner (active unless --inactive)
//! nv-cli banners upload --title "Diwali Sale" --file diwali.jpg
//!
//! # Flip a banner on or off
//! nv-cli banners toggle 665f1c2a9b
//!
//! # Export a report as CSV
//! nv-cli reports export sales --out sales_report.csv
//! ```
//!
//! # Environment Variables
//!
//! - `NAVDANA_API_TOKEN` - Bearer token of an operator account
//! - `MERCHANT_API_URL` - Merchant backend base URL

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use navdana_admin::config::DEFAULT_MERCHANT_API_URL;
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "nv-cli")]
#[command(author, version, about = "Navdana CLI tools")]
struct Cli {
    /// Merchant backend base URL
    #[arg(long, global = true, env = "MERCHANT_API_URL", default_value = DEFAULT_MERCHANT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage storefront banners
    Banners {
        /// Operator bearer token
        #[arg(long, env = "NAVDANA_API_TOKEN", hide_env_values = true)]
        token: String,

        #[command(subcommand)]
        action: BannerCommand,
    },
    /// Work with admin reports
    Reports {
        #[command(subcommand)]
        action: ReportCommand,
    },
}

#[derive(Subcommand)]
enum BannerCommand {
    /// List all banners
    List,
    /// Upload a new banner image
    Upload {
        /// Banner title (must be unique)
        #[arg(short, long)]
        title: String,

        /// Image file to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Upload the banner switched off
        #[arg(long)]
        inactive: bool,
    },
    /// Switch a banner on or off
    Toggle {
        /// Banner ID
        id: String,
    },
    /// Delete a banner
    Delete {
        /// Banner ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Export a report tab as CSV (`sales`, `user`, `inventory`, `order`)
    Export {
        /// Report tab
        tab: String,

        /// Output file; defaults to stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Banners { token, action } => {
            let ctx = commands::banners::Context::new(&cli.api_url, SecretString::from(token));
            match action {
                BannerCommand::List => commands::banners::list(&ctx).await?,
                BannerCommand::Upload {
                    title,
                    file,
                    inactive,
                } => commands::banners::upload(&ctx, &title, &file, !inactive).await?,
                BannerCommand::Toggle { id } => commands::banners::toggle(&ctx, &id).await?,
                BannerCommand::Delete { id } => commands::banners::delete(&ctx, &id).await?,
            }
        }
        Commands::Reports { action } => match action {
            ReportCommand::Export { tab, out } => {
                commands::reports::export(&tab, out.as_deref())?;
            }
        },
    }
    Ok(())
}
