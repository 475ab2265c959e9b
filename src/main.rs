//! Command line front end for linkvault.
//!
//! # Usage
//!
//! ```bash
//! # Shorten a URL for an owner, optionally with a click limit
//! linkvault create example.com --owner alice --limit 5
//!
//! # Follow a short code (counts a click)
//! linkvault open Ab3dE9
//!
//! # List, inspect and delete links
//! linkvault list --owner alice
//! linkvault info Ab3dE9
//! linkvault delete Ab3dE9 --owner alice
//!
//! # Remove expired links once, or keep sweeping until Ctrl-C
//! linkvault sweep
//! linkvault run
//! ```
//!
//! # Environment Variables
//!
//! See [`linkvault::config`]; a `.env` file in the working directory is
//! loaded first.

use linkvault::config::{self, Config};
use linkvault::domain::entities::{Link, LinkStatus};
use linkvault::state::AppState;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

/// Personal URL shortener backed by a JSON file.
#[derive(Parser)]
#[command(name = "linkvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten a URL
    Create {
        /// URL to shorten; `https://` is assumed when no scheme is given
        url: String,

        /// Identity that owns the link
        #[arg(short, long)]
        owner: String,

        /// Maximum number of successful opens
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Resolve a short code and count a click
    Open {
        code: String,
    },

    /// List an owner's links
    List {
        #[arg(short, long)]
        owner: String,
    },

    /// Delete a link you own
    Delete {
        code: String,

        #[arg(short, long)]
        owner: String,
    },

    /// Show a link without counting a click
    Info {
        code: String,
    },

    /// Remove expired links once
    Sweep,

    /// Sweep expired links periodically until Ctrl-C
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env().context("Invalid configuration")?;
    init_tracing(&config);

    match cli.command {
        Commands::Run => {
            config.print_summary();
            linkvault::runtime::run(config).await
        }
        Commands::Create { url, owner, limit } => {
            create_link(&AppState::new(config)?, &url, &owner, limit).await
        }
        Commands::Open { code } => open_link(&AppState::new(config)?, &code).await,
        Commands::List { owner } => list_links(&AppState::new(config)?, &owner).await,
        Commands::Delete { code, owner } => {
            delete_link(&AppState::new(config)?, &code, &owner).await
        }
        Commands::Info { code } => show_link(&AppState::new(config)?, &code).await,
        Commands::Sweep => sweep(&AppState::new(config)?).await,
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn create_link(state: &AppState, url: &str, owner: &str, limit: Option<u32>) -> Result<()> {
    let created = state.link_service.create(url, owner, limit).await?;

    if created.created {
        println!("{}", "✅ Short link created".green().bold());
    } else {
        println!("{}", "ℹ️  You already have a short link for this URL".yellow());
    }
    println!();
    println!("  Short URL: {}", created.short_url.bright_yellow().bold());
    println!("  Target:    {}", created.link.original_url.cyan());
    println!("  Expires:   {}", format_time(&created.link.expires_at));
    if let Some(limit) = created.link.click_limit {
        println!("  Limit:     {} clicks", limit);
    }
    println!();

    Ok(())
}

async fn open_link(state: &AppState, code: &str) -> Result<()> {
    let url = state.link_service.resolve(code).await?;
    println!("{url}");
    Ok(())
}

/// Lists an owner's links.
///
/// # Output Format
///
/// ```text
/// 📋 Links for alice
///
///   Code     Clicks     Created            Expires            Status   URL
///   ──────────────────────────────────────────────────────────────────────────────────
///   Ab3dE9   2/5        2026-01-15 10:30   2026-01-16 10:30   ACTIVE   https://example.com/
/// ```
async fn list_links(state: &AppState, owner: &str) -> Result<()> {
    println!("{}", format!("📋 Links for {owner}").bright_blue().bold());
    println!();

    let links = state.link_service.list_by_owner(owner).await?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<8} {:<10} {:<18} {:<18} {:<8} {}",
        "Code".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Created".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Status".bright_white().bold(),
        "URL".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    let now = Utc::now();
    for link in &links {
        println!(
            "  {:<8} {:<10} {:<18} {:<18} {:<8} {}",
            link.short_code.cyan(),
            format_clicks(link),
            format_time(&link.created_at).bright_black(),
            format_time(&link.expires_at).bright_black(),
            status_label(link.status_at(now)),
            link.original_url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn delete_link(state: &AppState, code: &str, owner: &str) -> Result<()> {
    if state.link_service.delete(code, owner).await? {
        println!("{}", "✅ Link deleted".green().bold());
        return Ok(());
    }

    match state.link_service.get_link(code).await? {
        Some(_) => anyhow::bail!("Link {code} belongs to another owner"),
        None => anyhow::bail!("Link {code} not found"),
    }
}

async fn show_link(state: &AppState, code: &str) -> Result<()> {
    let link = state
        .link_service
        .get_link(code)
        .await?
        .with_context(|| format!("Link {code} not found"))?;
    let status = link.status_at(Utc::now());

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    println!("  Short URL: {}", state.link_service.short_url(&link.short_code).bright_yellow());
    println!("  Target:    {}", link.original_url.cyan());
    println!("  Owner:     {}", link.owner_id);
    println!("  Clicks:    {}", format_clicks(&link));
    println!("  Created:   {}", format_time(&link.created_at));
    println!("  Expires:   {}", format_time(&link.expires_at));
    println!("  Status:    {}", status_label(status));
    println!();

    Ok(())
}

async fn sweep(state: &AppState) -> Result<()> {
    let removed = state.link_service.sweep_expired().await?;
    println!(
        "🧹 Removed {} expired link(s)",
        removed.to_string().bright_green().bold()
    );
    Ok(())
}

fn format_time(time: &chrono::DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

fn format_clicks(link: &Link) -> String {
    match link.click_limit {
        Some(limit) => format!("{}/{}", link.click_count, limit),
        None => link.click_count.to_string(),
    }
}

fn status_label(status: LinkStatus) -> ColoredString {
    match status {
        LinkStatus::Active { .. } => "ACTIVE".green(),
        LinkStatus::Expired => "EXPIRED".red(),
        LinkStatus::LimitExceeded => "USED UP".yellow(),
    }
}
