mod carousel;
mod config;
mod error;
mod executor;
mod export;
mod plan;
mod rows;
mod session;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::carousel::{gate, BlockSurvey};
use crate::config::RunConfig;
use crate::session::chrome::ChromeProvider;
use crate::session::{Session, SessionProvider};

#[derive(Parser)]
#[command(name = "carousel_scraper", about = "Card and link inventory of video.telequebec.tv carousels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List and classify the carousel blocks on the page
    Blocks {
        /// Page to inspect
        #[arg(long, default_value = "https://video.telequebec.tv/")]
        url: String,
        /// Scroll to the bottom until lazy sections stop loading
        #[arg(long)]
        scroll: bool,
    },
    /// Build the navigation plan without visiting anything
    Plan {
        /// Page to inspect
        #[arg(long, default_value = "https://video.telequebec.tv/")]
        url: String,
        /// Scroll to the bottom until lazy sections stop loading
        #[arg(long)]
        scroll: bool,
        /// Max targets to plan (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print the plan as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Visit every card and show-more link, then export the CSV
    Run {
        /// Page to inventory
        #[arg(long, default_value = "https://video.telequebec.tv/")]
        url: String,
        /// Label embedded in the CSV filename
        #[arg(long, default_value = "page_acceuil")]
        label: String,
        /// Output directory for the CSV and debug captures
        #[arg(long, default_value = "output")]
        out_dir: PathBuf,
        /// Scroll to the bottom until lazy sections stop loading
        #[arg(long)]
        scroll: bool,
        /// Max targets to visit (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Blocks { url, scroll } => {
            let config = RunConfig {
                base_url: url,
                full_scroll: scroll,
                ..RunConfig::default()
            };
            let provider = ChromeProvider::launch().await?;
            let outcome = blocks_command(&provider, &config).await;
            shutdown(provider).await;
            outcome
        }
        Commands::Plan {
            url,
            scroll,
            limit,
            json,
        } => {
            let config = RunConfig {
                base_url: url,
                full_scroll: scroll,
                ..RunConfig::default()
            };
            let provider = ChromeProvider::launch().await?;
            let outcome = plan_command(&provider, &config, limit, json).await;
            shutdown(provider).await;
            outcome
        }
        Commands::Run {
            url,
            label,
            out_dir,
            scroll,
            limit,
        } => {
            let config = RunConfig {
                base_url: url,
                page_label: label,
                debug_dir: out_dir.join("debug"),
                out_dir,
                full_scroll: scroll,
                ..RunConfig::default()
            };
            let provider = ChromeProvider::launch().await?;
            let outcome = run_command(&provider, &config, limit).await;
            shutdown(provider).await;
            outcome
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Open the page once and survey every carousel block on it.
async fn survey_once(
    provider: &ChromeProvider,
    config: &RunConfig,
) -> anyhow::Result<Vec<BlockSurvey>> {
    let session = provider.acquire().await?;
    let surveyed = survey_current(session.as_ref(), config).await;
    if let Err(err) = provider.release(session).await {
        warn!("Session release failed: {}", err);
    }
    surveyed
}

async fn survey_current(
    session: &dyn Session,
    config: &RunConfig,
) -> anyhow::Result<Vec<BlockSurvey>> {
    gate::open_page(session, config).await?;
    Ok(carousel::survey_page(session, config).await?)
}

async fn blocks_command(provider: &ChromeProvider, config: &RunConfig) -> anyhow::Result<()> {
    let surveys = survey_once(provider, config).await?;
    if surveys.is_empty() {
        println!("No carousel blocks found.");
        return Ok(());
    }

    println!(
        "{:>2} | {:<30} | {:<26} | {:>6} | {}",
        "#", "Titre", "Type", "Cartes", "Voir plus"
    );
    println!("{}", "-".repeat(84));
    for survey in &surveys {
        println!(
            "{:>2} | {:<30} | {:<26} | {:>6} | {}",
            survey.block.index,
            truncate(&survey.block.title, 30),
            survey.block.kind.label(),
            survey.cards.len(),
            if survey.has_show_more { "oui" } else { "non" }
        );
    }
    println!("\n{} blocs", surveys.len());
    Ok(())
}

async fn plan_command(
    provider: &ChromeProvider,
    config: &RunConfig,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let surveys = survey_once(provider, config).await?;
    let mut tasks = plan::build_tasks(&surveys);
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }
    if tasks.is_empty() {
        println!("Nothing to visit on this page.");
        return Ok(());
    }

    for (i, task) in tasks.iter().enumerate() {
        println!("{:>3}. {}", i + 1, task.describe());
    }
    println!("\n{} targets. Run 'run' to visit them.", tasks.len());
    Ok(())
}

async fn run_command(
    provider: &ChromeProvider,
    config: &RunConfig,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let surveys = survey_once(provider, config).await?;
    let mut tasks = plan::build_tasks(&surveys);
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
    if tasks.is_empty() {
        println!("No carousel cards or links found.");
        return Ok(());
    }
    println!("Visiting {} targets...", tasks.len());

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, finishing the current task");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let (rows, report) = executor::run_tasks(provider, config, &tasks, &cancel).await?;
    let path = export::write_csv(&rows, &config.out_dir, &config.page_label)?;

    println!(
        "Done: {} visited ({} ok, {} failed){}.",
        report.attempted,
        report.completed,
        report.failed,
        if report.cancelled { ", cancelled" } else { "" }
    );
    println!("CSV: {}", path.display());
    Ok(())
}

async fn shutdown(provider: ChromeProvider) {
    if let Err(err) = provider.shutdown().await {
        warn!("Browser shutdown failed: {}", err);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
