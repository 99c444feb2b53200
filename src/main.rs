use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Serialize;

use wikimve::api::{self, ClientConfig, PageCreation, WikiClient};
use wikimve::progression::{self, ArticleAnalysis};
use wikimve::{report, stats};

/// Change tags that mark mobile / visual-editor activity on English
/// Wikipedia. One recent-changes query runs per tag; the union is then
/// reduced to pages carrying both a mobile and a visual-editor tag.
const DEFAULT_TAGS: [&str; 4] = [
    "mobile web edit",
    "mobile edit",
    "visualeditor",
    "visualeditor-wikitext",
];

#[derive(Debug, clap::Parser)]
#[command(
    name = "wikimve",
    version,
    about = "Analyzes Wikipedia articles created with the mobile visual editor"
)]
struct CommandLine {
    /// Log debug-level detail (RUST_LOG overrides this)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List registered change tags related to mobile or visual editing
    Tags,
    /// Find recently created mobile-VE articles and save the list
    Fetch {
        /// How many days of recent changes to search
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Change tag to query; repeat for several (defaults to the
        /// standard mobile/VE tags)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Where to write the article list
        #[arg(long, default_value = "mobile_ve_articles.json")]
        output: PathBuf,
    },
    /// Fetch revision histories for saved articles and track their
    /// progression
    Analyze {
        /// Article list produced by `fetch`
        #[arg(long, default_value = "mobile_ve_articles.json")]
        input: PathBuf,
        /// How many articles to analyze in detail
        #[arg(long, default_value_t = 50)]
        limit: usize,
        /// Where to write the detailed analyses
        #[arg(long, default_value = "mobile_ve_detailed_analysis.json")]
        output: PathBuf,
    },
    /// Render the markdown report from saved datasets
    Report {
        /// Article list produced by `fetch`
        #[arg(long, default_value = "mobile_ve_articles.json")]
        articles: PathBuf,
        /// Detailed analyses produced by `analyze`; per-article
        /// progression sections are appended when given
        #[arg(long)]
        details: Option<PathBuf>,
        /// Days covered by the dataset, echoed into the report header
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Where to write the report
        #[arg(long, default_value = "analysis_report.md")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = CommandLine::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match args.command {
        Command::Tags => cmd_tags(),
        Command::Fetch { days, tags, output } => cmd_fetch(days, tags, &output),
        Command::Analyze {
            input,
            limit,
            output,
        } => cmd_analyze(&input, limit, &output),
        Command::Report {
            articles,
            details,
            days,
            output,
        } => cmd_report(&articles, details.as_deref(), days, &output),
    }
}

fn cmd_tags() -> anyhow::Result<()> {
    let mut client = WikiClient::new(ClientConfig::default())?;
    let tags = client.list_change_tags()?;
    println!("{} change tags registered", tags.len());
    for tag in api::mobile_ve_tags(&tags) {
        println!("  {} ({} hits): {}", tag.name, tag.hitcount, tag.displayname);
    }
    Ok(())
}

fn cmd_fetch(days: i64, tags: Vec<String>, output: &Path) -> anyhow::Result<()> {
    let tags = if tags.is_empty() {
        DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect()
    } else {
        tags
    };
    tracing::info!(message = "searching tagged page creations", ?tags, days);

    let mut client = WikiClient::new(ClientConfig::default())?;
    let pages = client.find_mobile_ve_pages(&tags, days)?;
    tracing::info!(
        message = "pages with both mobile and visual editor tags",
        count = pages.len()
    );

    write_json(output, &pages)?;
    println!("Saved article list to: {}", output.display());
    Ok(())
}

fn cmd_analyze(input: &Path, limit: usize, output: &Path) -> anyhow::Result<()> {
    let pages: Vec<PageCreation> = read_json(input)?;
    let total = pages.len().min(limit);

    let mut client = WikiClient::new(ClientConfig::default())?;
    let mut analyses = Vec::new();
    for (idx, page) in pages.iter().take(limit).enumerate() {
        tracing::info!(
            message = "analyzing article",
            n = idx + 1,
            of = total,
            title = page.title.as_str()
        );
        let revisions = match client.page_revisions(&page.title) {
            Ok(revisions) => revisions,
            Err(err) => {
                tracing::warn!(
                    message = "revision fetch failed, skipping",
                    title = page.title.as_str(),
                    error = %err
                );
                continue;
            }
        };
        if revisions.is_empty() {
            tracing::warn!(message = "no revisions found", title = page.title.as_str());
            continue;
        }

        let record = progression::track(&revisions);
        if let Some(first) = &record.first_revision {
            tracing::info!(
                message = "tracked progression",
                revisions = record.total_revisions,
                first_chars = first.total_chars,
                first_sections = first.sections.len(),
                has_lead = first.lead_length > 0
            );
        }
        analyses.push(ArticleAnalysis::new(page, record));
    }

    write_json(output, &analyses)?;
    println!("Saved detailed analysis to: {}", output.display());
    Ok(())
}

fn cmd_report(
    articles: &Path,
    details: Option<&Path>,
    days: i64,
    output: &Path,
) -> anyhow::Result<()> {
    let pages: Vec<PageCreation> = read_json(articles)?;
    let summary = stats::summarize(&pages);

    let mut rendered = report::render_report(&summary, days, chrono::Utc::now());
    if let Some(path) = details {
        let detailed: Vec<ArticleAnalysis> = read_json(path)?;
        for article in &detailed {
            rendered.push('\n');
            rendered.push_str(&report::render_progression(
                &article.title,
                &article.editing_pattern,
            ));
        }
    }

    std::fs::write(output, rendered)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Report saved to: {}", output.display());
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(value)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
