// src/main.rs
mod analysis;
mod config;
mod edgar;
mod extractors;
mod pipeline;
mod storage;
mod utils;

use analysis::{catalog, AnalysisMode, Analyzer, CompletionClient};
use clap::{Parser, Subcommand};
use config::Config;
use edgar::EdgarClient;
use extractors::{DocumentFlattener, FlattenedArtifact};
use std::path::PathBuf;
use storage::FilingStore;
use utils::error::AnalysisError;
use utils::AppError;

/// Download SEC filings, flatten them to text and tables, and summarize excerpts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the filing tree, overrides the configuration
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download filings of the configured companies from EDGAR
    Download {
        /// Restrict to these tickers (must be configured)
        #[arg(short, long)]
        ticker: Vec<String>,
    },
    /// Flatten every primary document into a cleaned text + tables artifact
    Clean {
        /// Directory to scan (defaults to the base directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Print the lines around the first match of a pattern in an artifact
    Search {
        /// Cleaned artifact to search
        #[arg(short, long)]
        file: PathBuf,

        /// Regular expression matched against each line
        #[arg(short, long)]
        pattern: String,

        /// Lines kept before the matching line
        #[arg(long, default_value_t = 2)]
        before: usize,

        /// End of the window, counted from the matching line
        #[arg(long, default_value_t = 6)]
        after: usize,
    },
    /// Summarize a cleaned artifact: paragraph count and table shapes
    Inspect {
        /// Cleaned artifact to read
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List companies present in the filing tree
    Companies,
    /// List accession folders of a company with their resolved year
    Filings {
        /// Company name or ticker
        #[arg(short, long)]
        company: String,
    },
    /// List years with cleaned data for a company, newest first
    Years {
        /// Company name or ticker
        #[arg(short, long)]
        company: String,
    },
    /// List analysis categories
    Analyses {
        /// Company name or ticker
        #[arg(short, long)]
        company: Option<String>,
    },
    /// Build an analysis prompt and send it to the completion API
    Analyze {
        /// Company name or ticker
        #[arg(short, long)]
        company: String,

        /// Fiscal year
        #[arg(short, long)]
        year: i32,

        /// Analysis category, e.g. "Sales by Geographic Region"
        #[arg(short, long)]
        analysis: String,

        /// Cover the selected year and the preceding available years
        #[arg(long)]
        trend: bool,

        /// Print the prompt instead of calling the API
        #[arg(long)]
        dry_run: bool,
    },
}

fn load_config(args: &Args) -> Result<Config, AppError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(base_dir) = &args.base_dir {
        config.base_dir = base_dir.clone();
    }
    tracing::debug!("Using base directory {}", config.base_dir.display());
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging("info");

    // 2. Parse CLI Arguments and configuration
    let args = Args::parse();
    tracing::debug!("Starting processing for args: {:?}", args);
    let config = load_config(&args)?;
    let store = FilingStore::from_config(&config);

    match args.command {
        Command::Download { ticker } => run_download(&config, &store, &ticker).await,
        Command::Clean { dir } => {
            let root = dir.unwrap_or_else(|| config.base_dir.clone());
            let report = pipeline::clean_directory(&store, &DocumentFlattener::new(), &root)?;
            println!("Cleaned {} documents, {} failed", report.succeeded.len(), report.failures.len());
            for (doc, reason) in &report.failures {
                println!("  {}: {}", doc.display(), reason);
            }
            if report.all_failed() {
                return Err(AppError::Processing(format!(
                    "Failed to clean any of {} documents",
                    report.failures.len()
                )));
            }
            Ok(())
        }
        Command::Search { file, pattern, before, after } => {
            let result = extractors::search(&file, &pattern, before, after)?;
            match result.excerpt() {
                Some(excerpt) => tracing::info!(
                    "Matched line {}, showing lines {}..{}",
                    excerpt.line_index + 1,
                    excerpt.start + 1,
                    excerpt.end
                ),
                None => tracing::info!("No line of {} matches '{}'", file.display(), pattern),
            }
            print!("{}", result.display_text());
            Ok(())
        }
        Command::Inspect { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let artifact = FlattenedArtifact::parse(&raw)?;
            println!("{} paragraphs, {} tables", artifact.text.len(), artifact.tables.len());
            for (i, table) in artifact.tables.iter().enumerate() {
                let widest = table.iter().map(Vec::len).max().unwrap_or(0);
                println!("  table {}: {} rows, up to {} cells", i + 1, table.len(), widest);
            }
            Ok(())
        }
        Command::Companies => {
            for ticker in store.companies()? {
                println!("{}", config.display_name(&ticker));
            }
            Ok(())
        }
        Command::Filings { company } => {
            let ticker = config.ticker_for(&company);
            for filing in store.filings(&ticker, &config.form_type_for(&ticker))? {
                let year = filing
                    .year
                    .map(|(year, source)| format!("{} ({:?})", year, source))
                    .unwrap_or_else(|| "unknown".to_string());
                let state = if filing.has_artifact { "cleaned" } else { "raw" };
                println!("{}\t{}\t{}", filing.accession, year, state);
            }
            Ok(())
        }
        Command::Years { company } => {
            let ticker = config.ticker_for(&company);
            for year in store.years_for(&ticker, &config.form_type_for(&ticker))? {
                println!("{}", year);
            }
            Ok(())
        }
        Command::Analyses { company } => {
            for spec in &config.analyses {
                let shown = company
                    .as_deref()
                    .map_or(true, |c| spec.ticker.eq_ignore_ascii_case(&config.ticker_for(c)));
                if shown {
                    println!("{}\t{}", config.display_name(&spec.ticker), spec.name);
                }
            }
            Ok(())
        }
        Command::Analyze { company, year, analysis, trend, dry_run } => {
            let mode = if trend { AnalysisMode::Trend } else { AnalysisMode::SingleYear };
            run_analyze(&config, &store, &company, year, &analysis, mode, dry_run).await
        }
    }
}

async fn run_download(config: &Config, store: &FilingStore, tickers: &[String]) -> Result<(), AppError> {
    let companies: Vec<_> = if tickers.is_empty() {
        config.companies.iter().collect()
    } else {
        tickers
            .iter()
            .map(|t| {
                config.company(t)
                    .ok_or_else(|| AppError::Config(format!("Company {} is not configured", t)))
            })
            .collect::<Result<Vec<_>, AppError>>()?
    };

    let client = EdgarClient::new(&config.user_agent, config.request_delay_ms)?;
    let mut downloaded = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for company in companies {
        // A company that cannot be resolved must not stop the others
        match pipeline::download_company(&client, store, company).await {
            Ok(report) => {
                downloaded += report.succeeded.len();
                skipped += report.skipped;
                failed += report.failures.len();
            }
            Err(e) => {
                tracing::error!("Downloads for {} failed: {}", company.ticker, e);
                failed += 1;
            }
        }
    }

    println!("Downloaded {} filings, {} skipped, {} failed", downloaded, skipped, failed);
    if downloaded == 0 && failed > 0 {
        return Err(AppError::Processing(format!("Failed to download any of {} filings", failed)));
    }
    Ok(())
}

async fn run_analyze(
    config: &Config,
    store: &FilingStore,
    company: &str,
    year: i32,
    analysis: &str,
    mode: AnalysisMode,
    dry_run: bool,
) -> Result<(), AppError> {
    let ticker = config.ticker_for(company);
    if catalog::analyses_for(&config.analyses, &ticker).next().is_none() {
        return Err(AnalysisError::UnknownCompany(company.to_string()).into());
    }

    let prepared = Analyzer::new(config, store).prepare(company, year, analysis, mode)?;
    tracing::info!(
        "Prompt covers {:?} with {} excerpts",
        prepared.years,
        prepared.excerpts.len()
    );
    for (yr, reason) in &prepared.skipped {
        eprintln!("No {} data for {} in {}: {:?}", prepared.analysis, prepared.company, yr, reason);
    }

    if dry_run {
        print!("{}", prepared.prompt);
        return Ok(());
    }

    let api_key = std::env::var(&config.completion.api_key_env).map_err(|_| {
        AppError::Config(format!("Set {} to call the completion API", config.completion.api_key_env))
    })?;
    let client = CompletionClient::new(&config.completion, api_key)?;
    let text = client.complete(&prepared.prompt).await?;

    println!("Analysis Result ({}, {}):\n", prepared.company, prepared.analysis);
    println!("{}", text.trim());
    Ok(())
}
