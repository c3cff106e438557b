//! UserSearch-RS: user directory search with profile enrichment
//!
//! This is the entry point of the `usersearch` command line tool.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use usersearch_rs::{
    config::{self, Settings},
    metrics::Metrics,
    network::HttpClient,
    Accumulator, GitHubDirectory, SearchCriteria, SearchError, SearchOptions, SortKey, SortOrder,
    UsernameScope,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("usersearch {}", usersearch_rs::VERSION);
            return ExitCode::SUCCESS;
        }
        Ok(Command::Run(cli)) => cli,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("Run with --help for usage");
            return ExitCode::from(2);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SearchError>() {
                Some(search_error) => {
                    error!("{}", search_error);
                    eprintln!("{}", search_error.user_message());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let settings_path = config::find_settings_file(cli.config.as_deref())?;
    let settings = config::load_from(settings_path.as_deref())?;
    init_logging(&settings);
    info!("Starting UserSearch-RS v{}", usersearch_rs::VERSION);
    match &settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings)?;
    debug!("HTTP client initialized for {}", client.base_url());

    let directory =
        GitHubDirectory::new(client).with_detail_timeout(settings.outgoing.detail_timeout());

    if let Some(handle) = &cli.lookup {
        let detail = directory.lookup(handle).await?;
        return print_json(&detail);
    }

    if let Some(handle) = &cli.repos_of {
        let per_page = cli.per_page.unwrap_or(settings.search.per_page);
        let repos = directory.repositories(handle, 1, per_page).await?;
        return print_json(&repos);
    }

    let options = search_options(&settings, &cli);
    let metrics = Arc::new(Metrics::new());
    let accumulator = Accumulator::new(Arc::new(directory), options).with_metrics(metrics.clone());

    let mut result = accumulator.search(&cli.criteria).await?;
    info!(
        "Loaded page 1: {} of {} users",
        result.len(),
        result.total_count
    );

    for _ in 1..cli.pages {
        if !result.has_more {
            break;
        }
        result = accumulator.load_more().await?;
        info!(
            "Loaded page {}: {} of {} users",
            result.current_page,
            result.len(),
            result.total_count
        );
    }

    for degraded in accumulator.degraded().await {
        debug!("{}", degraded);
    }
    debug!("Metrics: {:?}", metrics.snapshot());

    print_json(&result)
}

/// Install the stderr subscriber; `RUST_LOG` wins over `general.debug`
fn init_logging(settings: &Settings) {
    let default_level = if settings.general.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn search_options(settings: &Settings, cli: &Cli) -> SearchOptions {
    let mut options = SearchOptions::from_settings(settings);
    if let Some(per_page) = cli.per_page {
        options = options.with_per_page(per_page);
    }
    if cli.sort.is_some() || cli.order.is_some() {
        let sort = cli.sort.or(options.sort);
        let order = cli.order.unwrap_or(options.order);
        options = options.with_sort(sort, order);
    }
    if let Some(scope) = cli.scope {
        options.username_scope = scope;
    }
    options
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parsed command line
#[derive(Debug, Default)]
struct Cli {
    criteria: SearchCriteria,
    sort: Option<SortKey>,
    order: Option<SortOrder>,
    scope: Option<UsernameScope>,
    per_page: Option<u32>,
    pages: u32,
    lookup: Option<String>,
    repos_of: Option<String>,
    config: Option<PathBuf>,
}

#[derive(Debug)]
enum Command {
    Help,
    Version,
    Run(Cli),
}

fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut cli = Cli {
        pages: 1,
        ..Default::default()
    };
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{} requires a value", flag))
        };

        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-V" | "--version" => return Ok(Command::Version),
            "-c" | "--config" => cli.config = Some(PathBuf::from(value(&arg)?)),
            "--user" => cli.criteria = cli.criteria.username(value(&arg)?),
            "--location" => cli.criteria = cli.criteria.location(value(&arg)?),
            "--language" => cli.criteria = cli.criteria.language(value(&arg)?),
            "--min-repos" => {
                let count = value(&arg)?;
                let count = count
                    .parse::<u32>()
                    .with_context(|| format!("--min-repos expects a number, got {}", count))?;
                cli.criteria = cli.criteria.min_repos(count);
            }
            "--sort" => {
                let sort = value(&arg)?;
                cli.sort = Some(sort.parse::<SortKey>().map_err(anyhow::Error::msg)?);
            }
            "--order" => {
                let order = value(&arg)?;
                cli.order = Some(order.parse::<SortOrder>().map_err(anyhow::Error::msg)?);
            }
            "--scope" => {
                let scope = value(&arg)?;
                cli.scope = Some(scope.parse::<UsernameScope>().map_err(anyhow::Error::msg)?);
            }
            "--per-page" => {
                let per_page = value(&arg)?;
                cli.per_page = Some(
                    per_page
                        .parse::<u32>()
                        .with_context(|| format!("--per-page expects a number, got {}", per_page))?,
                );
            }
            "--pages" => {
                let pages = value(&arg)?;
                cli.pages = pages
                    .parse::<u32>()
                    .with_context(|| format!("--pages expects a number, got {}", pages))?;
                if cli.pages == 0 {
                    bail!("--pages must be at least 1");
                }
            }
            "--lookup" => cli.lookup = Some(value(&arg)?),
            "--repos-of" => cli.repos_of = Some(value(&arg)?),
            other => bail!("Unknown argument: {}", other),
        }
    }

    Ok(Command::Run(cli))
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
UserSearch-RS v{}
Search a user directory and enrich every hit with its profile

USAGE:
    usersearch [OPTIONS]

SEARCH:
    --user <TEXT>          Username fragment
    --location <TEXT>      Location
    --min-repos <N>        Minimum public repository count
    --language <TEXT>      Primary language
    --scope <SCOPE>        Match username in login, name or email
    --sort <KEY>           followers, repositories or joined
    --order <ORDER>        asc or desc
    --per-page <N>         Results per page (1-100)
    --pages <N>            Pages to load (default 1)

LOOKUP:
    --lookup <HANDLE>      Print one user's profile
    --repos-of <HANDLE>    Print one user's repositories

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    USERSEARCH_SETTINGS_PATH  Path to usersearch.yml
    USERSEARCH_TOKEN          API token (falls back to GITHUB_TOKEN)
    USERSEARCH_BASE_URL       Directory API base URL
    USERSEARCH_DEBUG          Enable debug logging (true/false)
    USERSEARCH_PER_PAGE       Results per page
    USERSEARCH_TIMEOUT        Request timeout in seconds
"#,
        usersearch_rs::VERSION
    );
}
