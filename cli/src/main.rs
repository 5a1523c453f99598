use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use application::UserService;
use domain::{EntityId, SearchParamsInput, UserEntity, UserProps};
use infrastructure::{EnvConfig, UserInMemoryRepository};

/// List users from an in-memory store through the search pipeline.
///
/// Every page option accepts any value: JSON literals (`2`, `null`, `true`)
/// are passed through as such, anything else as a string, and the pipeline
/// normalizes what it cannot use.
#[derive(Parser, Debug)]
#[command(name = "searchable-cli", version, about)]
struct Args {
    /// Page number, 1-based
    #[arg(long, allow_hyphen_values = true)]
    page: Option<String>,

    /// Items per page
    #[arg(long, allow_hyphen_values = true)]
    per_page: Option<String>,

    /// Field to sort by (`name` or `createdAt`)
    #[arg(long)]
    sort: Option<String>,

    /// Sort direction (`asc` or `desc`)
    #[arg(long)]
    sort_dir: Option<String>,

    /// Case-insensitive name filter
    #[arg(long)]
    filter: Option<String>,

    /// Generate this many users before listing
    #[arg(long, default_value_t = 0)]
    seed: usize,

    /// JSON file holding an array of users to load before listing
    #[arg(long)]
    fixture: Option<PathBuf>,
}

impl Args {
    fn search_input(&self) -> SearchParamsInput {
        SearchParamsInput {
            page: self.page.as_deref().map(raw_value),
            per_page: self.per_page.as_deref().map(raw_value),
            sort: self.sort.as_deref().map(raw_value),
            sort_dir: self.sort_dir.as_deref().map(raw_value),
            filter: self.filter.as_deref().map(raw_value),
        }
    }
}

/// One fixture record; `id` is generated when omitted.
#[derive(Deserialize, Debug)]
struct FixtureUser {
    id: Option<String>,
    #[serde(flatten)]
    props: UserProps,
}

fn raw_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn load_fixture(path: &Path) -> Result<Vec<UserEntity>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading fixture {}", path.display()))?;
    let records: Vec<FixtureUser> = serde_json::from_str(&content)
        .with_context(|| format!("parsing fixture {}", path.display()))?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let user = match record.id {
                Some(id) => UserEntity::restore(EntityId::new(id), record.props),
                None => UserEntity::create(record.props),
            };
            user.with_context(|| format!("invalid user at index {index}"))
        })
        .collect()
}

fn seed_users(count: usize) -> Result<Vec<UserEntity>> {
    let start = Utc::now();
    (0..count)
        .map(|i| {
            let props = UserProps {
                created_at: start + Duration::milliseconds(i as i64),
                ..UserProps::new(
                    format!("user{i}"),
                    format!("user{i}@example.com"),
                    "password",
                )
            };
            Ok(UserEntity::create(props)?)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // --- Logger Initialization ---
    // Logs go to stderr; stdout carries the page.
    let filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    info!("Logger initialized successfully.");

    let config = EnvConfig::from_env();
    info!(
        environment = %config.environment,
        default_per_page = config.default_per_page,
        "Configuration loaded."
    );

    // --- Dependency Injection ---
    let mut users = match &args.fixture {
        Some(path) => load_fixture(path)?,
        None => Vec::new(),
    };
    users.extend(seed_users(args.seed)?);

    let repository = Arc::new(UserInMemoryRepository::default());
    repository.replace_all(users).await;
    info!(count = repository.len().await, "In-memory user store ready.");

    let service =
        UserService::new(repository).with_default_per_page(config.default_per_page);

    let input = args.search_input();
    debug!(?input, "Listing users");
    let page = service.list_users(input).await?;

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
