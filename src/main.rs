use anyhow::{Context, Result};
use azrg::azure::{auth, client::ArmClient, http::format_arm_error};
use azrg::config::Config;
use azrg::notification::ConsoleNoticeSink;
use azrg::resource_group::{ResourceGroup, ResourceGroupService, Tags};
use azrg::VERSION;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Manage Azure resource groups
#[derive(Parser, Debug)]
#[command(name = "azrg", version = VERSION, about, long_about = None)]
struct Args {
    /// Azure subscription ID to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Management endpoint (defaults to the public Azure cloud)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all resource groups in the subscription
    List,
    /// Create or update a resource group
    Create {
        name: String,

        /// Azure region, e.g. eastus
        #[arg(short, long)]
        location: Option<String>,

        /// Tag as KEY=VALUE; repeatable. Without tags the defaults are applied
        #[arg(short, long = "tag", value_parser = parse_tag, conflicts_with = "no_tags")]
        tags: Vec<(String, String)>,

        /// Create with an explicitly empty tag set
        #[arg(long)]
        no_tags: bool,
    },
    /// Delete a resource group; succeeds if it does not exist
    Delete { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_tag(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Tags to send: `None` lets the service apply its defaults
fn requested_tags(tags: Vec<(String, String)>, no_tags: bool) -> Option<Tags> {
    if no_tags {
        return Some(Tags::new());
    }
    if tags.is_empty() {
        return None;
    }
    Some(tags.into_iter().collect())
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azrg {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azrg").join("azrg.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azrg").join("azrg.log");
    }
    PathBuf::from("azrg.log")
}

fn format_tags(group: &ResourceGroup) -> String {
    let mut tags: Vec<String> = group
        .tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    tags.sort();
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(",")
    }
}

fn print_groups(groups: &[ResourceGroup], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(groups)?);
        }
        OutputFormat::Table => {
            println!("{:<40} {:<20} {:<12} TAGS", "NAME", "LOCATION", "STATE");
            for group in groups {
                println!(
                    "{:<40} {:<20} {:<12} {}",
                    group.display_name(),
                    group.location,
                    group.provisioning_state(),
                    format_tags(group)
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    let Some(subscription) = config.effective_subscription(args.subscription.as_deref())? else {
        return Err(anyhow::anyhow!(
            "No Azure subscription configured. Set AZURE_SUBSCRIPTION_ID or use --subscription"
        ));
    };

    tracing::info!("Using subscription: {}", subscription);

    let mut client = ArmClient::new(&subscription, auth::default_credential())
        .context("Failed to initialize ARM client")?;
    if let Some(endpoint) = args.endpoint.as_deref().or(config.endpoint.as_deref()) {
        client = client.with_endpoint(endpoint);
    }
    if let Some(api_version) = config.api_version.as_deref() {
        client = client.with_api_version(api_version);
    }

    let service = ResourceGroupService::builder()
        .client(Arc::new(client))
        .notice_sink(Arc::new(ConsoleNoticeSink))
        .build()?;

    let result = match args.command {
        Command::List => match service.list_resource_groups().await {
            Ok(groups) => print_groups(&groups, args.output),
            Err(e) => Err(e.into()),
        },
        Command::Create {
            name,
            location,
            tags,
            no_tags,
        } => {
            let location = config.effective_location(location.as_deref());
            match service
                .create_resource_group(&name, &location, requested_tags(tags, no_tags))
                .await
            {
                Ok(group) => print_groups(std::slice::from_ref(&group), args.output),
                Err(e) => Err(e.into()),
            }
        }
        Command::Delete { name } => service
            .delete_resource_group(&name)
            .await
            .map_err(Into::into),
    };

    if let Err(err) = result {
        let message = match err.downcast_ref::<azrg::ResourceError>() {
            Some(resource_err) => format_arm_error(resource_err),
            None => err.to_string(),
        };
        tracing::error!("Command failed: {:?}", err);
        eprintln!("Error: {}", message);
        drop(log_guard);
        std::process::exit(1);
    }

    if config.subscription_id.as_deref() != Some(subscription.as_str()) {
        if let Err(e) = config.set_subscription(&subscription) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }

    Ok(())
}
