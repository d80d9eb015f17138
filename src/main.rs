use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rmon::api::{ApiClient, CatalogSource, SnapshotSource};
use rmon::config::{self, Config};
use rmon::costs::{self, CostHistory};
use rmon::exit_codes::exit_code_for_anyhow;
use rmon::global::{self, GLOBAL_ONLY};
use rmon::resources::region::{selectable_regions, RegionContext};
use rmon::resources::{self, CommandContext};
use rmon::session::SessionStore;
use rmon::utils::OutputFormat;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rmon")]
#[command(
    about = "Browse cloud cost-saving findings",
    long_about = "rmon lists the EC2 instances, RDS instances, EBS volumes, snapshots and\nElastic IPs the rmon backend flagged as potential savings.\n\nFeatures:\n  - Filter by region, instance type, tag, status and savings range\n  - Facets showing which filter values are available\n  - Paged card listing, export and savings summary\n  - Cost explorer and global (IAM/S3) findings\n  - Interactive terminal dashboard"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Read the catalog from a snapshot file instead of the backend
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store an access/refresh token pair
    Login {
        #[arg(short, long, env = "RMON_USERNAME")]
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "RMON_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget stored tokens
    Logout,
    /// Create a default configuration file
    Init {
        /// Path of the config file to write
        #[arg(short, long, default_value = ".rmon.toml")]
        path: PathBuf,
    },
    /// Show the account the backend reports on
    Account,
    /// List regions that have resources
    Regions {
        /// Include regions without resources
        #[arg(long)]
        all: bool,
    },
    /// Browse, summarize and export resources
    Resources {
        #[command(subcommand)]
        subcommand: resources::ResourceCommands,
    },
    /// Latest cumulative costs and cost history
    Costs {
        /// Start date (YYYY-MM-DD, default yesterday)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD, default tomorrow)
        #[arg(long)]
        end: Option<String>,
    },
    /// Inactive IAM users and empty S3 buckets
    Global {
        /// Region selection (global resources need Global)
        #[arg(long = "region")]
        regions: Vec<String>,
    },
    /// Interactive terminal dashboard
    Dashboard,
}

fn spinner(output: OutputFormat, message: &'static str) -> Option<ProgressBar> {
    if output == OutputFormat::Json {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let store = SessionStore::new(config.session.token_path());
    let client = ApiClient::new(&config.api, store)?;
    let snapshot = cli.snapshot.clone().map(SnapshotSource::new);
    let source: &dyn CatalogSource = match &snapshot {
        Some(snapshot) => snapshot,
        None => &client,
    };
    let output = cli.output;

    match cli.command {
        Commands::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            client.login(&username, &password).await?;
            println!("Logged in to {}", client.base_url());
        }
        Commands::Logout => {
            if client.logout().await? {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        Commands::Init { path } => {
            config::init_config(&path)?;
        }
        Commands::Account => {
            let pb = spinner(output, "Fetching account details...");
            let details = client.account_details().await;
            finish(pb);
            let details = details?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&details)?),
                _ => {
                    println!("Account: {}", details.account_id);
                    println!("Project: {}", details.project_name);
                }
            }
        }
        Commands::Regions { all } => {
            let regions = source.fetch_regions().await?;
            let shown: Vec<_> = if all {
                regions.iter().collect()
            } else {
                selectable_regions(&regions)
            };
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                _ => {
                    for region in shown {
                        println!("{:<20} {}", region.name, region.total_resources);
                    }
                }
            }
        }
        Commands::Resources { subcommand } => {
            let ctx = CommandContext {
                source,
                output,
                facet_preview_count: config.dashboard.facet_preview_count,
            };
            resources::handle_command(subcommand, &ctx).await?;
        }
        Commands::Costs { start, end } => {
            let (default_start, default_end) = costs::default_range(chrono::Local::now().date_naive());
            let start = match start {
                Some(s) => costs::parse_date("start", &s)?,
                None => default_start,
            };
            let end = match end {
                Some(s) => costs::parse_date("end", &s)?,
                None => default_end,
            };

            let pb = spinner(output, "Fetching cost data...");
            let fetched = futures::try_join!(client.latest_cost(), client.cost_history(start, end));
            finish(pb);
            let (latest, history) = fetched?;

            match output {
                OutputFormat::Json => {
                    let labels = costs::day_labels(start, history.days());
                    let body = serde_json::json!({
                        "latest": latest,
                        "history": history,
                        "labels": labels,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                _ => {
                    latest.print();
                    println!();
                    history.print(start);
                    if let CostHistory::NoData { .. } = history {
                        warn!("No cost history between {} and {}", start, end);
                    }
                }
            }
        }
        Commands::Global { regions } => {
            let region = RegionContext::from_regions(regions);
            if !region.is_global() {
                println!("{}", GLOBAL_ONLY);
                return Ok(());
            }
            let pb = spinner(output, "Fetching global resources...");
            let fetched = global::fetch_global(&client, &region).await;
            finish(pb);
            let resources = fetched?;
            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resources)?),
                _ => resources.print(),
            }
        }
        Commands::Dashboard => {
            let account = if snapshot.is_some() {
                None
            } else {
                match client.account_details().await {
                    Ok(details) => Some(details),
                    Err(e) => {
                        warn!("Account details unavailable: {}", e);
                        None
                    }
                }
            };
            rmon::dashboard::run_dashboard(
                source,
                account,
                Duration::from_millis(config.dashboard.poll_interval_ms),
                config.dashboard.facet_preview_count,
            )
            .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only warnings and errors unless --verbose; RUST_LOG overrides both
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
}
