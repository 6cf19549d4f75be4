use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use platform_hal::HttpRestClient;
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EmployeeConsole, build_record, parse_assignments, render};

mod commands;
mod config;
mod watch;

use config::ConsoleConfig;
use watch::TerminalNotifier;

#[derive(Parser, Debug)]
#[command(name = "employee-console", version, about = "Browse and edit the employee directory")]
struct Cli {
    /// Base URL of the REST API
    #[arg(long, global = true, env = "API_BASE_URL")]
    api_base_url: Option<String>,
    /// Root path of the HAL API
    #[arg(long, global = true, env = "API_ROOT")]
    api_root: Option<String>,
    /// STOMP websocket endpoint
    #[arg(long, global = true, env = "PUSH_URL")]
    push_url: Option<String>,
    /// Records per page
    #[arg(long, global = true, env = "PAGE_SIZE")]
    page_size: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive view with live updates
    Watch,
    /// Print one page
    List {
        #[arg(long)]
        size: Option<u64>,
    },
    /// Submit a new employee from field=value pairs
    Create {
        #[arg(required = true)]
        fields: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::for_service("employee-console"))?;
    let cli = Cli::parse();

    let config = ConsoleConfig::load()?.with_overrides(
        cli.api_base_url,
        cli.api_root,
        cli.push_url,
        cli.page_size,
    )?;
    tracing::debug!(?config, "configuration loaded");

    let client = HttpRestClient::new(&config.api_base_url)
        .with_context(|| format!("invalid API_BASE_URL {}", config.api_base_url))?;
    let console = EmployeeConsole::new(
        Arc::new(client),
        config.api_root.clone(),
        Arc::new(TerminalNotifier::default()),
    )
    .with_page_size(config.page_size);

    match cli.command {
        Commands::Watch => watch::run(&console, &config.push_url).await?,
        Commands::List { size } => {
            console
                .load_from_server(size.unwrap_or(config.page_size))
                .await
                .context("failed to load employees")?;
            print!("{}", render(&console.snapshot()));
        }
        Commands::Create { fields } => {
            console
                .mount()
                .await
                .context("failed to load the employee schema")?;
            let record = build_record(&console.snapshot().attributes, &parse_assignments(&fields)?)?;
            console.on_create(record).await.context("create failed")?;
            tracing::info!("employee created");
        }
    }

    Ok(())
}
