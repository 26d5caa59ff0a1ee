use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::infra::config::Config;

#[derive(Parser)]
#[command(name = "drive-mcp-gateway")]
#[command(about = "Google Drive MCP gateway")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway (default). MODE selects streamable HTTP or stdio.
    Serve,
    /// Health check a running gateway
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Load and validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Print the tool catalogue as JSON
    Tools,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => {
            crate::infra::logging::init();
            let result = match Config::from_env_and_toml() {
                Ok(cfg) => crate::infra::boot::run_server(cfg).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %format!("{e:#}"), "gateway stopped");
                    eprintln!("❌ {e:#}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate } => match load_config(validate) {
            Ok(cfg) => {
                print_config(&cfg);
                if validate {
                    println!("✅ Configuration is valid");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Tools => match tool_catalogue() {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Could not render tool catalogue: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn load_config(validate: bool) -> anyhow::Result<Config> {
    let cfg = Config::from_env_and_toml()?;
    if validate {
        cfg.validate()?;
    }
    Ok(cfg)
}

fn print_config(cfg: &Config) {
    println!("📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!("  Drive API: {}", cfg.drive.api_base_url);
    println!("  Drive upload: {}", cfg.drive.upload_base_url);
    println!(
        "  Access token: {}",
        if cfg.access_token.is_some() { "set" } else { "not set" }
    );
}

fn tool_catalogue() -> Result<String, serde_json::Error> {
    let registry = crate::tools::registry::build_registry();
    let tools: Vec<_> = registry.tools().map(crate::infra::mcp::to_mcp_tool).collect();
    serde_json::to_string_pretty(&tools)
}
