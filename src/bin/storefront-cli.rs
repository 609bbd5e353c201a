use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Diagnostics CLI for the storefront application", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "STOREFRONT_ADMIN_API_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap health report
    Health,
    /// Version, mode and initialization state
    Status,
    /// Initialized components in order
    Components,
    /// Per-component timing log
    Log,
    /// Errors from the last failed bootstrap
    Errors,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/health",
            Commands::Status => "/admin/status",
            Commands::Components => "/admin/components",
            Commands::Log => "/admin/log",
            Commands::Errors => "/admin/errors",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path()))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    // /health answers 503 with a JSON body while not initialized.
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => {
            eprintln!("Error: diagnostics API returned status {}", status);
            if !body.is_empty() {
                eprintln!("Response: {}", body);
            }
        }
    }
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
