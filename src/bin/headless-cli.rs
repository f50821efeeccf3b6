use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use headless_rest::config::{build_resolver, load_config, HeadlessConfig};

#[derive(Parser)]
#[command(name = "headless-cli")]
#[command(about = "Resolve URLs and query a running headless API", long_about = None)]
struct Cli {
    /// Base URL of a running server.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a URL offline and print its query descriptor
    Resolve {
        /// Config file providing the site base and rewrite rules
        #[arg(short, long)]
        config: Option<PathBuf>,
        url: String,
    },
    /// Fetch the post a URL points at
    Post { url: String },
    /// Fetch the content type a URL points at
    Type { url: String },
    /// Fetch the content listing a URL resolves to
    Query {
        url: String,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Fetch the home page content
    Home {
        #[arg(long)]
        page: Option<u32>,
    },
    /// Fetch a navigation menu by id, name or slug
    Menu { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = format!("{}/headless/v1", cli.url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    let request = match cli.command {
        Commands::Resolve { config, url } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => HeadlessConfig::default(),
            };
            let resolver = build_resolver(&config)?;
            let json = match resolver.resolve(&url) {
                Ok(descriptor) => serde_json::to_value(&descriptor)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
            return Ok(());
        }
        Commands::Post { url } => client.get(format!("{}/post-by-url/{}", base, url)),
        Commands::Type { url } => client.get(format!("{}/type-by-url/{}", base, url)),
        Commands::Query { url, page, per_page } => {
            let mut params = Vec::new();
            if let Some(page) = page {
                params.push(("page", page));
            }
            if let Some(per_page) = per_page {
                params.push(("per_page", per_page));
            }
            client.get(format!("{}/url_to_query/{}", base, url)).query(&params)
        }
        Commands::Home { page } => {
            let params: Vec<(&str, u32)> = page.map(|p| ("page", p)).into_iter().collect();
            client.get(format!("{}/home_page", base)).query(&params)
        }
        Commands::Menu { id } => client.get(format!("{}/menu/{}", base, id)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(total) = res.headers().get("x-wp-total").and_then(|v| v.to_str().ok()) {
        eprintln!("Total: {}", total);
    }
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
