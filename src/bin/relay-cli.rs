use clap::{Parser, Subcommand};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Management CLI for the campaign relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "RELAY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay status
    Status,
    /// Manage domain → campaign mappings
    #[command(subcommand)]
    Domains(DomainCommands),
    /// Manage the spy referrer blocklist
    #[command(subcommand)]
    Spy(SpyCommands),
    /// Run a lookup the way a landing page would
    Lookup {
        domain: String,
        #[arg(long)]
        referrer: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Classify a referrer without resolving anything
    Classify { referrer: Option<String> },
}

#[derive(Subcommand)]
enum DomainCommands {
    /// List all mappings, newest first
    List,
    /// Store (or replace) a mapping
    Add { domain: String, campaign_id: String },
    /// Change a mapping by id
    Update { id: i64, domain: String, campaign_id: String },
    /// Remove a mapping by id
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum SpyCommands {
    List,
    Add { domain: String },
    Remove { domain: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let call = |method: Method, path: &str| client.request(method, format!("{}{}", base, path));

    let request = match cli.command {
        Commands::Status => call(Method::GET, "/admin/status"),
        Commands::Domains(DomainCommands::List) => call(Method::GET, "/api/domains"),
        Commands::Domains(DomainCommands::Add { domain, campaign_id }) => call(Method::POST, "/api/domains")
            .json(&json!({ "domain": domain, "campaignID": campaign_id })),
        Commands::Domains(DomainCommands::Update { id, domain, campaign_id }) => {
            call(Method::PUT, &format!("/api/domains/{}", id))
                .json(&json!({ "domain": domain, "campaignID": campaign_id }))
        }
        Commands::Domains(DomainCommands::Delete { id }) => {
            call(Method::DELETE, &format!("/api/domains/{}", id))
        }
        Commands::Spy(SpyCommands::List) => call(Method::GET, "/admin/spy-domains"),
        Commands::Spy(SpyCommands::Add { domain }) => {
            call(Method::POST, "/admin/spy-domains").json(&json!({ "domain": domain }))
        }
        Commands::Spy(SpyCommands::Remove { domain }) => {
            call(Method::DELETE, &format!("/admin/spy-domains/{}", domain))
        }
        Commands::Lookup { domain, referrer, query } => call(Method::POST, "/api/domains/test")
            .json(&json!({ "domain": domain, "referrer": referrer, "query": query })),
        Commands::Classify { referrer } => {
            call(Method::POST, "/admin/classify").json(&json!({ "referrer": referrer }))
        }
    };

    send(request).await
}

async fn send(request: RequestBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: relay returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }
    Ok(())
}
