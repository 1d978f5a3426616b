use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the query proxy admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy system status
    Status,
    /// List clusters with per-node and per-credential running queries
    Clusters,
    /// List users with running queries and limits
    Users,
    /// Kill queries tagged with a client tag on every node of a cluster
    Kill {
        /// Cluster name
        cluster: String,
        /// Client tag (http_user_agent) the queries were sent with
        client_tag: String,
        /// Minimum elapsed seconds
        #[arg(short, long, default_value_t = 0)]
        elapsed_secs: u64,
    },
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

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Clusters => {
            client.get(format!("{}/admin/clusters", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Users => {
            client.get(format!("{}/admin/users", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Kill { cluster, client_tag, elapsed_secs } => {
            client.post(format!("{}/admin/kill", cli.url))
                .headers(headers)
                .json(&json!({
                    "cluster": cluster,
                    "client_tag": client_tag,
                    "elapsed_secs": elapsed_secs,
                }))
                .send()
                .await?
        }
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
