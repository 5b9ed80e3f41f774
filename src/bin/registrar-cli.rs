use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Operator CLI for the certificate registrar", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8090")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service version and ledger reachability
    Status,
    /// List all certificate records
    List,
    /// Show one attempt's certificate record
    Show { id: String },
    /// Retry issuance for attempts that are not confirmed
    Retry {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Revoke confirmed certificates
    Revoke {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Read a certificate back from the registry contract
    Verify { id: String },
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

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::List => client.get(format!("{base}/admin/certificates")),
        Commands::Show { id } => client.get(format!("{base}/admin/certificates/{id}")),
        Commands::Verify { id } => client.get(format!("{base}/admin/certificates/{id}/verify")),
        Commands::Retry { ids } => client
            .post(format!("{base}/admin/certificates/retry"))
            .json(&json!({ "ids": ids })),
        Commands::Revoke { ids } => client
            .post(format!("{base}/admin/certificates/revoke"))
            .json(&json!({ "ids": ids })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
