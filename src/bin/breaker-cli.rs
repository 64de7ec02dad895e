use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "breaker-cli")]
#[command(about = "Management CLI for the payment circuit breaker", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a provider's circuit state
    Status {
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Generate a status summary for a provider
    Summary {
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Show cumulative retry/success/failure metrics
    Metrics {
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Submit a payment
    Pay {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        amount: f64,
        #[arg(short, long, default_value = "USD")]
        currency: String,
        #[arg(short, long)]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status { provider } => {
            client.get(format!("{base}/status")).query(&provider_query(provider)).send().await?
        }
        Commands::Summary { provider } => {
            client
                .get(format!("{base}/status/summary"))
                .query(&provider_query(provider))
                .send()
                .await?
        }
        Commands::Metrics { provider } => {
            client.get(format!("{base}/metrics")).query(&provider_query(provider)).send().await?
        }
        Commands::Pay {
            provider,
            amount,
            currency,
            source,
        } => {
            let body = json!({
                "provider": provider,
                "amount": amount,
                "currency": currency,
                "source": source,
            });
            client.post(format!("{base}/pay")).json(&body).send().await?
        }
    };

    print_response(res).await
}

fn provider_query(provider: Option<String>) -> Vec<(&'static str, String)> {
    provider.map(|p| vec![("provider", p)]).unwrap_or_default()
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
