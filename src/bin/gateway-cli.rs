use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;

use edge_gateway::auth::decode_unverified;
use edge_gateway::routing::RouteTable;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the edge gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how the gateway classifies a request
    Classify {
        /// HTTP method, e.g. POST
        method: String,
        /// Request path, e.g. /posts/5
        path: String,
    },
    /// Print a token's claims WITHOUT verifying it
    Decode {
        token: String,
    },
    /// Send a request through a running gateway
    Send {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short, long, default_value = "/posts")]
        path: String,

        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Bearer token to attach
        #[arg(short, long)]
        token: Option<String>,

        /// Correlation id to send as x-request-id
        #[arg(long)]
        request_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { method, path } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let verdict = RouteTable::standard().classify(&method, &path);
            println!("{method} {path}: {verdict}");
        }
        Commands::Decode { token } => match decode_unverified(&token) {
            Some(claims) => {
                eprintln!("warning: signature and expiry NOT checked");
                println!("{}", serde_json::to_string_pretty(&claims)?);
            }
            None => {
                eprintln!("Error: not a decodable token");
                std::process::exit(1);
            }
        },
        Commands::Send {
            url,
            path,
            method,
            token,
            request_id,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(token) = token {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {token}"))?,
                );
            }
            if let Some(id) = request_id {
                headers.insert("x-request-id", HeaderValue::from_str(&id)?);
            }

            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let res = reqwest::Client::new()
                .request(method, format!("{}{}", url.trim_end_matches('/'), path))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    println!("status:       {status}");
    println!("x-request-id: {request_id}");

    let text = res.text().await?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
