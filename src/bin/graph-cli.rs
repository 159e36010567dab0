use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "graph-cli")]
#[command(about = "Command-line client for the graph gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness and upstream state
    Health,
    /// Probe the Gremlin endpoint through the gateway
    TestConnection,
    /// Create a vertex
    AddVertex {
        label: String,
        /// Property as key=value; repeatable
        #[arg(short, long = "property", value_parser = parse_property)]
        properties: Vec<(String, Value)>,
    },
    /// Create an edge between two vertex ids
    AddEdge {
        label: String,
        from: String,
        to: String,
        #[arg(short, long = "property", value_parser = parse_property)]
        properties: Vec<(String, Value)>,
    },
    /// List all vertices
    Vertices,
    /// List all edges
    Edges,
}

/// `key=value`; the value is read as JSON when it parses as a scalar, else as a string.
fn parse_property(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::String(_))) => v,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

fn to_map(properties: Vec<(String, Value)>) -> Map<String, Value> {
    properties.into_iter().collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::TestConnection => {
            client
                .post(format!("{}/test_connection", base))
                .send()
                .await?
        }
        Commands::AddVertex { label, properties } => {
            let body = serde_json::json!({ "label": label, "properties": to_map(properties) });
            client
                .post(format!("{}/vertices", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::AddEdge {
            label,
            from,
            to,
            properties,
        } => {
            let body = serde_json::json!({
                "label": label,
                "from": from,
                "to": to,
                "properties": to_map(properties),
            });
            client
                .post(format!("{}/edges", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Vertices => client.get(format!("{}/vertices", base)).send().await?,
        Commands::Edges => client.get(format!("{}/edges", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }

    println!("{}", rendered);
    Ok(())
}
