mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use mcp::ChannelConfig;
use runtime::providers::AnthropicBackend;
use runtime::{McpToolHost, Session};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::Result;

const CONFIG_FILE: &str = "moor.toml";
const SYSTEM_PROMPT: &str =
    "You are Moor, a helpful assistant. Use the available tools when a question needs live data.";

#[derive(Parser)]
#[command(name = "moor")]
#[command(about = "Chat with a model that can call tools on an MCP server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat backed by a tool server
    Chat {
        /// Tool server entry point (.py, .js, or an executable)
        server: PathBuf,
        /// Extra arguments passed through to the server
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        server_args: Vec<String>,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
    },
    /// List the tools a server exposes, then exit
    Tools {
        /// Tool server entry point (.py, .js, or an executable)
        server: PathBuf,
        /// Extra arguments passed through to the server
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        server_args: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            server,
            server_args,
            model,
        } => cmd_chat(&server, &server_args, model).await,
        Commands::Tools {
            server,
            server_args,
        } => cmd_tools(&server, &server_args).await,
    }
}

async fn cmd_chat(
    server: &Path,
    server_args: &[String],
    model_override: Option<String>,
) -> Result<()> {
    let config = Config::load_or_default(CONFIG_FILE)?;
    let api_key = config.api_key()?;
    let model = model_override.unwrap_or(config.backend.model);

    let backend = AnthropicBackend::builder(api_key)
        .model(&model)
        .system(SYSTEM_PROMPT)
        .build();

    let session = Session::connect(backend, server_command(server, server_args))
        .await?
        .with_max_rounds(config.session.max_rounds);

    let tool_names: Vec<&str> = session
        .descriptors()
        .iter()
        .map(|d| d.name.as_str())
        .collect();

    println!("moor v{}", env!("CARGO_PKG_VERSION"));
    println!("Connected with tools: {}", tool_names.join(", "));
    println!("Model: {model}");
    println!("Type a query, or 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("query> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        // A failed query is reported and the session stays open.
        match session.process_query(query).await {
            Ok(answer) => println!("\n{answer}\n"),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    session.shutdown().await?;
    println!("\nSession ended.");
    Ok(())
}

async fn cmd_tools(server: &Path, server_args: &[String]) -> Result<()> {
    let host = McpToolHost::connect(server_command(server, server_args)).await?;

    for descriptor in host.descriptors() {
        println!("{}", descriptor.name);
        if !descriptor.description.is_empty() {
            println!("  {}", descriptor.description);
        }
        println!("  schema: {}", descriptor.schema.to_value());
    }

    host.shutdown().await?;
    Ok(())
}

/// Pick the launcher by file extension: scripts go through their
/// interpreter, anything else is run directly.
fn server_command(server: &Path, extra_args: &[String]) -> ChannelConfig {
    let path = server.to_string_lossy().into_owned();
    let config = match server.extension().and_then(|ext| ext.to_str()) {
        Some("py") => ChannelConfig::new("python3").arg(path),
        Some("js") => ChannelConfig::new("node").arg(path),
        _ => ChannelConfig::new(path),
    };
    config.args(extra_args.iter().cloned())
}
