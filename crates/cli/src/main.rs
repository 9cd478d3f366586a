//! Guildtune CLI - Command-line client for the Guildtune daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9531";

#[derive(Parser)]
#[command(name = "guildtune")]
#[command(about = "Guildtune playback daemon CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "GUILDTUNE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue a search query for a guild
    Play {
        #[arg(short, long)]
        guild: String,

        /// Text channel that receives the replies
        #[arg(short, long)]
        channel: String,

        /// Requesting user (must be in a voice channel)
        #[arg(short, long)]
        user: String,

        /// Search terms
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Deliver a raw chat message (e.g. "!yt lofi beats")
    Say {
        #[arg(short, long)]
        guild: String,

        #[arg(short, long)]
        channel: String,

        #[arg(short, long)]
        user: String,

        /// Mark the author as a bot
        #[arg(long)]
        bot: bool,

        content: String,
    },

    /// Show a guild's queue
    Queue {
        #[arg(short, long)]
        guild: String,
    },

    /// Record that a user joined a voice channel
    Join {
        #[arg(short, long)]
        guild: String,

        #[arg(short, long)]
        user: String,

        /// Voice channel id
        voice_channel: String,
    },

    /// Record that a user left voice
    Leave {
        #[arg(short, long)]
        guild: String,

        #[arg(short, long)]
        user: String,
    },

    /// Show the latest replies posted to a text channel
    Messages {
        channel: String,

        /// Number of messages to tail
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,
    },

    /// Show daemon status
    Status,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct PlayResult {
    request_id: String,
    title: String,
    position: usize,
    worker_started: bool,
}

#[derive(Tabled)]
struct QueueRow {
    position: usize,
    title: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_played(result: serde_json::Value) -> Result<()> {
    let played: PlayResult = serde_json::from_value(result)?;
    println!("{}", "✓ Added to queue".green().bold());
    println!();
    println!("{}", Table::new(vec![played]));
    Ok(())
}

fn print_queue(queue: &serde_json::Value) {
    let titles: Vec<String> = queue["titles"]
        .as_array()
        .map(|titles| {
            titles
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    println!(
        "{} {}/{}",
        "Queue:".cyan().bold(),
        queue["length"],
        queue["capacity"]
    );
    if titles.is_empty() {
        println!("{}", "Nothing queued".yellow());
        return;
    }
    let rows: Vec<QueueRow> = titles
        .into_iter()
        .enumerate()
        .map(|(i, title)| QueueRow {
            position: i + 1,
            title,
        })
        .collect();
    println!("{}", Table::new(rows));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            guild,
            channel,
            user,
            query,
        } => {
            let params = json!({
                "guild_id": guild,
                "channel_id": channel,
                "user_id": user,
                "query": query.join(" "),
            });

            let result = call_rpc(&cli.rpc_url, "music.play.v1", params).await?;
            print_played(result)?;
        }

        Commands::Say {
            guild,
            channel,
            user,
            bot,
            content,
        } => {
            let params = json!({
                "guild_id": guild,
                "channel_id": channel,
                "author_id": user,
                "author_is_bot": bot,
                "content": content,
            });

            let result = call_rpc(&cli.rpc_url, "chat.message.v1", params).await?;
            if !result["handled"].as_bool().unwrap_or(false) {
                println!("{}", "Message ignored (not a command)".yellow());
            } else if !result["play"].is_null() {
                print_played(result["play"].clone())?;
            } else if !result["queue"].is_null() {
                print_queue(&result["queue"]);
            }
        }

        Commands::Queue { guild } => {
            let result = call_rpc(&cli.rpc_url, "music.queue.v1", json!({ "guild_id": guild })).await?;
            print_queue(&result);
        }

        Commands::Join {
            guild,
            user,
            voice_channel,
        } => {
            let params = json!({
                "guild_id": guild,
                "user_id": user,
                "channel_id": voice_channel,
            });

            call_rpc(&cli.rpc_url, "voice.join.v1", params).await?;
            println!(
                "{}",
                format!("✓ {} is in voice channel {}", user, voice_channel)
                    .green()
                    .bold()
            );
        }

        Commands::Leave { guild, user } => {
            let params = json!({ "guild_id": guild, "user_id": user });

            let result = call_rpc(&cli.rpc_url, "voice.leave.v1", params).await?;
            if result["changed"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ {} left voice", user).green().bold());
            } else {
                println!("{}", format!("{} was not in voice", user).yellow());
            }
        }

        Commands::Messages { channel, lines } => {
            let params = json!({ "channel_id": channel, "lines": lines });

            let result = call_rpc(&cli.rpc_url, "chat.tail.v1", params).await?;
            let messages = result["messages"].as_array().cloned().unwrap_or_default();

            if messages.is_empty() {
                println!("{}", "No messages".yellow());
            } else {
                println!("{}", format!("Messages in {}:", channel).cyan().bold());
                for message in messages {
                    println!(
                        "  {} {}",
                        format!("[{}]", message["sent_at"]).dimmed(),
                        message["message"].as_str().unwrap_or_default()
                    );
                }
            }
        }

        Commands::Status => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {}", "Version:".bold(), stats["version"]);
                    println!();
                    println!("  {} {}", "Active Guilds:".bold(), stats["active_guilds"]);
                    println!("  {} {}", "Max Queue Size:".bold(), stats["max_queue_size"]);
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
