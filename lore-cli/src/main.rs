//! lore-cli — command-line client for the Lore question-answering service
//!
//! Talks to a running `lore-server` over HTTP.
//!
//! # Subcommands
//! - `ask <question>`                                  — answer a question
//! - `list [--json]`                                   — list stored QA entries
//! - `add --question <q> --answer <a>`                 — create an entry
//! - `update <id> --answer <a> [--question <q>]`       — update an entry
//! - `delete <id>`                                     — delete an entry
//! - `status`                                          — show server health

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";
const REQUEST_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "lore-cli", version, about = "Lore question-answering client")]
struct Cli {
    /// Lore HTTP server URL (overrides LORE_HTTP_URL env var)
    #[arg(long, env = "LORE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// Question text, passed verbatim
        question: String,
    },

    /// List stored QA entries
    List {
        /// Print the raw JSON array
        #[arg(long)]
        json: bool,
    },

    /// Add a QA entry
    Add {
        #[arg(short, long)]
        question: String,

        #[arg(short, long)]
        answer: String,
    },

    /// Update an entry's answer (and optionally its question)
    Update {
        id: i64,

        #[arg(short, long)]
        answer: String,

        #[arg(short, long)]
        question: Option<String>,
    },

    /// Delete an entry
    Delete { id: i64 },

    /// Show Lore server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QaEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub data: (String, String),
}

// ============================================================================
// Output formatting
// ============================================================================

/// One line per entry: `#id  question  →  answer`, both sides capped at 60 chars.
pub fn format_entry(entry: &QaEntry) -> String {
    format!(
        "#{:<4} {}  →  {}",
        entry.id,
        truncate(&entry.question, 60),
        truncate(&entry.answer, 60)
    )
}

/// First line of `text`, cut to `max` chars with a trailing ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim_end();
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() <= max && line.len() == text.len() {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

/// Append `path` to the server base, tolerating a trailing slash on the base.
pub fn endpoint(server: &str, path: &str) -> String {
    format!("{}{}", server.trim_end_matches('/'), path)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Send the request and return the response body, failing on non-2xx.
fn send(req: reqwest::blocking::RequestBuilder) -> anyhow::Result<String> {
    let resp = req.send()?;
    let status = resp.status();
    let body = resp.text().unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("server returned {}: {}", status, body);
    }
    Ok(body)
}

fn do_ask(server: &str, question: &str) -> anyhow::Result<()> {
    let req = client()?
        .get(endpoint(server, "/"))
        .query(&[("question", question)]);
    println!("{}", send(req)?);
    Ok(())
}

fn do_list(server: &str, json_output: bool) -> anyhow::Result<()> {
    let body = send(client()?.get(endpoint(server, "/embeds")))?;

    if json_output {
        println!("{}", body);
        return Ok(());
    }

    let entries: Vec<QaEntry> = serde_json::from_str(&body)?;
    if entries.is_empty() {
        eprintln!("No entries stored");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn do_add(server: &str, question: &str, answer: &str) -> anyhow::Result<()> {
    let req = client()?
        .post(endpoint(server, "/embeds"))
        .json(&serde_json::json!({ "question": question, "answer": answer }));
    let created: CreatedResponse = serde_json::from_str(&send(req)?)?;
    println!("Added #{}: {}", created.id, created.data.0);
    Ok(())
}

fn do_update(
    server: &str,
    id: i64,
    answer: &str,
    question: Option<&str>,
) -> anyhow::Result<()> {
    let mut body = serde_json::json!({ "answer": answer });
    if let Some(q) = question {
        body["question"] = serde_json::Value::from(q);
    }
    let req = client()?
        .put(endpoint(server, &format!("/embeds/{}", id)))
        .json(&body);
    send(req)?;
    println!("Updated #{}", id);
    Ok(())
}

fn do_delete(server: &str, id: i64) -> anyhow::Result<()> {
    send(client()?.delete(endpoint(server, &format!("/embeds/{}", id))))?;
    println!("Deleted #{}", id);
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = endpoint(server, "/health");
    let resp = match client()?.get(&url).send() {
        Ok(r) => r,
        Err(e) => anyhow::bail!("cannot reach {}: {}", url, e),
    };

    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!(
            "server unhealthy (HTTP {}): {}",
            status,
            body["error"].as_str().unwrap_or("unknown error")
        );
    }

    println!("Lore server:  {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:      {}", body["version"].as_str().unwrap_or("?"));
    println!("Store:        {}", body["store"].as_str().unwrap_or("?"));
    println!("Store info:   {}", body["store_info"].as_str().unwrap_or("?"));
    println!("Vector index: {}", body["vector_index"].as_str().unwrap_or("?"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.as_str();

    let result = match &cli.command {
        Commands::Ask { question } => do_ask(server, question),
        Commands::List { json } => do_list(server, *json),
        Commands::Add { question, answer } => do_add(server, question, answer),
        Commands::Update {
            id,
            answer,
            question,
        } => do_update(server, *id, answer, question.as_deref()),
        Commands::Delete { id } => do_delete(server, *id),
        Commands::Status => do_status(server),
    };

    if let Err(e) = result {
        eprintln!("lore-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
