//! # CLI - Firkin Interactive Shell
//!
//! A REPL-style front-end for the Firkin storage engine. Reads commands from
//! stdin, runs them against an open database, and prints results to stdout,
//! so it works both interactively and with piped scripts.
//!
//! ## Commands
//!
//! ```text
//! write key value...   Insert or update a key (the value may contain spaces)
//! read key             Print the value, or the error for a missing key
//! delete key           Remove a key (appends a tombstone)
//! compact              Run a compaction pass now
//! stats                Print engine debug state
//! exit | quit          Close the engine and leave
//! ```
//!
//! ## Flags
//!
//! ```text
//! firkin [OPTIONS] <DB_PATH>
//!   --max-log-size <BYTES>        head rollover threshold   (default 5000)
//!   --compaction-sleep-ms <MS>    compaction tick interval  (default 10000)
//!   -v, --verbose                 debug-level logging
//! ```
//!
//! Log filtering follows `RUST_LOG` when set; otherwise `info` (or `debug`
//! with `--verbose`).

use anyhow::Result;
use clap::Parser;
use engine::{Config, Engine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Interactive shell for the Firkin key-value store.
#[derive(Parser)]
#[command(name = "firkin", version, about)]
struct Cli {
    /// Database directory (created if absent)
    db_path: PathBuf,

    /// Head-segment rollover threshold in bytes
    #[arg(long = "max-log-size", default_value_t = 5_000)]
    max_log_size: u64,

    /// Compaction worker sleep time in milliseconds
    #[arg(long = "compaction-sleep-ms", default_value_t = 10_000)]
    compaction_sleep_ms: u64,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Write { key: String, value: String },
    Read { key: String },
    Delete { key: String },
    Compact,
    Stats,
    Exit,
}

/// Parses one input line. Blank lines parse to `None`; anything else either
/// becomes a [`Command`] or an error message for the user.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut parts = line.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Ok(None);
    };

    let command = match keyword.to_lowercase().as_str() {
        "write" => {
            let key = parts.next().ok_or("usage: write key value")?.to_string();
            let value = parts.collect::<Vec<&str>>().join(" ");
            if value.is_empty() {
                return Err("usage: write key value".to_string());
            }
            Command::Write { key, value }
        }
        "read" => Command::Read {
            key: parts.next().ok_or("usage: read key")?.to_string(),
        },
        "delete" => Command::Delete {
            key: parts.next().ok_or("usage: delete key")?.to_string(),
        },
        "compact" => Command::Compact,
        "stats" => Command::Stats,
        "exit" | "quit" => Command::Exit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::new(&cli.db_path)
        .log_file_size_threshold(cli.max_log_size)
        .compaction_interval(Duration::from_millis(cli.compaction_sleep_ms));
    let engine = Engine::open(config)?;

    println!(
        "firkin started (db={}, max_log_size={}, compaction_sleep_ms={})",
        cli.db_path.display(),
        cli.max_log_size,
        cli.compaction_sleep_ms
    );
    println!("commands: write key value | read key | delete key | compact | stats | exit");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Write { key, value })) => {
                match engine.write(key.as_bytes(), value.as_bytes()) {
                    Ok(()) => println!("OK"),
                    Err(e) => println!("ERR write failed: {}", e),
                }
            }
            Ok(Some(Command::Read { key })) => match engine.read(key.as_bytes()) {
                Ok(value) => println!("{}", String::from_utf8_lossy(&value)),
                Err(e) => println!("ERR read failed: {}", e),
            },
            Ok(Some(Command::Delete { key })) => match engine.delete(key.as_bytes()) {
                Ok(()) => println!("OK"),
                Err(e) => println!("ERR delete failed: {}", e),
            },
            Ok(Some(Command::Compact)) => match engine.compact() {
                Ok(()) => println!("OK (segments={})", engine.segment_count()),
                Err(e) => println!("ERR compact failed: {}", e),
            },
            Ok(Some(Command::Stats)) => println!("{:?}", engine),
            Ok(Some(Command::Exit)) => {
                println!("bye");
                break;
            }
            Err(message) => println!("ERR {}", message),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    engine.close()?;
    Ok(())
}
