mod chat;
mod db;
mod parser;
mod render;
mod settings;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use parser::Spot;
use settings::Settings;

#[derive(Parser)]
#[command(name = "spot_finder", about = "Tourism spot finder over a chat backend")]
struct Cli {
    /// SQLite database path (overrides SPOTS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract spots from a saved response (file or stdin)
    Extract {
        /// Response text file; reads stdin when omitted or "-"
        file: Option<PathBuf>,
        /// Print spots as JSON instead of chat text
        #[arg(long)]
        json: bool,
    },
    /// Ask the chat backend and extract spots from its answer
    Ask {
        /// The tourism query
        #[arg(required = true)]
        query: Vec<String>,
        /// Conversation to continue (overrides SPOTS_SESSION)
        #[arg(short, long)]
        session: Option<String>,
        /// Chat backend URL (overrides SPOTS_ENDPOINT)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Extract and store every *.txt response in a directory
    Import {
        dir: PathBuf,
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Stored spots table
    Spots {
        #[arg(short, long)]
        session: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Stored exchanges, newest first
    History {
        #[arg(short, long)]
        session: Option<String>,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show storage statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Extract { file, json } => {
            let text = read_input(file.as_deref())?;
            let spots = parser::process_response(&text);
            info!(spots = spots.len(), "Extracted spots");
            if json {
                println!("{}", serde_json::to_string_pretty(&spots)?);
            } else {
                print_reply(&spots);
            }
            Ok(())
        }
        Commands::Ask {
            query,
            session,
            endpoint,
        } => {
            let query = query.join(" ").trim().to_string();
            if query.is_empty() {
                return Ok(());
            }
            let session = session.unwrap_or(settings.session);
            let endpoint = endpoint.unwrap_or(settings.endpoint);

            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let history = chat::History::from_exchanges(db::fetch_history(&conn, &session)?);
            let client = chat::ChatClient::new(endpoint);

            println!("You: {}", query);
            println!("Finding tourism spots...\n");

            let t_ask = Instant::now();
            let reply = client.send(&query, &history).await;
            let latency_ms = Some(t_ask.elapsed().as_millis() as i64);

            let (exchange, spots) = match reply {
                Ok(text) => {
                    let spots = parser::process_response(&text);
                    print_reply(&spots);
                    let exchange = db::ExchangeRow {
                        session,
                        query,
                        response: Some(text),
                        error: None,
                        latency_ms,
                        created_at: now(),
                    };
                    (exchange, spots)
                }
                Err(e) => {
                    warn!("Chat request failed: {:#}", e);
                    println!("Error: {:#}", e);
                    let exchange = db::ExchangeRow {
                        session,
                        query,
                        response: None,
                        error: Some(format!("{:#}", e)),
                        latency_ms,
                        created_at: now(),
                    };
                    (exchange, Vec::new())
                }
            };
            db::save_exchange(&conn, &exchange, &spots)?;
            Ok(())
        }
        Commands::Import { dir, session } => {
            let session = session.unwrap_or(settings.session);
            let files = list_responses(&dir)?;
            if files.is_empty() {
                println!("No *.txt responses in {}.", dir.display());
                return Ok(());
            }
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Importing {} responses...", files.len());
            let counts = import_responses(&conn, &files, &session)?;
            println!(
                "Saved {} exchanges, {} spots ({} without spots).",
                counts.exchanges, counts.spots, counts.empty
            );
            Ok(())
        }
        Commands::Spots { session, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_spots(&conn, session.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No spots found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:>4} | {:<20} | {:>3} | {:<28} | {:<10} | {:<6}",
                "#", "Xchg", "Query", "No.", "Spot", "Price", "Rating"
            );
            println!("{}", "-".repeat(94));

            for (i, r) in rows.iter().enumerate() {
                let price = r.spot.ticket_price.as_deref().unwrap_or("-");
                let rating = r
                    .spot
                    .rating
                    .map(|v| format!("{}/5", v))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:>3} | {:>4} | {:<20} | {:>3} | {:<28} | {:<10} | {:<6}",
                    i + 1,
                    r.exchange_id,
                    truncate(&r.query, 20),
                    r.spot.number,
                    truncate(&r.spot.name, 28),
                    truncate(price, 10),
                    rating
                );
            }

            println!("\n{} spots", rows.len());
            Ok(())
        }
        Commands::History { session, limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_exchanges(&conn, session.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No exchanges yet.");
                return Ok(());
            }

            println!(
                "{:>4} | {:<12} | {:<16} | {:<32} | {:>5} | {:>7}",
                "id", "Session", "When", "Query", "Spots", "ms"
            );
            println!("{}", "-".repeat(92));
            for r in &rows {
                let latency = r.latency_ms.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
                println!(
                    "{:>4} | {:<12} | {:<16} | {:<32} | {:>5} | {:>7}",
                    r.id,
                    truncate(&r.session, 12),
                    format_timestamp(&r.created_at),
                    truncate(&r.query, 32),
                    r.spot_count,
                    latency
                );
                if let Some(err) = &r.error {
                    println!("     └ error: {}", truncate(err, 80));
                }
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Exchanges: {}", s.exchanges);
            println!("Errors:    {}", s.errors);
            println!("No spots:  {}", s.empty);
            println!("Spots:     {}", s.spots);
            println!("Sessions:  {}", s.sessions);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_reply(spots: &[Spot]) {
    println!("{}", render::chat_message(spots));
    println!();
    println!("{}", render::cards_text(&render::result_cards(spots)));
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// `*.txt` files in `dir`, sorted by name.
fn list_responses(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

struct ImportCounts {
    exchanges: usize,
    spots: usize,
    empty: usize,
}

fn import_responses(
    conn: &rusqlite::Connection,
    files: &[PathBuf],
    session: &str,
) -> Result<ImportCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = ImportCounts {
        exchanges: 0,
        spots: 0,
        empty: 0,
    };

    for chunk in files.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| -> Result<(String, String, Vec<Spot>)> {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let query = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let spots = parser::process_response(&text);
                Ok((query, text, spots))
            })
            .collect();

        for result in results {
            let (query, text, spots) = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("Skipping response: {:#}", e);
                    pb.inc(1);
                    continue;
                }
            };
            if spots.is_empty() {
                counts.empty += 1;
            }
            counts.exchanges += 1;
            counts.spots += spots.len();
            let exchange = db::ExchangeRow {
                session: session.to_string(),
                query,
                response: Some(text),
                error: None,
                latency_ms: None,
                created_at: now(),
            };
            db::save_exchange(conn, &exchange, &spots)?;
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    info!(
        "Imported {} responses ({} spots)",
        counts.exchanges, counts.spots
    );
    Ok(counts)
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| truncate(ts, 16))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_fixture_directory() {
        let files = list_responses(Path::new("tests/fixtures")).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));

        let conn = rusqlite::Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let counts = import_responses(&conn, &files, "fixtures").unwrap();
        assert_eq!(counts.exchanges, 3);
        assert_eq!(counts.spots, 8);
        assert_eq!(counts.empty, 1);

        let history = db::fetch_history(&conn, "fixtures").unwrap();
        let queries: Vec<&str> = history.iter().map(|(q, _)| q.as_str()).collect();
        assert_eq!(queries, vec!["bali", "paris", "prose"]);
    }

    #[test]
    fn timestamps_render_compactly() {
        assert_eq!(format_timestamp("2026-10-16T09:05:33.123+00:00"), "2026-10-16 09:05");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("Colosseum", 20), "Colosseum");
        assert_eq!(truncate("Sagrada Família", 7), "Sagrada...");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
