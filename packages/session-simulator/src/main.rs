//! Session simulator CLI: runs bot-only matches against the engine in memory.
//!
//! Useful for shaking out state machine defects and for eyeballing how long
//! matches run at a given size and score cap.

mod output;
mod simulator;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use output::OutputWriter;
use simulator::{GameResult, Simulator};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "session-simulator")]
#[command(about = "Fast in-memory match simulator for the session engine")]
struct Args {
    /// Number of matches to simulate
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Players per match
    #[arg(short, long, default_value = "4", value_parser = clap::value_parser!(u16).range(3..=20))]
    players: u16,

    /// Score that wins a match
    #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=50))]
    max_score: u32,

    /// Base seed; match n uses seed + n. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON through the engine's telemetry setup
    #[arg(long)]
    json_logs: bool,

    /// Write one JSON line per match to this file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Gzip the output file
    #[arg(long, requires = "output")]
    compress: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.json_logs {
        party_backend::telemetry::init_tracing();
    } else {
        let filter = if args.verbose { "debug" } else { "warn" };
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let base_seed = args.seed.unwrap_or_else(rand::random);
    info!(
        games = args.games,
        players = args.players,
        max_score = args.max_score,
        base_seed,
        "Starting session simulator"
    );

    let mut writer = match &args.output {
        Some(path) => Some(OutputWriter::new(path, args.compress)?),
        None => None,
    };

    let start = Instant::now();
    let mut results = Vec::new();
    let mut errors = 0;

    for game in 1..=args.games {
        let seed = base_seed.wrapping_add(u64::from(game));
        let simulator = Simulator::new(seed, usize::from(args.players), args.max_score);
        match simulator.simulate_game(game) {
            Ok(result) => {
                if let Some(writer) = writer.as_mut() {
                    if let Err(e) = writer.write_game(&result) {
                        warn!("Failed to write result for game {}: {}", game, e);
                    }
                }
                info!(game, rounds = result.rounds, winner = result.winner_seat, "Game completed");
                results.push(result);
            }
            Err(e) => {
                errors += 1;
                warn!("Game {} (seed {}) failed: {}", game, seed, e);
            }
        }
    }

    if let Some(writer) = writer {
        let path = writer.path().to_path_buf();
        writer.finish()?;
        println!("Results written to: {}", path.display());
    }

    print_summary(&results, errors, start.elapsed(), args.games, usize::from(args.players));
    Ok(())
}

fn print_summary(
    results: &[GameResult],
    errors: u32,
    elapsed: Duration,
    total: u32,
    players: usize,
) {
    println!("\n=== Simulation Summary ===");
    println!("Games completed: {}/{}", results.len(), total);
    if errors > 0 {
        println!("Errors: {}", errors);
    }
    println!("Total time: {:?}", elapsed);
    if results.is_empty() {
        return;
    }
    println!(
        "Average time per game: {:?}",
        elapsed / results.len() as u32
    );

    let rounds: Vec<u32> = results.iter().map(|r| r.rounds).collect();
    let total_rounds: u64 = rounds.iter().map(|r| u64::from(*r)).sum();
    println!(
        "Rounds per game: avg={:.1}, min={}, max={}",
        total_rounds as f64 / results.len() as f64,
        rounds.iter().min().copied().unwrap_or(0),
        rounds.iter().max().copied().unwrap_or(0)
    );

    let mut wins = vec![0u32; players];
    for result in results {
        if let Some(slot) = wins.get_mut(result.winner_seat) {
            *slot += 1;
        }
    }

    println!("\n=== Wins by Seat ===");
    for (seat, count) in wins.iter().enumerate() {
        let rate = (*count as f64 / results.len() as f64) * 100.0;
        println!("Seat {}: wins={} ({:.1}%)", seat, count, rate);
    }
}
