//! KungFu Chess headless runner
//!
//! Loads settings and a board layout, optionally replays a JSON-lines command
//! script from a producer thread, ticks until exit or a tick limit, then
//! prints the move history and score.

use anyhow::{Context, Result};
use clap::Parser;
use kungfu_chess::core::{init_tracing, GameSettings};
use kungfu_chess::game::assets::DirectoryCatalog;
use kungfu_chess::game::resources::{MoveTracker, ScoreTracker};
use kungfu_chess::game::{
    BoardLayout, Command, CommandSender, EventBus, GameClock, GameContext, MonotonicClock,
    Orchestrator, Side,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kungfu-chess")]
#[command(about = "Run the real-time chess engine headless", long_about = None)]
struct Cli {
    /// Settings JSON file (defaults to the platform config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Board layout CSV (defaults to the standard opening)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// JSON-lines command script, one command per line
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop after this many ticks even without an exit command
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Piece sprite root (`<dir>/<code>/states/idle`)
    #[arg(long)]
    pieces_dir: Option<PathBuf>,

    /// Write the move history to this file when the game stops
    #[arg(long)]
    export_history: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let settings = GameSettings::load_or_default(cli.settings.as_deref());
    let layout = match &cli.layout {
        Some(path) => BoardLayout::load(path)
            .with_context(|| format!("loading layout {}", path.display()))?,
        None => BoardLayout::standard(),
    };
    let script = match &cli.script {
        Some(path) => parse_script(
            &fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?,
        )?,
        None => Vec::new(),
    };

    let bus = Arc::new(EventBus::new());
    let history = MoveTracker::attach(&bus, layout.board.rows);
    let score = ScoreTracker::attach(&bus);

    let mut ctx = GameContext::from_layout(&layout, &settings, Arc::clone(&bus), 0)
        .context("building the initial position")?;
    if let Some(dir) = &cli.pieces_dir {
        ctx = ctx.with_assets(Box::new(DirectoryCatalog::new(dir)));
    }

    let clock = MonotonicClock::new(settings.time_factor);
    let mut orchestrator = Orchestrator::new(ctx, clock.clone(), &settings);

    let producer = if script.is_empty() {
        None
    } else {
        let sender = orchestrator.sender();
        let interval = settings.tick_interval_ms;
        Some(thread::spawn(move || replay(script, sender, clock, interval)))
    };

    let ticks = orchestrator.run(cli.max_ticks);
    info!(
        "[MAIN] Stopped after {} ticks: {}",
        ticks,
        orchestrator.state().message()
    );

    if let Some(handle) = producer {
        if !handle.is_finished() {
            warn!("[MAIN] Script still had commands pending when the loop stopped");
        }
    }

    let history = history.lock();
    println!("{}", history.render());
    let score = score.lock();
    let (white, black) = score.scores();
    println!("Score: White {} - Black {}", white, black);
    for side in [Side::White, Side::Black] {
        println!("{} captured: {:?}", side.name(), score.captured_by(side));
    }

    if let Some(path) = &cli.export_history {
        history
            .export_to(path)
            .with_context(|| format!("exporting history to {}", path.display()))?;
        info!("[MAIN] History written to {}", path.display());
    }
    Ok(())
}

/// Parse a JSON-lines script; blank lines and `#` comments are skipped
fn parse_script(text: &str) -> Result<Vec<Command>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("script line {}", n))
        })
        .collect()
}

/// Push each command once the game clock reaches its timestamp
fn replay(script: Vec<Command>, sender: CommandSender, clock: MonotonicClock, interval_ms: u64) {
    for cmd in script {
        while clock.now_ms() < cmd.timestamp {
            clock.wait(interval_ms);
        }
        if sender.send(cmd).is_err() {
            // Loop already stopped
            return;
        }
    }
}
