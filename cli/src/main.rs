//! # 2048 CLI
//!
//! Headless driver for the rule engine. By default it reads one command per
//! line from stdin (`left`, `up`, `r`, `q`, ...) and prints the board after
//! each; with `--episodes` it runs simulations with a simple move policy.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use game_2048_engine::{Command, CommandOutcome, Direction, Game};
use log::{debug, info, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(name = "game-2048")]
#[command(author, version, about = "Drive the 2048 engine from stdin or run simulations")]
struct Args {
    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Random legal moves
    Random,
    /// Cycle through moves: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(episodes) = args.episodes {
        let summary = run_headless(&args, episodes, &mut out)?;
        summary.write_to(&mut out, &args)?;
    } else {
        let stdin = io::stdin();
        run_play(args.seed, stdin.lock(), &mut out)?;
    }
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

// =============================================================================
// Command-stream mode
// =============================================================================

/// Feed each line of `input` to a fresh game until `quit` or end of input.
fn run_play<I: BufRead, W: Write>(seed: u64, input: I, out: &mut W) -> Result<Game> {
    let mut game = Game::new(seed);
    writeln!(out, "=== 2048 ===")?;
    writeln!(out, "Commands: left/right/up/down (or a/d/w/s) | r to restart | q to quit\n")?;
    write!(out, "{game}")?;

    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                warn!("{err}");
                writeln!(out, "  ? {}", line.trim())?;
                continue;
            }
        };

        match game.apply_command(command) {
            CommandOutcome::Moved(result) => {
                write!(out, "{game}")?;
                if result.reward > 0 {
                    writeln!(out, "  +{} points!", result.reward)?;
                }
                if result.done {
                    writeln!(out, "\n  *** GAME OVER ***")?;
                    writeln!(out, "  Final Score: {}", game.score())?;
                    writeln!(out, "  Max Tile: {}", game.max_tile())?;
                    writeln!(out, "\n  Enter r to restart or q to quit")?;
                }
            }
            CommandOutcome::Ignored => {
                debug!("ignored {command:?} after game over");
                writeln!(out, "  Game over. Enter r to restart or q to quit")?;
            }
            CommandOutcome::Restarted => {
                write!(out, "{game}")?;
            }
            CommandOutcome::Quit => {
                writeln!(out, "\nGoodbye!")?;
                break;
            }
        }
    }

    Ok(game)
}

// =============================================================================
// Headless simulation mode
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Summary {
    episodes: u32,
    avg_score: f64,
    median_score: f64,
    min_score: u32,
    max_score: u32,
    max_tile_overall: u32,
    /// Max tile reached -> number of episodes.
    tile_distribution: BTreeMap<u32, u32>,
}

impl Summary {
    fn from_episodes(mut scores: Vec<u32>, max_tiles: &[u32]) -> Self {
        let episodes = scores.len() as u32;
        scores.sort_unstable();

        let total: u64 = scores.iter().map(|&s| u64::from(s)).sum();
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            total as f64 / scores.len() as f64
        };
        let mid = scores.len() / 2;
        let median_score = match scores.len() {
            0 => 0.0,
            n if n % 2 == 0 => (f64::from(scores[mid - 1]) + f64::from(scores[mid])) / 2.0,
            _ => f64::from(scores[mid]),
        };

        let mut tile_distribution = BTreeMap::new();
        for &tile in max_tiles {
            *tile_distribution.entry(tile).or_insert(0) += 1;
        }

        Summary {
            episodes,
            avg_score,
            median_score,
            min_score: scores.first().copied().unwrap_or(0),
            max_score: scores.last().copied().unwrap_or(0),
            max_tile_overall: max_tiles.iter().copied().max().unwrap_or(0),
            tile_distribution,
        }
    }

    /// Print results in a parseable `key=value` format.
    fn write_to<W: Write>(&self, out: &mut W, args: &Args) -> io::Result<()> {
        writeln!(out, "=== Simulation Results ===")?;
        writeln!(out, "episodes={}", self.episodes)?;
        writeln!(out, "policy={:?}", args.policy)?;
        writeln!(out, "seed={}", args.seed)?;
        writeln!(out, "max_steps={}", args.max_steps)?;
        writeln!(out, "avg_score={:.2}", self.avg_score)?;
        writeln!(out, "median_score={:.2}", self.median_score)?;
        writeln!(out, "min_score={}", self.min_score)?;
        writeln!(out, "max_score={}", self.max_score)?;
        writeln!(out, "max_tile_overall={}", self.max_tile_overall)?;
        let distribution: Vec<String> = self
            .tile_distribution
            .iter()
            .map(|(tile, count)| format!("{tile}:{count}"))
            .collect();
        writeln!(out, "tile_distribution={}", distribution.join(","))
    }
}

/// Run `episodes` games with seeds `seed`, `seed + 1`, ...
fn run_headless<W: Write>(args: &Args, episodes: u32, out: &mut W) -> Result<Summary> {
    let mut scores = Vec::with_capacity(episodes as usize);
    let mut max_tiles = Vec::with_capacity(episodes as usize);

    // Move selection draws from its own stream so tile spawns stay seed-aligned.
    let mut policy_rng = SmallRng::seed_from_u64(args.seed.wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = args.seed.wrapping_add(u64::from(episode));
        let mut game = Game::new(episode_seed);
        let mut steps = 0;
        let mut cycle = 0;

        while !game.is_over() && (args.max_steps == 0 || steps < args.max_steps) {
            let direction = match args.policy {
                Policy::Random => select_random_move(&game, &mut policy_rng),
                Policy::Cycle => select_cycle_move(&game, &mut cycle),
            };
            let Some(direction) = direction else {
                break;
            };

            game.step(direction);
            steps += 1;

            if args.verbose {
                writeln!(out, "Episode {} Step {}: {}", episode + 1, steps, direction)?;
                write!(out, "{game}")?;
            }
        }

        info!(
            "episode {}: score={} max_tile={} steps={}",
            episode + 1,
            game.score(),
            game.max_tile(),
            steps
        );
        scores.push(game.score());
        max_tiles.push(game.max_tile());
    }

    Ok(Summary::from_episodes(scores, &max_tiles))
}

fn legal_directions(game: &Game) -> Vec<Direction> {
    let legal = game.legal_moves();
    Direction::all()
        .into_iter()
        .filter(|&d| legal[d as usize])
        .collect()
}

/// Select a random legal move.
fn select_random_move(game: &Game, rng: &mut SmallRng) -> Option<Direction> {
    legal_directions(game).choose(rng).copied()
}

/// Select moves in a cycle: Left, Down, Right, Up, skipping illegal ones.
fn select_cycle_move(game: &Game, cycle: &mut usize) -> Option<Direction> {
    const ORDER: [Direction; 4] = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];
    let legal = game.legal_moves();

    for _ in 0..ORDER.len() {
        let direction = ORDER[*cycle % ORDER.len()];
        *cycle += 1;
        if legal[direction as usize] {
            return Some(direction);
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
