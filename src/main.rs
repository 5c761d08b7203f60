use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{debug, info};

use bus_jam::simulation::{Autoplayer, ClickOutcome, GamePhase, LevelDefinition, Session};

#[derive(Parser)]
#[command(name = "bus_jam")]
#[command(about = "Headless bus jam puzzle simulation")]
struct Cli {
    /// Level JSON file to play (defaults to the built-in demo level)
    #[arg(long)]
    level: Option<PathBuf>,

    /// Seed for vehicle order and the autoplayer
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Maximum number of simulation ticks
    #[arg(long, default_value = "2000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Simulated seconds between autoplayer clicks
    #[arg(long, default_value = "0.5")]
    click_interval: f32,

    /// Only print the final outcome
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,bus_jam=info"))
        .init();

    let cli = Cli::parse();

    let level = match &cli.level {
        Some(path) => LevelDefinition::load(path)?,
        None => LevelDefinition::demo(),
    };

    run_headless(&level, &cli)
}

/// Run a level in headless mode (no graphics), clicking with the autoplayer
fn run_headless(level: &LevelDefinition, cli: &Cli) -> Result<()> {
    let delta = if cli.delta > 0.0 { cli.delta } else { 0.1 };
    let mut session = Session::from_level_with_seed(level, cli.seed)?;
    let mut player = Autoplayer::new_with_seed(cli.seed);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = (1.0 / delta).ceil() as u32;

    if !cli.quiet {
        println!("Running bus jam level '{}' in headless mode...", session.level_name());
        println!("Ticks: {}, Delta: {}s", cli.ticks, delta);
        println!();
        println!("Initial state:");
        session.print_summary();
        session.draw_map();
    }

    let mut since_click = cli.click_interval;
    let mut tick = 0;
    while tick < cli.ticks && !session.phase().is_terminal() {
        tick += 1;

        if since_click >= cli.click_interval {
            if let Some(id) = player.choose(&session) {
                match session.click(id) {
                    ClickOutcome::Accepted { slot } => {
                        debug!("Autoplayer sent passenger {:?} to slot {}", id.0, slot)
                    }
                    outcome => debug!("Autoplayer click on {:?}: {:?}", id.0, outcome),
                }
                since_click = 0.0;
            }
        }

        session.tick(delta);
        since_click += delta;
        session.drain_events();

        if !cli.quiet && tick % ticks_per_second == 0 {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick,
                tick as f32 * delta
            );
            session.print_summary();
            session.draw_map();
        }
    }

    if !cli.quiet {
        println!("=== Final State ===");
        session.print_summary();
        session.draw_map();
    }

    let outcome = match session.phase() {
        GamePhase::Won => "Won",
        GamePhase::Lost => "Lost",
        GamePhase::Paused | GamePhase::Running => "Unfinished",
    };
    info!("Finished after {} ticks", tick);
    println!("Outcome: {}", outcome);
    println!(
        "Boarded: {}, Vehicles departed: {}, Outstanding: {}",
        session.game_state().passengers_boarded,
        session.game_state().vehicles_departed,
        session.outstanding_passengers()
    );
    if let Some(reason) = session.loss_reason() {
        println!("Loss reason: {:?}", reason);
    }

    Ok(())
}
