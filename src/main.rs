//! Endless Drive - headless demo runner
//!
//! Plays one session with the autopilot on the in-memory collaborators,
//! logs what happens and prints the session summary as JSON.
//!
//! Usage: `endless-drive [seed] [max-frames] [config.json]`

use anyhow::Context;

use endless_drive::GameConfig;
use endless_drive::sim::{Autopilot, EndReason, Engine, GameEvent, GamePhase};

/// Simulated display refresh
const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_SEED: u64 = 42;
/// Five minutes of play
const DEFAULT_MAX_FRAMES: u64 = 60 * 60 * 5;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid seed {arg:?}"))?,
        None => DEFAULT_SEED,
    };
    let max_frames = match args.next() {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid frame count {arg:?}"))?,
        None => DEFAULT_MAX_FRAMES,
    };
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            GameConfig::from_json(&json).with_context(|| format!("bad config in {path}"))?
        }
        None => GameConfig::default(),
    };

    log::info!("Endless Drive (headless) starting with seed {}", seed);

    let mut engine = Engine::headless(config, seed).context("engine failed to initialise")?;
    let pilot = Autopilot::new(&engine.config().driving);
    engine.begin()?;

    let mut frames = 0;
    while frames < max_frames {
        let input = pilot.decide(
            engine.vehicle(),
            engine.hazards().obstacles(),
            engine.pickups().pickups(),
        );
        engine.set_input(input);
        let keep_going = engine.frame(FRAME_DT);
        frames += 1;
        report(engine.drain_events())?;
        if !keep_going {
            break;
        }
    }

    if engine.phase() == GamePhase::Playing {
        log::info!("Frame limit reached after {} frames", frames);
        println!("{}", engine.session().summary(EndReason::Abandoned).to_json()?);
    }
    Ok(())
}

fn report(events: Vec<GameEvent>) -> anyhow::Result<()> {
    for event in events {
        match event {
            GameEvent::UpgradeAcquired {
                label, description, ..
            } => log::info!("Upgrade: {} ({})", label, description),
            GameEvent::UpgradeLost { label, .. } => log::warn!("{}", label),
            GameEvent::GameOver(summary) => println!("{}", summary.to_json()?),
            GameEvent::SessionStarted | GameEvent::ReturnedToMenu => {}
        }
    }
    Ok(())
}
