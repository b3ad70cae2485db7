//! A small game loop wired through a bus.
//!
//! Run with `RUST_LOG=busline=debug` to see registration logs and the warning
//! emitted for the failing handler.

use busline::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub trait GameEvent: Event {}
pub trait GameListener: Send + Sync {}

pub struct PlayerJoined {
    pub name: String,
}

impl GameEvent for PlayerJoined {}

pub struct ScoreChanged {
    pub player: String,
    pub delta: i32,
}

impl GameEvent for ScoreChanged {}

#[derive(Default)]
pub struct Scoreboard {
    players: AtomicU32,
}

impl GameListener for Scoreboard {}

#[listener(events = dyn GameEvent, family = dyn GameListener)]
impl Scoreboard {
    #[subscribe(priority = Priority::EARLY)]
    pub fn on_join(&self, event: &PlayerJoined) {
        let count = self.players.fetch_add(1, Ordering::SeqCst) + 1;
        println!("{} joined ({} online)", event.name, count);
    }

    #[subscribe]
    pub fn on_score(&self, event: &ScoreChanged) -> Result<(), String> {
        if event.delta < 0 {
            return Err(format!("negative delta for {}", event.player));
        }
        println!("{} scored {}", event.player, event.delta);
        Ok(())
    }
}

pub struct Announcer;

impl GameListener for Announcer {}

#[listener(events = dyn GameEvent, family = dyn GameListener)]
impl Announcer {
    #[subscribe(priority = Priority::LATE)]
    pub fn on_join(&self, event: &PlayerJoined) {
        println!("welcome, {}!", event.name);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let bus = EventBus::<dyn GameEvent, dyn GameListener>::builder()
        .event_family(FamilyType::of::<dyn GameEvent>())
        .listener_family(FamilyType::of::<dyn GameListener>())
        .with_capacity(8)
        .build()?;

    let scoreboard = Arc::new(Scoreboard::default());
    bus.register_listener(&scoreboard)?;
    bus.register_listener(&Arc::new(Announcer))?;

    bus.fire_event(&PlayerJoined {
        name: "ada".to_string(),
    });
    bus.fire_event(&ScoreChanged {
        player: "ada".to_string(),
        delta: 10,
    });
    // Reported through the default LogReporter; dispatch carries on.
    bus.fire_event(&ScoreChanged {
        player: "ada".to_string(),
        delta: -3,
    });

    let removed = bus.unregister_listener(&scoreboard);
    println!("scoreboard removed {removed} handlers");
    Ok(())
}
