//! Local match driver.
//!
//! Runs one host (authority) and one guest (follower) over the in-memory hub,
//! logs the match as it plays out and checks that both participants end on
//! the same snapshot.
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=runtime=debug SIM_MATCH_SEED=7 cargo run -p arena-sim
//!
//! # Host never answers, so every host turn falls back after the timeout
//! SIM_AUTO_PLAY_HOST=false SIM_DECISION_TIMEOUT_MS=50 cargo run -p arena-sim
//! ```

mod config;

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use tokio::sync::broadcast::{self, error::RecvError};

use arena_runtime::{
    ActionEvent, Event, LocalHub, LocalTransport, MatchEvent, MatchRuntime, RuntimeConfig, Topic,
    TurnEvent,
};
use battle_core::{
    BuffEffect, BuffSpec, Combatant, MatchOutcome, ParticipantId, Registry, Side, Skill,
    TargetRule,
};

use crate::config::SimConfig;

const HOST: ParticipantId = ParticipantId(1);
const GUEST: ParticipantId = ParticipantId(2);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SimConfig::from_env();
    tracing::info!(?config, "Starting simulated match");

    let hub = LocalHub::new(HOST);
    let host_transport = hub.join(HOST);
    let guest_transport = hub.join(GUEST);

    let host = build(config.host_runtime(), host_transport).await?;
    let guest = build(config.guest_runtime(), guest_transport).await?;
    hub.connect(HOST, host.handle())
        .context("host endpoint already connected")?;
    hub.connect(GUEST, guest.handle())
        .context("guest endpoint already connected")?;

    let host_handle = host.handle();
    let guest_handle = guest.handle();
    let feed = tokio::spawn(log_feed(host_handle.subscribe_multiple(&[
        Topic::Turn,
        Topic::Action,
    ])));
    let mut host_end = host_handle.subscribe(Topic::Match);
    let mut guest_end = guest_handle.subscribe(Topic::Match);

    host_handle.start().await?;

    let outcome = wait_for_end(&mut host_end).await?;
    let guest_outcome = wait_for_end(&mut guest_end).await?;
    if outcome != guest_outcome {
        bail!("participants disagree on the outcome: {outcome:?} vs {guest_outcome:?}");
    }

    let snapshot = host_handle.snapshot().await?;
    let digest = snapshot.digest()?;
    let guest_digest = guest_handle.snapshot().await?.digest()?;
    if digest != guest_digest {
        bail!("snapshot digests diverged: host {digest}, guest {guest_digest}");
    }

    tracing::info!(
        winner = ?outcome.winner,
        loser = ?outcome.loser,
        %digest,
        "Match finished"
    );

    if config.dump_snapshot {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }

    feed.abort();
    host.shutdown().await?;
    guest.shutdown().await?;

    Ok(())
}

async fn build(config: RuntimeConfig, transport: LocalTransport) -> Result<MatchRuntime> {
    let runtime = MatchRuntime::builder()
        .config(config)
        .registry(roster()?)
        .transport(transport)
        .build()
        .await?;
    Ok(runtime)
}

/// Two combatants per side. Both participants must build the same roster.
fn roster() -> Result<Registry> {
    let roster = [
        Combatant::new("paladin", Side::A, 48)
            .with_attack(11)
            .with_defense(5)
            .with_speed(5)
            .with_skill(
                Skill::new("smite", 3, 150, TargetRule::Foe).with_buff(BuffSpec {
                    id: "stun".into(),
                    effect: BuffEffect::Stun,
                    duration: 2,
                }),
            ),
        Combatant::new("ranger", Side::A, 30)
            .with_attack(13)
            .with_defense(2)
            .with_speed(7),
        Combatant::new("brute", Side::B, 55)
            .with_attack(12)
            .with_defense(4)
            .with_speed(3),
        Combatant::new("shaman", Side::B, 28)
            .with_attack(8)
            .with_defense(1)
            .with_speed(6)
            .with_skill(
                Skill::new("war chant", 4, 0, TargetRule::Ally).with_buff(BuffSpec {
                    id: "chant".into(),
                    effect: BuffEffect::AttackUp(5),
                    duration: 3,
                }),
            ),
    ];
    Registry::from_roster(roster).context("invalid roster")
}

async fn wait_for_end(rx: &mut broadcast::Receiver<Event>) -> Result<MatchOutcome> {
    loop {
        match rx.recv().await {
            Ok(Event::Match(MatchEvent::MatchEnded { outcome })) => return Ok(outcome),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => bail!("event bus closed before the match ended"),
        }
    }
}

async fn log_feed(receivers: HashMap<Topic, broadcast::Receiver<Event>>) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    for mut receiver in receivers.into_values() {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event feed lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
    drop(tx);

    while let Some(event) = rx.recv().await {
        match event {
            Event::Turn(TurnEvent::ActiveCombatantChanged {
                combatant,
                activation,
            }) => tracing::info!(activation, %combatant, "Turn"),
            Event::Turn(TurnEvent::TurnSkipped {
                combatant,
                activation,
                reason,
            }) => tracing::info!(activation, ?combatant, %reason, "Turn skipped"),
            Event::Turn(TurnEvent::DecisionExpired {
                combatant,
                activation,
            }) => tracing::info!(activation, %combatant, "Decision window expired"),
            Event::Action(ActionEvent::ActionResolved {
                activation,
                outcome,
                ..
            }) => tracing::info!(
                activation,
                actor = %outcome.actor,
                kind = %outcome.kind,
                target = %outcome.target,
                damage = outcome.damage,
                target_hp = outcome.target_hp,
                defeated = outcome.defeated,
                "Action"
            ),
            Event::Action(ActionEvent::DecisionRejected {
                activation, reason, ..
            }) => tracing::warn!(activation, %reason, "Decision rejected"),
            _ => {}
        }
    }
}
