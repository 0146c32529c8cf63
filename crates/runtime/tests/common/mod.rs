#![allow(dead_code)]

use std::time::Duration;

use arena_runtime::{Event, LocalHub, MatchRuntime, RuntimeConfig};
use battle_core::{
    BuffEffect, BuffSpec, Combatant, ParticipantId, Registry, Side, Skill, TargetRule,
};
use tokio::sync::broadcast;

pub const HOST: ParticipantId = ParticipantId(1);
pub const GUEST: ParticipantId = ParticipantId(2);

/// Knight (side A) acts first, wolf (side B) second.
pub fn roster() -> Registry {
    Registry::from_roster(combatants()).unwrap()
}

pub fn combatants() -> Vec<Combatant> {
    vec![
        Combatant::new("knight", Side::A, 40)
            .with_attack(12)
            .with_defense(4)
            .with_speed(6)
            .with_skill(
                Skill::new("shield bash", 3, 60, TargetRule::Foe).with_buff(BuffSpec {
                    id: "stun".into(),
                    effect: BuffEffect::Stun,
                    duration: 2,
                }),
            ),
        Combatant::new("archer", Side::A, 24)
            .with_attack(14)
            .with_speed(4),
        Combatant::new("orc", Side::B, 45)
            .with_attack(11)
            .with_defense(3)
            .with_speed(3),
        Combatant::new("wolf", Side::B, 20)
            .with_attack(9)
            .with_speed(5)
            .with_skill(
                Skill::new("howl", 4, 0, TargetRule::Caster).with_buff(BuffSpec {
                    id: "howl".into(),
                    effect: BuffEffect::AttackUp(4),
                    duration: 3,
                }),
            ),
    ]
}

pub struct Match {
    pub hub: LocalHub,
    pub host: MatchRuntime,
    pub guest: MatchRuntime,
}

pub async fn start_pair(host: RuntimeConfig, guest: RuntimeConfig) -> Match {
    start_pair_with(host, guest, roster()).await
}

/// Host is the authority on side A; guest follows on side B.
pub async fn start_pair_with(
    host_config: RuntimeConfig,
    guest_config: RuntimeConfig,
    guest_registry: Registry,
) -> Match {
    let hub = LocalHub::new(HOST);
    let host_transport = hub.join(HOST);
    let guest_transport = hub.join(GUEST);

    let host = MatchRuntime::builder()
        .config(host_config)
        .registry(roster())
        .transport(host_transport)
        .build()
        .await
        .unwrap();
    let guest = MatchRuntime::builder()
        .config(guest_config)
        .registry(guest_registry)
        .transport(guest_transport)
        .build()
        .await
        .unwrap();

    hub.connect(HOST, host.handle()).unwrap();
    hub.connect(GUEST, guest.handle()).unwrap();

    Match { hub, host, guest }
}

/// Receives events until `matches` accepts one. Lagged receivers skip ahead.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<Event>, mut matches: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3600), async {
        loop {
            match rx.recv().await {
                Ok(event) if matches(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
