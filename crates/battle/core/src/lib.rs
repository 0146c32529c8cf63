//! Deterministic battle rules shared by the authority and every follower.
//!
//! `battle-core` owns the canonical turn cycle: scheduling, the decision gate
//! state machine, action resolution, outcome evaluation and snapshot
//! reconciliation. It performs no I/O and keeps no clocks, so the same
//! decision resolves bit-identically on every participant. State mutation
//! flows through [`engine::BattleEngine`] or [`snapshot::GameplaySnapshot::apply_to`].
pub mod action;
pub mod combat;
pub mod config;
pub mod engine;
pub mod gate;
pub mod outcome;
pub mod snapshot;
pub mod state;
pub use action::{ActionKind, ActionOutcome, Decision, ResolveError, auto_decision};
pub use combat::{Roller, calculate_damage, fallback_seed};
pub use config::BattleConfig;
pub use engine::{Activation, BattleEngine, ResolvePlan, TurnError};
pub use gate::{DecisionGate, GateOpen, GatePhase, SkipReason, UnauthorizedDecision};
pub use outcome::{Evaluation, MatchOutcome, evaluate, forfeit};
pub use snapshot::{ApplyReport, BuffDuration, CombatantRecord, GameplaySnapshot, SkillCooldown};
pub use state::{
    BattleState, Buff, BuffEffect, BuffSpec, Combatant, CombatantId, Formation, ParticipantId,
    Registry, RegistryError, Seats, Side, Skill, TargetRule, Timed, TurnState,
};
