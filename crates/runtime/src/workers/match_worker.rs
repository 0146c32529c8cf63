//! Match worker that exclusively owns one match's [`BattleState`].
//!
//! Every input (local submissions, inbound wire messages, departures and
//! queries) arrives as a [`Command`] and is handled to completion before the
//! next one. The only other wake-up source is the decision deadline of the
//! current activation, raced against the command channel in `select!`.
//!
//! The authority drives the turn cycle and broadcasts `TurnStarted`, the
//! resolving `Decision` and a `Snapshot` per activation. Followers mirror the
//! activation, replay the decision locally and then overwrite their registry
//! with the snapshot.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

use battle_core::{
    ApplyReport, BattleConfig, BattleEngine, BattleState, CombatantId, Decision, DecisionGate,
    Evaluation, GameplaySnapshot, GateOpen, MatchOutcome, ParticipantId, Seats, Side, evaluate,
    forfeit,
};

use crate::api::{FallbackPolicy, Result, RuntimeError};
use crate::events::{ActionEvent, Event, EventBus, MatchEvent, SyncEvent, TurnEvent};
use crate::runtime::Role;
use crate::transport::{Transport, WireMessage};

/// Commands that can be sent to the match worker
pub enum Command {
    /// Begin the turn loop (authority only).
    Start { reply: oneshot::Sender<Result<()>> },
    /// A decision from the local participant.
    SubmitDecision {
        decision: Decision,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Raw bytes received from another participant.
    Inbound { from: ParticipantId, bytes: Vec<u8> },
    /// Another participant left the match.
    ParticipantLeft { participant: ParticipantId },
    /// Query the current battle state (read-only).
    QueryState { reply: oneshot::Sender<BattleState> },
    /// Capture a snapshot of the local registry.
    QuerySnapshot {
        reply: oneshot::Sender<GameplaySnapshot>,
    },
    /// Stop the worker loop.
    Shutdown,
}

/// Collaborators the builder injects into the worker.
pub struct MatchContext {
    pub role: Role,
    pub seats: Seats,
    pub battle: BattleConfig,
    pub decision_timeout: Duration,
    pub auto_play: bool,
    pub transport: Arc<dyn Transport>,
    pub fallback: Arc<dyn FallbackPolicy>,
    pub event_bus: EventBus,
}

/// Pending decision window. Dropping it cancels the timer.
struct Deadline {
    activation: u64,
    sleep: Pin<Box<Sleep>>,
}

/// Background task that runs one match.
pub struct MatchWorker {
    state: BattleState,
    gate: DecisionGate,
    ctx: MatchContext,
    command_rx: mpsc::Receiver<Command>,
    deadline: Option<Deadline>,
    outcome: Option<MatchOutcome>,
    started: bool,
    /// Set once a resync is requested; cleared by the next clean snapshot.
    resync_pending: bool,
}

impl MatchWorker {
    pub fn new(state: BattleState, ctx: MatchContext, command_rx: mpsc::Receiver<Command>) -> Self {
        info!(
            target: "runtime::worker",
            role = ?ctx.role,
            local = %ctx.seats.local(),
            side = %ctx.seats.local_side(),
            combatants = state.registry.len(),
            "MatchWorker initialized"
        );

        Self {
            state,
            gate: DecisionGate::new(),
            ctx,
            command_rx,
            deadline: None,
            outcome: None,
            started: false,
            resync_pending: false,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                activation = Self::expiry(&mut self.deadline) => {
                    self.deadline = None;
                    self.handle_timeout(activation).await;
                }
            }
        }
        debug!(target: "runtime::worker", "MatchWorker stopped");
    }

    /// Resolves when the pending deadline fires; never resolves without one.
    async fn expiry(deadline: &mut Option<Deadline>) -> u64 {
        match deadline {
            Some(deadline) => {
                deadline.sleep.as_mut().await;
                deadline.activation
            }
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { reply } => {
                let result = self.start().await;
                if reply.send(result).is_err() {
                    debug!("Start reply channel closed (caller dropped)");
                }
            }
            Command::SubmitDecision { decision, reply } => {
                let result = self.submit_local(decision).await;
                if reply.send(result).is_err() {
                    debug!("SubmitDecision reply channel closed (caller dropped)");
                }
            }
            Command::Inbound { from, bytes } => self.handle_inbound(from, &bytes).await,
            Command::ParticipantLeft { participant } => self.handle_departure(participant).await,
            Command::QueryState { reply } => {
                if reply.send(self.state.clone()).is_err() {
                    debug!("QueryState reply channel closed (caller dropped)");
                }
            }
            Command::QuerySnapshot { reply } => {
                let snapshot = GameplaySnapshot::capture(&self.state.registry, self.outcome);
                if reply.send(snapshot).is_err() {
                    debug!("QuerySnapshot reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn is_authority(&self) -> bool {
        self.ctx.role == Role::Authority
    }

    fn publish(&self, event: Event) {
        self.ctx.event_bus.publish(event);
    }

    fn arm_deadline(&mut self, activation: u64) {
        self.deadline = Some(Deadline {
            activation,
            sleep: Box::pin(tokio::time::sleep(self.ctx.decision_timeout)),
        });
    }

    fn active_side(&self) -> Option<Side> {
        self.state.active_combatant().map(|c| c.side)
    }

    // ===== authority: turn cycle =====

    async fn start(&mut self) -> Result<()> {
        if !self.is_authority() {
            return Err(RuntimeError::NotAuthority {
                operation: "start the turn loop",
            });
        }
        if self.outcome.is_some() {
            return Err(RuntimeError::MatchEnded);
        }
        if self.started {
            return Ok(());
        }
        self.started = true;

        info!(
            target: "runtime::worker",
            combatants = self.state.registry.len(),
            opponent = ?self.ctx.seats.opponent(),
            "Match started"
        );
        self.drive().await;
        Ok(())
    }

    /// Runs activations until one needs to wait for a decision or the match
    /// ends.
    async fn drive(&mut self) {
        while self.outcome.is_none() {
            // Scheduling with an empty side would fail; settle the match first.
            if let Evaluation::Ended {
                losing_side,
                outcome,
            } = evaluate(&self.state.registry, Side::A, &self.ctx.seats)
            {
                self.finish_match(losing_side, outcome).await;
                return;
            }

            let activation = match BattleEngine::new(&mut self.state, &self.ctx.battle)
                .advance_turn()
            {
                Ok(activation) => activation,
                Err(err) => {
                    error!(target: "runtime::worker", error = %err, "Turn scheduling failed");
                    return;
                }
            };

            debug!(
                target: "runtime::worker",
                combatant = %activation.combatant,
                activation = activation.activation,
                "Combatant activated"
            );
            self.publish(Event::Turn(TurnEvent::ActiveCombatantChanged {
                combatant: activation.combatant.clone(),
                activation: activation.activation,
            }));
            self.broadcast(WireMessage::TurnStarted {
                combatant: activation.combatant.clone(),
                activation: activation.activation,
            })
            .await;

            if let GateOpen::Skip(reason) = self.gate.open(&self.state) {
                debug!(
                    target: "runtime::worker",
                    combatant = %activation.combatant,
                    %reason,
                    "Turn skipped"
                );
                self.publish(Event::Turn(TurnEvent::TurnSkipped {
                    combatant: Some(activation.combatant),
                    activation: activation.activation,
                    reason,
                }));
                self.complete_activation().await;
                continue;
            }

            let Some(side) = self.active_side() else {
                continue;
            };
            let unseated = self.ctx.seats.controller(side).is_none();
            let auto = self.ctx.auto_play && self.ctx.seats.controls(self.ctx.seats.local(), side);
            if unseated || auto {
                // Nobody to wait for.
                self.gate.mark_resolved(activation.activation);
                let decision = self.ctx.fallback.decide(&self.state).await;
                self.settle(activation.activation, decision).await;
                continue;
            }

            self.arm_deadline(activation.activation);
            return;
        }
    }

    /// Applies the decision that resolved `activation`. The gate must already
    /// be resolved. `None`, or a decision the resolver refuses, makes the
    /// activation a no-op turn.
    async fn settle(&mut self, activation: u64, decision: Option<Decision>) {
        self.deadline = None;

        let Some(decision) = decision else {
            debug!(target: "runtime::worker", activation, "No decision; turn passes");
            self.complete_activation().await;
            return;
        };

        let result = BattleEngine::new(&mut self.state, &self.ctx.battle).resolve_action(&decision);
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    target: "runtime::worker",
                    activation,
                    actor = %decision.actor,
                    error = %err,
                    "Decision failed to resolve; turn passes"
                );
                self.publish(Event::Action(ActionEvent::DecisionRejected {
                    activation,
                    decision,
                    sender: self.ctx.seats.local(),
                    reason: err.to_string(),
                }));
                self.complete_activation().await;
                return;
            }
        };

        debug!(
            target: "runtime::worker",
            activation,
            actor = %outcome.actor,
            kind = %outcome.kind,
            target = %outcome.target,
            damage = outcome.damage,
            "Action resolved"
        );

        self.broadcast(WireMessage::Decision {
            activation,
            decision: decision.clone(),
        })
        .await;

        let acting_side = self.state.registry.get(&decision.actor).map(|c| c.side);
        self.publish(Event::Action(ActionEvent::ActionResolved {
            activation,
            decision,
            outcome,
        }));

        let evaluation = match acting_side {
            Some(side) => evaluate(&self.state.registry, side, &self.ctx.seats),
            None => Evaluation::Continue,
        };
        match evaluation {
            Evaluation::Ended {
                losing_side,
                outcome,
            } => self.finish_match(losing_side, outcome).await,
            Evaluation::Continue => self.complete_activation().await,
        }
    }

    /// Ends the activation without a match end and shares the result.
    async fn complete_activation(&mut self) {
        let activation = self.state.turn.activation;
        BattleEngine::new(&mut self.state, &self.ctx.battle).end_activation();
        self.gate.reset();

        let snapshot = GameplaySnapshot::capture(&self.state.registry, None);
        self.share_snapshot(activation, snapshot).await;
    }

    async fn finish_match(&mut self, losing_side: Side, outcome: MatchOutcome) {
        let activation = self.state.turn.activation;
        self.deadline = None;
        BattleEngine::new(&mut self.state, &self.ctx.battle).end_activation();
        self.gate.reset();
        self.outcome = Some(outcome);

        info!(
            target: "runtime::worker",
            activation,
            %losing_side,
            winner = ?outcome.winner,
            loser = ?outcome.loser,
            "Match ended"
        );

        let snapshot = GameplaySnapshot::capture(&self.state.registry, Some(outcome));
        self.share_snapshot(activation, snapshot).await;
        self.publish(Event::Match(MatchEvent::MatchEnded { outcome }));
    }

    /// Broadcasts `snapshot` and applies it locally like any participant.
    async fn share_snapshot(&mut self, activation: u64, snapshot: GameplaySnapshot) {
        self.broadcast(WireMessage::Snapshot {
            activation,
            snapshot: snapshot.clone(),
        })
        .await;
        self.apply_snapshot(activation, &snapshot);
    }

    // ===== decisions =====

    async fn submit_local(&mut self, decision: Decision) -> Result<()> {
        let local = self.ctx.seats.local();
        if self.is_authority() {
            self.accept_submission(decision, local).await
        } else {
            self.forward_submission(decision).await
        }
    }

    /// Gate and resolver checks shared by both roles. Publishes the rejection.
    fn check_submission(&mut self, decision: &Decision, sender: ParticipantId) -> Result<()> {
        let checked = if self.outcome.is_some() {
            Err(RuntimeError::MatchEnded)
        } else {
            self.gate
                .check(decision, sender, &self.ctx.seats)
                .map_err(RuntimeError::from)
                .and_then(|()| {
                    BattleEngine::new(&mut self.state, &self.ctx.battle)
                        .validate_decision(decision)
                        .map(|_| ())
                        .map_err(RuntimeError::from)
                })
        };

        if let Err(err) = &checked {
            self.reject(decision, sender, err);
        }
        checked
    }

    fn reject(&self, decision: &Decision, sender: ParticipantId, reason: &RuntimeError) {
        debug!(
            target: "runtime::worker",
            actor = %decision.actor,
            %sender,
            error = %reason,
            "Decision rejected"
        );
        self.publish(Event::Action(ActionEvent::DecisionRejected {
            activation: self.state.turn.activation,
            decision: decision.clone(),
            sender,
            reason: reason.to_string(),
        }));
    }

    /// Authority: first valid decision for the awaiting activation wins.
    async fn accept_submission(&mut self, decision: Decision, sender: ParticipantId) -> Result<()> {
        self.check_submission(&decision, sender)?;
        let activation = self.gate.accept(&decision, sender, &self.ctx.seats)?;
        self.settle(activation, Some(decision)).await;
        self.drive().await;
        Ok(())
    }

    /// Follower: pre-check locally, then hand the decision to the authority.
    async fn forward_submission(&mut self, decision: Decision) -> Result<()> {
        self.check_submission(&decision, self.ctx.seats.local())?;
        let activation = self.state.turn.activation;
        debug!(
            target: "runtime::worker",
            activation,
            actor = %decision.actor,
            "Forwarding decision to authority"
        );
        self.send_to_authority(WireMessage::Decision {
            activation,
            decision,
        })
        .await
    }

    async fn handle_timeout(&mut self, activation: u64) {
        if !self.gate.expire(activation) {
            debug!(target: "runtime::worker", activation, "Stale decision timer ignored");
            return;
        }

        let Some(combatant) = self.state.turn.active.clone() else {
            return;
        };
        info!(
            target: "runtime::worker",
            activation,
            %combatant,
            timeout_ms = self.ctx.decision_timeout.as_millis() as u64,
            "Decision window expired"
        );
        self.publish(Event::Turn(TurnEvent::DecisionExpired {
            combatant,
            activation,
        }));

        if !self.is_authority() {
            return;
        }

        let decision = self.ctx.fallback.decide(&self.state).await;
        self.settle(activation, decision).await;
        self.drive().await;
    }

    // ===== transport =====

    async fn broadcast(&mut self, message: WireMessage) {
        let kind = message.kind();
        let bytes = match message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(target: "runtime::worker", kind, error = %err, "Failed to encode message");
                return;
            }
        };
        if let Err(err) = self.ctx.transport.broadcast(bytes).await {
            warn!(target: "runtime::worker", kind, error = %err, "Broadcast failed");
        }
    }

    async fn send_to_authority(&mut self, message: WireMessage) -> Result<()> {
        let bytes = message.encode()?;
        let authority = self.ctx.transport.authority();
        self.ctx.transport.send_to(authority, bytes).await?;
        Ok(())
    }

    async fn handle_inbound(&mut self, from: ParticipantId, bytes: &[u8]) {
        let message = match WireMessage::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                warn!(target: "runtime::worker", %from, error = %err, "Dropping undecodable message");
                return;
            }
        };

        if self.is_authority() {
            self.handle_as_authority(from, message).await;
        } else if from == self.ctx.transport.authority() {
            self.handle_as_follower(message).await;
        } else {
            warn!(
                target: "runtime::worker",
                %from,
                kind = message.kind(),
                "Ignoring message from a non-authority participant"
            );
        }
    }

    async fn handle_as_authority(&mut self, from: ParticipantId, message: WireMessage) {
        match message {
            WireMessage::Decision {
                activation,
                decision,
            } => {
                let current = self.state.turn.activation;
                if activation != current {
                    let err = RuntimeError::StaleActivation {
                        received: activation,
                        current,
                    };
                    self.reject(&decision, from, &err);
                    return;
                }
                if let Err(err) = self.accept_submission(decision, from).await {
                    debug!(target: "runtime::worker", %from, error = %err, "Remote decision refused");
                }
            }
            WireMessage::ResyncRequest { activation } => {
                info!(target: "runtime::worker", %from, activation, "Serving resync");
                self.publish(Event::Sync(SyncEvent::ResyncRequested {
                    activation,
                    participant: from,
                }));
                let message = WireMessage::Resync {
                    activation: self.state.turn.activation,
                    snapshot: GameplaySnapshot::capture(&self.state.registry, self.outcome),
                };
                let sent = match message.encode() {
                    Ok(bytes) => self
                        .ctx
                        .transport
                        .send_to(from, bytes)
                        .await
                        .map_err(RuntimeError::from),
                    Err(err) => Err(err.into()),
                };
                if let Err(err) = sent {
                    warn!(target: "runtime::worker", %from, error = %err, "Resync reply failed");
                }
            }
            other => {
                warn!(
                    target: "runtime::worker",
                    %from,
                    kind = other.kind(),
                    "Authority ignores follower-bound message"
                );
            }
        }
    }

    async fn handle_as_follower(&mut self, message: WireMessage) {
        match message {
            WireMessage::TurnStarted {
                combatant,
                activation,
            } => self.mirror_activation(combatant, activation).await,
            WireMessage::Decision {
                activation,
                decision,
            } => self.replay_decision(activation, decision),
            WireMessage::Snapshot {
                activation,
                snapshot,
            } => self.receive_snapshot(activation, snapshot).await,
            WireMessage::Resync {
                activation,
                snapshot,
            } => self.receive_resync(activation, snapshot),
            WireMessage::ResyncRequest { .. } => {
                debug!(target: "runtime::worker", "Follower ignores resync request");
            }
        }
    }

    async fn mirror_activation(&mut self, combatant: CombatantId, activation: u64) {
        self.deadline = None;

        let activated =
            BattleEngine::new(&mut self.state, &self.ctx.battle).activate(combatant, activation);
        let activated = match activated {
            Ok(activated) => activated,
            Err(err) => {
                warn!(target: "runtime::worker", activation, error = %err, "Cannot mirror activation");
                self.request_resync(activation).await;
                return;
            }
        };

        self.publish(Event::Turn(TurnEvent::ActiveCombatantChanged {
            combatant: activated.combatant.clone(),
            activation,
        }));

        match self.gate.open(&self.state) {
            GateOpen::Skip(reason) => {
                self.publish(Event::Turn(TurnEvent::TurnSkipped {
                    combatant: Some(activated.combatant),
                    activation,
                    reason,
                }));
            }
            GateOpen::Awaiting => {
                self.arm_deadline(activation);

                let local_turn = self
                    .active_side()
                    .is_some_and(|side| self.ctx.seats.controls(self.ctx.seats.local(), side));
                if self.ctx.auto_play && local_turn {
                    let decision = self.ctx.fallback.decide(&self.state).await;
                    if let Some(decision) = decision
                        && let Err(err) = self.forward_submission(decision).await
                    {
                        warn!(target: "runtime::worker", activation, error = %err, "Auto-play submission failed");
                    }
                }
            }
        }
    }

    fn replay_decision(&mut self, activation: u64, decision: Decision) {
        self.deadline = None;
        self.gate.mark_resolved(activation);

        if activation != self.state.turn.activation {
            warn!(
                target: "runtime::worker",
                activation,
                current = self.state.turn.activation,
                "Decision for another activation; waiting for snapshot"
            );
            return;
        }

        match BattleEngine::new(&mut self.state, &self.ctx.battle).resolve_action(&decision) {
            Ok(outcome) => {
                self.publish(Event::Action(ActionEvent::ActionResolved {
                    activation,
                    decision,
                    outcome,
                }));
            }
            Err(err) => {
                warn!(
                    target: "runtime::worker",
                    activation,
                    error = %err,
                    "Replay diverged from authority; waiting for snapshot"
                );
            }
        }
    }

    async fn receive_snapshot(&mut self, activation: u64, snapshot: GameplaySnapshot) {
        self.deadline = None;
        BattleEngine::new(&mut self.state, &self.ctx.battle).end_activation();
        self.gate.reset();

        let report = self.apply_snapshot(activation, &snapshot);
        if report.needs_resync() {
            self.request_resync(activation).await;
        }
        self.adopt_outcome(&snapshot);
    }

    /// Applies a resync reply. The activation in progress, its gate and its
    /// deadline stay as they are.
    fn receive_resync(&mut self, activation: u64, snapshot: GameplaySnapshot) {
        debug!(
            target: "runtime::worker",
            activation,
            current = self.state.turn.activation,
            "Applying resync reply"
        );
        self.apply_snapshot(activation, &snapshot);
        self.adopt_outcome(&snapshot);
    }

    fn adopt_outcome(&mut self, snapshot: &GameplaySnapshot) {
        let Some(outcome) = snapshot.outcome() else {
            return;
        };
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.deadline = None;
        self.gate.reset();
        info!(
            target: "runtime::worker",
            winner = ?outcome.winner,
            loser = ?outcome.loser,
            "Match ended by authority"
        );
        self.publish(Event::Match(MatchEvent::MatchEnded { outcome }));
    }

    /// Asks the authority for canonical state, once until a snapshot applies
    /// cleanly again.
    async fn request_resync(&mut self, activation: u64) {
        if self.resync_pending {
            debug!(target: "runtime::worker", activation, "Resync already requested");
            return;
        }
        self.resync_pending = true;
        self.publish(Event::Sync(SyncEvent::ResyncRequested {
            activation,
            participant: self.ctx.seats.local(),
        }));
        if let Err(err) = self
            .send_to_authority(WireMessage::ResyncRequest { activation })
            .await
        {
            warn!(target: "runtime::worker", activation, error = %err, "Resync request failed");
        }
    }

    fn apply_snapshot(&mut self, activation: u64, snapshot: &GameplaySnapshot) -> ApplyReport {
        let report = snapshot.apply_to(&mut self.state.registry);
        if !report.needs_resync() {
            self.resync_pending = false;
        }
        if !report.is_clean() {
            warn!(
                target: "runtime::worker",
                activation,
                unknown = report.unknown_combatants.len(),
                skipped_skills = report.skipped_skills.len(),
                skipped_buffs = report.skipped_buffs.len(),
                "Snapshot applied with unresolved entries"
            );
        }

        self.publish(Event::Sync(SyncEvent::SnapshotApplied {
            activation,
            digest: snapshot.digest().ok(),
            unknown_combatants: report.unknown_combatants.clone(),
        }));
        report
    }

    // ===== departures =====

    async fn handle_departure(&mut self, participant: ParticipantId) {
        if participant == self.ctx.seats.local() {
            return;
        }

        if !self.is_authority() {
            if participant == self.ctx.transport.authority() {
                warn!(target: "runtime::worker", %participant, "Authority left the match");
            } else {
                debug!(target: "runtime::worker", %participant, "Participant left");
            }
            return;
        }

        if self.outcome.is_some() {
            return;
        }
        let Some(side) = self.ctx.seats.side_of(participant) else {
            debug!(target: "runtime::worker", %participant, "Unseated participant left");
            return;
        };

        info!(target: "runtime::worker", %participant, %side, "Participant left; forcing outcome");
        if let Evaluation::Ended {
            losing_side,
            outcome,
        } = forfeit(side, &self.ctx.seats)
        {
            self.finish_match(losing_side, outcome).await;
        }
    }
}
