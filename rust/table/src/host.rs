//! The single authoritative writer of a round.
//!
//! The host owns the [`TurnStateMachine`], applies client intents through it, drives
//! bot seats, and publishes the whole document after every change. Everything it
//! remembers about a round lives in one [`RoundContext`] that is replaced when the
//! next round opens.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dicehall_ai::driver::play_turn;
use dicehall_ai::{create_bot, BotPolicy};
use dicehall_engine::dealer::{select_dealer, DealerSelectionState};
use dicehall_engine::dice::{DiceDrawSource, DiceRoller, SeededRoller};
use dicehall_engine::errors::GameError;
use dicehall_engine::logger::{ActionRecord, RoundRecord};
use dicehall_engine::round::{Outcome, RoundEvent, RoundOutcome, RoundState, TurnStateMachine};
use dicehall_engine::seat::{PlayerId, Table};
use dicehall_engine::tiebreak::DrawSource;

use crate::channel::ReplicationChannel;
use crate::clock::Clock;
use crate::document::{new_round_id, ClientId, RoundDocument, RoundId, WriterLease};
use crate::errors::TableError;
use crate::intent::{IntentReceiver, SeatAction, SeatIntent};
use crate::settings::{SettingsError, TableSettings, TiePolicy};

/// Hooks for collaborators that settle rounds and set up the next one.
pub trait RoundListener: Send + Sync {
    /// Fired exactly once per round.
    fn on_round_complete(&self, round_id: &str, outcome: &RoundOutcome);

    fn on_dealer_selected(&self, round_id: &str, position: usize);
}

/// Listener that remembers every notification.
#[derive(Debug, Default)]
pub struct RecordingListener {
    completions: Mutex<Vec<(RoundId, RoundOutcome)>>,
    dealers: Mutex<Vec<(RoundId, usize)>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completions(&self) -> Vec<(RoundId, RoundOutcome)> {
        self.completions
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn dealers(&self) -> Vec<(RoundId, usize)> {
        self.dealers.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl RoundListener for RecordingListener {
    fn on_round_complete(&self, round_id: &str, outcome: &RoundOutcome) {
        if let Ok(mut g) = self.completions.lock() {
            g.push((round_id.to_string(), outcome.clone()));
        }
    }

    fn on_dealer_selected(&self, round_id: &str, position: usize) {
        if let Ok(mut g) = self.dealers.lock() {
            g.push((round_id.to_string(), position));
        }
    }
}

/// Per-round bookkeeping, passed around instead of process-wide maps.
#[derive(Debug)]
pub struct RoundContext {
    round_id: RoundId,
    lease: WriterLease,
    machine: TurnStateMachine,
    dealer_position: Option<usize>,
    dealer: Option<DealerSelectionState>,
    acks: BTreeMap<ClientId, u64>,
    /// Bot seats whose turn has already been played
    bots_done: HashSet<PlayerId>,
    bot_due: Option<(PlayerId, Duration)>,
    completion_fired: bool,
    outcome: Option<RoundOutcome>,
    actions: Vec<ActionRecord>,
    revision: u64,
    /// Set when the latest state has not reached the channel yet
    dirty: bool,
}

impl RoundContext {
    fn new(round_id: RoundId, lease: WriterLease, machine: TurnStateMachine) -> Self {
        Self {
            round_id,
            lease,
            machine,
            dealer_position: None,
            dealer: None,
            acks: BTreeMap::new(),
            bots_done: HashSet::new(),
            bot_due: None,
            completion_fired: false,
            outcome: None,
            actions: Vec::new(),
            revision: 0,
            dirty: true,
        }
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    pub fn state(&self) -> &RoundState {
        self.machine.state()
    }

    pub fn epoch(&self) -> u64 {
        self.lease.epoch
    }
}

pub struct RoundHost {
    host_id: ClientId,
    table: Table,
    settings: TableSettings,
    channel: Arc<dyn ReplicationChannel>,
    clock: Arc<dyn Clock>,
    bot: Box<dyn BotPolicy>,
    roller: Box<dyn DiceRoller + Send>,
    listeners: Vec<Arc<dyn RoundListener>>,
    round: Option<RoundContext>,
    pending_round_id: Option<RoundId>,
    fenced: Option<TableError>,
}

impl RoundHost {
    pub fn new(
        host_id: impl Into<ClientId>,
        table: Table,
        settings: TableSettings,
        channel: Arc<dyn ReplicationChannel>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        let bot = create_bot(&settings.bot_policy).ok_or_else(|| {
            SettingsError::InvalidValue(format!("unknown bot policy: {}", settings.bot_policy))
        })?;
        Ok(Self {
            host_id: host_id.into(),
            table,
            settings,
            channel,
            clock,
            bot,
            roller: Box::new(SeededRoller::from_entropy()),
            listeners: Vec::new(),
            round: None,
            pending_round_id: None,
            fenced: None,
        })
    }

    /// Replaces the dice used for bot seats and roll-offs.
    pub fn with_roller(mut self, roller: Box<dyn DiceRoller + Send>) -> Self {
        self.roller = roller;
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn RoundListener>) {
        self.listeners.push(listener);
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Seats may be changed between rounds; the running round keeps its turn order.
    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn context(&self) -> Option<&RoundContext> {
        self.round.as_ref()
    }

    pub fn round_id(&self) -> Option<&str> {
        self.round.as_ref().map(|c| c.round_id.as_str())
    }

    pub fn state(&self) -> Option<&RoundState> {
        self.round.as_ref().map(RoundContext::state)
    }

    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.round.as_ref().and_then(|c| c.outcome.as_ref())
    }

    pub fn is_complete(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn is_fenced(&self) -> bool {
        self.fenced.is_some()
    }

    /// Id the next opened round will use, so watchers can subscribe before it starts.
    pub fn next_round_id(&mut self) -> RoundId {
        self.pending_round_id
            .get_or_insert_with(new_round_id)
            .clone()
    }

    /// Draws for the button among active seats, then starts a round.
    pub fn open_round(&mut self, source: &mut dyn DrawSource) -> Result<RoundId, TableError> {
        let selection = select_dealer(&self.table, source);
        if let Some(position) = selection.winner_position {
            self.table.set_dealer_position(position);
        }
        self.start_round(Some(selection))
    }

    /// Passes the button to the next active seat and starts a round without a draw.
    pub fn open_next_round(&mut self) -> Result<RoundId, TableError> {
        self.table.rotate_dealer();
        self.start_round(None)
    }

    fn start_round(&mut self, dealer: Option<DealerSelectionState>) -> Result<RoundId, TableError> {
        let round_id = self
            .pending_round_id
            .clone()
            .unwrap_or_else(new_round_id);
        let lease = self.channel.acquire_lease(&round_id, &self.host_id)?;
        self.pending_round_id = None;
        self.fenced = None;

        let mut machine = TurnStateMachine::new(self.settings.variant, self.table.turn_order());
        let started = machine.start();
        let mut ctx = RoundContext::new(round_id.clone(), lease, machine);
        ctx.dealer = dealer;
        ctx.dealer_position =
            (!self.table.seats().is_empty()).then(|| self.table.dealer_position());
        self.round = Some(ctx);

        tracing::info!(
            round_id = %round_id,
            host = %self.host_id,
            turn_order = ?self.table.turn_order(),
            "round opened"
        );
        if let Some(position) = self.round.as_ref().and_then(|c| c.dealer_position) {
            for listener in &self.listeners {
                listener.on_dealer_selected(&round_id, position);
            }
        }
        self.handle_events(started.events());
        self.publish()?;
        self.on_change()?;
        Ok(round_id)
    }

    /// Takes over a round from its replicated document with a fresh lease. The previous
    /// writer is fenced off from then on.
    pub fn adopt_round(&mut self, doc: RoundDocument) -> Result<(), TableError> {
        let lease = self.channel.acquire_lease(&doc.round_id, &self.host_id)?;
        self.fenced = None;
        let machine = TurnStateMachine::from_state(doc.state);
        let mut ctx = RoundContext::new(doc.round_id.clone(), lease, machine);
        ctx.dealer = doc.dealer;
        ctx.acks = doc.acks;
        ctx.revision = doc.revision;
        ctx.completion_fired = doc.outcome.is_some();
        ctx.outcome = doc.outcome;
        // seats that already finished need no bot turn
        ctx.bots_done = ctx
            .machine
            .state()
            .player_states
            .iter()
            .filter(|(_, s)| s.is_complete)
            .map(|(p, _)| p.clone())
            .collect();
        tracing::warn!(
            round_id = %doc.round_id,
            host = %self.host_id,
            epoch = ctx.lease.epoch,
            "adopted round from replicated document"
        );
        self.round = Some(ctx);
        self.publish()?;
        self.on_change()
    }

    /// Applies a client's request and acknowledges its token, legal or not.
    pub fn apply_intent(&mut self, intent: SeatIntent) -> Result<Outcome, TableError> {
        self.ensure_writer()?;
        let Some(ctx) = self.round.as_mut() else {
            return Err(TableError::UnknownRound(intent.round_id));
        };
        if ctx.round_id != intent.round_id {
            return Err(TableError::UnknownRound(intent.round_id));
        }

        let player = intent.player.as_str();
        let outcome = if self.table.is_bot(player) {
            Outcome::Ignored(GameError::NotPlayersTurn {
                expected: ctx.machine.state().current_turn_player_id.clone(),
                actual: player.to_string(),
            })
        } else {
            match &intent.action {
                SeatAction::Roll { faces } => ctx.machine.roll_with_faces(player, faces),
                SeatAction::ToggleHold { index } => ctx.machine.toggle_hold(player, *index),
                SeatAction::LockIn => ctx.machine.lock_in(player),
            }
        };
        let ack = ctx.acks.entry(intent.client.clone()).or_insert(0);
        *ack = (*ack).max(intent.token);
        ctx.dirty = true;

        tracing::debug!(
            round_id = %ctx.round_id,
            client = %intent.client,
            player,
            token = intent.token,
            applied = outcome.is_applied(),
            "intent processed"
        );
        self.handle_events(outcome.events());
        self.publish()?;
        self.on_change()?;
        Ok(outcome)
    }

    /// Applies every intent already queued. Returns how many were processed.
    pub fn drain_intents(&mut self, intents: &mut IntentReceiver) -> Result<usize, TableError> {
        let mut processed = 0;
        while let Ok(intent) = intents.try_recv() {
            match self.apply_intent(intent) {
                Ok(_) => processed += 1,
                Err(TableError::UnknownRound(id)) => {
                    tracing::debug!(round_id = %id, "dropping intent for another round");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(processed)
    }

    /// Entry point for change notifications. Re-firing it is harmless: each bot seat is
    /// played at most once per round.
    pub fn on_change(&mut self) -> Result<(), TableError> {
        if self.settings.bot_think_ms == 0 {
            self.run_due_bots()
        } else {
            self.schedule_bot();
            Ok(())
        }
    }

    /// Periodic driver: retries an unpublished write and plays bots whose pause elapsed.
    pub fn tick(&mut self) -> Result<(), TableError> {
        if self.round.as_ref().is_some_and(|c| c.dirty) {
            self.publish()?;
        }
        self.schedule_bot();
        self.run_due_bots()
    }

    /// Serves intents until the current round completes.
    pub async fn serve(
        &mut self,
        intents: &mut IntentReceiver,
        tick_every: Duration,
    ) -> Result<RoundOutcome, TableError> {
        if self.round.is_none() {
            return Err(TableError::UnknownRound(String::new()));
        }
        let mut ticker = tokio::time::interval(tick_every);
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome.clone());
            }
            tokio::select! {
                maybe = intents.recv() => match maybe {
                    Some(intent) => match self.apply_intent(intent) {
                        Ok(_) => {}
                        Err(TableError::UnknownRound(id)) => {
                            tracing::debug!(round_id = %id, "dropping intent for another round");
                        }
                        Err(TableError::WriteFailure { .. }) => {}
                        Err(e) => return Err(e),
                    },
                    None => return Err(TableError::ChannelClosed),
                },
                _ = ticker.tick() => match self.tick() {
                    Ok(()) | Err(TableError::WriteFailure { .. }) => {}
                    Err(e) => return Err(e),
                },
            }
        }
    }

    /// Read-only copy of the current document.
    pub fn snapshot(&self) -> Option<RoundDocument> {
        let ctx = self.round.as_ref()?;
        let mut doc = RoundDocument::new(
            ctx.round_id.clone(),
            self.host_id.clone(),
            ctx.machine.state().clone(),
        );
        doc.revision = ctx.revision;
        doc.epoch = ctx.lease.epoch;
        doc.dealer = ctx.dealer.clone();
        doc.acks = ctx.acks.clone();
        doc.outcome = ctx.outcome.clone();
        Some(doc)
    }

    /// History record of the finished round, `None` while it is still in play.
    pub fn record(&self, history_id: String) -> Option<RoundRecord> {
        let ctx = self.round.as_ref()?;
        let outcome = ctx.outcome.clone()?;
        let mut rec = RoundRecord::from_state(history_id, ctx.machine.state(), outcome);
        rec.dealer_position = ctx.dealer_position;
        rec.dealer_selection = ctx.dealer.clone();
        rec.actions = ctx.actions.clone();
        rec.meta = Some(serde_json::json!({ "round_id": ctx.round_id }));
        Some(rec)
    }

    /// Writes the current document again after a failed write.
    pub fn retry_publish(&mut self) -> Result<u64, TableError> {
        self.publish()
    }

    fn ensure_writer(&self) -> Result<(), TableError> {
        match &self.fenced {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn publish(&mut self) -> Result<u64, TableError> {
        self.ensure_writer()?;
        let doc = match self.snapshot() {
            Some(doc) => doc,
            None => return Err(TableError::UnknownRound(String::new())),
        };
        let Some(ctx) = self.round.as_mut() else {
            return Err(TableError::UnknownRound(doc.round_id));
        };
        match self.channel.write(&ctx.lease, doc) {
            Ok(revision) => {
                ctx.revision = revision;
                ctx.dirty = false;
                Ok(revision)
            }
            Err(err) if err.is_fenced() => {
                tracing::warn!(
                    round_id = %ctx.round_id,
                    host = %self.host_id,
                    error = %err,
                    "writer fenced; no longer publishing this round"
                );
                self.fenced = Some(err.clone());
                Err(err)
            }
            Err(err) => {
                tracing::warn!(
                    round_id = %ctx.round_id,
                    error = %err,
                    "round write failed"
                );
                ctx.dirty = true;
                Err(err)
            }
        }
    }

    fn pending_bot(&self) -> Option<PlayerId> {
        let ctx = self.round.as_ref()?;
        let current = ctx.machine.current_player()?;
        (self.table.is_bot(current) && !ctx.bots_done.contains(current)).then(|| current.to_string())
    }

    fn schedule_bot(&mut self) {
        let Some(player) = self.pending_bot() else {
            return;
        };
        let due = self.clock.now() + self.settings.bot_think();
        if let Some(ctx) = self.round.as_mut() {
            let already = matches!(&ctx.bot_due, Some((p, _)) if *p == player);
            if !already {
                ctx.bot_due = Some((player, due));
            }
        }
    }

    fn run_due_bots(&mut self) -> Result<(), TableError> {
        while let Some(player) = self.pending_bot() {
            if self.settings.bot_think_ms > 0 {
                let now = self.clock.now();
                let due = self.round.as_ref().and_then(|c| c.bot_due.clone());
                match due {
                    Some((p, at)) if p == player && now >= at => {}
                    _ => {
                        self.schedule_bot();
                        return Ok(());
                    }
                }
            }
            self.play_bot(&player)?;
        }
        Ok(())
    }

    fn play_bot(&mut self, player: &str) -> Result<(), TableError> {
        self.ensure_writer()?;
        let Some(ctx) = self.round.as_mut() else {
            return Ok(());
        };
        if !ctx.bots_done.insert(player.to_string()) {
            return Ok(());
        }
        ctx.bot_due = None;
        let report = play_turn(
            &mut ctx.machine,
            player,
            self.bot.as_ref(),
            self.roller.as_mut(),
        )?;
        ctx.dirty = true;
        self.handle_events(&report.events);
        self.publish()?;
        Ok(())
    }

    fn handle_events(&mut self, events: &[RoundEvent]) {
        for event in events {
            let Some(ctx) = self.round.as_mut() else {
                return;
            };
            match event {
                RoundEvent::Rolled { player, faces, .. } => ctx.actions.push(ActionRecord::Roll {
                    player: player.clone(),
                    faces: faces.clone(),
                }),
                RoundEvent::HoldToggled {
                    player,
                    index,
                    held,
                } => ctx.actions.push(ActionRecord::Hold {
                    player: player.clone(),
                    index: *index,
                    held: *held,
                }),
                RoundEvent::SeatCompleted {
                    player,
                    locked_in: true,
                    ..
                } => ctx.actions.push(ActionRecord::LockIn {
                    player: player.clone(),
                }),
                RoundEvent::RoundCompleted { outcome } => self.complete(outcome.clone()),
                _ => {}
            }
        }
    }

    fn complete(&mut self, mut outcome: RoundOutcome) {
        let Some(ctx) = self.round.as_mut() else {
            return;
        };
        if ctx.completion_fired {
            tracing::error!(
                round_id = %ctx.round_id,
                error = %GameError::InvariantViolation("round completed twice".into()),
                "ignoring repeated completion"
            );
            return;
        }
        if self.settings.tie_policy == TiePolicy::RollOff && outcome.winners.len() > 1 {
            let mut dice = DiceDrawSource::new(self.roller.as_mut());
            if let Some(tie_break) = ctx.machine.resolve_tie(&mut dice) {
                outcome.winners = ctx.machine.state().winners.clone();
                outcome.tie_break = Some(tie_break);
            }
        }
        ctx.completion_fired = true;
        ctx.outcome = Some(outcome.clone());
        ctx.dirty = true;
        tracing::info!(
            round_id = %ctx.round_id,
            winners = ?outcome.winners,
            "round settled"
        );
        for listener in &self.listeners {
            listener.on_round_complete(&ctx.round_id, &outcome);
        }
    }
}
