//! A participant's view of a round.
//!
//! The client applies its own actions to a local copy immediately, sends the matching
//! intent to the host, and folds replicated documents back in through a
//! [`LocalReconciler`] so that a lagging snapshot cannot undo an edit in flight.

use std::sync::Arc;

use dicehall_engine::dice::{DiceRoller, SeededRoller};
use dicehall_engine::errors::GameError;
use dicehall_engine::round::{Outcome, Phase, PlayerTurnState, RoundState, TurnStateMachine};
use dicehall_engine::rules;
use dicehall_engine::seat::PlayerId;

use crate::channel::{ReplicationChannel, Subscription};
use crate::clock::Clock;
use crate::document::{ClientId, RoundDocument, RoundId};
use crate::intent::{IntentSender, SeatAction, SeatIntent};
use crate::reconciler::{LocalReconciler, Reconciliation};
use crate::settings::TableSettings;

pub struct TableClient {
    client_id: ClientId,
    player: PlayerId,
    intents: IntentSender,
    reconciler: LocalReconciler,
    roller: Box<dyn DiceRoller + Send>,
    round_id: Option<RoundId>,
    view: Option<RoundState>,
    latest: Option<RoundDocument>,
}

impl TableClient {
    pub fn new(
        client_id: impl Into<ClientId>,
        player: impl Into<PlayerId>,
        intents: IntentSender,
        settings: &TableSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let client_id = client_id.into();
        let reconciler = LocalReconciler::new(
            client_id.clone(),
            settings.reconcile_mode,
            settings.protection_window(),
            clock,
        );
        Self {
            client_id,
            player: player.into(),
            intents,
            reconciler,
            roller: Box::new(SeededRoller::from_entropy()),
            round_id: None,
            view: None,
            latest: None,
        }
    }

    pub fn with_roller(mut self, roller: Box<dyn DiceRoller + Send>) -> Self {
        self.roller = roller;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn round_id(&self) -> Option<&str> {
        self.round_id.as_deref()
    }

    /// What the participant currently sees, own edits included.
    pub fn view(&self) -> Option<&RoundState> {
        self.view.as_ref()
    }

    /// Last document accepted from the channel.
    pub fn latest(&self) -> Option<&RoundDocument> {
        self.latest.as_ref()
    }

    pub fn my_seat(&self) -> Option<&PlayerTurnState> {
        self.view.as_ref()?.seat(&self.player)
    }

    pub fn is_my_turn(&self) -> bool {
        self.view
            .as_ref()
            .is_some_and(|v| v.phase == Phase::Playing && v.is_turn_of(&self.player))
    }

    pub fn reconciler(&self) -> &LocalReconciler {
        &self.reconciler
    }

    /// Folds a replicated document into the view.
    pub fn on_snapshot(&mut self, doc: RoundDocument) -> Reconciliation {
        if self.round_id.as_deref() != Some(doc.round_id.as_str()) {
            tracing::debug!(client = %self.client_id, round_id = %doc.round_id, "joined round");
            self.reconciler.start_round();
            self.round_id = Some(doc.round_id.clone());
            self.view = None;
        }
        let decision = self.reconciler.decide(&doc);
        match decision {
            Reconciliation::Stale => return decision,
            Reconciliation::Accepted => self.view = Some(doc.state.clone()),
            Reconciliation::KeptLocal => {
                let mut merged = doc.state.clone();
                let local = self
                    .view
                    .as_ref()
                    .and_then(|v| v.seat(&self.player))
                    .cloned();
                if let Some(local) = local {
                    merged.player_states.insert(self.player.clone(), local);
                }
                let mut machine = TurnStateMachine::from_state(merged);
                machine.resync_turn();
                self.view = Some(machine.into_state());
            }
        }
        self.latest = Some(doc);
        decision
    }

    /// Drops local edits the host never confirmed once their protection has lapsed.
    /// Returns true when the view changed.
    pub fn refresh(&mut self) -> bool {
        let Some(latest) = &self.latest else {
            return false;
        };
        if self.reconciler.protects(latest) || self.view.as_ref() == Some(&latest.state) {
            return false;
        }
        tracing::debug!(
            client = %self.client_id,
            revision = latest.revision,
            "protection lapsed; adopting replicated seat"
        );
        self.view = Some(latest.state.clone());
        true
    }

    /// Subscribes to `round_id` and seeds the view from the latest stored document.
    pub fn join(&mut self, channel: &dyn ReplicationChannel, round_id: &str) -> Subscription {
        let subscription = channel.subscribe(round_id);
        if let Some(doc) = channel.latest(round_id) {
            self.on_snapshot(doc);
        }
        subscription
    }

    /// Handles every document already delivered to `subscription`.
    pub fn pump(&mut self, subscription: &mut Subscription) -> usize {
        let mut handled = 0;
        while let Some(doc) = subscription.try_next() {
            self.on_snapshot(doc);
            handled += 1;
        }
        handled
    }

    /// Waits for the next document; `None` once the channel side is gone.
    pub async fn follow(&mut self, subscription: &mut Subscription) -> Option<Reconciliation> {
        let doc = subscription.next().await?;
        Some(self.on_snapshot(doc))
    }

    /// Rolls the unheld dice locally and asks the host to record the same faces.
    pub fn roll(&mut self) -> Outcome {
        let unheld = {
            let Some(view) = self.view.as_ref() else {
                return Outcome::Ignored(GameError::WrongPhase(Phase::Waiting));
            };
            if let Err(e) = rules::check_roll(view, &self.player) {
                return Outcome::Ignored(e);
            }
            view.seat(&self.player)
                .map_or(0, |s| s.dice.iter().filter(|d| !d.held).count())
        };
        let faces: Vec<u8> = (0..unheld).map(|_| self.roller.roll_face()).collect();
        let action = SeatAction::Roll {
            faces: faces.clone(),
        };
        self.apply_local(action, |m, p| m.roll_with_faces(p, &faces))
    }

    pub fn toggle_hold(&mut self, index: usize) -> Outcome {
        self.apply_local(SeatAction::ToggleHold { index }, |m, p| {
            m.toggle_hold(p, index)
        })
    }

    pub fn lock_in(&mut self) -> Outcome {
        self.apply_local(SeatAction::LockIn, |m, p| m.lock_in(p))
    }

    fn apply_local(
        &mut self,
        action: SeatAction,
        apply: impl FnOnce(&mut TurnStateMachine, &str) -> Outcome,
    ) -> Outcome {
        let Some(view) = self.view.clone() else {
            return Outcome::Ignored(GameError::WrongPhase(Phase::Waiting));
        };
        let mut machine = TurnStateMachine::from_state(view);
        let outcome = apply(&mut machine, &self.player);
        if let Outcome::Ignored(error) = &outcome {
            tracing::debug!(client = %self.client_id, error = %error, "local action rejected");
            return outcome;
        }
        self.view = Some(machine.into_state());
        let token = self.reconciler.next_token();
        self.submit(token, action);
        outcome
    }

    fn submit(&self, token: u64, action: SeatAction) {
        let Some(round_id) = self.round_id.clone() else {
            return;
        };
        let intent = SeatIntent {
            round_id,
            client: self.client_id.clone(),
            player: self.player.clone(),
            token,
            action,
        };
        if let Err(e) = self.intents.try_send(intent) {
            // the local view stays; the next snapshot after the window settles it
            tracing::warn!(client = %self.client_id, token, error = %e, "intent not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::intent::intent_queue;
    use dicehall_engine::dice::ScriptedRoller;
    use dicehall_engine::hand::GameVariant;

    fn started_doc(revision: u64) -> RoundDocument {
        let mut machine =
            TurnStateMachine::new(GameVariant::Wild, vec!["ann".into(), "bob".into()]);
        let _ = machine.start();
        let mut doc = RoundDocument::new("r1".into(), "host".into(), machine.into_state());
        doc.revision = revision;
        doc
    }

    #[test]
    fn roll_applies_locally_and_sends_intent() {
        let (tx, mut rx) = intent_queue();
        let clock = Arc::new(ManualClock::new());
        let mut client = TableClient::new("c1", "ann", tx, &TableSettings::default(), clock)
            .with_roller(Box::new(ScriptedRoller::new(vec![2, 2, 3, 4, 5])));
        client.on_snapshot(started_doc(1));

        assert!(client.roll().is_applied());
        assert_eq!(client.my_seat().unwrap().faces(), vec![2, 2, 3, 4, 5]);

        let intent = rx.try_recv().unwrap();
        assert_eq!(intent.token, 1);
        assert_eq!(
            intent.action,
            SeatAction::Roll {
                faces: vec![2, 2, 3, 4, 5]
            }
        );
    }

    #[test]
    fn illegal_local_actions_send_nothing() {
        let (tx, mut rx) = intent_queue();
        let clock = Arc::new(ManualClock::new());
        let mut client = TableClient::new("c2", "bob", tx, &TableSettings::default(), clock);
        assert!(!client.roll().is_applied());
        client.on_snapshot(started_doc(1));
        assert!(!client.roll().is_applied());
        assert!(!client.lock_in().is_applied());
        assert!(rx.try_recv().is_err());
        assert_eq!(client.reconciler().last_token(), 0);
    }
}
