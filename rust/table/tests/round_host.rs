use std::sync::Arc;
use std::time::Duration;

use dicehall_engine::deck::Deck;
use dicehall_engine::dice::{ScriptedRoller, SeededRoller};
use dicehall_engine::errors::GameError;
use dicehall_engine::logger::ActionRecord;
use dicehall_engine::round::Phase;
use dicehall_engine::seat::{Seat, Table};
use dicehall_engine::tiebreak::TieBreakPhase;
use dicehall_table::{
    intent_queue, InMemoryChannel, ManualClock, RecordingListener, ReplicationChannel, RoundHost,
    SeatAction, SeatIntent, TableClient, TableError, TableSettings, TiePolicy,
};

struct Harness {
    channel: Arc<InMemoryChannel>,
    clock: Arc<ManualClock>,
    host: RoundHost,
    listener: Arc<RecordingListener>,
}

fn harness(table: Table, settings: TableSettings) -> Harness {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let listener = Arc::new(RecordingListener::new());
    let mut host = RoundHost::new("host", table, settings, channel.clone(), clock.clone())
        .unwrap()
        .with_roller(Box::new(SeededRoller::new_with_seed(11)));
    host.add_listener(listener.clone());
    Harness {
        channel,
        clock,
        host,
        listener,
    }
}

fn intent(round_id: &str, client: &str, player: &str, token: u64, action: SeatAction) -> SeatIntent {
    SeatIntent {
        round_id: round_id.to_string(),
        client: client.to_string(),
        player: player.to_string(),
        token,
        action,
    }
}

fn roll(faces: &[u8]) -> SeatAction {
    SeatAction::Roll {
        faces: faces.to_vec(),
    }
}

fn human_then_bot() -> Table {
    Table::new(vec![Seat::human("ann"), Seat::bot("bot-1")])
}

fn bot_actions(actions: &[ActionRecord]) -> usize {
    actions
        .iter()
        .filter(|a| match a {
            ActionRecord::Roll { player, .. }
            | ActionRecord::Hold { player, .. }
            | ActionRecord::LockIn { player } => player == "bot-1",
        })
        .count()
}

#[test]
fn human_turn_then_bot_turn_completes_round() {
    let settings = TableSettings::default();
    let mut h = harness(human_then_bot(), settings.clone());
    let round_id = h.host.open_next_round().unwrap();
    assert_eq!(h.host.state().unwrap().turn_order, vec!["ann", "bot-1"]);

    let (tx, mut rx) = intent_queue();
    let mut ann = TableClient::new("c-ann", "ann", tx, &settings, h.clock.clone())
        .with_roller(Box::new(ScriptedRoller::new(vec![6, 6, 6, 1, 2])));
    let mut sub = ann.join(h.channel.as_ref(), &round_id);
    assert!(ann.is_my_turn());

    assert!(ann.roll().is_applied());
    assert!(ann.lock_in().is_applied());
    assert!(!ann.is_my_turn());
    assert_eq!(h.host.drain_intents(&mut rx).unwrap(), 2);

    assert!(h.host.is_complete());
    ann.pump(&mut sub);
    let view = ann.view().unwrap();
    assert_eq!(view.phase, Phase::Complete);
    assert_eq!(Some(view), h.host.state());

    let completions = h.listener.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].0, round_id);
}

#[test]
fn replayed_notifications_do_not_replay_the_bot() {
    let mut h = harness(human_then_bot(), TableSettings::default());
    let round_id = h.host.open_next_round().unwrap();
    h.host
        .apply_intent(intent(&round_id, "c-ann", "ann", 1, roll(&[2, 3, 4, 5, 6])))
        .unwrap();
    h.host
        .apply_intent(intent(&round_id, "c-ann", "ann", 2, SeatAction::LockIn))
        .unwrap();
    let before = h.host.record("20261017-000001".into()).unwrap().actions;

    for _ in 0..3 {
        h.channel.replay_latest(&round_id);
        h.host.on_change().unwrap();
        h.host.tick().unwrap();
    }

    let after = h.host.record("20261017-000001".into()).unwrap().actions;
    assert_eq!(before, after);
    assert!(bot_actions(&after) >= 2);
    assert_eq!(h.listener.completions().len(), 1);
}

#[test]
fn bot_opening_the_round_plays_immediately() {
    let table = Table::new(vec![Seat::bot("bot-1"), Seat::human("ann")]);
    let mut h = harness(table, TableSettings::default());
    h.host.open_next_round().unwrap();

    let state = h.host.state().unwrap();
    assert_eq!(state.turn_order, vec!["bot-1", "ann"]);
    assert!(state.seat("bot-1").unwrap().is_complete);
    assert_eq!(state.current_turn_player_id.as_deref(), Some("ann"));
}

#[test]
fn bot_waits_for_its_think_time() {
    let table = Table::new(vec![Seat::bot("bot-1"), Seat::human("ann")]);
    let settings = TableSettings {
        bot_think_ms: 500,
        ..Default::default()
    };
    let mut h = harness(table, settings);
    h.host.open_next_round().unwrap();
    h.host.on_change().unwrap();
    h.host.tick().unwrap();
    assert_eq!(h.host.state().unwrap().seat("bot-1").unwrap().rolls_used(), 0);

    h.clock.advance(Duration::from_millis(499));
    h.host.tick().unwrap();
    assert!(!h.host.state().unwrap().seat("bot-1").unwrap().is_complete);

    h.clock.advance(Duration::from_millis(1));
    h.host.tick().unwrap();
    let seat = h.host.state().unwrap().seat("bot-1").unwrap();
    assert!(seat.is_complete);
    assert!(seat.rolls_used() <= 3);
}

#[test]
fn open_round_draws_for_the_button_once() {
    let table = Table::new(vec![
        Seat::human("ann"),
        Seat::human("bob"),
        Seat::human("cy"),
    ]);
    let mut h = harness(table, TableSettings::default());
    let round_id = h.host.open_round(&mut Deck::new_with_seed(7)).unwrap();

    let dealers = h.listener.dealers();
    assert_eq!(dealers.len(), 1);
    assert_eq!(dealers[0], (round_id.clone(), h.host.table().dealer_position()));

    let doc = h.channel.latest(&round_id).unwrap();
    let selection = doc.dealer.unwrap();
    assert_eq!(selection.phase, TieBreakPhase::Resolved);
    assert_eq!(selection.winner_position, Some(h.host.table().dealer_position()));

    // dealer acts last
    let dealer_id = &h.host.table().seats()[h.host.table().dealer_position()].id;
    assert_eq!(doc.state.turn_order.last(), Some(dealer_id));
}

#[test]
fn round_without_participants_completes_with_no_winners() {
    let mut table = Table::new(vec![Seat::human("ann")]);
    table.set_sitting_out("ann", true);
    let mut h = harness(table, TableSettings::default());
    h.host.open_next_round().unwrap();

    let outcome = h.host.outcome().unwrap();
    assert!(outcome.winners.is_empty());
    assert_eq!(h.host.state().unwrap().phase, Phase::Complete);
    assert_eq!(h.listener.completions().len(), 1);
}

#[test]
fn illegal_intents_are_acknowledged_but_change_nothing() {
    let table = Table::new(vec![Seat::human("ann"), Seat::human("bob")]);
    let mut h = harness(table, TableSettings::default());
    let round_id = h.host.open_next_round().unwrap();
    let before = h.channel.latest(&round_id).unwrap();

    let outcome = h
        .host
        .apply_intent(intent(&round_id, "c-bob", "bob", 4, roll(&[6, 6, 6, 6, 6])))
        .unwrap();
    assert!(!outcome.is_applied());

    let after = h.channel.latest(&round_id).unwrap();
    assert_eq!(after.state, before.state);
    assert_eq!(after.ack_for("c-bob"), 4);
    assert!(after.revision > before.revision);
}

#[test]
fn clients_cannot_act_for_bot_seats() {
    let table = Table::new(vec![Seat::bot("bot-1"), Seat::human("ann")]);
    let settings = TableSettings {
        bot_think_ms: 1000,
        ..Default::default()
    };
    let mut h = harness(table, settings);
    let round_id = h.host.open_next_round().unwrap();
    assert_eq!(h.host.state().unwrap().current_turn_player_id.as_deref(), Some("bot-1"));

    let outcome = h
        .host
        .apply_intent(intent(&round_id, "c-ann", "bot-1", 1, roll(&[6, 6, 6, 6, 6])))
        .unwrap();
    assert!(matches!(
        outcome.rejection(),
        Some(GameError::NotPlayersTurn { .. })
    ));
    assert_eq!(h.host.state().unwrap().seat("bot-1").unwrap().rolls_used(), 0);
}

#[test]
fn intents_for_other_rounds_are_refused() {
    let mut h = harness(human_then_bot(), TableSettings::default());
    h.host.open_next_round().unwrap();
    let err = h
        .host
        .apply_intent(intent("not-this-one", "c-ann", "ann", 1, SeatAction::LockIn))
        .unwrap_err();
    assert!(matches!(err, TableError::UnknownRound(_)));
}

fn tied_round(tie_policy: TiePolicy, host_dice: Vec<u8>) -> Harness {
    let table = Table::new(vec![Seat::human("ann"), Seat::human("bob")]);
    let settings = TableSettings {
        tie_policy,
        ..Default::default()
    };
    let mut h = harness(table, settings);
    h.host = h.host.with_roller(Box::new(ScriptedRoller::new(host_dice)));
    let round_id = h.host.open_next_round().unwrap();
    for (client, player) in [("c-ann", "ann"), ("c-bob", "bob")] {
        h.host
            .apply_intent(intent(&round_id, client, player, 1, roll(&[3, 3, 3, 2, 4])))
            .unwrap();
        h.host
            .apply_intent(intent(&round_id, client, player, 2, SeatAction::LockIn))
            .unwrap();
    }
    h
}

#[test]
fn split_policy_reports_every_tied_seat() {
    let h = tied_round(TiePolicy::Split, vec![]);
    let outcome = h.host.outcome().unwrap();
    assert_eq!(outcome.winners, vec!["ann", "bob"]);
    assert!(outcome.tie_break.is_none());
}

#[test]
fn roll_off_policy_settles_ties_with_dice() {
    let h = tied_round(TiePolicy::RollOff, vec![2, 5]);
    let outcome = h.host.outcome().unwrap();
    assert_eq!(outcome.winners, vec!["bob"]);
    let tie_break = outcome.tie_break.as_ref().unwrap();
    assert_eq!(tie_break.winner, Some(1));
    assert_eq!(tie_break.round_number, 1);
    assert_eq!(h.host.state().unwrap().winners, vec!["bob"]);

    let completions = h.listener.completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].1.winners, vec!["bob"]);
}

#[test]
fn finished_round_produces_a_history_record() {
    let mut h = harness(human_then_bot(), TableSettings::default());
    let round_id = h.host.open_next_round().unwrap();
    assert!(h.host.record("20261017-000001".into()).is_none());

    h.host
        .apply_intent(intent(&round_id, "c-ann", "ann", 1, roll(&[5, 5, 1, 2, 3])))
        .unwrap();
    h.host
        .apply_intent(intent(&round_id, "c-ann", "ann", 2, SeatAction::ToggleHold { index: 0 }))
        .unwrap();
    h.host
        .apply_intent(intent(&round_id, "c-ann", "ann", 3, SeatAction::LockIn))
        .unwrap();

    let record = h.host.record("20261017-000001".into()).unwrap();
    assert_eq!(record.round_id, "20261017-000001");
    assert_eq!(record.dealer_position, Some(1));
    assert_eq!(record.seats.len(), 2);
    assert_eq!(
        &record.actions[..3],
        &[
            ActionRecord::Roll {
                player: "ann".into(),
                faces: vec![5, 5, 1, 2, 3]
            },
            ActionRecord::Hold {
                player: "ann".into(),
                index: 0,
                held: true
            },
            ActionRecord::LockIn {
                player: "ann".into()
            },
        ]
    );
    assert!(bot_actions(&record.actions) >= 2);
    assert_eq!(
        record.meta.unwrap()["round_id"],
        serde_json::Value::String(round_id)
    );
}

#[test]
fn next_round_passes_the_button_and_resets_context() {
    let mut h = harness(human_then_bot(), TableSettings::default());
    let first = h.host.open_next_round().unwrap();
    assert_eq!(h.host.table().dealer_position(), 1);
    h.host
        .apply_intent(intent(&first, "c-ann", "ann", 1, roll(&[2, 2, 2, 3, 4])))
        .unwrap();
    h.host
        .apply_intent(intent(&first, "c-ann", "ann", 2, SeatAction::LockIn))
        .unwrap();
    assert!(h.host.is_complete());

    let second = h.host.open_next_round().unwrap();
    assert_ne!(first, second);
    assert_eq!(h.host.table().dealer_position(), 0);
    // bot sits left of the new dealer and has already played
    let state = h.host.state().unwrap();
    assert_eq!(state.turn_order, vec!["bot-1", "ann"]);
    assert!(state.seat("bot-1").unwrap().is_complete);
    assert!(!h.host.is_complete());
    assert_eq!(h.listener.completions().len(), 1);
    assert_eq!(h.listener.dealers().len(), 2);
}

#[test]
fn watchers_can_subscribe_before_the_round_opens() {
    let table = Table::new(vec![Seat::bot("bot-1"), Seat::bot("bot-2")]);
    let mut h = harness(table, TableSettings::default());
    let upcoming = h.host.next_round_id();
    assert_eq!(h.host.next_round_id(), upcoming);

    let (tx, _rx) = intent_queue();
    let mut watcher = TableClient::new("c-watch", "nobody", tx, &TableSettings::default(), h.clock.clone());
    let mut sub = watcher.join(h.channel.as_ref(), &upcoming);
    assert!(watcher.view().is_none());

    let round_id = h.host.open_next_round().unwrap();
    assert_eq!(round_id, upcoming);
    assert!(h.host.is_complete());
    assert!(watcher.pump(&mut sub) > 0);
    assert_eq!(watcher.view().unwrap().phase, Phase::Complete);
    assert_eq!(watcher.view(), h.host.state());
    assert_ne!(h.host.next_round_id(), round_id);
}
