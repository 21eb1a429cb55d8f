use std::sync::Arc;
use std::time::Duration;

use dicehall_engine::dice::ScriptedRoller;
use dicehall_engine::seat::{Seat, Table};
use dicehall_table::{
    intent_queue, InMemoryChannel, ManualClock, ReconcileMode, Reconciliation, ReplicationChannel,
    RoundHost, SeatAction, SeatIntent, TableClient, TableError, TableSettings,
};

fn two_humans() -> Table {
    Table::new(vec![Seat::human("ann"), Seat::human("bob")])
}

fn host(
    name: &str,
    channel: &Arc<InMemoryChannel>,
    clock: &Arc<ManualClock>,
    settings: &TableSettings,
) -> RoundHost {
    RoundHost::new(
        name,
        two_humans(),
        settings.clone(),
        channel.clone(),
        clock.clone(),
    )
    .unwrap()
}

fn ann_client(
    settings: &TableSettings,
    clock: &Arc<ManualClock>,
) -> (TableClient, dicehall_table::IntentReceiver) {
    let (tx, rx) = intent_queue();
    let client = TableClient::new("c-ann", "ann", tx, settings, clock.clone())
        .with_roller(Box::new(ScriptedRoller::new(vec![4, 4, 2, 3, 5])));
    (client, rx)
}

#[test]
fn fenced_writer_stops_and_new_writer_continues() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut old = host("host-a", &channel, &clock, &settings);
    let round_id = old.open_next_round().unwrap();

    let mut new = host("host-b", &channel, &clock, &settings);
    new.adopt_round(channel.latest(&round_id).unwrap()).unwrap();
    assert_eq!(new.context().unwrap().epoch(), 2);

    let roll = SeatIntent {
        round_id: round_id.clone(),
        client: "c-ann".into(),
        player: "ann".into(),
        token: 1,
        action: SeatAction::Roll {
            faces: vec![6, 6, 6, 6, 6],
        },
    };
    let err = old.apply_intent(roll.clone()).unwrap_err();
    assert!(err.is_fenced());
    assert!(old.is_fenced());
    assert!(old.retry_publish().unwrap_err().is_fenced());
    assert!(old.tick().unwrap_err().is_fenced());

    let latest = channel.latest(&round_id).unwrap();
    assert_eq!(latest.writer, "host-b");
    assert_eq!(latest.state.seat("ann").unwrap().rolls_used(), 0);

    assert!(new.apply_intent(roll).unwrap().is_applied());
    let latest = channel.latest(&round_id).unwrap();
    assert_eq!(latest.state.seat("ann").unwrap().faces(), vec![6, 6, 6, 6, 6]);
    assert_eq!(latest.epoch, 2);
}

#[test]
fn failed_write_is_retried_on_the_next_tick() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    let revision = channel.latest(&round_id).unwrap().revision;

    channel.fail_next_writes(1);
    let err = host
        .apply_intent(SeatIntent {
            round_id: round_id.clone(),
            client: "c-ann".into(),
            player: "ann".into(),
            token: 1,
            action: SeatAction::Roll {
                faces: vec![2, 3, 4, 5, 6],
            },
        })
        .unwrap_err();
    assert!(matches!(err, TableError::WriteFailure { .. }));
    assert!(!host.is_fenced());
    assert_eq!(host.state().unwrap().seat("ann").unwrap().rolls_used(), 1);
    assert_eq!(channel.latest(&round_id).unwrap().revision, revision);

    host.tick().unwrap();
    let latest = channel.latest(&round_id).unwrap();
    assert_eq!(latest.revision, revision + 1);
    assert_eq!(latest.ack_for("c-ann"), 1);
    assert_eq!(latest.state.seat("ann").unwrap().rolls_used(), 1);
}

#[test]
fn lagging_snapshot_does_not_undo_a_local_roll() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    let (mut ann, mut rx) = ann_client(&settings, &clock);
    let mut sub = ann.join(channel.as_ref(), &round_id);

    assert!(ann.roll().is_applied());
    // the host republishes before it has seen the roll
    host.retry_publish().unwrap();
    let lagging = sub.try_next().unwrap();
    assert_eq!(lagging.ack_for("c-ann"), 0);
    assert_eq!(ann.on_snapshot(lagging), Reconciliation::KeptLocal);
    assert_eq!(ann.my_seat().unwrap().faces(), vec![4, 4, 2, 3, 5]);

    host.drain_intents(&mut rx).unwrap();
    let acked = sub.try_next().unwrap();
    assert_eq!(acked.ack_for("c-ann"), 1);
    assert_eq!(ann.on_snapshot(acked), Reconciliation::Accepted);
    assert_eq!(ann.view(), host.state());
}

#[test]
fn duplicate_and_old_documents_are_dropped() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    let (mut ann, mut rx) = ann_client(&settings, &clock);
    let mut sub = ann.join(channel.as_ref(), &round_id);
    let first = channel.latest(&round_id).unwrap();

    channel.duplicate_deliveries(true);
    assert!(ann.roll().is_applied());
    host.drain_intents(&mut rx).unwrap();
    let a = sub.try_next().unwrap();
    let b = sub.try_next().unwrap();
    assert_eq!(a, b);
    assert_eq!(ann.on_snapshot(a), Reconciliation::Accepted);
    assert_eq!(ann.on_snapshot(b), Reconciliation::Stale);

    channel.duplicate_deliveries(false);
    let view = ann.view().cloned();
    channel.deliver(first);
    assert_eq!(ann.pump(&mut sub), 1);
    assert_eq!(ann.view().cloned(), view);
    assert_eq!(ann.latest().unwrap().revision, 2);
}

#[test]
fn unconfirmed_edit_is_dropped_after_the_window() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    // intents go to a queue the host never reads
    let (mut ann, _lost) = ann_client(&settings, &clock);
    let mut sub = ann.join(channel.as_ref(), &round_id);

    assert!(ann.roll().is_applied());
    host.retry_publish().unwrap();
    ann.pump(&mut sub);
    assert_eq!(ann.my_seat().unwrap().rolls_used(), 1);
    assert!(!ann.refresh());

    clock.advance(settings.protection_window());
    assert!(ann.refresh());
    assert_eq!(ann.my_seat().unwrap().rolls_used(), 0);
    assert_eq!(ann.view(), host.state());
}

#[test]
fn window_mode_ignores_acknowledgements() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings {
        reconcile_mode: ReconcileMode::Window,
        protection_window_ms: 200,
        ..Default::default()
    };
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    let (mut ann, mut rx) = ann_client(&settings, &clock);
    let mut sub = ann.join(channel.as_ref(), &round_id);

    assert!(ann.roll().is_applied());
    host.drain_intents(&mut rx).unwrap();
    let acked = sub.try_next().unwrap();
    assert_eq!(acked.ack_for("c-ann"), 1);
    assert_eq!(ann.on_snapshot(acked), Reconciliation::KeptLocal);

    clock.advance(Duration::from_millis(200));
    host.retry_publish().unwrap();
    let later = sub.try_next().unwrap();
    assert_eq!(ann.on_snapshot(later), Reconciliation::Accepted);
}

#[test]
fn observers_follow_every_document() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();

    let (tx, _rx) = intent_queue();
    let mut watcher = TableClient::new("c-watch", "nobody", tx, &settings, clock.clone());
    let mut sub = watcher.join(channel.as_ref(), &round_id);
    assert!(!watcher.is_my_turn());
    assert!(!watcher.roll().is_applied());

    host.retry_publish().unwrap();
    host.retry_publish().unwrap();
    assert_eq!(watcher.pump(&mut sub), 2);
    assert_eq!(watcher.latest().unwrap().revision, 3);

    drop(sub);
    assert_eq!(channel.subscriber_count(&round_id), 0);
}

#[test]
fn lagging_snapshot_after_lock_in_keeps_the_turn_moving() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();
    let (mut ann, _rx) = ann_client(&settings, &clock);
    let mut sub = ann.join(channel.as_ref(), &round_id);

    assert!(ann.roll().is_applied());
    assert!(ann.lock_in().is_applied());
    assert_eq!(
        ann.view().unwrap().current_turn_player_id.as_deref(),
        Some("bob")
    );

    host.retry_publish().unwrap();
    let lagging = sub.try_next().unwrap();
    assert_eq!(lagging.ack_for("c-ann"), 0);
    assert_eq!(
        lagging.state.current_turn_player_id.as_deref(),
        Some("ann")
    );
    assert_eq!(ann.on_snapshot(lagging), Reconciliation::KeptLocal);

    let view = ann.view().unwrap();
    assert_eq!(view.current_turn_player_id.as_deref(), Some("bob"));
    assert!(view.seat("ann").unwrap().is_complete);
    assert!(view.check_invariants().is_ok());
    assert!(!ann.is_my_turn());
}

#[test]
fn observer_converges_after_a_burst_it_did_not_read() {
    let channel = Arc::new(InMemoryChannel::new());
    let clock = Arc::new(ManualClock::new());
    let settings = TableSettings::default();
    let mut host = host("host", &channel, &clock, &settings);
    let round_id = host.open_next_round().unwrap();

    let (tx, _rx) = intent_queue();
    let mut watcher = TableClient::new("c-watch", "nobody", tx, &settings, clock.clone());
    let mut sub = watcher.join(channel.as_ref(), &round_id);

    for _ in 0..300 {
        host.retry_publish().unwrap();
    }
    assert_eq!(channel.subscriber_count(&round_id), 1);

    assert!(watcher.pump(&mut sub) > 0);
    let newest = channel.latest(&round_id).unwrap();
    assert_eq!(watcher.latest().unwrap().revision, newest.revision);
    assert_eq!(watcher.view(), Some(&newest.state));
    assert_eq!(channel.subscriber_count(&round_id), 1);

    host.retry_publish().unwrap();
    assert_eq!(watcher.pump(&mut sub), 1);
    assert_eq!(watcher.latest().unwrap().revision, newest.revision + 1);
}
