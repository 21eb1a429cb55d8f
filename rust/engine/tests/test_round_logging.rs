use std::fs;
use std::path::PathBuf;

use dicehall_engine::hand::GameVariant;
use dicehall_engine::logger::{read_records, ActionRecord, RoundLogger, RoundRecord};
use dicehall_engine::round::TurnStateMachine;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("target");
    p.push(format!("{}_{}.jsonl", name, std::process::id()));
    p
}

fn finished_record(id: &str) -> RoundRecord {
    let mut m = TurnStateMachine::new(GameVariant::Wild, vec!["ann".into(), "bob".into()]);
    let _ = m.start();
    let _ = m.roll_with_faces("ann", &[6, 6, 2, 3, 4]);
    let _ = m.lock_in("ann");
    let _ = m.roll_with_faces("bob", &[5, 5, 5, 3, 4]);
    let outcome = m.lock_in("bob").round_outcome().cloned().expect("round finished");
    let mut rec = RoundRecord::from_state(id.to_string(), m.state(), outcome);
    rec.seed = Some(11);
    rec.actions = vec![
        ActionRecord::Roll {
            player: "ann".into(),
            faces: vec![6, 6, 2, 3, 4],
        },
        ActionRecord::LockIn {
            player: "ann".into(),
        },
    ];
    rec
}

#[test]
fn writes_jsonl_with_lf_only() {
    let path = tmp_path("roundlog");
    let mut logger = RoundLogger::create(&path).expect("create logger");
    logger.write(&finished_record("20250102-000001")).expect("write");
    let bytes = fs::read(&path).expect("read file");
    assert!(bytes.ends_with(b"\n"));
    assert!(!bytes.contains(&b'\r'));
    let _ = fs::remove_file(&path);
}

#[test]
fn sequential_ids_increment() {
    let mut logger = RoundLogger::with_seq_for_test("20251231");
    assert_eq!(logger.next_id(), "20251231-000001");
    assert_eq!(logger.next_id(), "20251231-000002");
}

#[test]
fn ts_is_generated_when_missing_and_preserved_when_present() {
    let path = tmp_path("roundlog_ts");
    let mut logger = RoundLogger::create(&path).expect("create logger");
    logger.write(&finished_record("20250102-000010")).expect("write");
    let mut stamped = finished_record("20250102-000011");
    stamped.ts = Some("2025-01-02T03:04:05Z".to_string());
    logger.write(&stamped).expect("write");

    let records = read_records(&path).expect("read back");
    assert_eq!(records.len(), 2);
    assert!(records[0].ts.is_some());
    assert_eq!(records[1].ts.as_deref(), Some("2025-01-02T03:04:05Z"));
    let _ = fs::remove_file(&path);
}

#[test]
fn record_keeps_winner_and_seat_summaries() {
    let rec = finished_record("20250102-000020");
    assert_eq!(rec.outcome.winners, vec!["bob".to_string()]);
    assert_eq!(rec.seats.len(), 2);
    assert_eq!(rec.seats[0].faces, vec![6, 6, 2, 3, 4]);
    assert_eq!(rec.seats[0].rolls_used, 1);
    assert!(rec.seats[1].locked_in);
    let json = serde_json::to_value(&rec).unwrap();
    assert_eq!(json["variant"], "wild");
    assert_eq!(json["actions"][1]["action"], "lock_in");
}

#[test]
fn append_keeps_earlier_rounds() {
    let path = tmp_path("roundlog_append");
    {
        let mut logger = RoundLogger::create(&path).expect("create");
        logger.write(&finished_record("20250102-000030")).expect("write");
    }
    {
        let mut logger = RoundLogger::append(&path).expect("append");
        logger.write(&finished_record("20250102-000031")).expect("write");
    }
    let ids: Vec<String> = read_records(&path)
        .expect("read")
        .into_iter()
        .map(|r| r.round_id)
        .collect();
    assert_eq!(ids, vec!["20250102-000030", "20250102-000031"]);
    let _ = fs::remove_file(&path);
}
