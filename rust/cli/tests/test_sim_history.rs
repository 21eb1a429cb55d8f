//! Round history written by `sim --output`.

use dicehall_engine::logger::read_records;

#[test]
fn sim_writes_one_record_per_round() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rounds.jsonl");
    let path_str = path.to_str().unwrap();

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = dicehall_cli::run(
        vec![
            "dicehall", "sim", "--rounds", "4", "--players", "2", "--seed", "3", "--variant",
            "categories", "--output", path_str,
        ],
        &mut out,
        &mut err,
    );
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&err));

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 4);
    for rec in &records {
        assert_eq!(rec.seed, Some(3));
        assert!(rec.dealer_position.is_some());
        assert!(!rec.actions.is_empty());
    }
    // only the first round draws for the button
    assert!(records[0].dealer_selection.is_some());
    assert!(records[1..].iter().all(|r| r.dealer_selection.is_none()));

    let ids: std::collections::HashSet<_> = records.iter().map(|r| r.round_id.clone()).collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn unwritable_output_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    // a directory cannot be opened as the history file
    let path = dir.path();
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = dicehall_cli::run(
        vec![
            "dicehall",
            "sim",
            "--rounds",
            "1",
            "--output",
            path.to_str().unwrap(),
        ],
        &mut out,
        &mut err,
    );
    assert_eq!(code, 2);
    assert!(String::from_utf8_lossy(&err).contains("I/O error"));
}
