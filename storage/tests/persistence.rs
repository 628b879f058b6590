use chrono::{TimeZone, Utc};
use dpos_core::{ConsensusState, MemoryState, MinerId, Miners, Tickets};
use dpos_storage::ConsensusStore;
use tempfile::tempdir;

fn create_test_state() -> MemoryState {
    let start = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let miners = Miners::new(1, vec![MinerId::new("aa01"), MinerId::new("bb02")]);
    let term = miners.generate_new_term(4000, 8000, 0, start, 7);

    let mut state = MemoryState::new();
    state.set_chain_id(7);
    state.set_blockchain_start_timestamp(start);
    assert!(state.try_update_term_number(1));
    assert!(state.try_update_round_number(1));
    assert!(state.set_miners(miners, false));
    assert!(state.try_add_round(term.first_round));
    assert!(state.try_add_round(term.second_round));
    state.put_tickets(Tickets::new(MinerId::new("cc03"), 40));
    state
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("consensus");
    let state = create_test_state();

    {
        let store = ConsensusStore::open(&path).unwrap();
        store.save_state(&state).unwrap();
    }

    let store = ConsensusStore::open(&path).unwrap();
    let loaded = store.load_state().unwrap().unwrap();
    assert_eq!(loaded, state);
    assert_eq!(loaded.current_round().unwrap().round_number, 1);
    assert_eq!(loaded.victories(1), vec![MinerId::new("cc03")]);
}

#[test]
fn test_rounds_are_stored_individually() {
    let dir = tempdir().unwrap();
    let store = ConsensusStore::open(dir.path().join("consensus")).unwrap();
    let state = create_test_state();
    store.save_state(&state).unwrap();

    let second = store.load_round(2).unwrap().unwrap();
    assert_eq!(second, state.rounds[&2]);

    let mut third = second.clone();
    third.round_number = 10;
    store.save_round(&third).unwrap();
    store.flush().unwrap();

    let numbers: Vec<u64> = store
        .load_rounds()
        .unwrap()
        .iter()
        .map(|r| r.round_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 10]);
}

#[test]
fn test_export_json() {
    let dir = tempdir().unwrap();
    let store = ConsensusStore::open(dir.path().join("consensus")).unwrap();
    let state = create_test_state();
    store.save_state(&state).unwrap();

    let export = dir.path().join("state.json");
    assert!(store.export_json(&export).unwrap());

    let json = std::fs::read_to_string(&export).unwrap();
    let parsed: MemoryState = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);
}
