#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use dpos_consensus::dpos_core::{DPoSExtraInformation, Hash, MinerId, TransactionList};
use dpos_consensus::{ConsensusConfig, ConsensusContract, ConsensusEvent, Outcome};

pub const CHAIN_ID: i32 = 9_992_731;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn at(milliseconds: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(milliseconds)
}

pub fn miner(key: &str) -> MinerId {
    MinerId::new(key)
}

/// Ranked by leading byte, highest first: cc03, bb02, aa01
pub fn initial_miners() -> Vec<MinerId> {
    vec![miner("aa01"), miner("bb02"), miner("cc03")]
}

pub fn test_config() -> ConsensusConfig {
    ConsensusConfig {
        producer_number: 3,
        ..Default::default()
    }
}

pub fn secret(key: &MinerId, round_number: u64) -> Hash {
    Hash::from_string(&format!("secret:{}:{}", key, round_number))
}

pub fn extra(key: &MinerId, timestamp: DateTime<Utc>) -> DPoSExtraInformation {
    DPoSExtraInformation {
        public_key: key.clone(),
        timestamp,
        initial_miners: initial_miners(),
        chain_id: CHAIN_ID,
        ..Default::default()
    }
}

pub fn run(
    contract: &mut ConsensusContract,
    list: &TransactionList,
    sender: &MinerId,
    timestamp: DateTime<Utc>,
    height: u64,
) -> Vec<Outcome<Vec<ConsensusEvent>>> {
    list.transactions
        .iter()
        .map(|tx| contract.execute_transaction(tx, timestamp, height, sender))
        .collect()
}

pub fn assert_all_ok(outcomes: &[Outcome<Vec<ConsensusEvent>>]) {
    for outcome in outcomes {
        assert!(outcome.is_ok(), "unexpected failure: {:?}", outcome.message());
    }
}

/// Contract after the genesis block produced by cc03 at `t0`
pub fn genesis() -> ConsensusContract {
    init_logger();
    let mut contract = ConsensusContract::in_memory(test_config()).unwrap();
    let producer = miner("cc03");
    let list = contract
        .consensus_transactions(1, [0; 4], &extra(&producer, t0()))
        .unwrap();
    let outcomes = run(&mut contract, &list, &producer, t0(), 1);
    assert_all_ok(&outcomes);
    contract
}

/// Every miner of the current round uses its slot in order, revealing its
/// secret of the previous round
pub fn produce_round(contract: &mut ConsensusContract, height: &mut u64) -> Vec<ConsensusEvent> {
    produce_round_without(contract, height, &[])
}

/// Like [`produce_round`], but the `absent` miners let their slots pass.
///
/// A slot supplemented in the previous round is revealed with its stored in value.
pub fn produce_round_without(
    contract: &mut ConsensusContract,
    height: &mut u64,
    absent: &[MinerId],
) -> Vec<ConsensusEvent> {
    let round = contract.views().current_round().unwrap();
    let previous = contract.views().round(round.round_number - 1);
    let slots: Vec<(MinerId, DateTime<Utc>)> = round
        .ordered_miners()
        .into_iter()
        .filter(|m| !absent.contains(&m.public_key))
        .map(|m| (m.public_key.clone(), m.expected_mining_time))
        .collect();

    let mut events = Vec::new();
    for (key, time) in slots {
        let mut extra = extra(&key, time);
        extra.current_in_value = Some(secret(&key, round.round_number));
        if round.round_number > 1 {
            let stored = previous
                .as_ref()
                .and_then(|p| p.miner(&key))
                .and_then(|m| m.in_value);
            extra.in_value = Some(stored.unwrap_or_else(|| secret(&key, round.round_number - 1)));
        }

        let list = contract.consensus_transactions(*height, [0; 4], &extra).unwrap();
        assert!(!list.is_empty());
        *height += 1;

        for outcome in run(contract, &list, &key, time, *height) {
            match outcome {
                Outcome::Ok(mut emitted) => events.append(&mut emitted),
                other => panic!("slot of {} failed: {:?}", key, other.message()),
            }
        }
    }
    events
}

/// Close the current round at its extra block slot
pub fn close_round(contract: &mut ConsensusContract, height: &mut u64, timestamp: DateTime<Utc>) {
    let round = contract.views().current_round().unwrap();
    let producer = round.ordered_miners()[0].public_key.clone();

    let list = contract
        .consensus_transactions(*height, [0; 4], &extra(&producer, timestamp))
        .unwrap();
    assert_eq!(list.method_names(), vec!["NextRound"]);
    *height += 1;
    assert_all_ok(&run(contract, &list, &producer, timestamp, *height));
}

/// Close the current round at its extra block slot, supplementing unused slots
pub fn close_round_at_extra_slot(contract: &mut ConsensusContract, height: &mut u64) -> Vec<ConsensusEvent> {
    let round = contract.views().current_round().unwrap();
    let timestamp = round
        .extra_block_mining_time(contract.config().mining_interval_milliseconds)
        .unwrap();
    let producer = round.ordered_miners()[0].public_key.clone();

    let list = contract
        .consensus_transactions(*height, [0; 4], &extra(&producer, timestamp))
        .unwrap();
    assert_eq!(list.method_names(), vec!["NextRound"]);
    *height += 1;

    let mut events = Vec::new();
    for outcome in run(contract, &list, &producer, timestamp, *height) {
        match outcome {
            Outcome::Ok(mut emitted) => events.append(&mut emitted),
            other => panic!("closing round {} failed: {:?}", round.round_number, other.message()),
        }
    }
    events
}

/// Genesis followed by two fully produced rounds; the chain sits in round 3
pub fn third_round() -> (ConsensusContract, u64) {
    let mut contract = genesis();
    let mut height = 1;
    produce_round(&mut contract, &mut height);
    close_round(&mut contract, &mut height, at(24_000));
    produce_round(&mut contract, &mut height);
    close_round(&mut contract, &mut height, at(40_000));
    (contract, height)
}
