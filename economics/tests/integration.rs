use dpos_economics::*;

#[test]
fn test_breakdown_conserves_release() {
    let calculator = IncentiveCalculator::new(IncentiveRatios::default());

    for blocks in [0u64, 1, 7, 18, 1_000] {
        let breakdown = calculator.breakdown(blocks);
        assert_eq!(breakdown.sum(), calculator.total_dividends(blocks));
    }
}

#[test]
fn test_breakdown_rounding_loss_is_bounded() {
    // Odd per-block amount forces integer truncation in every bucket
    let ratios = IncentiveRatios {
        token_per_block: 333,
        ..Default::default()
    };
    let calculator = IncentiveCalculator::new(ratios);

    let total = calculator.total_dividends(7);
    let sum = calculator.breakdown(7).sum();
    assert!(sum <= total);
    assert!(total - sum < 5, "lost {} units", total - sum);
}

#[test]
fn test_voters_bucket() {
    let calculator = IncentiveCalculator::new(IncentiveRatios::default());

    // 18 blocks, 20% for voters
    assert_eq!(
        calculator.voters_dividends(18),
        18 * constants::TOKEN_PER_BLOCK / 5
    );
}

#[test]
fn test_miner_reward_combines_three_parts() {
    let calculator = IncentiveCalculator::new(IncentiveRatios::default());
    let blocks = 30;

    let reward = calculator.miner_reward(blocks, 3, 50, 100, 1, 4);

    let expected = calculator.miners_basic_reward(blocks) / 3
        + calculator.miners_votes_reward(blocks) / 2
        + calculator.reappointment_reward(blocks) / 4;
    assert_eq!(reward, expected);
}

#[test]
fn test_miner_reward_without_votes_or_history() {
    let calculator = IncentiveCalculator::new(IncentiveRatios::default());

    let reward = calculator.miner_reward(30, 3, 0, 0, 0, 0);
    assert_eq!(reward, calculator.miner_basic_reward(30, 3));
}

#[test]
fn test_backup_nodes_split_evenly() {
    let calculator = IncentiveCalculator::new(IncentiveRatios::default());

    let each = calculator.backup_node_reward(30, 4);
    assert_eq!(each, calculator.backup_nodes_reward(30) / 4);
    assert_eq!(calculator.backup_node_reward(30, 0), 0);
}

#[test]
fn test_ratios_from_json() {
    let ratios: IncentiveRatios =
        serde_json::from_str(r#"{"voters": 10, "miners_basic": 60}"#).unwrap();

    assert_eq!(ratios.voters, 10);
    assert_eq!(ratios.miners_basic, 60);
    assert_eq!(ratios.token_per_block, constants::TOKEN_PER_BLOCK);
    assert!(ratios.validate().is_ok());
}
