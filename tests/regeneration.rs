//! Regeneration integration tests
//!
//! Drives the full load → carry-over → commit → persist pipeline against a
//! mock stash and a temporary ledger directory:
//! 1. Genesis and date rollover
//! 2. Carry-over of unclaimed entries
//! 3. Failure paths that must leave the ledger untouched
//! 4. Properties: idempotence, conservation, proof validity

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use stashcraft_aggregator::{LedgerStore, RegenerateOutcome, RegenerateRequest, Regenerator};
use stashcraft_core::{checksum, parse_address, Address, RewardRow, StashError, B256, U256};
use stashcraft_prover::{merkle_leaf, verify_proof, verify_snapshot};
use stashcraft_settlement::StashClient;

const SYMBOL: &str = "SDT";
const TOKEN: &str = "0x73968b9a57c6e53d41345fd57a6e6ae27d6cdb2f";
const ADDR1: &str = "0x1111111111111111111111111111111111111111";
const ADDR2: &str = "0x2222222222222222222222222222222222222222";

fn token() -> Address {
    parse_address(TOKEN).unwrap()
}

fn addr(text: &str) -> Address {
    parse_address(text).unwrap()
}

/// Distinct accounts with the counter in the low two bytes.
fn numbered(i: u16) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xAB;
    bytes[18..].copy_from_slice(&(i + 1).to_be_bytes());
    Address::from(bytes)
}

fn request(date: &str, rows: Vec<RewardRow>) -> RegenerateRequest {
    RegenerateRequest {
        symbol: SYMBOL.to_string(),
        token: token(),
        date: date.to_string(),
        rows,
    }
}

fn rows(entries: &[(&str, &str)]) -> Vec<RewardRow> {
    entries.iter().map(|(a, v)| RewardRow::new(*a, *v)).collect()
}

fn regenerator(root: &Path) -> Regenerator<StashClient> {
    Regenerator::new(StashClient::mock(), LedgerStore::new(root, SYMBOL))
}

/// Every file in the ledger directory with its bytes.
fn dir_contents(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let path = entry.unwrap().path();
            let bytes = fs::read(&path).unwrap();
            (path, bytes)
        })
        .collect()
}

fn assert_proofs_valid(outcome: &RegenerateOutcome) {
    assert_eq!(verify_snapshot(&outcome.snapshot), Ok(()));
    let root = outcome.snapshot.merkle_root.unwrap();
    for (account, claim) in &outcome.snapshot.claims {
        let leaf = merkle_leaf(claim.index, account, &claim.amount);
        assert!(
            verify_proof(&leaf, &claim.proof, &root),
            "proof for {} does not reach the root",
            checksum(account)
        );
    }
}

// ============================================================================
// 1. Genesis and rollover
// ============================================================================

#[tokio::test]
async fn test_genesis_single_leaf_root_is_leaf() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    let outcome = regen
        .run(&request("20240101", rows(&[(ADDR1, "100"), (ADDR1, "50")])))
        .await
        .unwrap();

    let snapshot = &outcome.snapshot;
    assert_eq!(snapshot.claims.len(), 1);
    let claim = &snapshot.claims[&addr(ADDR1)];
    assert_eq!(claim.index, 0);
    assert_eq!(claim.amount, U256::from(150u64));
    assert!(claim.proof.is_empty());
    assert_eq!(
        snapshot.merkle_root,
        Some(merkle_leaf(0, &addr(ADDR1), &U256::from(150u64)))
    );
    assert_eq!(snapshot.total, U256::from(150u64));

    // genesis never consults the stash
    assert_eq!(regen.oracle().mock_calls(), 0);
    assert_eq!(outcome.saved.archived, None);
}

#[tokio::test]
async fn test_written_file_shape() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();

    let text = fs::read_to_string(regen.store().latest_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["symbol"], "SDT");
    assert_eq!(json["address"], checksum(&token()));
    assert_eq!(json["date"], "20240101");
    assert_eq!(json["total"], "100");
    assert!(json["merkleRoot"].as_str().unwrap().starts_with("0x"));
    assert_eq!(json["claims"][checksum(&addr(ADDR1))]["index"], 0);
    // two-space indentation
    assert!(text.contains("\n  \"symbol\""));
}

#[tokio::test]
async fn test_date_rollover_archives_previous_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();
    let first_bytes = fs::read(regen.store().latest_path()).unwrap();

    regen.oracle().set_update_counter(token(), U256::from(1u64));
    let outcome = regen
        .run(&request("20240108", rows(&[(ADDR2, "30")])))
        .await
        .unwrap();

    let archive = regen.store().archive_path("20240101");
    assert_eq!(outcome.saved.archived, Some(archive.clone()));
    assert_eq!(fs::read(&archive).unwrap(), first_bytes);
    assert_eq!(regen.store().archived_dates().unwrap(), vec!["20240101"]);
    assert_eq!(
        regen.store().load_latest().unwrap().unwrap().date,
        "20240108"
    );
}

// ============================================================================
// 2. Carry-over
// ============================================================================

#[tokio::test]
async fn test_unclaimed_entry_is_carried() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();

    regen.oracle().set_update_counter(token(), U256::from(1u64));
    let outcome = regen
        .run(&request("20240108", rows(&[(ADDR2, "30")])))
        .await
        .unwrap();

    let claims = &outcome.snapshot.claims;
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[&addr(ADDR1)].amount, U256::from(100u64));
    assert_eq!(claims[&addr(ADDR2)].amount, U256::from(30u64));
    assert_ne!(claims[&addr(ADDR1)].index, claims[&addr(ADDR2)].index);
    assert_eq!(outcome.snapshot.total, U256::from(130u64));
    assert_eq!(outcome.carry_over.carried, 1);
    assert_eq!(outcome.carry_over.bitmap_update, Some(U256::ZERO));
    assert_proofs_valid(&outcome);
}

#[tokio::test]
async fn test_claimed_entry_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();

    regen.oracle().set_update_counter(token(), U256::from(1u64));
    regen.oracle().mark_claimed(token(), U256::ZERO, 0);
    let outcome = regen
        .run(&request("20240108", rows(&[(ADDR2, "30")])))
        .await
        .unwrap();

    let claims = &outcome.snapshot.claims;
    assert_eq!(claims.len(), 1);
    assert!(!claims.contains_key(&addr(ADDR1)));
    assert_eq!(claims[&addr(ADDR2)].index, 0);
    assert_eq!(outcome.snapshot.total, U256::from(30u64));
    assert_eq!(outcome.carry_over.claimed, 1);
    assert_eq!(outcome.carry_over.claimed_amount, U256::from(100u64));
}

#[tokio::test]
async fn test_carried_amount_merges_with_new_reward() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    regen
        .run(&request("20240101", rows(&[(ADDR1, "100"), (ADDR2, "5")])))
        .await
        .unwrap();

    regen.oracle().set_update_counter(token(), U256::from(1u64));
    let outcome = regen
        .run(&request("20240108", rows(&[(ADDR1, "1")])))
        .await
        .unwrap();

    assert_eq!(outcome.snapshot.claims[&addr(ADDR1)].amount, U256::from(101u64));
    assert_eq!(outcome.snapshot.claims[&addr(ADDR2)].amount, U256::from(5u64));
    assert_eq!(outcome.snapshot.total, U256::from(106u64));
}

#[tokio::test]
async fn test_carry_over_spans_bitmap_words() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    let first: Vec<RewardRow> = (0..300u16)
        .map(|i| RewardRow::new(checksum(&numbered(i)), (u64::from(i) + 1).to_string()))
        .collect();
    let first = regen.run(&request("20240101", first)).await.unwrap();
    assert_eq!(first.snapshot.claims.len(), 300);

    // claim index 3 (word 0) and index 260 (word 1) under update 4
    regen.oracle().set_update_counter(token(), U256::from(5u64));
    regen.oracle().mark_claimed(token(), U256::from(4u64), 3);
    regen.oracle().mark_claimed(token(), U256::from(4u64), 260);
    // the same bits under another update must be ignored
    regen.oracle().mark_claimed(token(), U256::from(3u64), 7);

    let claimed: Vec<Address> = first
        .snapshot
        .claims
        .iter()
        .filter(|(_, c)| c.index == 3 || c.index == 260)
        .map(|(a, _)| *a)
        .collect();
    assert_eq!(claimed.len(), 2);
    let claimed_total = claimed
        .iter()
        .map(|a| first.snapshot.claims[a].amount)
        .fold(U256::ZERO, |acc, v| acc + v);

    let outcome = regen.run(&request("20240108", Vec::new())).await.unwrap();
    assert_eq!(outcome.carry_over.carried, 298);
    assert_eq!(outcome.carry_over.claimed, 2);
    assert_eq!(outcome.snapshot.claims.len(), 298);
    for account in &claimed {
        assert!(!outcome.snapshot.claims.contains_key(account));
    }
    assert_eq!(outcome.snapshot.total, first.snapshot.total - claimed_total);
    assert_proofs_valid(&outcome);
}

// ============================================================================
// 3. Failure paths
// ============================================================================

#[tokio::test]
async fn test_active_distribution_leaves_directory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();
    regen.oracle().set_update_counter(token(), U256::from(1u64));
    regen
        .run(&request("20240108", rows(&[(ADDR2, "30")])))
        .await
        .unwrap();
    let before = dir_contents(regen.store().dir());
    assert_eq!(before.len(), 2);

    regen.oracle().set_root(token(), B256::repeat_byte(0x42));
    let err = regen
        .run(&request("20240115", rows(&[(ADDR2, "1")])))
        .await
        .unwrap_err();

    assert!(matches!(err, StashError::DistributionActive { .. }));
    assert_eq!(dir_contents(regen.store().dir()), before);
}

#[tokio::test]
async fn test_zero_update_counter_with_history_fails() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    regen
        .run(&request("20240101", rows(&[(ADDR1, "100")])))
        .await
        .unwrap();
    let before = dir_contents(regen.store().dir());

    let err = regen
        .run(&request("20240108", rows(&[(ADDR2, "30")])))
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::Oracle(_)));
    assert_eq!(dir_contents(regen.store().dir()), before);
}

#[tokio::test]
async fn test_invalid_rows_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    let err = regen
        .run(&request("20240101", rows(&[(ADDR1, "-5")])))
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::InvalidAmount(_)));

    // bad EIP-55 checksum
    let err = regen
        .run(&request(
            "20240101",
            rows(&[("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD", "1")]),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::InvalidAddress(_)));
    assert!(!regen.store().dir().exists());
}

#[tokio::test]
async fn test_overflowing_total_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    let max = U256::MAX.to_string();

    let err = regen
        .run(&request("20240101", rows(&[(ADDR1, max.as_str()), (ADDR2, "1")])))
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::AmountOverflow(_)));
    assert!(!regen.store().dir().exists());
}

#[tokio::test]
async fn test_corrupt_ledger_is_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());
    fs::create_dir_all(regen.store().dir()).unwrap();
    fs::write(regen.store().latest_path(), b"{\"symbol\":").unwrap();

    let err = regen
        .run(&request("20240101", rows(&[(ADDR1, "1")])))
        .await
        .unwrap_err();
    assert!(matches!(err, StashError::CorruptLedger { .. }));
    assert_eq!(fs::read(regen.store().latest_path()).unwrap(), b"{\"symbol\":");
}

// ============================================================================
// 4. Properties
// ============================================================================

#[tokio::test]
async fn test_identical_inputs_give_identical_files() {
    let input = rows(&[
        (ADDR2, "30"),
        (ADDR1, "100"),
        ("0x3333333333333333333333333333333333333333", "7"),
        (ADDR1, "0x10"),
    ]);
    let mut reordered = input.clone();
    reordered.reverse();

    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let regen_a = regenerator(a.path());
    let regen_b = regenerator(b.path());
    let out_a = regen_a.run(&request("20240101", input)).await.unwrap();
    let out_b = regen_b.run(&request("20240101", reordered)).await.unwrap();

    assert_eq!(out_a.snapshot, out_b.snapshot);
    assert_eq!(
        fs::read(regen_a.store().latest_path()).unwrap(),
        fs::read(regen_b.store().latest_path()).unwrap()
    );
    assert_proofs_valid(&out_a);
}

#[tokio::test]
async fn test_total_is_new_plus_unclaimed() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    let first: Vec<RewardRow> = (0..9u16)
        .map(|i| RewardRow::new(checksum(&numbered(i)), "1000"))
        .collect();
    regen.run(&request("20240101", first)).await.unwrap();

    regen.oracle().set_update_counter(token(), U256::from(1u64));
    for index in [0u64, 4, 8] {
        regen.oracle().mark_claimed(token(), U256::ZERO, index);
    }

    let outcome = regen
        .run(&request("20240108", rows(&[(ADDR1, "25"), (ADDR2, "75")])))
        .await
        .unwrap();

    let sum = outcome
        .snapshot
        .claims
        .values()
        .fold(U256::ZERO, |acc, c| acc + c.amount);
    assert_eq!(outcome.snapshot.total, sum);
    assert_eq!(outcome.snapshot.total, U256::from(6u64 * 1000 + 100));
    assert_eq!(outcome.carry_over.carried_amount, U256::from(6000u64));

    let mut indices: Vec<u64> = outcome.snapshot.claims.values().map(|c| c.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..8u64).collect::<Vec<_>>());
    assert_proofs_valid(&outcome);
}

#[tokio::test]
async fn test_empty_cycle_has_empty_root() {
    let dir = tempfile::tempdir().unwrap();
    let regen = regenerator(dir.path());

    let outcome = regen.run(&request("20240101", Vec::new())).await.unwrap();
    assert_eq!(outcome.snapshot.merkle_root, None);
    assert_eq!(outcome.snapshot.total, U256::ZERO);

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(regen.store().latest_path()).unwrap()).unwrap();
    assert_eq!(json["merkleRoot"], "");

    // an empty previous ledger never consults the stash
    regen
        .run(&request("20240108", rows(&[(ADDR1, "1")])))
        .await
        .unwrap();
    assert_eq!(regen.oracle().mock_calls(), 0);
}
