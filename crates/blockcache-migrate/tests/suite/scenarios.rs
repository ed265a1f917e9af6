use blockcache_archive::legacy::write_legacy_archive;
use blockcache_archive::records::{
    Appearance, Block, BlockV2, CachedAccount, CachedAccountV1, Transaction, TransactionV2,
};
use blockcache_archive::{ArchiveReader, FormatVersion, LockMode};
use blockcache_migrate::{CacheKind, FileOutcome, Halt, MigrationStats};

use super::fixtures::*;

fn stats(seen: u64, migrated: u64, skipped: u64) -> MigrationStats {
    MigrationStats {
        seen,
        migrated,
        skipped,
    }
}

#[test]
fn empty_current_and_old_archives_then_rerun() {
    let (_tmp, layout) = new_cache();
    let empty = file(&layout, CacheKind::Transactions, "000/empty.bin");
    let current = file(&layout, CacheKind::Transactions, "000/current.bin");
    let old = file(&layout, CacheKind::Transactions, "001/old.bin");
    std::fs::write(&empty, b"").unwrap();
    write_transaction(&current, 1);
    write_transaction_v1(&old, 2);
    let current_bytes = std::fs::read(&current).unwrap();

    let report = run(&layout, &[CacheKind::Transactions], apply());
    assert_eq!(report.totals, stats(3, 2, 0));
    assert_eq!(report.directories.len(), 1);
    assert_eq!(report.directories[0].halt, None);
    assert!(!report.cancelled);

    assert!(!empty.exists());
    assert_eq!(std::fs::read(&current).unwrap(), current_bytes);
    let (version, tx) = read_transaction(&old);
    assert_eq!(version, FormatVersion::CURRENT);
    assert_eq!(tx, transaction(2));

    let report = run(&layout, &[CacheKind::Transactions], apply());
    assert_eq!(report.totals, stats(2, 0, 0));
}

#[test]
fn zero_byte_archives_are_deleted_in_every_kind() {
    let (_tmp, layout) = new_cache();
    let mut paths = Vec::new();
    for kind in CacheKind::ALL {
        let path = file(&layout, kind, "empty.bin");
        std::fs::write(&path, b"").unwrap();
        paths.push(path);
    }

    let report = run(&layout, &CacheKind::ALL, apply());
    assert_eq!(report.totals, stats(7, 7, 0));
    for path in paths {
        assert!(!path.exists(), "{} should be deleted", path.display());
    }
}

#[test]
fn names_are_deleted_unconditionally() {
    let (_tmp, layout) = new_cache();
    let paths: Vec<_> = (0..5)
        .map(|idx| {
            let path = file(&layout, CacheKind::Names, &format!("{idx:03}/names.bin"));
            std::fs::write(&path, b"not an archive").unwrap();
            path
        })
        .collect();

    let report = run(&layout, &[CacheKind::Names], apply());
    assert_eq!(report.totals, stats(5, 5, 0));
    assert!(paths.iter().all(|path| !path.exists()));
}

#[test]
fn reconciliations_are_accepted_untouched_by_default() {
    let (_tmp, layout) = new_cache();
    let first = file(&layout, CacheKind::Reconciliations, "a.bin");
    let second = file(&layout, CacheKind::Reconciliations, "b.bin");
    write_reconciliations_v1(&first, 2);
    write_reconciliations_v1(&second, 3);
    let before = (std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());

    let report = run(&layout, &[CacheKind::Reconciliations], apply());
    assert_eq!(report.totals, stats(2, 2, 0));
    assert_eq!(std::fs::read(&first).unwrap(), before.0);
    assert_eq!(std::fs::read(&second).unwrap(), before.1);
}

#[test]
fn reconciliations_are_rewritten_under_the_rewrite_policy() {
    let (_tmp, layout) = new_cache();
    let path = file(&layout, CacheKind::Reconciliations, "a.bin");
    write_reconciliations_v1(&path, 2);

    let report = run(&layout, &[CacheKind::Reconciliations], rewrite_reconciliations());
    assert_eq!(report.totals, stats(1, 1, 0));

    let recons = read_reconciliations(&path);
    assert_eq!(recons.len(), 2);
    assert_eq!(recons[1].block_number, 15_000_001);
    assert_eq!(recons[1].amount_net, -60);

    let report = run(&layout, &[CacheKind::Reconciliations], rewrite_reconciliations());
    assert_eq!(report.totals, stats(1, 0, 0));
}

#[test]
fn trace_arrays_are_converted_element_wise() {
    let (_tmp, layout) = new_cache();
    let path = file(&layout, CacheKind::Traces, "015/000/traces.bin");
    write_traces_v1(&path, &["", "0", "0-1"]);

    let report = run(&layout, &[CacheKind::Traces], apply());
    assert_eq!(report.totals, stats(1, 1, 0));

    let (version, traces) = read_traces(&path);
    assert_eq!(version, FormatVersion::CURRENT);
    let addresses: Vec<_> = traces.iter().map(|t| t.trace_address.clone()).collect();
    assert_eq!(addresses, vec![vec![], vec![0], vec![0, 1]]);
    assert!(traces.iter().all(|t| t.value == 5));
}

#[test]
fn slurps_blocks_and_v2_transactions_are_upgraded() {
    let (_tmp, layout) = new_cache();
    let account = file(&layout, CacheKind::Slurps, "0x07/account.bin");
    let block = file(&layout, CacheKind::Blocks, "001/block.bin");
    let tx = file(&layout, CacheKind::Transactions, "001/tx.bin");
    write_legacy_archive(
        &account,
        &CachedAccountV1 {
            address: [7; 20],
            last_block: u32::MAX,
            appearances: vec![(u32::MAX, 2)],
        },
    )
    .unwrap();
    write_legacy_archive(
        &block,
        &BlockV2 {
            number: 1 << 40,
            hash: [1; 32],
            parent_hash: [2; 32],
            timestamp: 1_700_000_000,
            transaction_hashes: vec![[3; 32]],
        },
    )
    .unwrap();
    write_legacy_archive(
        &tx,
        &TransactionV2 {
            hash: [4; 32],
            block_number: 1 << 40,
            transaction_index: 0,
            from: [0x11; 20],
            to: [0; 20],
            value: u128::MAX,
            gas_used: 1_000_000,
            is_error: false,
        },
    )
    .unwrap();

    let report = run(
        &layout,
        &[CacheKind::Slurps, CacheKind::Transactions, CacheKind::Blocks],
        apply(),
    );
    assert_eq!(report.totals, stats(3, 3, 0));
    assert!(!report.has_failures());

    let mut reader = ArchiveReader::open(&account, LockMode::NonBlocking).unwrap();
    assert_eq!(reader.header().version().unwrap(), FormatVersion::CURRENT);
    let upgraded: CachedAccount = reader.read_record().unwrap();
    assert_eq!(upgraded.last_block, u64::from(u32::MAX));
    assert_eq!(
        upgraded.appearances,
        vec![Appearance {
            block_number: u64::from(u32::MAX),
            transaction_index: 2,
        }]
    );
    drop(reader);

    let mut reader = ArchiveReader::open(&block, LockMode::NonBlocking).unwrap();
    assert_eq!(reader.header().version().unwrap(), FormatVersion::CURRENT);
    let upgraded: Block = reader.read_record().unwrap();
    assert_eq!(upgraded.number, 1 << 40);
    assert_eq!(upgraded.transaction_hashes, vec![[3; 32]]);
    assert_eq!(upgraded.base_fee_per_gas, None);
    drop(reader);

    let (version, upgraded): (FormatVersion, Transaction) = read_transaction(&tx);
    assert_eq!(version, FormatVersion::CURRENT);
    assert_eq!(upgraded.to, None);
    assert_eq!(upgraded.value, u128::MAX);
    assert_eq!(upgraded.block_number, 1 << 40);
}

#[test]
fn non_candidates_are_skipped_byte_for_byte() {
    let (_tmp, layout) = new_cache();
    let marker = file(&layout, CacheKind::Blocks, "ts.bin");
    let json = file(&layout, CacheKind::Blocks, "000/block.json");
    let empty_json = file(&layout, CacheKind::Blocks, "000/empty.txt");
    std::fs::write(&marker, b"1700000000").unwrap();
    std::fs::write(&json, b"{\"number\":1}").unwrap();
    std::fs::write(&empty_json, b"").unwrap();

    let report = run(&layout, &[CacheKind::Blocks], apply());
    assert_eq!(report.totals, stats(0, 0, 3));
    assert_eq!(std::fs::read(&marker).unwrap(), b"1700000000");
    assert_eq!(std::fs::read(&json).unwrap(), b"{\"number\":1}");
    assert!(empty_json.exists());
}

#[test]
fn second_run_performs_no_rewrites() {
    let (_tmp, layout) = new_cache();
    for idx in 0..4 {
        write_transaction_v1(
            &file(&layout, CacheKind::Transactions, &format!("{idx}.bin")),
            idx,
        );
    }

    let first = run(&layout, &[CacheKind::Transactions], apply());
    assert_eq!(first.totals, stats(4, 4, 0));

    let snapshot: Vec<_> = (0..4)
        .map(|idx| {
            std::fs::read(layout.dir(CacheKind::Transactions).join(format!("{idx}.bin"))).unwrap()
        })
        .collect();
    let second = run(&layout, &[CacheKind::Transactions], apply());
    assert_eq!(second.totals.seen, first.totals.seen);
    assert_eq!(second.totals.migrated, 0);
    for (idx, bytes) in snapshot.iter().enumerate() {
        let path = layout.dir(CacheKind::Transactions).join(format!("{idx}.bin"));
        assert_eq!(&std::fs::read(path).unwrap(), bytes);
    }
}

#[test]
fn conversion_failure_halts_only_its_directory() {
    let (_tmp, layout) = new_cache();
    let good_abi = file(&layout, CacheKind::Abis, "a.bin");
    let bad_abi = file(&layout, CacheKind::Abis, "b.bin");
    let after_bad = file(&layout, CacheKind::Abis, "c.bin");
    write_abi_v1(&good_abi, &["transfer(address,uint256)"]);
    write_abi_v1(&bad_abi, &["transfer"]);
    write_abi_v1(&after_bad, &["approve(address,uint256)"]);
    let bad_bytes = std::fs::read(&bad_abi).unwrap();
    let after_bytes = std::fs::read(&after_bad).unwrap();

    let tx = file(&layout, CacheKind::Transactions, "0.bin");
    write_transaction_v1(&tx, 0);

    let report = run(&layout, &[CacheKind::Abis, CacheKind::Transactions], apply());
    let abis = &report.directories[0];
    assert_eq!(abis.halt, Some(Halt::Failed));
    assert_eq!(abis.stats, stats(2, 1, 0));
    assert_eq!(std::fs::read(&bad_abi).unwrap(), bad_bytes);
    assert_eq!(std::fs::read(&after_bad).unwrap(), after_bytes);

    let txs = &report.directories[1];
    assert_eq!(txs.halt, None);
    assert_eq!(txs.stats, stats(1, 1, 0));
    assert!(report.has_failures());

    // No scratch file survives the failed rewrite.
    assert_eq!(scratch_entries(&layout), vec!["migrate.lock".to_string()]);
}

#[test]
fn leftover_scratch_from_an_interrupted_run_is_swept() {
    let (_tmp, layout) = new_cache();
    let path = file(&layout, CacheKind::Transactions, "0.bin");
    write_transaction_v1(&path, 7);

    // A rewrite killed between writing the scratch file and the rename.
    std::fs::create_dir_all(layout.tmp_dir()).unwrap();
    let stale = layout.scratch_path(4242, 0);
    write_transaction(&stale, 7);

    let report = run(&layout, &[CacheKind::Transactions], apply());
    assert_eq!(report.totals, stats(1, 1, 0));
    assert!(!stale.exists());
    assert_eq!(read_transaction(&path), (FormatVersion::CURRENT, transaction(7)));
    assert_eq!(scratch_entries(&layout), vec!["migrate.lock".to_string()]);
}

#[test]
fn dry_run_counts_without_touching_anything() {
    let (_tmp, layout) = new_cache();
    let empty = file(&layout, CacheKind::Transactions, "empty.bin");
    let old = file(&layout, CacheKind::Transactions, "old.bin");
    let current = file(&layout, CacheKind::Transactions, "current.bin");
    let name = file(&layout, CacheKind::Names, "names.bin");
    std::fs::write(&empty, b"").unwrap();
    write_transaction_v1(&old, 1);
    write_transaction(&current, 2);
    std::fs::write(&name, b"names").unwrap();
    let old_bytes = std::fs::read(&old).unwrap();

    std::fs::create_dir_all(layout.tmp_dir()).unwrap();
    let stale = layout.scratch_path(4242, 0);
    std::fs::write(&stale, b"partial").unwrap();

    let report = run(
        &layout,
        &[CacheKind::Names, CacheKind::Transactions],
        dry_run(),
    );
    assert_eq!(report.totals, stats(4, 3, 0));
    assert!(empty.exists());
    assert!(name.exists());
    assert!(stale.exists());
    assert_eq!(std::fs::read(&old).unwrap(), old_bytes);
}

#[test]
fn dry_run_creates_nothing_under_the_cache_root() {
    let (tmp, layout) = new_cache();
    let report = run(&layout, &CacheKind::ALL, dry_run());
    assert_eq!(report.totals, MigrationStats::default());
    assert!(!layout.root().exists());

    let old = file(&layout, CacheKind::Transactions, "old.bin");
    write_transaction_v1(&old, 1);
    let report = run(&layout, &[CacheKind::Transactions], dry_run());
    assert_eq!(report.totals, stats(1, 1, 0));
    assert!(!layout.tmp_dir().exists());
    assert!(tmp.path().join("cache").exists());
}

#[test]
fn unreadable_non_candidates_are_still_skipped() {
    let (_tmp, layout) = new_cache();
    let regular = file(&layout, CacheKind::Blocks, "notes.json");
    std::fs::write(&regular, b"{}").unwrap();

    // Querying a path below a regular file fails on every platform.
    let below_file = regular.join("nested.json");
    let migrator = migrator(&layout, apply());
    assert_eq!(
        migrator.migrate_file(CacheKind::Blocks, &below_file).unwrap(),
        FileOutcome::NotCandidate
    );
}

#[test]
fn missing_directories_report_zero_counters() {
    let (_tmp, layout) = new_cache();
    let report = run(&layout, &CacheKind::ALL, apply());
    assert_eq!(report.directories.len(), CacheKind::ALL.len());
    assert!(report
        .directories
        .iter()
        .all(|dir| dir.halt.is_none() && dir.stats == MigrationStats::default()));
    assert_eq!(report.totals, MigrationStats::default());
}
