use std::path::{Path, PathBuf};

use blockcache_archive::legacy::{write_legacy_archive, write_legacy_array_archive};
use blockcache_archive::records::{
    AbiV1, Reconciliation, ReconciliationV1, Trace, TraceV1, Transaction, TransactionV1,
};
use blockcache_archive::{ArchiveReader, ArchiveWriter, FormatVersion, LockMode};
use blockcache_migrate::{
    CacheKind, CacheLayout, MigrationMode, MigrationOptions, MigrationReport, Migrator,
    ReconciliationPolicy,
};
use tokio_util::sync::CancellationToken;

pub fn new_cache() -> (tempfile::TempDir, CacheLayout) {
    let tmp = tempfile::tempdir().unwrap();
    let layout = CacheLayout::new(tmp.path().join("cache"));
    (tmp, layout)
}

pub fn file(layout: &CacheLayout, kind: CacheKind, relative: &str) -> PathBuf {
    let path = layout.dir(kind).join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    path
}

pub fn apply() -> MigrationOptions {
    MigrationOptions::default()
}

pub fn dry_run() -> MigrationOptions {
    MigrationOptions {
        mode: MigrationMode::DryRun,
        ..MigrationOptions::default()
    }
}

pub fn rewrite_reconciliations() -> MigrationOptions {
    MigrationOptions {
        reconciliations: ReconciliationPolicy::Rewrite,
        ..MigrationOptions::default()
    }
}

pub fn migrator(layout: &CacheLayout, options: MigrationOptions) -> Migrator {
    Migrator::new(layout.clone(), options, CancellationToken::new()).unwrap()
}

pub fn run(layout: &CacheLayout, kinds: &[CacheKind], options: MigrationOptions) -> MigrationReport {
    migrator(layout, options).run(&layout.targets(kinds))
}

pub fn transaction_v1(n: u32) -> TransactionV1 {
    TransactionV1 {
        hash: [n as u8; 32],
        block_number: 15_000_000 + n,
        transaction_index: n,
        from: [0x11; 20],
        to: [0x22; 20],
        value: 1_000_000_000_000_000_000,
        gas_used: 21_000,
        is_error: false,
    }
}

pub fn transaction(n: u32) -> Transaction {
    Transaction {
        hash: [n as u8; 32],
        block_number: 15_000_000 + u64::from(n),
        transaction_index: n,
        from: [0x11; 20],
        to: Some([0x22; 20]),
        value: 1_000_000_000_000_000_000,
        gas_used: 21_000,
        is_error: false,
    }
}

pub fn reconciliation_v1(n: u32) -> ReconciliationV1 {
    ReconciliationV1 {
        block_number: 15_000_000 + n,
        transaction_index: n,
        asset_address: [0xee; 20],
        begin_balance: 100,
        end_balance: 40,
    }
}

pub fn trace_v1(address: &str) -> TraceV1 {
    TraceV1 {
        block_number: 15_000_000,
        transaction_index: 3,
        trace_address: address.to_string(),
        from: [0x11; 20],
        to: [0x22; 20],
        value: 5,
    }
}

pub fn write_transaction_v1(path: &Path, n: u32) {
    write_legacy_archive(path, &transaction_v1(n)).unwrap();
}

pub fn write_transaction(path: &Path, n: u32) {
    let mut writer = ArchiveWriter::create(path, LockMode::NonBlocking).unwrap();
    writer.write_record(&transaction(n)).unwrap();
    writer.finish().unwrap();
}

pub fn write_reconciliations_v1(path: &Path, count: u32) {
    let values: Vec<_> = (0..count).map(reconciliation_v1).collect();
    write_legacy_array_archive(path, &values).unwrap();
}

pub fn write_traces_v1(path: &Path, addresses: &[&str]) {
    let values: Vec<_> = addresses.iter().map(|address| trace_v1(address)).collect();
    write_legacy_array_archive(path, &values).unwrap();
}

pub fn write_abi_v1(path: &Path, signatures: &[&str]) {
    let abi = AbiV1 {
        address: [0x33; 20],
        signatures: signatures.iter().map(|s| s.to_string()).collect(),
    };
    write_legacy_archive(path, &abi).unwrap();
}

pub fn read_transaction(path: &Path) -> (FormatVersion, Transaction) {
    let mut reader = ArchiveReader::open(path, LockMode::NonBlocking).unwrap();
    let version = reader.header().version().unwrap();
    (version, reader.read_record().unwrap())
}

pub fn read_reconciliations(path: &Path) -> Vec<Reconciliation> {
    let mut reader = ArchiveReader::open(path, LockMode::NonBlocking).unwrap();
    reader.read_array().unwrap()
}

pub fn read_traces(path: &Path) -> (FormatVersion, Vec<Trace>) {
    let mut reader = ArchiveReader::open(path, LockMode::NonBlocking).unwrap();
    let version = reader.header().version().unwrap();
    (version, reader.read_array().unwrap())
}

/// Names of the entries in the cache's scratch folder, sorted.
pub fn scratch_entries(layout: &CacheLayout) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(layout.tmp_dir()) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
