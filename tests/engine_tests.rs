//! Tests for the rename engine
//!
//! These tests verify:
//! - Real runs rename mis-named segments to their canonical names
//! - Dry runs journal everything and touch nothing
//! - Validation failures are counted and leave files untouched
//! - Collisions never merge two source files
//! - Second runs are no-ops (idempotence)
//! - Interrupted runs resume to the same final state

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walmend::journal::{Journal, OpStatus, OperationRecord, RunStatus, STATE_DIR};
use walmend::segment::file_fingerprint;
use walmend::{Config, RenameEngine};

const SEGMENT_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// Helper Functions
// =============================================================================

fn write_segment(dir: &Path, name: &str, tli: u32, pageaddr: u64) -> PathBuf {
    write_segment_versioned(dir, name, tli, pageaddr, 15)
}

fn write_segment_versioned(
    dir: &Path,
    name: &str,
    tli: u32,
    pageaddr: u64,
    version: u16,
) -> PathBuf {
    let mut buf = vec![0u8; 8192];
    buf[0..2].copy_from_slice(&0xD061u16.to_le_bytes());
    buf[2..4].copy_from_slice(&version.to_le_bytes());
    buf[4..8].copy_from_slice(&tli.to_le_bytes());
    buf[8..16].copy_from_slice(&pageaddr.to_le_bytes());

    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(&buf).unwrap();
    path
}

fn config_for(dir: &TempDir) -> Config {
    Config::builder()
        .wal_dir(dir.path())
        .segment_size(SEGMENT_SIZE)
        .build()
        .unwrap()
}

fn run(config: Config) -> walmend::Report {
    RenameEngine::open(config).unwrap().run().unwrap()
}

// =============================================================================
// Real Run Tests
// =============================================================================

#[test]
fn test_renames_misnamed_segment() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "badname1.dat", 1, 0x0100_0000);

    let report = run(config_for(&dir));

    assert_eq!(report.scanned, 1);
    assert_eq!(report.renamed, 1);
    assert!(!dir.path().join("badname1.dat").exists());
    assert!(dir.path().join("000000010000000000000001").exists());
}

#[test]
fn test_already_canonical_is_skipped() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "000000010000000000000001", 1, 0x0100_0000);

    let report = run(config_for(&dir));

    assert_eq!(report.scanned, 1);
    assert_eq!(report.renamed, 0);
    assert_eq!(report.already_canonical, 1);
    assert!(dir.path().join("000000010000000000000001").exists());
}

#[test]
fn test_rename_preserves_content() {
    let dir = TempDir::new().unwrap();
    let path = write_segment(dir.path(), "bad.dat", 1, 0);
    let before = file_fingerprint(&path).unwrap();

    run(config_for(&dir));

    let after = file_fingerprint(&dir.path().join("000000010000000000000000")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_journal_records_completed_rename() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "bad.dat", 1, 0x0100_0000);

    run(config_for(&dir));

    let journal = Journal::load(&dir.path().join(STATE_DIR)).unwrap().unwrap();
    assert_eq!(journal.run_status(), RunStatus::Completed);
    assert_eq!(journal.records().len(), 1);
    assert_eq!(journal.records()[0].status, OpStatus::Completed);
    assert_eq!(journal.records()[0].old_name, "bad.dat");
    assert_eq!(journal.records()[0].new_name, "000000010000000000000001");
}

#[test]
fn test_report_file_is_written() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "bad.dat", 1, 0);

    run(config_for(&dir));

    let reports: Vec<_> = fs::read_dir(dir.path().join(STATE_DIR))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("report_"))
        .collect();
    assert_eq!(reports.len(), 1);
}

// =============================================================================
// Dry-Run Tests
// =============================================================================

#[test]
fn test_dry_run_touches_nothing() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "badname1.dat", 1, 0x0100_0000);

    let config = Config::builder()
        .wal_dir(dir.path())
        .segment_size(SEGMENT_SIZE)
        .dry_run(true)
        .build()
        .unwrap();
    let report = run(config);

    assert_eq!(report.renamed, 0);
    assert_eq!(report.would_rename, 1);
    assert!(dir.path().join("badname1.dat").exists());
    assert!(!dir.path().join("000000010000000000000001").exists());
}

#[test]
fn test_dry_run_journal_has_planned_entry() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "badname1.dat", 1, 0x0100_0000);

    let config = Config::builder()
        .wal_dir(dir.path())
        .segment_size(SEGMENT_SIZE)
        .dry_run(true)
        .build()
        .unwrap();
    run(config);

    let journal = Journal::load(&dir.path().join(STATE_DIR)).unwrap().unwrap();
    assert!(journal.dry_run());
    assert_eq!(journal.records().len(), 1);
    assert_eq!(journal.records()[0].status, OpStatus::Planned);
}

#[test]
fn test_real_run_after_dry_run_starts_fresh() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "bad.dat", 1, 0x0100_0000);

    let dry = Config::builder()
        .wal_dir(dir.path())
        .segment_size(SEGMENT_SIZE)
        .dry_run(true)
        .build()
        .unwrap();
    run(dry);

    // The dry-run journal is left in_progress but must not be "resumed"
    // into renames it never intended.
    let report = run(config_for(&dir));
    assert_eq!(report.renamed, 1);
    assert!(dir.path().join("000000010000000000000001").exists());
}

// =============================================================================
// Validation Error Tests
// =============================================================================

#[test]
fn test_zero_byte_file_is_too_small() {
    let dir = TempDir::new().unwrap();
    File::create(dir.path().join("empty.dat")).unwrap();

    let report = run(config_for(&dir));

    assert_eq!(report.scanned, 1);
    assert_eq!(report.renamed, 0);
    assert_eq!(report.errors.get("TooSmall"), Some(&1));
    assert!(dir.path().join("empty.dat").exists());
}

#[test]
fn test_bad_magic_is_counted_and_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.dat");
    File::create(&path).unwrap().write_all(&[0xFFu8; 64]).unwrap();

    let report = run(config_for(&dir));

    assert_eq!(report.errors.get("MagicMismatch"), Some(&1));
    assert!(path.exists());
}

#[test]
fn test_timeline_zero_is_invalid() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "tl0.dat", 0, 0);

    let report = run(config_for(&dir));

    assert_eq!(report.errors.get("InvalidTimeline"), Some(&1));
    assert!(dir.path().join("tl0.dat").exists());
}

#[test]
fn test_unsupported_version_blocks_by_default() {
    let dir = TempDir::new().unwrap();
    write_segment_versioned(dir.path(), "v99.dat", 1, 0, 99);

    let report = run(config_for(&dir));

    assert_eq!(report.errors.get("UnsupportedVersion"), Some(&1));
    assert!(dir.path().join("v99.dat").exists());
}

#[test]
fn test_unsupported_version_downgraded_by_config() {
    let dir = TempDir::new().unwrap();
    write_segment_versioned(dir.path(), "v99.dat", 1, 0, 99);

    let config = Config::builder()
        .wal_dir(dir.path())
        .segment_size(SEGMENT_SIZE)
        .allow_unsupported_version(true)
        .build()
        .unwrap();
    let report = run(config);

    assert_eq!(report.renamed, 1);
    assert!(dir.path().join("000000010000000000000000").exists());
}

#[test]
fn test_errors_do_not_abort_the_run() {
    let dir = TempDir::new().unwrap();
    File::create(dir.path().join("a_empty.dat")).unwrap();
    write_segment(dir.path(), "z_good.dat", 1, 0x0100_0000);

    let report = run(config_for(&dir));

    assert_eq!(report.scanned, 2);
    assert_eq!(report.renamed, 1);
    assert_eq!(report.total_errors(), 1);
}

// =============================================================================
// Collision Tests
// =============================================================================

#[test]
fn test_collision_renames_at_most_one() {
    let dir = TempDir::new().unwrap();
    // Both derive 000000010000000000000002
    write_segment(dir.path(), "first.dat", 1, 0x0200_0000);
    write_segment(dir.path(), "second.dat", 1, 0x0200_0000);

    let report = run(config_for(&dir));

    assert_eq!(report.renamed, 1);
    assert_eq!(report.errors.get("RenameCollision"), Some(&1));

    // Sorted scan order: first.dat wins, second.dat is untouched.
    assert!(dir.path().join("000000010000000000000002").exists());
    assert!(dir.path().join("second.dat").exists());
    assert!(!dir.path().join("first.dat").exists());
}

#[test]
fn test_collision_never_overwrites() {
    let dir = TempDir::new().unwrap();
    let a = write_segment(dir.path(), "a.dat", 1, 0x0200_0000);
    let b = write_segment(dir.path(), "b.dat", 1, 0x0200_0000);
    let fp_a = file_fingerprint(&a).unwrap();
    let fp_b = file_fingerprint(&b).unwrap();

    run(config_for(&dir));

    // Both contents still exist somewhere, byte for byte.
    let winner = file_fingerprint(&dir.path().join("000000010000000000000002")).unwrap();
    let loser = file_fingerprint(&dir.path().join("b.dat")).unwrap();
    assert_eq!(winner, fp_a);
    assert_eq!(loser, fp_b);
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_second_run_renames_nothing() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "bad1.dat", 1, 0);
    write_segment(dir.path(), "bad2.dat", 1, 0x0100_0000);
    File::create(dir.path().join("empty.dat")).unwrap();

    let first = run(config_for(&dir));
    assert_eq!(first.renamed, 2);

    let second = run(config_for(&dir));
    assert_eq!(second.renamed, 0);
    assert_eq!(second.already_canonical, 2);
    assert_eq!(second.errors.get("TooSmall"), Some(&1));
}

// =============================================================================
// Resume Tests
// =============================================================================

#[test]
fn test_resume_reapplies_planned_rename() {
    let dir = TempDir::new().unwrap();
    let path = write_segment(dir.path(), "badname1.dat", 1, 0x0100_0000);
    let fp = file_fingerprint(&path).unwrap();

    // Simulate a crash after the planned entry was flushed but before the
    // rename syscall executed.
    let state_dir = dir.path().join(STATE_DIR);
    let mut journal = Journal::create(&state_dir, SEGMENT_SIZE, false).unwrap();
    journal
        .append_planned(OperationRecord::planned(
            "badname1.dat",
            "000000010000000000000001",
            &fp,
        ))
        .unwrap();
    drop(journal);

    let report = run(config_for(&dir));

    assert_eq!(report.renamed, 1);
    assert!(dir.path().join("000000010000000000000001").exists());
    assert!(!dir.path().join("badname1.dat").exists());

    let journal = Journal::load(&state_dir).unwrap().unwrap();
    assert_eq!(journal.records()[0].status, OpStatus::Completed);
}

#[test]
fn test_resume_reclassifies_applied_rename() {
    let dir = TempDir::new().unwrap();
    // The rename landed before the crash: only the destination exists.
    let path = write_segment(dir.path(), "000000010000000000000001", 1, 0x0100_0000);
    let fp = file_fingerprint(&path).unwrap();

    let state_dir = dir.path().join(STATE_DIR);
    let mut journal = Journal::create(&state_dir, SEGMENT_SIZE, false).unwrap();
    journal
        .append_planned(OperationRecord::planned(
            "badname1.dat",
            "000000010000000000000001",
            &fp,
        ))
        .unwrap();
    drop(journal);

    let report = run(config_for(&dir));

    // Reclassified completed without re-executing; counts match a single
    // uninterrupted run.
    assert_eq!(report.scanned, 1);
    assert_eq!(report.renamed, 1);

    let journal = Journal::load(&state_dir).unwrap().unwrap();
    assert_eq!(journal.records()[0].status, OpStatus::Completed);
}

#[test]
fn test_resume_refuses_tampered_source() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "badname1.dat", 1, 0x0100_0000);

    let state_dir = dir.path().join(STATE_DIR);
    let mut journal = Journal::create(&state_dir, SEGMENT_SIZE, false).unwrap();
    journal
        .append_planned(OperationRecord::planned(
            "badname1.dat",
            "000000010000000000000001",
            "00000000", // does not match the file on disk
        ))
        .unwrap();
    drop(journal);

    let report = run(config_for(&dir));

    assert_eq!(report.renamed, 0);
    assert_eq!(report.errors.get("FilesystemError"), Some(&1));
    assert!(dir.path().join("badname1.dat").exists());
}

// =============================================================================
// Scan Hygiene Tests
// =============================================================================

#[test]
fn test_state_artifacts_are_never_candidates() {
    let dir = TempDir::new().unwrap();
    write_segment(dir.path(), "bad.dat", 1, 0);

    let first = run(config_for(&dir));
    assert_eq!(first.scanned, 1);

    // Second run: the state dir now holds journal, report and (in real use)
    // logs, none of which may be scanned.
    let second = run(config_for(&dir));
    assert_eq!(second.scanned, 1);
    assert_eq!(second.total_errors(), 0);
}
