//! Integration tests for the inflate engine.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use dupelink::dedup::{deduplicate, DedupOptions};
use dupelink::inflate::{inflate, InflateAction, InflateEvent, InflateOptions};
use dupelink::scanner::{resolve_identity, set_read_only};

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn count(events: &[InflateEvent], action: InflateAction) -> usize {
    events.iter().filter(|e| e.action == action).count()
}

fn run_confirm_all(root: &std::path::Path) -> Vec<InflateEvent> {
    inflate(root, InflateOptions::default().with_confirm_all(true)).collect()
}

#[test]
fn inflating_a_deduplicated_tree() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.txt", b"hello");
    let b = write_file(&dir, "b.txt", b"hello");
    write_file(&dir, "c.txt", b"world");

    let dedup_events: Vec<_> = deduplicate(
        dir.path(),
        DedupOptions::default().with_confirm_all(true),
    )
    .collect();
    assert_eq!(dedup_events.iter().filter(|e| e.group_id.is_some()).count(), 1);

    let events = run_confirm_all(dir.path());

    // Exactly one Inflated event for the previously linked file
    assert_eq!(count(&events, InflateAction::Inflated), 1);
    assert_eq!(count(&events, InflateAction::Error), 0);
    let inflated: Vec<_> = events
        .iter()
        .filter(|e| e.action == InflateAction::Inflated)
        .collect();
    assert_eq!(inflated[0].path, b);

    // Distinct identities, byte-identical content
    assert_ne!(
        resolve_identity(&a).unwrap(),
        resolve_identity(&b).unwrap()
    );
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn inflate_scans_every_regular_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a.txt", b"alpha");
    write_file(&dir, "sub/b.txt", b"beta");

    // Unlike dedup, inflate scans read-only files too: linked members
    // usually carry the read-only attribute
    let locked = write_file(&dir, "locked.txt", b"gamma");
    set_read_only(&locked, true).unwrap();

    let events = run_confirm_all(dir.path());
    assert_eq!(count(&events, InflateAction::Scanned), 3);

    set_read_only(&locked, false).unwrap();
}

#[test]
fn inflate_handles_read_only_links() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.txt", b"shared");
    let b = dir.path().join("b.txt");
    fs::hard_link(&a, &b).unwrap();
    set_read_only(&b, true).unwrap();

    let events = run_confirm_all(dir.path());

    assert_eq!(count(&events, InflateAction::Inflated), 1);
    assert_eq!(count(&events, InflateAction::Error), 0);
    assert_ne!(
        resolve_identity(&a).unwrap(),
        resolve_identity(&b).unwrap()
    );
    // The restored copy is writable
    assert!(!fs::metadata(&b).unwrap().permissions().readonly());
}

#[test]
fn tree_without_links_produces_no_terminal_events() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "a.txt", b"one");
    write_file(&dir, "b.txt", b"two");
    // Identical content but independent allocations
    write_file(&dir, "c.txt", b"one");

    let events = run_confirm_all(dir.path());

    assert_eq!(count(&events, InflateAction::Scanned), 3);
    assert_eq!(count(&events, InflateAction::Inflated), 0);
    assert_eq!(count(&events, InflateAction::Skipped), 0);
    assert_eq!(count(&events, InflateAction::Error), 0);
}

#[test]
fn denied_confirmation_keeps_the_group_linked() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.txt", b"shared");
    let b = dir.path().join("b.txt");
    fs::hard_link(&a, &b).unwrap();

    let options = InflateOptions::default().with_confirm(Box::new(|_| false));
    let events: Vec<_> = inflate(dir.path(), options).collect();

    assert_eq!(count(&events, InflateAction::Skipped), 1);
    assert_eq!(count(&events, InflateAction::Inflated), 0);
    assert_eq!(
        resolve_identity(&a).unwrap(),
        resolve_identity(&b).unwrap()
    );
}

#[test]
fn groups_spanning_directories_are_detected() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "docs/report.txt", b"numbers");
    let b = dir.path().join("backup");
    fs::create_dir_all(&b).unwrap();
    let b = b.join("report.txt");
    fs::hard_link(&a, &b).unwrap();

    let events = run_confirm_all(dir.path());

    assert_eq!(count(&events, InflateAction::Inflated), 1);
    assert_ne!(
        resolve_identity(&a).unwrap(),
        resolve_identity(&b).unwrap()
    );
}

#[test]
fn distinct_groups_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let a1 = write_file(&dir, "a1.txt", b"first");
    let a2 = dir.path().join("a2.txt");
    fs::hard_link(&a1, &a2).unwrap();

    let b1 = write_file(&dir, "b1.txt", b"second");
    let b2 = dir.path().join("b2.txt");
    fs::hard_link(&b1, &b2).unwrap();

    let events = run_confirm_all(dir.path());

    let inflated: Vec<_> = events
        .iter()
        .filter(|e| e.action == InflateAction::Inflated)
        .collect();
    assert_eq!(inflated.len(), 2);
    assert_ne!(inflated[0].group_id, inflated[1].group_id);
}

#[test]
fn master_is_never_touched() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.txt", b"shared");
    let b = dir.path().join("b.txt");
    let c = dir.path().join("c.txt");
    fs::hard_link(&a, &b).unwrap();
    fs::hard_link(&a, &c).unwrap();

    let master_identity = resolve_identity(&a).unwrap();

    let events = run_confirm_all(dir.path());

    assert_eq!(count(&events, InflateAction::Inflated), 2);
    // a.txt sorts first: it stays the master and keeps its allocation
    assert_eq!(resolve_identity(&a).unwrap(), master_identity);
    assert!(events
        .iter()
        .all(|e| e.path != a || e.action == InflateAction::Scanned));
}

#[test]
fn inflate_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir, "a.txt", b"shared");
    let b = dir.path().join("b.txt");
    fs::hard_link(&a, &b).unwrap();

    let first = run_confirm_all(dir.path());
    assert_eq!(count(&first, InflateAction::Inflated), 1);

    // No links remain, so the second pass only scans
    let second = run_confirm_all(dir.path());
    assert_eq!(count(&second, InflateAction::Inflated), 0);
    assert_eq!(count(&second, InflateAction::Skipped), 0);
    assert_eq!(count(&second, InflateAction::Error), 0);
}
