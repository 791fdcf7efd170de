use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use super::*;
use crate::types::{ActorId, Direction, ObjectId, TurnReason};

fn journal_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

fn header(seed: u64) -> InputJournal {
    InputJournal::new(seed, "normal", "Wren").with_content_hash(99)
}

fn write_moves(path: &Path, count: u64) {
    let mut writer = JournalWriter::create(path, &header(1)).unwrap();
    for turn in 0..count {
        writer.append(turn, &InputPayload::Move { direction: Direction::East }).unwrap();
    }
}

#[test]
fn header_and_records_survive_a_round_trip() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "roundtrip.jsonl");

    let mut writer = JournalWriter::create(&path, &header(42)).unwrap();
    writer.append(0, &InputPayload::Move { direction: Direction::North }).unwrap();
    writer.append(1, &InputPayload::Interact { object: ObjectId(12) }).unwrap();
    writer
        .append(2, &InputPayload::ChooseDialogue { actor: ActorId(3), choice: "calm".into() })
        .unwrap();
    assert_eq!(writer.next_seq(), 3);

    let loaded = load_journal_from_file(&path).unwrap();
    let journal = &loaded.journal;
    assert_eq!(journal.format_version, JOURNAL_FORMAT_VERSION);
    assert_eq!(journal.build_id, "dev");
    assert_eq!(journal.content_hash, 99);
    assert_eq!(journal.seed, 42);
    assert_eq!(journal.difficulty, "normal");
    assert_eq!(journal.player_name, "Wren");
    assert_eq!(journal.inputs.len(), 3);
    assert_eq!(journal.inputs[1].turn, 1);
    assert_eq!(journal.inputs[1].payload, InputPayload::Interact { object: ObjectId(12) });
    assert!(matches!(journal.inputs[2].payload, InputPayload::ChooseDialogue { .. }));

    let seqs: Vec<u64> = journal.inputs.iter().map(|record| record.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
    assert_eq!(loaded.next_seq, 3);
    assert_ne!(loaded.last_sha256_hex, INITIAL_HASH);
}

#[test]
fn edited_payload_breaks_the_chain() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "tampered.jsonl");
    write_moves(&path, 2);

    let text = fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(String::from).collect();
    assert_eq!(lines.len(), 3, "header + 2 records");
    lines[2] = lines[2].replace("east", "west");
    fs::write(&path, lines.join("\n") + "\n").unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::HashChainBroken { line: 3 })),
        "expected hash chain broken at line 3, got: {result:?}"
    );
}

#[test]
fn dropped_record_is_detected() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "deleted.jsonl");
    write_moves(&path, 3);

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    fs::write(&path, format!("{}\n{}\n{}\n", lines[0], lines[1], lines[3])).unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::InvalidRecord { line: 3, .. })),
        "expected a sequence gap at line 3, got: {result:?}"
    );
}

#[test]
fn truncated_tail_is_an_incomplete_line() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "truncated.jsonl");
    write_moves(&path, 1);

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    write!(file, "{{\"seq\":1,\"tu").unwrap();

    let result = load_journal_from_file(&path);
    assert!(
        matches!(result, Err(JournalLoadError::IncompleteLine { line: 3 })),
        "expected incomplete line at line 3, got: {result:?}"
    );
}

#[test]
fn empty_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "empty.jsonl");
    fs::write(&path, "").unwrap();
    assert!(matches!(load_journal_from_file(&path), Err(JournalLoadError::EmptyFile)));
}

#[test]
fn garbage_header_is_rejected() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "bad_header.jsonl");
    fs::write(&path, "not valid json\n").unwrap();
    assert!(matches!(
        load_journal_from_file(&path),
        Err(JournalLoadError::InvalidHeader { line: 1, .. })
    ));
}

#[test]
fn future_format_versions_are_refused() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "future.jsonl");
    fs::write(
        &path,
        "{\"format_version\":9,\"build_id\":\"dev\",\"content_hash\":0,\"seed\":1,\
         \"difficulty\":\"normal\",\"player_name\":\"Wren\"}\n",
    )
    .unwrap();
    assert!(matches!(
        load_journal_from_file(&path),
        Err(JournalLoadError::UnsupportedVersion(9))
    ));
}

#[test]
fn header_only_file_is_an_empty_journal() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "header_only.jsonl");
    drop(JournalWriter::create(&path, &header(555)).unwrap());

    let loaded = load_journal_from_file(&path).unwrap();
    assert_eq!(loaded.journal.seed, 555);
    assert!(loaded.journal.inputs.is_empty());
    assert_eq!(loaded.next_seq, 0);
    assert_eq!(loaded.last_sha256_hex, INITIAL_HASH);
}

#[test]
fn resumed_writer_extends_the_chain() {
    let dir = tempdir().unwrap();
    let path = journal_path(dir.path(), "resume.jsonl");
    write_moves(&path, 1);

    let loaded = load_journal_from_file(&path).unwrap();
    let mut writer = JournalWriter::resume(&path, loaded.last_sha256_hex, loaded.next_seq).unwrap();
    writer.append(1, &InputPayload::Search).unwrap();
    writer.append(2, &InputPayload::AdvanceTurn { reason: TurnReason::Rest }).unwrap();
    drop(writer);

    let reloaded = load_journal_from_file(&path).unwrap();
    assert_eq!(reloaded.journal.inputs.len(), 3);
    assert_eq!(reloaded.journal.inputs[2].seq, 2);
    assert_eq!(reloaded.next_seq, 3);
}
