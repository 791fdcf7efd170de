//! Append-only JSONL journal guarded by a SHA-256 chain.
//!
//! Line 1 is a header naming the run (`seed`, `difficulty`, `player_name`)
//! and the build/content it was recorded against. Every following line is
//! one accepted action plus `prev_sha256_hex` and `sha256_hex`, where
//! `sha256_hex = hex(SHA-256(body_json || prev_sha256_hex))` over the
//! `seq`/`turn`/`payload` body. Records are flushed as they are written, so
//! a crash loses at most the line being written, and the loader refuses
//! anything after the first bad line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::journal::{InputJournal, InputPayload, InputRecord, JOURNAL_FORMAT_VERSION};

/// `prev_sha256_hex` of the first record.
const INITIAL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct FileHeader {
    format_version: u16,
    build_id: String,
    content_hash: u64,
    seed: u64,
    difficulty: String,
    player_name: String,
}

impl FileHeader {
    fn describing(journal: &InputJournal) -> Self {
        Self {
            format_version: JOURNAL_FORMAT_VERSION,
            build_id: journal.build_id.clone(),
            content_hash: journal.content_hash,
            seed: journal.seed,
            difficulty: journal.difficulty.clone(),
            player_name: journal.player_name.clone(),
        }
    }

    fn into_journal(self) -> InputJournal {
        InputJournal {
            format_version: self.format_version,
            build_id: self.build_id,
            content_hash: self.content_hash,
            seed: self.seed,
            difficulty: self.difficulty,
            player_name: self.player_name,
            inputs: Vec::new(),
        }
    }
}

/// The hashed part of a record line.
#[derive(Serialize)]
struct RecordBody<'a> {
    seq: u64,
    turn: u64,
    payload: &'a InputPayload,
}

impl RecordBody<'_> {
    fn chained_digest(&self, prev_sha256_hex: &str) -> serde_json::Result<String> {
        let body_json = serde_json::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(body_json.as_bytes());
        hasher.update(prev_sha256_hex.as_bytes());
        Ok(format!("{:064x}", hasher.finalize()))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct FileRecord {
    seq: u64,
    turn: u64,
    payload: InputPayload,
    prev_sha256_hex: String,
    sha256_hex: String,
}

impl FileRecord {
    fn body(&self) -> RecordBody<'_> {
        RecordBody { seq: self.seq, turn: self.turn, payload: &self.payload }
    }
}

/// Appends accepted actions to a journal file, one flushed line each.
pub struct JournalWriter {
    writer: BufWriter<File>,
    last_sha256_hex: String,
    next_seq: u64,
}

impl JournalWriter {
    /// Starts a new file from `journal`'s header fields. Inputs already
    /// held by `journal` are not written.
    pub fn create(path: &Path, journal: &InputJournal) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        let header_json =
            serde_json::to_string(&FileHeader::describing(journal)).map_err(io::Error::other)?;
        writeln!(writer, "{header_json}")?;
        writer.flush()?;
        Ok(Self { writer, last_sha256_hex: INITIAL_HASH.to_string(), next_seq: 0 })
    }

    /// Continues a file previously read with [`load_journal_from_file`].
    pub fn resume(path: &Path, last_sha256_hex: String, next_seq: u64) -> io::Result<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self { writer: BufWriter::new(file), last_sha256_hex, next_seq })
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn append(&mut self, turn: u64, payload: &InputPayload) -> io::Result<()> {
        let body = RecordBody { seq: self.next_seq, turn, payload };
        let sha256_hex = body.chained_digest(&self.last_sha256_hex).map_err(io::Error::other)?;
        let record = FileRecord {
            seq: self.next_seq,
            turn,
            payload: payload.clone(),
            prev_sha256_hex: mem::replace(&mut self.last_sha256_hex, sha256_hex.clone()),
            sha256_hex,
        };
        let line = serde_json::to_string(&record).map_err(io::Error::other)?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        self.next_seq += 1;
        Ok(())
    }
}

/// A verified journal plus what a [`JournalWriter`] needs to keep appending.
#[derive(Debug)]
pub struct LoadedJournal {
    pub journal: InputJournal,
    pub last_sha256_hex: String,
    pub next_seq: u64,
}

#[derive(Debug, Error)]
pub enum JournalLoadError {
    #[error("journal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("journal file is empty")]
    EmptyFile,
    #[error("invalid journal header at line {line}: {message}")]
    InvalidHeader { line: usize, message: String },
    #[error("invalid journal record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },
    /// The file ended without a trailing newline.
    #[error("incomplete journal line at line {line}")]
    IncompleteLine { line: usize },
    /// Either the `prev_sha256_hex` link or the recomputed digest disagrees.
    #[error("SHA-256 hash chain broken at line {line}")]
    HashChainBroken { line: usize },
    #[error("unsupported journal format version {0}")]
    UnsupportedVersion(u16),
}

fn invalid_record(line: usize, message: impl ToString) -> JournalLoadError {
    JournalLoadError::InvalidRecord { line, message: message.to_string() }
}

/// Reads and verifies a journal file, failing on the first bad line.
pub fn load_journal_from_file(path: &Path) -> Result<LoadedJournal, JournalLoadError> {
    let text = fs::read_to_string(path)?;
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return Err(JournalLoadError::EmptyFile);
    }
    if !text.ends_with('\n') {
        return Err(JournalLoadError::IncompleteLine { line: lines.len() });
    }

    let header: FileHeader = serde_json::from_str(lines[0])
        .map_err(|e| JournalLoadError::InvalidHeader { line: 1, message: e.to_string() })?;
    if header.format_version != JOURNAL_FORMAT_VERSION {
        return Err(JournalLoadError::UnsupportedVersion(header.format_version));
    }
    let mut journal = header.into_journal();
    let mut prev_sha256_hex = INITIAL_HASH.to_string();

    for (offset, line) in lines[1..].iter().enumerate() {
        // Header is line 1.
        let line_number = offset + 2;
        let expected_seq = offset as u64;
        if line.is_empty() {
            return Err(invalid_record(line_number, "empty line"));
        }
        let record: FileRecord =
            serde_json::from_str(line).map_err(|e| invalid_record(line_number, e))?;
        if record.seq != expected_seq {
            return Err(invalid_record(
                line_number,
                format!("expected seq {expected_seq}, found {}", record.seq),
            ));
        }
        if record.prev_sha256_hex != prev_sha256_hex {
            return Err(JournalLoadError::HashChainBroken { line: line_number });
        }
        let digest = record
            .body()
            .chained_digest(&prev_sha256_hex)
            .map_err(|e| invalid_record(line_number, e))?;
        if record.sha256_hex != digest {
            return Err(JournalLoadError::HashChainBroken { line: line_number });
        }

        prev_sha256_hex = record.sha256_hex;
        journal.inputs.push(InputRecord {
            seq: record.seq,
            turn: record.turn,
            payload: record.payload,
        });
    }

    let next_seq = journal.inputs.len() as u64;
    Ok(LoadedJournal { journal, last_sha256_hex: prev_sha256_hex, next_seq })
}

#[cfg(test)]
mod tests;
