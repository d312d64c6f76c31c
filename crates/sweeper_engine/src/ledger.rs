//! Sent-recipient ledger and candidate-list diff.
//!
//! File formats match the existing ops tooling: the ledger is a
//! newline-delimited list of lowercase email addresses, the candidate list a
//! CSV with at least `Email`, `Name` and `id` columns.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only record of addresses already processed. Addresses are
/// normalized to trimmed lowercase both on load and on append.
#[derive(Debug, Clone)]
pub struct SentLedger {
    path: PathBuf,
    entries: HashSet<String>,
}

impl SentLedger {
    /// Load the ledger; a missing file is an empty ledger.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let mut entries = HashSet::new();
        match File::open(&path) {
            Ok(file) => {
                for line in BufReader::new(file).lines() {
                    let email = normalize(&line?);
                    if !email.is_empty() {
                        entries.insert(email);
                    }
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        Ok(Self { path, entries })
    }

    pub fn contains(&self, email: &str) -> bool {
        self.entries.contains(&normalize(email))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an address as processed, in memory and on disk. Appending an
    /// address already present (or an empty one) is a no-op.
    pub fn append(&mut self, email: &str) -> Result<(), LedgerError> {
        let email = normalize(email);
        if email.is_empty() || !self.entries.insert(email.clone()) {
            return Ok(());
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{email}")?;
        Ok(())
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// One row of the candidate CSV. Extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "id")]
    pub id: String,
}

/// Read the candidate list from a CSV file with a header row.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>, LedgerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Candidates not yet in the ledger, input order preserved. Rows without an
/// address are dropped, and in-file duplicates keep the first occurrence.
pub fn pending_candidates(candidates: Vec<Candidate>, ledger: &SentLedger) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            let email = normalize(&candidate.email);
            if email.is_empty() || ledger.contains(&email) {
                return false;
            }
            seen.insert(email)
        })
        .collect()
}
