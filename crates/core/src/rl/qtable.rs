//! Q-table store and its on-disk format.
//!
//! Rows are materialized lazily: the first lookup of an unknown state inserts
//! a zero row. Every row has exactly one value per action.
//!
//! # File format
//!
//! All integers and floats are little-endian.
//!
//! ```text
//! magic          4 bytes  "RLQT"
//! version        u32      1
//! action_count   u32
//! signature_len  u32
//! signature      signature_len bytes (UTF-8, e.g. "stride;tagged;")
//! state_count    u64
//! state_count x { state u64, action_count x f64 }
//! ```
//!
//! States are written in ascending order so identical tables produce
//! identical files.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::state::State;
use crate::common::QTableError;

const MAGIC: &[u8; 4] = b"RLQT";
const VERSION: u32 = 1;

/// Result of attempting to load a persisted table.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The file was read and validated.
    Loaded(QTable),
    /// No file exists at the path; start from a zero table.
    Absent,
    /// The file exists but could not be used.
    Corrupt(QTableError),
}

/// Mapping from state to per-action value estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    actions: usize,
    rows: BTreeMap<State, Vec<f64>>,
}

impl QTable {
    /// Creates an empty table for `actions` actions.
    pub const fn new(actions: usize) -> Self {
        Self {
            actions,
            rows: BTreeMap::new(),
        }
    }

    /// Number of actions per row.
    pub const fn actions(&self) -> usize {
        self.actions
    }

    /// Number of materialized states.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no state has been materialized yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row for `state`, inserting a zero row if it is unknown.
    pub fn get(&mut self, state: State) -> &[f64] {
        let actions = self.actions;
        self.rows.entry(state).or_insert_with(|| vec![0.0; actions])
    }

    /// Returns the row for `state` without materializing it.
    pub fn peek(&self, state: State) -> Option<&[f64]> {
        self.rows.get(&state).map(Vec::as_slice)
    }

    /// Value of one cell; 0 for unknown states.
    pub fn value(&self, state: State, action: usize) -> f64 {
        self.peek(state)
            .and_then(|row| row.get(action).copied())
            .unwrap_or(0.0)
    }

    /// Materialized states in ascending order.
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        self.rows.keys().copied()
    }

    /// Overwrites one cell.
    ///
    /// # Errors
    ///
    /// Rejects a non-finite `new_value` (the cell keeps its previous value) and
    /// an out-of-range `action`.
    pub fn update(&mut self, state: State, action: usize, new_value: f64) -> Result<(), QTableError> {
        if action >= self.actions {
            return Err(QTableError::ActionOutOfRange {
                action,
                actions: self.actions,
            });
        }
        if !new_value.is_finite() {
            return Err(QTableError::NonFinite {
                state: state.0,
                action,
            });
        }
        let actions = self.actions;
        let row = self.rows.entry(state).or_insert_with(|| vec![0.0; actions]);
        row[action] = new_value;
        Ok(())
    }

    /// Moves one cell toward `reward`: `old + learning_rate * (reward - old)`.
    ///
    /// # Returns
    ///
    /// The value stored in the cell afterwards.
    ///
    /// # Errors
    ///
    /// Same as [`QTable::update`].
    pub fn learn(
        &mut self,
        state: State,
        action: usize,
        reward: f64,
        learning_rate: f64,
    ) -> Result<f64, QTableError> {
        let old = self.value(state, action);
        let new = learning_rate.mul_add(reward - old, old);
        self.update(state, action, new)?;
        Ok(new)
    }

    /// Serializes the table with the given children signature.
    pub fn encode(&self, signature: &str) -> Vec<u8> {
        let row_bytes = 8 + 8 * self.actions;
        let mut out = Vec::with_capacity(24 + signature.len() + self.rows.len() * row_bytes);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(self.actions as u32).to_le_bytes());
        out.extend_from_slice(&(signature.len() as u32).to_le_bytes());
        out.extend_from_slice(signature.as_bytes());
        out.extend_from_slice(&(self.rows.len() as u64).to_le_bytes());
        for (state, row) in &self.rows {
            out.extend_from_slice(&state.0.to_le_bytes());
            for value in row {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    /// Parses a serialized table, checking it against the expected action
    /// count and children signature.
    ///
    /// # Errors
    ///
    /// Any structural problem, an action-count or signature mismatch, or a
    /// non-finite stored value.
    pub fn decode(bytes: &[u8], actions: usize, signature: &str) -> Result<Self, QTableError> {
        let mut r = Reader::new(bytes);

        if r.take(4, "magic")? != MAGIC {
            return Err(QTableError::BadMagic);
        }
        let version = r.u32("version")?;
        if version != VERSION {
            return Err(QTableError::UnsupportedVersion(version));
        }
        let found = r.u32("action count")? as usize;
        if found != actions {
            return Err(QTableError::ActionCountMismatch {
                expected: actions,
                found,
            });
        }
        let sig_len = r.u32("signature length")? as usize;
        let saved = std::str::from_utf8(r.take(sig_len, "signature")?)
            .map_err(|_| QTableError::InvalidSignature)?;
        if saved != signature {
            return Err(QTableError::SignatureMismatch {
                expected: signature.to_owned(),
                found: saved.to_owned(),
            });
        }

        let count = r.u64("state count")?;
        let mut table = Self::new(actions);
        for _ in 0..count {
            let state = State(r.u64("state")?);
            let mut row = Vec::with_capacity(actions);
            for action in 0..actions {
                let value = r.f64("row value")?;
                if !value.is_finite() {
                    return Err(QTableError::NonFinite {
                        state: state.0,
                        action,
                    });
                }
                row.push(value);
            }
            let _ = table.rows.insert(state, row);
        }

        if r.remaining() > 0 {
            return Err(QTableError::TrailingBytes(r.remaining()));
        }
        Ok(table)
    }

    /// Writes the table to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be written.
    pub fn save(&self, path: &Path, signature: &str) -> Result<(), QTableError> {
        fs::write(path, self.encode(signature))?;
        Ok(())
    }

    /// Reads a table from `path`.
    ///
    /// A missing file is [`LoadOutcome::Absent`]; any other I/O failure or a
    /// malformed file is [`LoadOutcome::Corrupt`].
    pub fn load(path: &Path, actions: usize, signature: &str) -> LoadOutcome {
        match fs::read(path) {
            Ok(bytes) => match Self::decode(&bytes, actions, signature) {
                Ok(table) => LoadOutcome::Loaded(table),
                Err(e) => LoadOutcome::Corrupt(e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => LoadOutcome::Absent,
            Err(e) => LoadOutcome::Corrupt(e.into()),
        }
    }
}

/// Bounds-checked little-endian cursor.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    const fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], QTableError> {
        if self.remaining() < n {
            return Err(QTableError::Truncated(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], QTableError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, QTableError> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn u64(&mut self, what: &'static str) -> Result<u64, QTableError> {
        Ok(u64::from_le_bytes(self.array(what)?))
    }

    fn f64(&mut self, what: &'static str) -> Result<f64, QTableError> {
        Ok(f64::from_le_bytes(self.array(what)?))
    }
}
