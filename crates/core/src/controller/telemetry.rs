//! Per-epoch CSV trace.
//!
//! One line per epoch in a stable comma-separated layout; the per-action
//! value estimates occupy the last column, joined by `;`.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::rl::State;

/// Column header written before the first record.
pub const HEADER: &str = "epoch,tick,state,action,reward,ipc,miss_rate,explored,next_state,next_action,q_values";

/// Everything decided at one epoch boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochReport {
    /// Index of the completed epoch.
    pub epoch: u64,
    /// Tick of the boundary.
    pub tick: u64,
    /// State the completed epoch ran under.
    pub state: State,
    /// Action active during the completed epoch.
    pub action: usize,
    /// Reward credited to `(state, action)`.
    pub reward: f64,
    /// IPC of the completed epoch.
    pub ipc: f64,
    /// Miss rate of the completed epoch.
    pub miss_rate: f64,
    /// Whether `next_action` was a random exploration.
    pub explored: bool,
    /// State of the epoch that starts now.
    pub next_state: State,
    /// Action active from now on.
    pub next_action: usize,
    /// Value estimates of `state` after the update, one per action.
    pub q_values: Vec<f64>,
}

impl EpochReport {
    /// Formats the report as one CSV line (without the newline).
    pub fn to_csv(&self) -> String {
        let mut line = format!(
            "{},{},{},{},{:.6},{:.6},{:.6},{},{},{},",
            self.epoch,
            self.tick,
            self.state,
            self.action,
            self.reward,
            self.ipc,
            self.miss_rate,
            u8::from(self.explored),
            self.next_state,
            self.next_action,
        );
        for (i, q) in self.q_values.iter().enumerate() {
            if i > 0 {
                line.push(';');
            }
            let _ = write!(line, "{q:.6}");
        }
        line
    }
}

/// CSV sink for [`EpochReport`]s.
pub struct TelemetryLogger {
    out: Box<dyn Write + Send>,
    interval: u64,
    header_written: bool,
}

impl TelemetryLogger {
    /// Creates (truncating) the trace file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn create(path: &Path, interval: u64) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(BufWriter::new(file)), interval))
    }

    /// Logs to an arbitrary writer.
    pub fn from_writer(out: Box<dyn Write + Send>, interval: u64) -> Self {
        Self {
            out,
            interval: interval.max(1),
            header_written: false,
        }
    }

    /// Appends `report` if its epoch falls on the logging interval.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the underlying writer.
    pub fn record(&mut self, report: &EpochReport) -> io::Result<()> {
        if report.epoch % self.interval != 0 {
            return Ok(());
        }
        if !self.header_written {
            writeln!(self.out, "{HEADER}")?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", report.to_csv())
    }

    /// Flushes buffered records.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl std::fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("interval", &self.interval)
            .field("header_written", &self.header_written)
            .finish_non_exhaustive()
    }
}
