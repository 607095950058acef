//! Controller statistics collection and reporting.
//!
//! This module tracks what the controller did over a run. It provides:
//! 1. **Summary:** Epochs, accesses, misses and how many selections explored.
//! 2. **Actions:** How many epochs each action was selected for.
//! 3. **Children:** Notifications forwarded plus issued/useful/redundant prefetches per child.

use serde::Serialize;

/// Counters of one child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChildStats {
    /// Child label.
    pub label: String,
    /// Access notifications forwarded to this child.
    pub notifications: u64,
    /// Distinct prefetch lines issued.
    pub issued: u64,
    /// Issued lines later hit by a demand access.
    pub useful: u64,
    /// Candidates for lines that were already outstanding.
    pub redundant: u64,
}

/// Controller statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerStats {
    /// Epoch boundaries processed.
    pub epochs: u64,
    /// Access notifications received.
    pub accesses: u64,
    /// Notifications that missed in the owning cache.
    pub misses: u64,
    /// Boundaries whose selection was a random exploration.
    pub explored: u64,
    /// Epochs each action was selected for, indexed by action.
    pub action_use: Vec<u64>,
    /// Per-child counters, indexed by action.
    pub children: Vec<ChildStats>,
}

/// Section names for selective stats output.
pub const STATS_SECTIONS: &[&str] = &["summary", "actions", "children"];

impl ControllerStats {
    /// Creates zeroed statistics for the given child labels.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            action_use: vec![0; labels.len()],
            children: labels
                .iter()
                .map(|l| ChildStats {
                    label: l.as_ref().to_owned(),
                    ..ChildStats::default()
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Miss rate over the whole run, in `[0, 1]`.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }

    /// Serializes the statistics as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates the `serde_json` error (not expected for this type).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Renders only the requested sections. Pass an empty slice for all of them.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let epochs = self.epochs.max(1);
        let mut out = String::new();

        out.push_str("==========================================================\n");
        out.push_str("PREFETCH CONTROLLER STATISTICS\n");
        out.push_str("==========================================================\n");
        if want("summary") {
            out.push_str(&format!("epochs                   {}\n", self.epochs));
            out.push_str(&format!("accesses                 {}\n", self.accesses));
            out.push_str(&format!("misses                   {}\n", self.misses));
            out.push_str(&format!("miss_rate                {:.2}%\n", self.miss_rate() * 100.0));
            out.push_str(&format!(
                "explored                 {} ({:.2}%)\n",
                self.explored,
                self.explored as f64 / epochs as f64 * 100.0
            ));
            out.push_str("----------------------------------------------------------\n");
        }
        if want("actions") {
            out.push_str("ACTION USAGE\n");
            for (i, uses) in self.action_use.iter().enumerate() {
                out.push_str(&format!(
                    "  action.{i:<3}             {} ({:.2}%)\n",
                    uses,
                    *uses as f64 / epochs as f64 * 100.0
                ));
            }
            out.push_str("----------------------------------------------------------\n");
        }
        if want("children") {
            out.push_str("CHILDREN\n");
            for (i, c) in self.children.iter().enumerate() {
                let accuracy = if c.issued > 0 {
                    c.useful as f64 / c.issued as f64 * 100.0
                } else {
                    0.0
                };
                out.push_str(&format!(
                    "  [{i}] {:<10} notified: {:<10} | issued: {:<8} | useful: {:<8} | redundant: {:<8} | accuracy: {:.2}%\n",
                    c.label, c.notifications, c.issued, c.useful, c.redundant, accuracy
                ));
            }
        }
        out.push_str("==========================================================\n");
        out
    }

    /// Prints the requested sections to stdout.
    pub fn print_sections(&self, sections: &[String]) {
        print!("{}", self.render_sections(sections));
    }

    /// Prints all sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
