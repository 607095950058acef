//! Adaptive prefetch controller.
//!
//! The controller sits where a cache's prefetcher would and owns several
//! child prefetchers. Time is divided into fixed-length epochs:
//! 1. **Dispatch:** every access notification goes to the active child only,
//!    and its candidates are returned to the cache unchanged.
//! 2. **Boundary:** when an epoch ends, the IPC it achieved is credited to the
//!    (state, action) it ran under, the next state is derived from the epoch's
//!    miss rate and IPC history, and the next child is chosen epsilon-greedily.
//! 3. **Persistence:** the learned table survives runs through a binary file
//!    keyed on the children signature.
//!
//! The host drives everything through two entry points, [`PrefetchController::on_access`]
//! and [`PrefetchController::on_tick`]; there are no internal timers.

/// Issued-prefetch ownership for usefulness accounting.
pub mod attribution;

/// Epoch timer.
pub mod scheduler;

/// Per-epoch CSV trace.
pub mod telemetry;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use self::attribution::{IssueOutcome, PrefetchAttribution};
use self::scheduler::{Boundary, EpochScheduler};
use self::telemetry::{EpochReport, TelemetryLogger};
use crate::common::{AccessInfo, ConfigError, QTableError};
use crate::config::ControllerConfig;
use crate::counters::{CounterSnapshot, ThroughputSource};
use crate::prefetch::{Child, build_child};
use crate::rl::reward::{epoch_ipc, reward as epoch_reward};
use crate::rl::{EpochObservation, EpsilonGreedy, LoadOutcome, QTable, Selection, State, StateDiscretizer};
use crate::stats::ControllerStats;

/// Where the controller's Q-table came from.
#[derive(Debug)]
pub enum TableOrigin {
    /// Zero table: persistence disabled or no file existed yet.
    Fresh,
    /// Loaded from the configured file.
    Loaded,
    /// The file existed but was unusable; the controller started from a zero table.
    Recovered(QTableError),
}

/// Bookkeeping of the epoch in progress.
#[derive(Debug, Clone, Copy)]
struct EpochRecord {
    state: State,
    action: usize,
    counters: CounterSnapshot,
    accesses: u64,
    misses: u64,
}

/// RL-driven selector over a set of child prefetchers.
pub struct PrefetchController {
    name: String,
    children: Vec<Child>,
    active: usize,
    learning_rate: f64,
    explore_rate: f64,
    explore_decay: f64,
    explore_min: f64,
    cpu: Arc<dyn ThroughputSource>,
    qtable: QTable,
    origin: TableOrigin,
    signature: String,
    qtable_path: Option<PathBuf>,
    save_interval: u64,
    selector: EpsilonGreedy,
    discretizer: StateDiscretizer,
    scheduler: EpochScheduler,
    epoch: EpochRecord,
    attribution: PrefetchAttribution,
    telemetry: Option<TelemetryLogger>,
    stats: ControllerStats,
    last_report: Option<EpochReport>,
    shut_down: bool,
}

impl PrefetchController {
    /// Builds a controller with the children described in `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingCpu`] if `cpu` is `None`, or the first invariant
    /// `config` violates.
    pub fn new(
        config: &ControllerConfig,
        cpu: Option<Arc<dyn ThroughputSource>>,
    ) -> Result<Self, ConfigError> {
        let children = config.children.iter().map(build_child).collect();
        Self::with_children(config, children, cpu)
    }

    /// Builds a controller around externally constructed children.
    /// `config.children` is ignored; `children` defines the actions.
    ///
    /// # Errors
    ///
    /// Same as [`PrefetchController::new`].
    pub fn with_children(
        config: &ControllerConfig,
        children: Vec<Child>,
        cpu: Option<Arc<dyn ThroughputSource>>,
    ) -> Result<Self, ConfigError> {
        config.validate_for(children.len())?;
        let cpu = cpu.ok_or(ConfigError::MissingCpu)?;

        let name = config.cache_name.clone();
        let signature = signature_of(&children);
        let actions = children.len();

        let (qtable, origin) = match &config.qtable_file {
            None => (QTable::new(actions), TableOrigin::Fresh),
            Some(path) => match QTable::load(path, actions, &signature) {
                LoadOutcome::Loaded(table) => {
                    info!(cache = %name, path = %path.display(), states = table.len(), "loaded q-table");
                    (table, TableOrigin::Loaded)
                }
                LoadOutcome::Absent => {
                    debug!(cache = %name, path = %path.display(), "no q-table file, starting fresh");
                    (QTable::new(actions), TableOrigin::Fresh)
                }
                LoadOutcome::Corrupt(e) => {
                    warn!(cache = %name, path = %path.display(), error = %e, "ignoring unusable q-table, starting fresh");
                    (QTable::new(actions), TableOrigin::Recovered(e))
                }
            },
        };

        let telemetry = if config.debug_logging {
            match TelemetryLogger::create(&config.trace_file, config.log_interval) {
                Ok(logger) => Some(logger),
                Err(e) => {
                    warn!(cache = %name, path = %config.trace_file.display(), error = %e, "cannot open epoch trace, telemetry disabled");
                    None
                }
            }
        } else {
            None
        };

        let labels: Vec<&str> = children.iter().map(Child::label).collect();
        let stats = ControllerStats::new(&labels);

        info!(
            cache = %name,
            children = %signature,
            action = config.current_action,
            ticks_per_epoch = config.ticks_per_epoch,
            "prefetch controller ready"
        );

        Ok(Self {
            epoch: EpochRecord {
                state: State::INITIAL,
                action: config.current_action,
                counters: CounterSnapshot::take(cpu.as_ref()),
                accesses: 0,
                misses: 0,
            },
            name,
            children,
            active: config.current_action,
            learning_rate: config.learning_rate,
            explore_rate: config.explore_rate,
            explore_decay: config.explore_decay,
            explore_min: config.explore_min,
            cpu,
            qtable,
            origin,
            signature,
            qtable_path: config.qtable_file.clone(),
            save_interval: config.save_interval_epochs,
            selector: EpsilonGreedy::new(config.seed),
            discretizer: StateDiscretizer::new(),
            scheduler: EpochScheduler::new(config.ticks_per_epoch, config.start_tick),
            attribution: PrefetchAttribution::default(),
            telemetry,
            stats,
            last_report: None,
            shut_down: false,
        })
    }

    /// Sends the epoch trace to `out` instead of the configured file.
    /// Telemetry is enabled regardless of `debug_logging`, honoring `log_interval`.
    #[must_use]
    pub fn with_trace_writer(mut self, out: Box<dyn Write + Send>, log_interval: u64) -> Self {
        self.telemetry = Some(TelemetryLogger::from_writer(out, log_interval));
        self
    }

    /// Handles one access notification from the owning cache.
    ///
    /// A pending epoch boundary at `access.tick` is processed first, so the
    /// access is served by the newly selected child.
    ///
    /// # Returns
    ///
    /// The active child's prefetch candidates, unmodified.
    pub fn on_access(&mut self, access: &AccessInfo) -> Vec<u64> {
        let _ = self.on_tick(access.tick);

        self.epoch.accesses += 1;
        self.stats.accesses += 1;
        if access.hit {
            if let Some(owner) = self.attribution.record_hit(access.addr) {
                self.stats.children[owner].useful += 1;
            }
        } else {
            self.epoch.misses += 1;
            self.stats.misses += 1;
        }

        let active = self.active;
        let candidates = self.children[active].observe(access);
        let child = &mut self.stats.children[active];
        child.notifications += 1;
        for &addr in &candidates {
            match self.attribution.record_issue(active, addr) {
                IssueOutcome::Fresh => child.issued += 1,
                IssueOutcome::Redundant => child.redundant += 1,
            }
        }
        trace!(cache = %self.name, addr = access.addr, action = active, candidates = candidates.len(), "access");
        candidates
    }

    /// Advances simulated time without an access.
    ///
    /// # Returns
    ///
    /// The report of the epoch boundary processed at `tick`, if any.
    pub fn on_tick(&mut self, tick: u64) -> Option<EpochReport> {
        let boundary = self.scheduler.poll(tick)?;
        let report = self.end_epoch(boundary);
        self.last_report = Some(report.clone());
        Some(report)
    }

    fn end_epoch(&mut self, boundary: Boundary) -> EpochReport {
        let now = CounterSnapshot::take(self.cpu.as_ref());
        let ipc = epoch_ipc(self.epoch.counters, now);
        let reward = epoch_reward(self.epoch.counters, now);
        let (state, action) = (self.epoch.state, self.epoch.action);

        match self.qtable.learn(state, action, reward, self.learning_rate) {
            Ok(value) => debug!(cache = %self.name, epoch = boundary.epoch, %state, action, reward, value, "q update"),
            Err(e) => warn!(cache = %self.name, epoch = boundary.epoch, %state, action, reward, error = %e, "q update rejected"),
        }
        let q_values = self.qtable.get(state).to_vec();

        let observation = EpochObservation {
            accesses: self.epoch.accesses,
            misses: self.epoch.misses,
            ipc,
        };
        let features = self.discretizer.observe(&observation);
        let next_state = features.state;

        let selection = if self.is_frozen() {
            Selection {
                action: self.active,
                explored: false,
            }
        } else {
            self.selector.select(self.qtable.get(next_state), self.explore_rate)
        };
        self.explore_rate = (self.explore_rate * self.explore_decay)
            .max(self.explore_min.min(self.explore_rate));

        if selection.action != self.active {
            info!(
                cache = %self.name,
                epoch = boundary.epoch,
                from = %self.children[self.active].label(),
                to = %self.children[selection.action].label(),
                explored = selection.explored,
                "switching prefetcher"
            );
        }
        self.active = selection.action;

        self.stats.epochs += 1;
        self.stats.action_use[action] += 1;
        if selection.explored {
            self.stats.explored += 1;
        }

        let report = EpochReport {
            epoch: boundary.epoch,
            tick: boundary.ended_at,
            state,
            action,
            reward,
            ipc,
            miss_rate: features.miss_rate,
            explored: selection.explored,
            next_state,
            next_action: selection.action,
            q_values,
        };
        if let Some(logger) = self.telemetry.as_mut() {
            if let Err(e) = logger.record(&report) {
                warn!(cache = %self.name, error = %e, "epoch trace write failed, telemetry disabled");
                self.telemetry = None;
            }
        }

        self.epoch = EpochRecord {
            state: next_state,
            action: selection.action,
            counters: now,
            accesses: 0,
            misses: 0,
        };

        if self.save_interval > 0 && self.scheduler.completed() % self.save_interval == 0 {
            if let Err(e) = self.save_qtable() {
                warn!(cache = %self.name, epoch = boundary.epoch, error = %e, "periodic q-table save failed");
            }
        }

        report
    }

    /// With nothing to learn and nothing to explore, the active child is kept.
    const fn is_frozen(&self) -> bool {
        self.learning_rate <= 0.0 && self.explore_rate <= 0.0
    }

    /// Writes the Q-table to the configured file. A no-op without one.
    ///
    /// # Errors
    ///
    /// Returns the I/O error; the run itself is unaffected.
    pub fn save_qtable(&self) -> Result<(), QTableError> {
        let Some(path) = self.qtable_path.as_deref() else {
            return Ok(());
        };
        self.qtable.save(path, &self.signature)?;
        debug!(cache = %self.name, path = %path.display(), states = self.qtable.len(), "saved q-table");
        Ok(())
    }

    /// Flushes the epoch trace and performs the final Q-table save.
    /// Called automatically on drop if the host never does.
    ///
    /// # Errors
    ///
    /// Returns the save error. Trace flush errors are only logged.
    pub fn shutdown(&mut self) -> Result<(), QTableError> {
        self.shut_down = true;
        if let Some(logger) = self.telemetry.as_mut() {
            if let Err(e) = logger.flush() {
                warn!(cache = %self.name, error = %e, "epoch trace flush failed");
            }
        }
        self.save_qtable()
    }

    /// Name of the owning cache.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the child currently receiving notifications.
    pub const fn active_action(&self) -> usize {
        self.active
    }

    /// Label of the active child.
    pub fn active_label(&self) -> &str {
        self.children[self.active].label()
    }

    /// Number of children (actions).
    pub fn num_actions(&self) -> usize {
        self.children.len()
    }

    /// Children in action order.
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// The learned table.
    pub const fn qtable(&self) -> &QTable {
        &self.qtable
    }

    /// How the table was initialized.
    pub const fn table_origin(&self) -> &TableOrigin {
        &self.origin
    }

    /// Children signature recorded in saved tables (e.g. `"stride;tagged;"`).
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// State the current epoch runs under.
    pub const fn current_state(&self) -> State {
        self.epoch.state
    }

    /// Exploration rate after decay.
    pub const fn explore_rate(&self) -> f64 {
        self.explore_rate
    }

    /// Number of epoch boundaries processed.
    pub const fn epochs(&self) -> u64 {
        self.scheduler.completed()
    }

    /// Tick at which the current epoch started.
    pub const fn epoch_start(&self) -> u64 {
        self.scheduler.epoch_start()
    }

    /// Report of the most recent boundary.
    pub const fn last_report(&self) -> Option<&EpochReport> {
        self.last_report.as_ref()
    }

    /// Statistics accumulated so far.
    pub const fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Configured Q-table file, if persistence is enabled.
    pub fn qtable_path(&self) -> Option<&Path> {
        self.qtable_path.as_deref()
    }
}

impl Drop for PrefetchController {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(e) = self.shutdown() {
                warn!(cache = %self.name, error = %e, "final q-table save failed");
            }
        }
    }
}

impl fmt::Debug for PrefetchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchController")
            .field("name", &self.name)
            .field("children", &self.signature)
            .field("active", &self.active)
            .field("epochs", &self.scheduler.completed())
            .field("explore_rate", &self.explore_rate)
            .field("states", &self.qtable.len())
            .finish_non_exhaustive()
    }
}

/// `"label;label;..."` with a trailing separator.
fn signature_of(children: &[Child]) -> String {
    children.iter().map(|c| format!("{};", c.label())).collect()
}
