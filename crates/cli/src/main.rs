//! Adaptive prefetch controller CLI.
//!
//! This binary drives the controller outside of a full simulator. It performs:
//! 1. **Replay:** Feed a JSON-lines trace of accesses and counter samples through a controller.
//! 2. **Inspect:** Dump a persisted Q-table with the greedy action of every state.
//! 3. **Script run:** Execute a Python script with the `rlpf` module injected, for parameter sweeps.

use std::error::Error;
use std::ffi::CString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pyo3::prelude::*;
use pyo3::types::PyList;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rlpf_core::common::AccessInfo;
use rlpf_core::config::ControllerConfig;
use rlpf_core::controller::PrefetchController;
use rlpf_core::counters::{CpuCounters, ThroughputSource};
use rlpf_core::rl::selector::greedy;
use rlpf_core::rl::{LoadOutcome, QTable};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "rlpf",
    author,
    version,
    about = "Adaptive RL prefetch controller",
    long_about = "Replay access traces through the controller, inspect learned Q-tables, or run a Python sweep script.\n\nExamples:\n  rlpf replay --config l2.json --trace run.jsonl\n  rlpf inspect --qtable qtable_system_l2cache.bin --config l2.json\n  rlpf script sweeps/explore_rates.py"
)]
struct Cli {
    /// Log filter in `RUST_LOG` syntax (defaults to `RUST_LOG`, then `info`).
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines trace through a controller.
    Replay {
        /// Controller configuration (JSON).
        #[arg(short, long)]
        config: PathBuf,

        /// Trace file: one `{"access": {...}}`, `{"counters": {...}}` or `{"tick": {...}}` object per line.
        #[arg(short, long)]
        trace: PathBuf,

        /// Only print these stats sections (summary, actions, children).
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,

        /// Print stats as JSON instead of the text report.
        #[arg(long)]
        json: bool,

        /// Load and save the Q-table; defaults to `qtable_<cache_name>.bin` when the config names no file.
        #[arg(long)]
        persist: bool,
    },

    /// Print the contents of a persisted Q-table.
    Inspect {
        /// Q-table file.
        #[arg(short, long)]
        qtable: PathBuf,

        /// Controller configuration the table was learned with.
        #[arg(short, long, conflicts_with = "signature", required_unless_present = "signature")]
        config: Option<PathBuf>,

        /// Children signature instead of a config, e.g. "stride;tagged;".
        #[arg(short, long)]
        signature: Option<String>,
    },

    /// Run a Python script with the `rlpf` module injected. Script gets argv as sys.argv.
    Script {
        /// Script path.
        path: String,

        /// Arguments for the script (sys.argv[1:]).
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
}

/// One line of a replay trace.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
enum TraceRecord {
    /// A cache access notification.
    Access(AccessInfo),
    /// Absolute CPU counter values at a tick.
    Counters {
        tick: u64,
        instructions: u64,
        cycles: u64,
    },
    /// Time advance without an access.
    Tick { tick: u64 },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let result = match cli.command {
        Commands::Replay {
            config,
            trace,
            sections,
            json,
            persist,
        } => cmd_replay(&config, &trace, &sections, json, persist),
        Commands::Inspect {
            qtable,
            config,
            signature,
        } => cmd_inspect(&qtable, config.as_deref(), signature),
        Commands::Script { path, args } => run_python_script(&path, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        EnvFilter::new,
    );
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> CliResult<ControllerConfig> {
    let text = fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    Ok(ControllerConfig::from_json(&text).map_err(|e| format!("parsing {}: {e}", path.display()))?)
}

/// Falls back to the cache's derived Q-table file when persistence is requested
/// and the config does not name one.
fn apply_persist(config: &mut ControllerConfig, persist: bool) {
    if persist && config.qtable_file.is_none() {
        config.qtable_file = Some(config.derived_qtable_path());
    }
}

/// Replays `trace` through a controller built from `config_path`, then prints its stats.
fn cmd_replay(
    config_path: &Path,
    trace: &Path,
    sections: &[String],
    json: bool,
    persist: bool,
) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    apply_persist(&mut config, persist);
    let cpu = Arc::new(CpuCounters::new());
    let source: Arc<dyn ThroughputSource> = cpu.clone();
    let mut ctl = PrefetchController::new(&config, Some(source))?;

    let reader = BufReader::new(File::open(trace).map_err(|e| format!("opening {}: {e}", trace.display()))?);
    let mut candidates = 0usize;
    let mut skipped = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TraceRecord>(&line) {
            Ok(TraceRecord::Access(access)) => candidates += ctl.on_access(&access).len(),
            Ok(TraceRecord::Counters {
                tick,
                instructions,
                cycles,
            }) => {
                cpu.set(instructions, cycles);
                let _ = ctl.on_tick(tick);
            }
            Ok(TraceRecord::Tick { tick }) => {
                let _ = ctl.on_tick(tick);
            }
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "skipping malformed trace record");
                skipped += 1;
            }
        }
    }
    ctl.shutdown()?;
    info!(
        epochs = ctl.epochs(),
        candidates,
        skipped,
        active = %ctl.active_label(),
        "replay finished"
    );

    if json {
        println!("{}", ctl.stats().to_json()?);
    } else {
        ctl.stats().print_sections(sections);
    }
    Ok(())
}

/// Number of actions recorded by a children signature.
fn actions_in(signature: &str) -> usize {
    signature.split(';').filter(|s| !s.is_empty()).count()
}

/// Prints every state of a persisted table with its greedy action.
fn cmd_inspect(path: &Path, config: Option<&Path>, signature: Option<String>) -> CliResult<()> {
    let signature = match (config, signature) {
        (Some(config), _) => load_config(config)?
            .children
            .iter()
            .map(|c| format!("{};", c.label()))
            .collect(),
        (None, Some(signature)) => signature,
        (None, None) => return Err("either --config or --signature is required".into()),
    };
    let actions = actions_in(&signature);
    if actions == 0 {
        return Err("the children signature names no children".into());
    }

    let table = match QTable::load(path, actions, &signature) {
        LoadOutcome::Loaded(table) => table,
        LoadOutcome::Absent => return Err(format!("{} does not exist", path.display()).into()),
        LoadOutcome::Corrupt(e) => return Err(format!("{}: {e}", path.display()).into()),
    };

    let labels: Vec<&str> = signature.split(';').filter(|s| !s.is_empty()).collect();
    println!("{}: {} states x {} actions [{}]", path.display(), table.len(), actions, labels.join(", "));
    for state in table.states() {
        let Some(row) = table.peek(state) else {
            continue;
        };
        let values: Vec<String> = row.iter().map(|v| format!("{v:>10.6}")).collect();
        println!("  state {state:>3}  {}  -> {}", values.join(" "), labels[greedy(row)]);
    }
    Ok(())
}

/// Runs a Python script with `rlpf` injected into `sys.modules` and `sys.argv` set.
///
/// The script is executed as `__main__`.
///
/// # Arguments
///
/// * `script_path` - Path to the `.py` file.
/// * `script_args` - Arguments passed as `sys.argv[1:]`.
fn run_python_script(script_path: &str, script_args: Vec<String>) -> CliResult<()> {
    let script_content =
        fs::read_to_string(script_path).map_err(|e| format!("reading script {script_path}: {e}"))?;
    let code_c = CString::new(script_content)?;
    let file_c = CString::new(script_path)?;
    let name_c = CString::new("__main__")?;

    Python::with_gil(|py| -> PyResult<()> {
        let sys = py.import("sys")?;
        let path = sys.getattr("path")?;
        let _ = path.call_method1("append", (".",))?;

        let m = PyModule::new(py, "rlpf")?;
        rlpf_bindings::register_controller_module(&m)?;
        sys.getattr("modules")?.set_item("rlpf", m)?;

        let mut full_args = vec![script_path.to_string()];
        full_args.extend(script_args);
        sys.setattr("argv", PyList::new(py, &full_args)?)?;

        let _ = PyModule::from_code(py, &code_c, &file_c, &name_c).map_err(|e| {
            e.print(py);
            e
        })?;
        Ok(())
    })?;
    Ok(())
}
