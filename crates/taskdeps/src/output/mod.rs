//! Output formatting for CLI commands.
//!
//! Every printer has a human-readable text form and a JSON form for
//! programmatic use. The text writers are generic over [`Write`] so they
//! can be tested against a buffer.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)
//! - [`tree`]: Hierarchy rendering with ASCII/Unicode connectors

pub mod color;
pub mod tree;

use crate::commands::benchmark::BenchmarkReport;
use crate::domain::{DependencyEdge, DependencyStats, Direction, HierarchyNode, Task, TaskId};
use crate::engine::Capability;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{bold, colored_status_icon, colorize_id, colorize_status, completion_label, dimmed};

// ============================================================================
// Output Configuration
// ============================================================================

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII-only icons and connectors instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `TASKDEPS_ASCII`: Set to "1" or "true" for ASCII-only output (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `TASKDEPS_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        let use_ascii = match env::var("TASKDEPS_ASCII") {
            Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Ok(v) => {
                tracing::warn!(
                    env_var = "TASKDEPS_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            Err(_) => false,
        };

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("TASKDEPS_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Run `text` against a locked stdout, or print `value` as JSON.
fn dispatch<T, F>(mode: OutputMode, value: &T, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'_>, &OutputConfig) -> io::Result<()>,
{
    match mode {
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            text(&mut handle, &OutputConfig::from_env())
        }
        OutputMode::Json => print_json(value),
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(handle, "{json}")
}

/// Print one task
pub fn print_task(task: &Task, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, task, |w, config| write_task(w, task, config))
}

/// Print a list of tasks
pub fn print_tasks(tasks: &[Task], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, tasks, |w, config| write_tasks(w, tasks, config))
}

/// Print a newly recorded edge
pub fn print_edge(edge: &DependencyEdge, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, edge, |w, config| write_edge(w, edge, config))
}

/// Print the transitive dependents or dependencies of `task`
pub fn print_related(
    task: &TaskId,
    direction: Direction,
    related: &[TaskId],
    mode: OutputMode,
) -> io::Result<()> {
    let value = json!({
        "task": task,
        "direction": direction,
        "tasks": related,
    });
    dispatch(mode, &value, |w, config| {
        write_related(w, task, direction, related, config)
    })
}

/// Print a hierarchy as a tree
pub fn print_hierarchy(nodes: &[HierarchyNode], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, nodes, |w, config| tree::write_hierarchy(w, nodes, config))
}

/// Print completion gate decisions
pub fn print_completion(decisions: &BTreeMap<TaskId, bool>, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, decisions, |w, config| {
        write_completion(w, decisions, config)
    })
}

/// Print whether an edge would close a cycle
pub fn print_cycle_check(
    task: &TaskId,
    dependency: &TaskId,
    would_cycle: bool,
    mode: OutputMode,
) -> io::Result<()> {
    let value = json!({
        "task": task,
        "dependency": dependency,
        "would_create_cycle": would_cycle,
    });
    dispatch(mode, &value, |w, config| {
        write_cycle_check(w, task, dependency, would_cycle, config)
    })
}

/// Print edge statistics and the active traversal capability
pub fn print_stats(
    stats: &DependencyStats,
    capability: Capability,
    mode: OutputMode,
) -> io::Result<()> {
    let value = json!({
        "capability": capability,
        "stats": stats,
    });
    dispatch(mode, &value, |w, config| {
        write_stats(w, stats, capability, config)
    })
}

/// Print a benchmark report
pub fn print_benchmark(report: &BenchmarkReport, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, report, |w, config| write_benchmark(w, report, config))
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_task<W: Write>(w: &mut W, task: &Task, config: &OutputConfig) -> io::Result<()> {
    let title = task
        .title
        .as_deref()
        .map(|t| format!("  {t}"))
        .unwrap_or_default();
    writeln!(
        w,
        "{} {} [{}]{}",
        colored_status_icon(task.status, config),
        colorize_id(task.id.as_str(), config),
        colorize_status(task.status, config),
        title
    )
}

fn write_tasks<W: Write>(w: &mut W, tasks: &[Task], config: &OutputConfig) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(w, "No tasks found.");
    }

    writeln!(w, "Found {} task(s):", tasks.len())?;
    writeln!(w)?;
    for task in tasks {
        write_task(w, task, config)?;
    }
    Ok(())
}

fn write_edge<W: Write>(w: &mut W, edge: &DependencyEdge, config: &OutputConfig) -> io::Result<()> {
    writeln!(
        w,
        "{} {} depends on {}",
        success("Added dependency:", config),
        colorize_id(edge.task_id.as_str(), config),
        colorize_id(edge.dependency_task_id.as_str(), config)
    )
}

fn write_related<W: Write>(
    w: &mut W,
    task: &TaskId,
    direction: Direction,
    related: &[TaskId],
    config: &OutputConfig,
) -> io::Result<()> {
    let id = colorize_id(task.as_str(), config);
    let header = match direction {
        Direction::Dependents => format!("Tasks depending on {id}"),
        Direction::Dependencies => format!("Tasks {id} depends on"),
    };

    if related.is_empty() {
        return writeln!(w, "{header}: {}", dimmed("none", config));
    }

    writeln!(w, "{} ({}):", bold(&header, config), related.len())?;
    for (i, other) in related.iter().enumerate() {
        writeln!(w, "  {:>3}. {}", i + 1, colorize_id(other.as_str(), config))?;
    }
    Ok(())
}

fn write_completion<W: Write>(
    w: &mut W,
    decisions: &BTreeMap<TaskId, bool>,
    config: &OutputConfig,
) -> io::Result<()> {
    for (task, &allowed) in decisions {
        writeln!(
            w,
            "{}  {}",
            colorize_id(task.as_str(), config),
            completion_label(allowed, config)
        )?;
    }
    Ok(())
}

fn write_cycle_check<W: Write>(
    w: &mut W,
    task: &TaskId,
    dependency: &TaskId,
    would_cycle: bool,
    config: &OutputConfig,
) -> io::Result<()> {
    let edge = format!(
        "{} -> {}",
        colorize_id(task.as_str(), config),
        colorize_id(dependency.as_str(), config)
    );
    if would_cycle {
        writeln!(w, "{} {edge} would create a cycle", error("Rejected:", config))
    } else {
        writeln!(w, "{} {edge} keeps the graph acyclic", success("OK:", config))
    }
}

fn write_stats<W: Write>(
    w: &mut W,
    stats: &DependencyStats,
    capability: Capability,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w, "{}", bold("Dependency Statistics", config))?;
    writeln!(w)?;

    let rows = [
        ("Traversal strategy", capability.to_string()),
        (
            "Tasks with dependencies",
            stats.tasks_with_dependencies.to_string(),
        ),
        ("Total dependencies", stats.total_dependencies.to_string()),
        (
            "Average per task",
            format!("{:.2}", stats.avg_dependencies_per_task),
        ),
        ("Maximum per task", stats.max_dependencies_per_task.to_string()),
        (
            "Potential circular",
            stats.potential_circular_dependencies.to_string(),
        ),
    ];

    for (label, value) in rows {
        writeln!(w, "  {:<26} {value}", dimmed(&format!("{label}:"), config))?;
    }

    if stats.potential_circular_dependencies > 0 {
        writeln!(w)?;
        writeln!(
            w,
            "{}",
            warning("Mutual edges found; the store was modified outside taskdeps", config)
        )?;
    }
    Ok(())
}

fn write_benchmark<W: Write>(
    w: &mut W,
    report: &BenchmarkReport,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {} ({} iteration(s), cold cache)",
        bold("Benchmark for", config),
        colorize_id(report.task.as_str(), config),
        report.iterations
    )?;
    writeln!(
        w,
        "  {} dependents, {} dependencies, {} hierarchy nodes",
        report.dependents, report.dependencies, report.hierarchy_nodes
    )?;
    writeln!(w)?;
    writeln!(
        w,
        "  {:<18} {:>14} {:>14} {:>14}",
        "strategy", "dependents", "dependencies", "hierarchy"
    )?;
    for timing in &report.timings {
        writeln!(
            w,
            "  {:<18} {:>11.3} ms {:>11.3} ms {:>11.3} ms",
            timing.capability.to_string(),
            timing.dependents_ms,
            timing.dependencies_ms,
            timing.hierarchy_ms
        )?;
    }
    writeln!(w)?;

    if report.consistent {
        writeln!(w, "{}", success("Strategies agree", config))
    } else {
        writeln!(w, "{}", error("Strategies returned different results", config))
    }
}
