//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands. Task
//! mutations go through the SQLite store and then notify the graph service,
//! so cached results never outlive the state they were computed from.

use anyhow::{bail, Result};

use super::args::{
    BenchmarkArgs, CanCompleteArgs, DepAction, DepArgs, InitArgs, TaskAction, TaskArgs,
    TaskRefArgs,
};
use crate::app::App;
use crate::domain::{Direction, TaskId, TaskStatus};
use crate::error::Error;
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.strategy.into()).await?;

    if !args.quiet {
        println!("Initialized taskdeps in {}", result.taskdeps_dir.display());
        println!("  Config:   {}", result.config_file.display());
        println!("  Database: {}", result.database_file.display());
        println!("  Strategy: {:?}", result.strategy);
    }

    Ok(())
}

/// Execute the task command
pub async fn execute_task(app: &App, args: &TaskArgs, output_mode: OutputMode) -> Result<()> {
    match &args.action {
        TaskAction::Add {
            task_id,
            title,
            status,
        } => {
            let id = TaskId::new(task_id);
            let existed = app.store().get_task(&id).await?;
            let status = TaskStatus::from(*status);

            app.store()
                .upsert_task(&id, title.as_deref(), status)
                .await?;
            if existed.is_some_and(|task| task.status != status) {
                app.service().on_status_changed(&id).await?;
            }

            print_stored_task(app, &id, output_mode).await
        }
        TaskAction::Status {
            task_id,
            status,
            force,
        } => {
            let id = TaskId::new(task_id);
            let status = TaskStatus::from(*status);

            if status == TaskStatus::Completed
                && !*force
                && !app.service().is_completion_allowed(&id).await?
            {
                bail!(
                    "Cannot complete {id}: not every dependency is completed. \
                     Run 'taskdeps dependencies {id}' to see them, or pass --force"
                );
            }

            app.store().set_status(&id, status).await?;
            app.service().on_status_changed(&id).await?;

            print_stored_task(app, &id, output_mode).await
        }
        TaskAction::Delete { task_id } => {
            let id = TaskId::new(task_id);

            // Invalidate while the edges still exist, so the affected set is exact.
            app.service().on_task_deleted(&id).await?;
            let edges = app.store().delete_task(&id).await?;

            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "deleted": id,
                    "edges_removed": edges,
                }))?,
                OutputMode::Text => {
                    println!("Deleted task {id} ({edges} dependency edge(s) removed)");
                }
            }
            Ok(())
        }
        TaskAction::List => {
            let tasks = app.store().list_tasks().await?;
            output::print_tasks(&tasks, output_mode)?;
            Ok(())
        }
    }
}

async fn print_stored_task(app: &App, id: &TaskId, output_mode: OutputMode) -> Result<()> {
    let task = app
        .store()
        .get_task(id)
        .await?
        .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
    output::print_task(&task, output_mode)?;
    Ok(())
}

/// Execute the dep command
pub async fn execute_dep(app: &App, args: &DepArgs, output_mode: OutputMode) -> Result<()> {
    match &args.action {
        DepAction::Add { task, dependency } => {
            let edge = app
                .service()
                .add_dependency(&TaskId::new(task), &TaskId::new(dependency))
                .await?;
            output::print_edge(&edge, output_mode)?;
        }
        DepAction::Remove { task, dependency } => {
            app.service()
                .remove_dependency(&TaskId::new(task), &TaskId::new(dependency))
                .await?;

            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "action": "remove",
                    "task": task,
                    "dependency": dependency,
                    "status": "success"
                }))?,
                OutputMode::Text => println!("Removed dependency: {task} -> {dependency}"),
            }
        }
        DepAction::Check { task, dependency } => {
            let task = TaskId::new(task);
            let dependency = TaskId::new(dependency);
            let would_cycle = app
                .service()
                .would_create_cycle(&task, &dependency)
                .await?;
            output::print_cycle_check(&task, &dependency, would_cycle, output_mode)?;
        }
    }
    Ok(())
}

/// Execute the dependents and dependencies commands
pub async fn execute_related(
    app: &App,
    args: &TaskRefArgs,
    direction: Direction,
    output_mode: OutputMode,
) -> Result<()> {
    let id = TaskId::new(&args.task_id);
    let related = match direction {
        Direction::Dependents => app.service().dependents(&id).await?,
        Direction::Dependencies => app.service().dependencies(&id).await?,
    };
    output::print_related(&id, direction, &related, output_mode)?;
    Ok(())
}

/// Execute the hierarchy command
pub async fn execute_hierarchy(
    app: &App,
    args: &TaskRefArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let nodes = app.service().hierarchy(&TaskId::new(&args.task_id)).await?;
    output::print_hierarchy(&nodes, output_mode)?;
    Ok(())
}

/// Execute the can-complete command
pub async fn execute_can_complete(
    app: &App,
    args: &CanCompleteArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let ids: Vec<TaskId> = args.task_ids.iter().map(TaskId::new).collect();
    let decisions = app.service().batch_completion_allowed(&ids).await?;
    output::print_completion(&decisions, output_mode)?;
    Ok(())
}

/// Execute the stats command
pub async fn execute_stats(app: &App, output_mode: OutputMode) -> Result<()> {
    let stats = app.service().stats().await?;
    output::print_stats(&stats, app.service().capability(), output_mode)?;
    Ok(())
}

/// Execute the benchmark command
pub async fn execute_benchmark(
    app: &App,
    args: &BenchmarkArgs,
    output_mode: OutputMode,
) -> Result<()> {
    use crate::commands::benchmark;

    let report = benchmark::run(
        app.store(),
        app.config(),
        &TaskId::new(&args.task_id),
        args.iterations,
    )
    .await?;
    output::print_benchmark(&report, output_mode)?;
    Ok(())
}
