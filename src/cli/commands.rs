//! Command dispatch: one function per subcommand.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{FormMode, Mutation, TreeService};
use crate::application::{ApplicationError, LoadOutcome};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{parse_child_count, DomainError, NodeDraft, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command line with settings from config file and environment.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    // Completion needs neither settings nor storage
    let settings = match command_of(cli)? {
        Commands::Completion { .. } => Settings::default(),
        _ => Settings::load()?,
    };
    execute_with_settings(cli, settings)
}

/// Execute the parsed command line with already loaded settings.
///
/// `--data-dir` still overrides `settings.data_dir`.
pub fn execute_with_settings(cli: &Cli, mut settings: Settings) -> CliResult<()> {
    let command = command_of(cli)?;

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    debug!("settings: {:?}", settings);

    if let Commands::Config { command } = command {
        return cmd_config(command, &settings);
    }

    let container = ServiceContainer::new(settings);
    let (mut service, outcome) = container.tree_service()?;
    report_load(&outcome);

    match command {
        Commands::Add {
            parent,
            title,
            question,
            children,
        } => {
            let parent = parent.as_ref().map(|id| resolve_id(&service, id));
            cmd_add(&mut service, parent.as_ref(), title, question, children)
        }
        Commands::Edit {
            id,
            title,
            question,
            children,
        } => {
            let id = resolve_id(&service, id);
            cmd_edit(
                &mut service,
                &id,
                title.as_deref(),
                question.as_deref(),
                children.as_deref(),
            )
        }
        Commands::Resize { id, count } => {
            let id = resolve_id(&service, id);
            cmd_resize(&mut service, &id, count)
        }
        Commands::Delete { id, recursive } => {
            let id = resolve_id(&service, id);
            cmd_delete(&mut service, &id, *recursive)
        }
        Commands::Show => {
            output::info(service.render().trim_end());
            Ok(())
        }
        Commands::Layout { compact } => cmd_layout(&service, *compact),
        Commands::Export { output: target } => cmd_export(&container, target.as_deref()),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn command_of(cli: &Cli) -> CliResult<&Commands> {
    cli.command
        .as_ref()
        .ok_or_else(|| CliError::Usage("no command given, run with --help for usage".into()))
}

/// Stored id the user meant: the parsed id if present, else its other reading (`7` or `"7"`).
fn resolve_id(service: &TreeService, id: &NodeId) -> NodeId {
    if service.find(id).is_some() {
        return id.clone();
    }
    id.alternate()
        .filter(|alt| service.find(alt).is_some())
        .unwrap_or_else(|| id.clone())
}

fn report_load(outcome: &LoadOutcome) {
    if let LoadOutcome::Recovered { .. } = outcome {
        output::warning(outcome);
    }
}

fn report_mutation(mutation: Mutation, done: &str, id: &NodeId) {
    match mutation {
        Mutation::Changed => output::action(done, id),
        Mutation::Unchanged => output::warning(&format!("no node with id {id}, nothing changed")),
    }
}

#[instrument(skip(service))]
fn cmd_add(
    service: &mut TreeService,
    parent: Option<&NodeId>,
    title: &str,
    question: &str,
    children: &str,
) -> CliResult<()> {
    let draft = NodeDraft::from_form(title, question, children);
    let mode = FormMode::Create {
        parent: parent.cloned(),
    };
    let before = service.forest().len();
    let mutation = service.submit(&mode, &draft)?;

    match (mutation, parent) {
        (Mutation::Unchanged, Some(parent)) => {
            output::warning(&format!("no node with id {parent}, nothing added"));
        }
        _ => {
            let added = service.forest().len() - before;
            output::success(&format!(
                "added '{}' ({} node{})",
                draft.title,
                added,
                if added == 1 { "" } else { "s" }
            ));
        }
    }
    Ok(())
}

#[instrument(skip(service))]
fn cmd_edit(
    service: &mut TreeService,
    id: &NodeId,
    title: Option<&str>,
    question: Option<&str>,
    children: Option<&str>,
) -> CliResult<()> {
    if title.is_none() && question.is_none() && children.is_none() {
        return Err(CliError::InvalidArgs(
            "edit needs at least one of --title, --question, --children".into(),
        ));
    }
    // Unspecified fields keep the node's current values, like a pre-filled form
    let current = service
        .find(id)
        .ok_or_else(|| DomainError::NodeNotFound(id.clone()))?;
    let draft = NodeDraft {
        title: title.map_or_else(|| current.title.clone(), str::to_string),
        question: question.map_or_else(|| current.question.clone(), str::to_string),
        child_count: children.map_or(current.children.len(), parse_child_count),
    };

    let mutation = service.submit(&FormMode::Edit { id: id.clone() }, &draft)?;
    report_mutation(mutation, "Updated", id);
    Ok(())
}

#[instrument(skip(service))]
fn cmd_resize(service: &mut TreeService, id: &NodeId, count: &str) -> CliResult<()> {
    let mutation = service.resize_children(id, parse_child_count(count))?;
    report_mutation(mutation, "Resized", id);
    Ok(())
}

#[instrument(skip(service))]
fn cmd_delete(service: &mut TreeService, id: &NodeId, recursive: bool) -> CliResult<()> {
    let mutation = if recursive {
        service.delete_node(id)?
    } else {
        service.delete_leaf(id)?
    };
    report_mutation(mutation, "Deleted", id);
    Ok(())
}

fn cmd_layout(service: &TreeService, compact: bool) -> CliResult<()> {
    let flow = service.layout();
    let json = if compact {
        serde_json::to_string(&flow)
    } else {
        serde_json::to_string_pretty(&flow)
    }
    .map_err(|e| ApplicationError::OperationFailed {
        context: "serialize layout".into(),
        source: Box::new(e),
    })?;
    output::info(&json);
    Ok(())
}

fn cmd_export(container: &ServiceContainer, target: Option<&Path>) -> CliResult<()> {
    let json = container
        .repository()
        .export()?
        .unwrap_or_else(|| "[]".to_string());
    match target {
        Some(path) => {
            container
                .fs
                .write_atomic(path, &json)
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Exported", &path.display());
        }
        None => output::info(&json),
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(settings.to_toml()?.trim_end()),
        ConfigCommands::Template => output::info(Settings::template().trim_end()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("config", &path.display()),
                None => output::warning("no config directory for this platform"),
            }
            output::action("data", &settings.forest_path().display());
        }
    }
    Ok(())
}
