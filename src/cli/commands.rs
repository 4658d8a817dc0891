//! Command dispatch: one function per subcommand

use std::path::Path;

use chrono::Local;
use colored::Colorize;
use tracing::{debug, instrument};

use crate::application::services::WorkspaceService;
use crate::application::{AppState, ApplicationResult, Outcome};
use crate::cli::args::{Cli, Commands, ConfigCommands, StoreCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::render::{self, RenderOptions};
use crate::config::{global_config_path, Settings};
use crate::domain::{matches_query, NodeId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::InfraError;

/// Runs one parsed command. `completion` is handled by the binary.
pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `cbm --help`".to_string(),
        ));
    };
    match command {
        Commands::Import { file } => cmd_import(container, file),
        Commands::Export { output } => cmd_export(container, output.as_deref()),
        Commands::Clear => cmd_clear(container),
        Commands::Show {
            query,
            duplicates,
            ids,
            all,
        } => cmd_show(container, query.as_deref().unwrap_or(""), *duplicates, *ids, *all),
        Commands::Duplicates => cmd_duplicates(container),
        Commands::Rename { id, title } => edit(container, |ws, state| {
            ws.rename(state, &NodeId::from(id.as_str()), title)
        }),
        Commands::Delete { id } => edit(container, |ws, state| {
            ws.delete(state, &NodeId::from(id.as_str()))
        }),
        Commands::AddFolder { parent, name } => cmd_add_folder(container, parent, name),
        Commands::Move { id, parent, index } => edit(container, |ws, state| {
            ws.move_node(
                state,
                &NodeId::from(id.as_str()),
                &NodeId::from(parent.as_str()),
                *index,
            )
        }),
        Commands::Collapse { id } => edit(container, |ws, state| {
            ws.set_collapsed(state, &NodeId::from(id.as_str()), true)
        }),
        Commands::Expand { id } => edit(container, |ws, state| {
            ws.set_collapsed(state, &NodeId::from(id.as_str()), false)
        }),
        Commands::Toggle { id } => edit(container, |ws, state| {
            Ok(Outcome::from_changed(
                ws.toggle(state, &NodeId::from(id.as_str()))?.is_some(),
            ))
        }),
        Commands::CollapseAll { id } => edit(container, |ws, state| {
            ws.set_collapse_recursive(state, &NodeId::from(id.as_str()), true)
        }),
        Commands::ExpandAll { id } => edit(container, |ws, state| {
            ws.set_collapse_recursive(state, &NodeId::from(id.as_str()), false)
        }),
        Commands::Breadcrumb { id } => cmd_breadcrumb(container, id),
        Commands::Pick { query } => cmd_pick(container, query.as_deref().unwrap_or("")),
        Commands::Store { command } => match command {
            StoreCommands::Import { file } => cmd_store_import(container, file),
            StoreCommands::Export { output } => cmd_store_export(container, output.as_deref()),
            StoreCommands::Clear => cmd_store_clear(container),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => cmd_config_show(&container.settings),
            ConfigCommands::Path => cmd_config_path(),
            ConfigCommands::Template => {
                output::info(&Settings::template());
                Ok(())
            }
        },
        Commands::Completion { .. } => Err(CliError::Usage(
            "completion is generated by the binary".to_string(),
        )),
    }
}

fn render_options(container: &ServiceContainer) -> RenderOptions {
    RenderOptions {
        truncate: container.settings.truncate,
        show_ids: false,
        ignore_collapsed: false,
    }
}

fn print_board(state: &AppState, opts: &RenderOptions) -> CliResult<()> {
    if !state.is_loaded() {
        output::info(&"0 bookmarks");
        output::detail(&"No workspace loaded. Import a bookmarks file with `cbm import FILE`.");
        return Ok(());
    }
    let board = state.board()?;
    debug!("render: {} visible nodes", board.visibility.visible_count());
    output::info(&render::render_board(&board, opts).trim_end());
    Ok(())
}

fn report(outcome: Outcome, done: &str) {
    match outcome {
        Outcome::Applied => output::success(&done),
        Outcome::Declined => output::warning(&"cancelled, nothing changed"),
        Outcome::Unchanged => output::warning(&"nothing changed"),
    }
}

/// Load, apply one edit, print the outcome and the board.
fn edit(
    container: &ServiceContainer,
    op: impl FnOnce(&WorkspaceService, &mut AppState) -> ApplicationResult<Outcome>,
) -> CliResult<()> {
    let workspace = container.workspace();
    let mut state = workspace.load()?;
    let outcome = op(&workspace, &mut state)?;
    report(outcome, "saved");
    if outcome.is_applied() {
        print_board(&state, &render_options(container))?;
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_import(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let workspace = container.workspace();
    let mut state = workspace.load()?;
    let outcome = workspace.import_file(&mut state, file)?;
    if outcome.is_applied() {
        let count = state.tree()?.count_bookmarks();
        output::action("Imported", &format!("{} bookmarks from {}", count, file.display()));
        print_board(&state, &render_options(container))?;
    } else {
        report(outcome, "");
    }
    Ok(())
}

fn cmd_export(container: &ServiceContainer, out: Option<&Path>) -> CliResult<()> {
    let workspace = container.workspace();
    let state = workspace.load()?;
    let path = workspace.export(&state, out, Local::now().date_naive())?;
    output::action("Exported", &path.display());
    Ok(())
}

fn cmd_clear(container: &ServiceContainer) -> CliResult<()> {
    let workspace = container.workspace();
    let mut state = workspace.load()?;
    report(workspace.clear(&mut state)?, "workspace cleared");
    Ok(())
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, query: &str, duplicates: bool, ids: bool, all: bool) -> CliResult<()> {
    let mut state = container.workspace().load()?;
    state.set_filter(query, duplicates);
    let opts = RenderOptions {
        show_ids: ids,
        ignore_collapsed: all,
        ..render_options(container)
    };
    print_board(&state, &opts)
}

fn cmd_duplicates(container: &ServiceContainer) -> CliResult<()> {
    let state = container.workspace().load()?;
    let board = state.board()?;
    let groups = board.duplicates.groups(board.tree.root());
    if groups.is_empty() {
        output::success(&"no duplicate URLs");
        return Ok(());
    }
    let width = container.settings.truncate;
    for group in groups {
        output::header(&format!("{} ({})", render::truncate(&group.key, width), group.bookmarks.len()));
        for bookmark in group.bookmarks {
            let crumb = bookmark
                .id
                .as_ref()
                .and_then(|id| board.tree.breadcrumb(id))
                .unwrap_or_default();
            let id = bookmark.id.as_ref().map(NodeId::to_string).unwrap_or_default();
            output::detail(&format!(
                "{} {}  {}",
                format!("[{id}]").dimmed(),
                render::truncate(bookmark.display_title(), width),
                render::breadcrumb_line(&crumb).dimmed()
            ));
        }
    }
    Ok(())
}

fn cmd_add_folder(container: &ServiceContainer, parent: &str, name: &str) -> CliResult<()> {
    let workspace = container.workspace();
    let mut state = workspace.load()?;
    match workspace.add_folder(&mut state, &NodeId::from(parent), name)? {
        Some(id) => {
            output::action("Created", &format!("folder {} ({})", name.trim(), id));
            print_board(&state, &render_options(container))
        }
        None => {
            report(Outcome::Unchanged, "");
            Ok(())
        }
    }
}

fn cmd_breadcrumb(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let state = container.workspace().load()?;
    let crumb = state.breadcrumb(&NodeId::from(id))?;
    output::info(&render::breadcrumb_line(&crumb));
    Ok(())
}

/// Fuzzy-pick a bookmark and print its URL.
fn cmd_pick(container: &ServiceContainer, query: &str) -> CliResult<()> {
    let state = container.workspace().load()?;
    let tree = state.tree()?;
    let query = query.trim();
    let width = container.settings.truncate;
    let items: Vec<SelectionItem> = tree
        .iter()
        .filter(|node| !node.is_folder() && matches_query(node, query))
        .filter_map(|node| {
            let url = node.url()?;
            let crumb = node.id().and_then(|id| tree.breadcrumb(id)).unwrap_or_default();
            Some(SelectionItem {
                display: format!(
                    "{}  {}  {}",
                    render::truncate(node.display_title(), width),
                    render::truncate(url, width),
                    render::breadcrumb_line(&crumb)
                ),
                value: url.to_string(),
            })
        })
        .collect();
    if items.is_empty() {
        output::warning(&"no matching bookmarks");
        return Ok(());
    }
    let picked = container
        .selector
        .select_one(&items, "bookmark> ")
        .map_err(InfraError::Selector)?;
    if let Some(item) = picked {
        output::info(&item.value);
    }
    Ok(())
}

fn cmd_store_import(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let sync = container.store_sync()?;
    match sync.import_file(file)? {
        Some(report) => output::action(
            "Imported",
            &format!(
                "{} folders, {} bookmarks into the bookmark store ({} entries replaced)",
                report.folders, report.bookmarks, report.removed
            ),
        ),
        None => report(Outcome::Declined, ""),
    }
    Ok(())
}

fn cmd_store_export(container: &ServiceContainer, out: Option<&Path>) -> CliResult<()> {
    let path = container
        .store_sync()?
        .export(out, Local::now().date_naive())?;
    output::action("Exported", &path.display());
    Ok(())
}

fn cmd_store_clear(container: &ServiceContainer) -> CliResult<()> {
    report(container.store_sync()?.clear()?, "bookmark store cleared");
    Ok(())
}

fn cmd_config_show(settings: &Settings) -> CliResult<()> {
    output::info(&settings.to_toml()?);
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not created)" };
            output::info(&format!("{}{}", path.display(), marker));
            Ok(())
        }
        None => Err(CliError::Usage(
            "no home directory: cannot locate the global config".to_string(),
        )),
    }
}
