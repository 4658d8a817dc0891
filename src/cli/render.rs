//! Terminal rendering of the bookmark board
//!
//! One tree per top-level folder ("column"). Rows are drawn only when the
//! visibility map says so; collapsed folders hide their children.

use colored::Colorize;
use termtree::Tree;

use crate::application::BoardView;
use crate::domain::{count_bookmarks, Node};

/// Separator between breadcrumb segments.
pub const CRUMB_SEPARATOR: &str = " › ";

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub truncate: usize,
    pub show_ids: bool,
    /// Draw children of collapsed folders too.
    pub ignore_collapsed: bool,
}

/// Cuts `value` to `length` characters, the last one being `…`.
pub fn truncate(value: &str, length: usize) -> String {
    if value.chars().count() <= length {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(length.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn breadcrumb_line(crumb: &[String]) -> String {
    crumb.join(CRUMB_SEPARATOR)
}

/// Header line: totals and the duplicates toggle label.
pub fn summary_line(board: &BoardView<'_>) -> String {
    format!(
        "{} bookmarks · {}",
        board.total_bookmarks,
        board.duplicates_label()
    )
}

pub fn render_board(board: &BoardView<'_>, opts: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(&summary_line(board));
    out.push('\n');
    for column in board.tree.root().children().iter().filter(|n| n.is_folder()) {
        out.push('\n');
        let mut tree = Tree::new(column_label(column, opts));
        push_children(&mut tree, column, 0, board, opts);
        out.push_str(&tree.to_string());
    }
    out
}

fn push_children(tree: &mut Tree<String>, parent: &Node, depth: usize, board: &BoardView<'_>, opts: &RenderOptions) {
    for child in parent.children() {
        if !board.visibility.is_rendered(child) {
            continue;
        }
        let mut leaf = Tree::new(row_label(child, depth, board, opts));
        if let Node::Folder(folder) = child {
            if opts.ignore_collapsed || !folder.collapsed {
                push_children(&mut leaf, child, depth + 1, board, opts);
            }
        }
        tree.push(leaf);
    }
}

fn id_prefix(node: &Node, opts: &RenderOptions) -> String {
    match node.id() {
        Some(id) if opts.show_ids => format!("{} ", format!("[{id}]").dimmed()),
        _ => String::new(),
    }
}

fn column_label(column: &Node, opts: &RenderOptions) -> String {
    format!(
        "{}{} ({})",
        id_prefix(column, opts),
        truncate(column.display_title(), opts.truncate).cyan().bold(),
        count_bookmarks(column)
    )
}

fn row_label(node: &Node, depth: usize, board: &BoardView<'_>, opts: &RenderOptions) -> String {
    let level = format!("L{}", depth + 1).dimmed();
    let label = match node {
        Node::Bookmark(bookmark) => {
            let duplicate = if board.duplicates.contains_url(&bookmark.url) {
                format!(" {}", "[dup]".red())
            } else {
                String::new()
            };
            format!(
                "{} {}{}  {}{}",
                level,
                id_prefix(node, opts),
                truncate(bookmark.display_title(), opts.truncate),
                truncate(&bookmark.url, opts.truncate).dimmed(),
                duplicate
            )
        }
        Node::Folder(folder) => {
            let marker = if folder.collapsed { " [+]" } else { "" };
            format!(
                "{} {}{} ({}){}",
                level,
                id_prefix(node, opts),
                truncate(folder.display_title(), opts.truncate).bold(),
                count_bookmarks(node),
                marker
            )
        }
    };
    if node.just_moved() {
        format!("{} {}", label, "← moved".yellow().bold())
    } else {
        label
    }
}
