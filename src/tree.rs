//! File tree model: backend listing entries, the typed tree built from them, and the flat row
//! projection the sidebar renders.
//!
//! Nothing here touches the DOM. The view rebuilds every row from [`TreeView::rows`] whenever the
//! tree or the open file changes; rows are never patched in place.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::storage::StorageError;

/// One record from the backend's recursive listing call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ListingEntry {
    File {
        name: String,
        path: String,
    },
    Directory {
        name: String,
        path: String,
        #[serde(default)]
        children: Vec<ListingEntry>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeNode {
    File {
        path: String,
        display_name: String,
    },
    Folder {
        path: String,
        display_name: String,
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Folder { path, .. } => path,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::File { display_name, .. } | Self::Folder { display_name, .. } => display_name,
        }
    }

    /// Folders are never active; a file is active when its full stored path is the open one.
    pub fn is_active(&self, current_path: Option<&str>) -> bool {
        match self {
            Self::File { path, .. } => current_path == Some(path.as_str()),
            Self::Folder { .. } => false,
        }
    }
}

/// Strips a single trailing `.md` from a file name for display.
pub fn display_name(name: &str) -> String {
    static RE_MD_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let re = RE_MD_SUFFIX.get_or_init(|| Regex::new(r"\.md$").expect("valid suffix regex"));
    re.replace(name, "").into_owned()
}

/// Builds the typed tree, preserving backend order at every level.
pub fn build_tree(listing: &[ListingEntry]) -> Vec<TreeNode> {
    listing
        .iter()
        .map(|entry| match entry {
            ListingEntry::File { name, path } => TreeNode::File {
                path: path.clone(),
                display_name: display_name(name),
            },
            ListingEntry::Directory {
                name,
                path,
                children,
            } => TreeNode::Folder {
                path: path.clone(),
                display_name: name.clone(),
                children: build_tree(children),
            },
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    File,
    Folder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    NewFile,
    NewFolder,
    DeleteFolder,
    DeleteFile,
}

impl RowAction {
    pub fn title(self) -> &'static str {
        match self {
            Self::NewFile => "New File",
            Self::NewFolder => "New Folder",
            Self::DeleteFolder => "Delete Folder",
            Self::DeleteFile => "Delete File",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::NewFile => "fa-plus",
            Self::NewFolder => "fa-folder-plus",
            Self::DeleteFolder | Self::DeleteFile => "fa-trash",
        }
    }
}

const FOLDER_ACTIONS: [RowAction; 3] = [
    RowAction::NewFile,
    RowAction::NewFolder,
    RowAction::DeleteFolder,
];
const FILE_ACTIONS: [RowAction; 1] = [RowAction::DeleteFile];

/// Actions offered by the row above the tree; they target the storage root (`""`).
pub const ROOT_ACTIONS: [RowAction; 2] = [RowAction::NewFile, RowAction::NewFolder];

impl RowKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::File => "fa-file-alt",
            Self::Folder => "fa-folder",
        }
    }

    pub fn actions(self) -> &'static [RowAction] {
        match self {
            Self::File => &FILE_ACTIONS,
            Self::Folder => &FOLDER_ACTIONS,
        }
    }
}

/// One rendered line of the sidebar tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeRow {
    pub kind: RowKind,
    pub path: String,
    pub label: String,
    pub depth: usize,
    pub active: bool,
}

impl TreeRow {
    /// Path to open on a primary click; folders are not openable.
    pub fn open_target(&self) -> Option<&str> {
        match self.kind {
            RowKind::File => Some(&self.path),
            RowKind::Folder => None,
        }
    }
}

/// Projects one node and its descendants into rows, children one level deeper than the folder.
pub fn render(node: &TreeNode, current_path: Option<&str>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(node, current_path, 0, &mut rows);
    rows
}

pub fn render_tree(nodes: &[TreeNode], current_path: Option<&str>) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    for node in nodes {
        push_rows(node, current_path, 0, &mut rows);
    }
    rows
}

fn push_rows(node: &TreeNode, current_path: Option<&str>, depth: usize, out: &mut Vec<TreeRow>) {
    match node {
        TreeNode::File { path, display_name } => out.push(TreeRow {
            kind: RowKind::File,
            path: path.clone(),
            label: display_name.clone(),
            depth,
            active: node.is_active(current_path),
        }),
        TreeNode::Folder {
            path,
            display_name,
            children,
        } => {
            out.push(TreeRow {
                kind: RowKind::Folder,
                path: path.clone(),
                label: display_name.clone(),
                depth,
                active: false,
            });
            for child in children {
                push_rows(child, current_path, depth + 1, out);
            }
        }
    }
}

/// Handle for one in-flight listing fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReloadTicket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied,
    /// A newer reload was issued after this one; its response was dropped.
    Stale,
    Failed,
}

/// The sidebar tree plus the generation counter guarding overlapping reloads.
///
/// Responses are accepted only for the most recently issued ticket, whatever order they arrive in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeView {
    issued: u64,
    nodes: Vec<TreeNode>,
}

impl TreeView {
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.issued += 1;
        ReloadTicket(self.issued)
    }

    pub fn finish_reload(
        &mut self,
        ticket: ReloadTicket,
        result: Result<Vec<ListingEntry>, StorageError>,
    ) -> ReloadOutcome {
        if ticket.0 < self.issued {
            return ReloadOutcome::Stale;
        }
        match result {
            Ok(listing) => {
                self.nodes = build_tree(&listing);
                ReloadOutcome::Applied
            }
            Err(err) => {
                leptos::logging::error!("Error loading files: {err}");
                ReloadOutcome::Failed
            }
        }
    }

    pub fn rows(&self, current_path: Option<&str>) -> Vec<TreeRow> {
        render_tree(&self.nodes, current_path)
    }
}
