//! Command-line interface over a JSON-serialized tree file.
//!
//! Each invocation loads the tree file, applies one operation atomically,
//! writes the file back, and prints a result. The open-file selection is
//! stored alongside the tree and reconciled on every delete.

use crate::config::{default_tree_path, CanopyConfig};
use crate::error::CliError;
use crate::selection::SelectionController;
use crate::sync::snapshot;
use crate::tree::ops::ProjectTree;
use crate::tree::store::NodeStore;
use crate::types::{NodeId, NodeKind};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Canopy CLI - in-memory virtual filesystem engine
#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Project file tree management")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Tree file path (default: config, then platform data directory)
    #[arg(long)]
    pub tree_file: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new tree file with an empty root folder
    Init {
        /// Root folder name
        #[arg(default_value = "project")]
        name: String,
        /// Overwrite an existing tree file
        #[arg(long)]
        force: bool,
    },
    /// Create a folder under a parent
    Mkdir { parent: NodeId, name: String },
    /// Create an empty file under a parent
    Touch { parent: NodeId, name: String },
    /// Rename a node
    Rename { id: NodeId, name: String },
    /// Delete a node and its whole subtree
    Rm { id: NodeId },
    /// Move a node under a new parent folder
    Mv { id: NodeId, parent: NodeId },
    /// Write file content from a path, or stdin when omitted
    Write {
        id: NodeId,
        /// Content source file
        #[arg(long)]
        from: Option<PathBuf>,
        /// MIME type to record with the content
        #[arg(long)]
        mime: Option<String>,
    },
    /// Print file content
    Cat { id: NodeId },
    /// Open a file (set the selection)
    Open { id: NodeId },
    /// Close the open file
    Close,
    /// Search node names for a substring
    Search { query: String },
    /// Print the tree
    Tree,
    /// Verify structural invariants and report node count
    Check,
    /// Dump the metadata records for every node
    Export,
}

/// On-disk document: the node arena plus the persisted selection.
#[derive(Serialize, Deserialize)]
struct TreeDocument {
    store: NodeStore,
    #[serde(default)]
    open_id: Option<NodeId>,
}

/// Workspace-scoped execution context for CLI commands.
pub struct CliContext {
    tree_path: PathBuf,
    config: CanopyConfig,
}

impl CliContext {
    pub fn new(
        tree_file: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config = CanopyConfig::load(config_path.as_deref())?;
        let tree_path = match tree_file.or_else(|| config.tree_file.clone()) {
            Some(path) => path,
            None => default_tree_path()?,
        };
        Ok(CliContext { tree_path, config })
    }

    pub fn config(&self) -> &CanopyConfig {
        &self.config
    }

    pub fn tree_path(&self) -> &PathBuf {
        &self.tree_path
    }

    /// Execute one command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        if let Commands::Init { name, force } = command {
            return self.init(name, *force);
        }

        let (mut tree, mut selection) = self.load()?;
        let output = match command {
            Commands::Init { .. } => unreachable!("handled above"),
            Commands::Mkdir { parent, name } => {
                let id = tree.create(*parent, name, NodeKind::Folder)?;
                self.save(&tree, &selection)?;
                id.to_string()
            }
            Commands::Touch { parent, name } => {
                let id = tree.create(*parent, name, NodeKind::File)?;
                self.save(&tree, &selection)?;
                id.to_string()
            }
            Commands::Rename { id, name } => {
                tree.rename(*id, name)?;
                self.save(&tree, &selection)?;
                format!("renamed {id}")
            }
            Commands::Rm { id } => {
                let had_selection = selection.open_id();
                let removed = tree.delete(*id)?;
                selection.on_delete(&removed);
                self.save(&tree, &selection)?;
                let mut out = String::new();
                for removed_id in &removed {
                    writeln!(out, "removed {removed_id}").unwrap();
                }
                if had_selection.is_some() && selection.open_id().is_none() {
                    out.push_str("selection cleared\n");
                }
                out.trim_end().to_string()
            }
            Commands::Mv { id, parent } => {
                tree.move_node(*id, *parent)?;
                self.save(&tree, &selection)?;
                format!("moved {id} under {parent}")
            }
            Commands::Write { id, from, mime } => {
                let content = match from {
                    Some(path) => std::fs::read(path)?,
                    None => {
                        let mut buffer = Vec::new();
                        std::io::stdin().read_to_end(&mut buffer)?;
                        buffer
                    }
                };
                let written = content.len();
                match mime {
                    Some(mime) => tree.update_content_with_mime(*id, content, mime.clone())?,
                    None => tree.update_content(*id, content)?,
                }
                self.save(&tree, &selection)?;
                format!("wrote {written} bytes to {id}")
            }
            Commands::Cat { id } => {
                let node = tree.store().get(*id)?;
                let content = node
                    .content()
                    .ok_or(crate::error::TreeError::NotAFile(*id))?;
                String::from_utf8_lossy(content).to_string()
            }
            Commands::Open { id } => {
                selection.select(tree.store(), *id)?;
                self.save(&tree, &selection)?;
                format!("opened {id}")
            }
            Commands::Close => {
                selection.clear();
                self.save(&tree, &selection)?;
                "closed".to_string()
            }
            Commands::Search { query } => {
                let mut out = String::new();
                for node in tree.search(query) {
                    writeln!(out, "{}\t{}", node.id, node.name).unwrap();
                }
                if out.is_empty() {
                    "no matches".to_string()
                } else {
                    out.trim_end().to_string()
                }
            }
            Commands::Tree => render_tree(&tree, selection.open_id()),
            Commands::Check => {
                tree.store().verify()?;
                format!("ok: {} nodes", tree.store().len())
            }
            Commands::Export => {
                serde_json::to_string_pretty(&snapshot(tree.store()))?
            }
        };
        Ok(output)
    }

    fn init(&self, root_name: &str, force: bool) -> Result<String, CliError> {
        if self.tree_path.exists() && !force {
            return Err(CliError::TreeExists(self.tree_path.clone()));
        }
        let tree = ProjectTree::with_config(root_name, self.config.tree.clone());
        let selection = SelectionController::new();
        self.save(&tree, &selection)?;
        info!(path = %self.tree_path.display(), "initialized tree file");
        Ok(format!("initialized {} (root {})", self.tree_path.display(), tree.root_id()))
    }

    fn load(&self) -> Result<(ProjectTree, SelectionController), CliError> {
        if !self.tree_path.exists() {
            return Err(CliError::MissingTree(self.tree_path.clone()));
        }
        let raw = std::fs::read(&self.tree_path)?;
        let document: TreeDocument = serde_json::from_slice(&raw)?;
        let selection = SelectionController::restore(&document.store, document.open_id);
        let tree = ProjectTree::from_store(document.store, self.config.tree.clone());
        Ok((tree, selection))
    }

    fn save(&self, tree: &ProjectTree, selection: &SelectionController) -> Result<(), CliError> {
        if let Some(parent) = self.tree_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let document = TreeDocument {
            store: tree.store().clone(),
            open_id: selection.open_id(),
        };
        let raw = serde_json::to_vec_pretty(&document)?;
        std::fs::write(&self.tree_path, raw)?;
        Ok(())
    }
}

/// Indented tree listing, iterative over an explicit (id, depth) stack.
fn render_tree(tree: &ProjectTree, open_id: Option<NodeId>) -> String {
    let mut out = String::new();
    let mut stack = vec![(tree.root_id(), 0usize)];
    while let Some((id, depth)) = stack.pop() {
        let Ok(node) = tree.store().get(id) else {
            continue;
        };
        let marker = match (node.is_folder(), open_id == Some(id)) {
            (true, _) => "/",
            (false, true) => " *",
            (false, false) => "",
        };
        writeln!(
            out,
            "{}{}{}  [{}]",
            "  ".repeat(depth),
            node.name,
            marker,
            id
        )
        .unwrap();
        if let Some(children) = node.children() {
            for child in children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }
    out.trim_end().to_string()
}
