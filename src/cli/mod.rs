//! Command-line interface for glowtasks
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in the `task` and `theme` submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::task::TaskId;

mod task;
mod theme;

/// glowtasks - GlowTopia Tasks
///
/// A local task list with categories, priorities, due dates and a
/// terminal UI. State lives in a single data directory.
#[derive(Parser, Debug)]
#[command(name = "glowtasks")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "GLOWTASKS_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,

        /// Category: personal, work, shopping, health, other
        #[arg(long)]
        category: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Priority: low, medium, high
        #[arg(long)]
        priority: Option<String>,
    },

    /// List tasks in display order
    #[command(visible_alias = "ls")]
    List {
        /// Filter: all, active, completed
        #[arg(long, default_value = "all")]
        filter: String,

        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a single task
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Toggle a task between active and completed
    Toggle {
        /// Task ID
        id: TaskId,
    },

    /// Replace a task's text
    Edit {
        /// Task ID
        id: TaskId,

        /// New text (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Delete a task
    #[command(visible_alias = "delete")]
    Rm {
        /// Task ID
        id: TaskId,
    },

    /// Remove every completed task
    ClearCompleted,

    /// Move a task within the stored order
    Move {
        /// Task ID to move
        id: TaskId,

        /// Place it directly before this task (end of list when omitted)
        #[arg(long)]
        before: Option<TaskId>,
    },

    /// Theme preference
    #[command(subcommand)]
    Theme(ThemeCommands),

    /// Interactive terminal UI
    Tui,
}

/// Theme subcommands
#[derive(Subcommand, Debug)]
pub enum ThemeCommands {
    /// Print the current theme
    Show,

    /// Switch between light and dark
    Toggle,

    /// Set the theme explicitly
    Set {
        /// light or dark
        theme: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let data_dir = self.data_dir;
        let json = self.json;
        let quiet = self.quiet;

        match self.command {
            Commands::Add {
                text,
                category,
                due,
                priority,
            } => task::run_add(task::AddOptions {
                text,
                category,
                due,
                priority,
                data_dir,
                json,
                quiet,
            }),
            Commands::List { filter, search } => task::run_list(task::ListOptions {
                filter,
                search,
                data_dir,
                json,
                quiet,
            }),
            Commands::Show { id } => task::run_show(task::ShowOptions {
                id,
                data_dir,
                json,
                quiet,
            }),
            Commands::Toggle { id } => task::run_toggle(task::ToggleOptions {
                id,
                data_dir,
                json,
                quiet,
            }),
            Commands::Edit { id, text } => task::run_edit(task::EditOptions {
                id,
                text,
                data_dir,
                json,
                quiet,
            }),
            Commands::Rm { id } => task::run_delete(task::DeleteOptions {
                id,
                data_dir,
                json,
                quiet,
            }),
            Commands::ClearCompleted => {
                task::run_clear_completed(task::ClearCompletedOptions {
                    data_dir,
                    json,
                    quiet,
                })
            }
            Commands::Move { id, before } => task::run_move(task::MoveOptions {
                id,
                before,
                data_dir,
                json,
                quiet,
            }),
            Commands::Theme(cmd) => match cmd {
                ThemeCommands::Show => theme::run_show(theme::ThemeOptions {
                    data_dir,
                    json,
                    quiet,
                }),
                ThemeCommands::Toggle => theme::run_toggle(theme::ThemeOptions {
                    data_dir,
                    json,
                    quiet,
                }),
                ThemeCommands::Set { theme: value } => theme::run_set(
                    value,
                    theme::ThemeOptions {
                        data_dir,
                        json,
                        quiet,
                    },
                ),
            },
            Commands::Tui => task::run_tui(task::TuiOptions {
                data_dir,
                json,
                quiet,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delete_alias_parses_as_rm() {
        let cli = Cli::try_parse_from(["glowtasks", "delete", "12"]).expect("parse");
        assert!(matches!(cli.command, Commands::Rm { id: 12 }));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["glowtasks", "list", "--json", "--filter", "active"])
            .expect("parse");
        assert!(cli.json);
        match cli.command {
            Commands::List { filter, search } => {
                assert_eq!(filter, "active");
                assert!(search.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
