//! glowtasks - a local to-do list with a terminal viewer
//!
//! The library holds the task model and everything built around it so the
//! CLI and the TUI share one reducer and one persistence path.
//!
//! # Core Concepts
//!
//! - **Tasks**: text, category, priority, optional due date, completion flag
//! - **Actions**: every mutation is an `Action` reduced into a new task list
//! - **Views**: filter, search and priority/due ordering derived on demand
//! - **Theme**: light or dark palette, persisted next to the tasks
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `task`: Task model and the action reducer
//! - `view`: Filtering, searching, ordering and counts
//! - `storage`: Key-value persistence and data directory resolution
//! - `store`: Task store tying the reducer to persistence
//! - `theme`: Theme preference and color palettes
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output envelopes
//! - `ui`: Interactive terminal viewer

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod storage;
pub mod store;
pub mod task;
pub mod theme;
pub mod ui;
pub mod view;

pub use error::{Error, Result};
