//! glowtasks theme command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{resolve_data_dir, FileStore};
use crate::store::TaskStore;
use crate::theme::Theme;

pub struct ThemeOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct ThemeOutput {
    theme: Theme,
}

fn open_store(data_dir: Option<PathBuf>) -> Result<(TaskStore<FileStore>, Vec<String>)> {
    let dir = resolve_data_dir(data_dir.as_deref());
    let mut store = TaskStore::open(FileStore::new(dir))?;
    let warnings = store.take_load_warning().into_iter().collect();
    Ok((store, warnings))
}

pub fn run_show(options: ThemeOptions) -> Result<()> {
    let (store, warnings) = open_store(options.data_dir.clone())?;
    emit_theme(store.theme(), "Theme", "theme show", &warnings, &options)
}

pub fn run_toggle(options: ThemeOptions) -> Result<()> {
    let (mut store, warnings) = open_store(options.data_dir.clone())?;
    let theme = store.toggle_theme()?;
    emit_theme(theme, "Theme switched", "theme toggle", &warnings, &options)
}

pub fn run_set(value: String, options: ThemeOptions) -> Result<()> {
    let theme: Theme = value.parse()?;
    let (mut store, warnings) = open_store(options.data_dir.clone())?;
    store.set_theme(theme)?;
    emit_theme(theme, "Theme set", "theme set", &warnings, &options)
}

fn emit_theme(
    theme: Theme,
    header: &str,
    command: &str,
    warnings: &[String],
    options: &ThemeOptions,
) -> Result<()> {
    let mut human = HumanOutput::new(header);
    for warning in warnings {
        human.push_warning(warning.clone());
    }
    human.push_summary("Theme", theme.as_str());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        command,
        &ThemeOutput { theme },
        Some(&human),
    )
}
