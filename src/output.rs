//! Shared output formatting for glowtasks CLI commands.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "glowtasks.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: JsonError,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: JsonError::from(err),
            next_steps: next_steps.clone(),
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// Best-effort command name for error envelopes when clap parsing never ran.
pub fn infer_command_name<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut positionals: Vec<String> = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--data-dir" {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        positionals.push(arg);
        if positionals.len() == 2 || positionals[0] != "theme" {
            break;
        }
    }

    match positionals.as_slice() {
        [] => "glowtasks".to_string(),
        [command] => command.clone(),
        [command, sub, ..] => format!("{command} {sub}"),
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::EmptyText => vec!["glowtasks add \"<what needs doing>\"".to_string()],
        Error::TaskNotFound(_) => vec!["glowtasks list".to_string()],
        Error::InvalidConfig(_) => {
            vec!["fix config.toml in the data directory then retry".to_string()]
        }
        Error::LockFailed(_) => vec!["close other glowtasks sessions then retry".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn format_human_renders_sections() {
        let mut output = HumanOutput::new("Task added");
        output.push_summary("id", "42");
        output.push_summary("text", "Buy milk");
        output.push_warning("stored data was unreadable");
        output.push_next_step("glowtasks list");

        let rendered = format_human(&output);
        assert!(rendered.starts_with("Task added"));
        assert!(rendered.contains("Summary:\n- id: 42\n- text: Buy milk"));
        assert!(rendered.contains("Warnings:\n- stored data was unreadable"));
        assert!(rendered.contains("Next steps:\n- glowtasks list"));
        assert!(!rendered.contains("Details:"));
    }

    #[test]
    fn infer_command_skips_global_flags() {
        assert_eq!(
            infer_command_name(args(&["--data-dir", "/tmp/x", "--json", "add", "milk"])),
            "add"
        );
        assert_eq!(infer_command_name(args(&["theme", "set", "dark"])), "theme set");
        assert_eq!(infer_command_name(args(&["-q"])), "glowtasks");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(Error::EmptyText.kind(), "user_error");
        assert_eq!(
            Error::OperationFailed("disk".to_string()).kind(),
            "operation_failed"
        );
        assert_eq!(error_next_steps(&Error::TaskNotFound(7)), vec!["glowtasks list"]);
    }
}
