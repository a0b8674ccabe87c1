//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use provis_core::{ContentKind, ContentNode, JobStatus};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled for `stream`.
pub fn should_color(mode: &ColorMode, stream: &impl IsTerminal) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stream.is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Paints job status labels when color is on.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: &ColorMode) -> Self {
        Self {
            enabled: should_color(mode, &io::stdout()),
        }
    }

    pub fn status(self, status: JobStatus) -> String {
        let label = status.to_string();
        if !self.enabled {
            return label;
        }
        match status {
            JobStatus::Completed => label.green().to_string(),
            JobStatus::Failed => label.red().bold().to_string(),
            JobStatus::Cancelled => label.dimmed().to_string(),
            JobStatus::Imaging | JobStatus::Configuring => label.cyan().to_string(),
            JobStatus::Created | JobStatus::Waiting => label.yellow().to_string(),
        }
    }

    pub fn flag(self, on: bool) -> String {
        match (on, self.enabled) {
            (true, true) => "yes".green().to_string(),
            (true, false) => "yes".into(),
            (false, _) => "no".into(),
        }
    }
}

// ── Field helpers ────────────────────────────────────────────────────

/// Local-time rendering for table views; `-` when absent.
pub fn fmt_time(ts: Option<&DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

pub fn or_dash(value: Option<&str>) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or("-").to_owned()
}

/// Indented listing of a content tree, directories suffixed with `/`.
pub fn render_tree(root: &ContentNode) -> String {
    root.walk()
        .into_iter()
        .map(|(depth, node)| {
            let indent = "  ".repeat(depth);
            match node.kind {
                ContentKind::Directory => format!("{indent}{}/", node.name),
                ContentKind::File => match node.size {
                    Some(size) => format!("{indent}{}  ({size} B)", node.name),
                    None => format!("{indent}{}", node.name),
                },
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                return "(none)".into();
            }
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single item. Table format uses `detail_fn`, a key/value block.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: String,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: "a".into() }, Item { id: "b".into() }]
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let out = render_list(
            &OutputFormat::Plain,
            &items(),
            |i| Row { id: i.id.clone() },
            |i| i.id.clone(),
        );
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn empty_table_says_none() {
        let out = render_list(
            &OutputFormat::Table,
            &Vec::<Item>::new(),
            |i| Row { id: i.id.clone() },
            |i| i.id.clone(),
        );
        assert_eq!(out, "(none)");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &items(),
            |i| Row { id: i.id.clone() },
            |i| i.id.clone(),
        );
        assert_eq!(out, r#"[{"id":"a"},{"id":"b"}]"#);
    }

    #[test]
    fn tree_indents_by_depth() {
        let tree: ContentNode = serde_json::from_value(serde_json::json!({
            "name": "bundle",
            "type": "directory",
            "children": [
                { "name": "setup.ps1", "type": "file", "size": 42 },
                { "name": "drivers", "type": "directory" }
            ]
        }))
        .unwrap();
        assert_eq!(
            render_tree(&tree),
            "bundle/\n  setup.ps1  (42 B)\n  drivers/"
        );
    }

    #[test]
    fn painter_without_color_is_plain() {
        let painter = Painter::new(&ColorMode::Never);
        assert_eq!(painter.status(JobStatus::Failed), "FAILED");
        assert_eq!(painter.flag(true), "yes");
    }
}
