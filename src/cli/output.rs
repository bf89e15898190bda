//! Terminal output for the synthmint CLI.
//!
//! Every command reports through a [`Reporter`] bound to one output mode,
//! so `--format json` turns any command into machine-readable output with
//! no per-command branching. Text rendering is built as plain lines first
//! and printed after, which keeps the layout testable; styling goes
//! through the `console` crate and follows its global color setting.

use console::style;
use serde::Serialize;
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Pretty JSON format
    JsonPretty,
    /// Minimal format (values only)
    Minimal,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            "minimal" | "min" => Ok(OutputFormat::Minimal),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Kind of a status line
#[derive(Debug, Clone, Copy)]
enum Status {
    Success,
    Error,
    Warning,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
            Status::Warning => "warning",
            Status::Info => "info",
        }
    }

    fn glyph(self) -> console::StyledObject<&'static str> {
        match self {
            Status::Success => style("✓").green(),
            Status::Error => style("✗").red(),
            Status::Warning => style("⚠").yellow(),
            Status::Info => style("ℹ").blue(),
        }
    }
}

/// Renders command results in the selected output format
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a reporter for the given format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// The format this reporter renders in
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn json_mode(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::JsonPretty)
    }

    fn emit_json<T: Serialize>(&self, value: &T) {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(value),
            _ => serde_json::to_string(value),
        };
        if let Ok(line) = rendered {
            println!("{}", line);
        }
    }

    fn status(&self, status: Status, message: &str) {
        if self.json_mode() {
            self.emit_json(&serde_json::json!({
                "status": status.label(),
                "message": message,
            }));
        } else if matches!(status, Status::Error) {
            eprintln!("{} {}", status.glyph(), message);
        } else {
            println!("{} {}", status.glyph(), message);
        }
    }

    /// Report a completed operation
    pub fn success(&self, message: &str) {
        self.status(Status::Success, message);
    }

    /// Report a failure. Text mode goes to stderr.
    pub fn error(&self, message: &str) {
        self.status(Status::Error, message);
    }

    /// Report a condition that deserves attention
    pub fn warning(&self, message: &str) {
        self.status(Status::Warning, message);
    }

    /// Report neutral information
    pub fn info(&self, message: &str) {
        self.status(Status::Info, message);
    }

    /// Print one labeled value
    pub fn kv(&self, key: &str, value: &str) {
        if self.json_mode() {
            self.emit_json(&serde_json::json!({ key: value }));
        } else if matches!(self.format, OutputFormat::Minimal) {
            println!("{}", value);
        } else {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    /// Print a section heading. Text mode only.
    pub fn section(&self, title: &str) {
        if matches!(self.format, OutputFormat::Text) {
            println!();
            println!("{}", style(title).cyan().bold());
        }
    }

    /// Render any serializable value in the selected format
    pub fn data<T: Serialize>(&self, value: &T) {
        if self.json_mode() {
            self.emit_json(value);
            return;
        }

        if let Ok(tree) = serde_json::to_value(value) {
            if matches!(self.format, OutputFormat::Minimal) {
                for leaf in leaf_values(&tree) {
                    println!("{}", leaf);
                }
            } else {
                for line in tree_lines(&tree, 0) {
                    println!("{}", line);
                }
            }
        }
    }

    /// Print rows under a header
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        if self.json_mode() {
            let objects: Vec<Value> = rows
                .iter()
                .map(|row| {
                    let fields = headers
                        .iter()
                        .zip(row)
                        .map(|(header, cell)| ((*header).to_string(), Value::from(cell.as_str())))
                        .collect();
                    Value::Object(fields)
                })
                .collect();
            self.emit_json(&objects);
        } else if matches!(self.format, OutputFormat::Minimal) {
            for row in rows {
                println!("{}", row.join("\t"));
            }
        } else {
            for line in column_lines(headers, rows) {
                println!("{}", line);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LINE BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Flatten a JSON tree into indented `key: value` lines
fn tree_lines(value: &Value, depth: usize) -> Vec<String> {
    let pad = "  ".repeat(depth);
    let mut lines = Vec::new();

    match value {
        Value::Object(fields) => {
            for (key, child) in fields {
                if child.is_object() || child.is_array() {
                    lines.push(format!("{}{}:", pad, key));
                    lines.extend(tree_lines(child, depth + 1));
                } else {
                    lines.push(format!("{}{}: {}", pad, key, scalar_text(child)));
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    lines.push(format!("{}[{}]:", pad, index));
                    lines.extend(tree_lines(item, depth + 1));
                } else {
                    lines.push(format!("{}[{}]: {}", pad, index, scalar_text(item)));
                }
            }
        }
        scalar => lines.push(format!("{}{}", pad, scalar_text(scalar))),
    }

    lines
}

/// Scalar leaves of a JSON tree, in document order
fn leaf_values(value: &Value) -> Vec<String> {
    match value {
        Value::Object(fields) => fields.values().flat_map(leaf_values).collect(),
        Value::Array(items) => items.iter().flat_map(leaf_values).collect(),
        scalar => vec![scalar_text(scalar)],
    }
}

/// Lay out rows as padded columns under a dashed header rule
fn column_lines(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    if headers.is_empty() {
        return Vec::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
    for row in rows {
        for (column, cell) in row.iter().enumerate().take(widths.len()) {
            widths[column] = widths[column].max(cell.len());
        }
    }

    let render = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(column, cell)| {
                let width = widths.get(column).copied().unwrap_or(cell.len());
                format!("{:<width$}", cell, width = width)
            })
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render(&header_cells));
    lines.push(rule.join("  "));
    for row in rows {
        lines.push(render(row));
    }

    lines
}

/// Bare text for a scalar JSON value. Strings lose their quotes.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "json-pretty".parse::<OutputFormat>().unwrap(),
            OutputFormat::JsonPretty
        );
        assert_eq!("min".parse::<OutputFormat>().unwrap(), OutputFormat::Minimal);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_reporter_keeps_its_format() {
        let reporter = Reporter::new(OutputFormat::JsonPretty);
        assert_eq!(reporter.format(), OutputFormat::JsonPretty);
    }

    #[test]
    fn test_tree_lines_indent_nested_objects() {
        let tree = json!({
            "sequence": 3,
            "token": { "supply": 10, "symbol": "SYNTH" }
        });

        let lines = tree_lines(&tree, 0);
        assert_eq!(
            lines,
            vec!["sequence: 3", "token:", "  supply: 10", "  symbol: SYNTH"]
        );
    }

    #[test]
    fn test_tree_lines_inline_scalar_array_items() {
        let tree = json!({ "holders": ["aa", "bb"] });

        let lines = tree_lines(&tree, 0);
        assert_eq!(lines, vec!["holders:", "  [0]: aa", "  [1]: bb"]);
    }

    #[test]
    fn test_leaf_values_keep_document_order() {
        let tree = json!({
            "a": { "x": 1, "y": "two" },
            "b": [true, null]
        });

        assert_eq!(leaf_values(&tree), vec!["1", "two", "true", "null"]);
    }

    #[test]
    fn test_column_lines_pad_to_widest_cell() {
        let lines = column_lines(
            &["SEQ", "EVENT"],
            &[
                vec!["1".into(), "Deposited".into()],
                vec!["12".into(), "Redeemed".into()],
            ],
        );

        assert_eq!(lines[0], "SEQ  EVENT");
        assert_eq!(lines[1], "---  ---------");
        assert_eq!(lines[2], "1    Deposited");
        assert_eq!(lines[3], "12   Redeemed");
    }

    #[test]
    fn test_column_lines_empty_headers_render_nothing() {
        assert!(column_lines(&[], &[]).is_empty());
    }

    #[test]
    fn test_scalar_text_unquotes_strings() {
        assert_eq!(scalar_text(&json!("abc")), "abc");
        assert_eq!(scalar_text(&json!(42)), "42");
        assert_eq!(scalar_text(&json!(false)), "false");
        assert_eq!(scalar_text(&Value::Null), "null");
    }
}
