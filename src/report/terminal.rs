use std::borrow::Cow;
use std::path::{Path, PathBuf};

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, Table};
use owo_colors::OwoColorize;

use crate::report::diagnostic::{MergeTotals, MergedDiagnostic, MergedFileRecord, Severity};

/// Width source-context lines are padded to
const CONTEXT_WIDTH: usize = 80;

/// Settings for the stylish renderer
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Print the lines around each diagnostic
    pub show_source: bool,
    /// Emit ANSI colors
    pub color: bool,
    /// Source paths under this directory are shown relative to it
    pub cwd: Option<PathBuf>,
}

/// Conditional styling so the same code path renders plain text
struct Paint {
    color: bool,
}

impl Paint {
    fn underline(&self, s: &str) -> String {
        if self.color {
            s.underline().to_string()
        } else {
            s.to_string()
        }
    }

    fn dim(&self, s: &str) -> String {
        if self.color {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }

    fn context(&self, s: &str) -> String {
        if self.color {
            s.dimmed().on_bright_black().to_string()
        } else {
            s.to_string()
        }
    }

    fn summary(&self, s: &str, has_errors: bool) -> String {
        match (self.color, has_errors) {
            (false, _) => s.to_string(),
            (true, true) => s.red().bold().to_string(),
            (true, false) => s.yellow().bold().to_string(),
        }
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// Single-line message without its trailing period
fn message_text(message: &str) -> String {
    let flat = message.replace(['\r', '\n'], " ");
    match flat.strip_suffix('.') {
        Some(rest) if rest.ends_with(|c: char| c != ' ') => rest.to_string(),
        _ => flat,
    }
}

fn is_error(m: &MergedDiagnostic) -> bool {
    m.diagnostic.is_fatal() || m.diagnostic.severity == Severity::Error
}

fn file_table(file: &MergedFileRecord, color: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    if color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }

    for m in &file.messages {
        let d = &m.diagnostic;
        let (kind, kind_color) = if is_error(m) {
            ("error", Color::Red)
        } else {
            ("warning", Color::Yellow)
        };

        let mut occurrence = Cell::new(format!("{}x", m.occurrence));
        let mut kind = Cell::new(kind).fg(kind_color);
        let mut text = Cell::new(message_text(&d.message));

        // dim messages that are below the threshold
        if m.below_threshold {
            occurrence = occurrence.add_attribute(Attribute::Dim);
            kind = kind.add_attribute(Attribute::Dim);
            text = text.add_attribute(Attribute::Dim);
        }

        table.add_row(vec![
            Cell::new(format!("{}:{}", d.line.unwrap_or(0), d.column.unwrap_or(0)))
                .add_attribute(Attribute::Dim),
            occurrence,
            kind,
            text,
            Cell::new(d.rule_id.as_deref().unwrap_or("")).add_attribute(Attribute::Dim),
        ]);
    }

    if let Some(position) = table.column_mut(0) {
        position.set_cell_alignment(CellAlignment::Right);
    }

    table
}

fn display_path<'a>(path: &'a str, cwd: Option<&Path>) -> Cow<'a, str> {
    cwd.and_then(|cwd| Path::new(path).strip_prefix(cwd).ok())
        .map(|rel| Cow::Owned(rel.to_string_lossy().into_owned()))
        .unwrap_or(Cow::Borrowed(path))
}

/// The originating path and up to three lines around the diagnostic
fn source_context(m: &MergedDiagnostic, options: &RenderOptions, paint: &Paint) -> Option<String> {
    let source = m.file_source.as_deref()?;
    let line = m.diagnostic.line.filter(|&l| l > 0)? as usize;

    let lines: Vec<&str> = source.lines().collect();
    let start = line.saturating_sub(2);
    let end = (line + 1).min(lines.len());
    if start >= end {
        return None;
    }

    let mut out = paint.dim(&display_path(&m.source_file, options.cwd.as_deref()));
    out.push('\n');

    let block: Vec<String> = lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let l = format!("{}: {}", start + i + 1, text);
            let pad = CONTEXT_WIDTH.saturating_sub(l.chars().count());
            format!("{}{}", l, " ".repeat(pad))
        })
        .collect();
    out.push_str(&paint.context(&block.join("\n")));
    out.push_str("\n\n");

    Some(out)
}

/// Render merged files as the stylish report.
///
/// Returns an empty string when there are no problems.
pub fn render(files: &[MergedFileRecord], options: &RenderOptions) -> String {
    let paint = Paint { color: options.color };
    let totals = MergeTotals::from_records(files);
    let mut has_errors = false;
    let mut output = String::from("\n");

    for file in files {
        if file.messages.is_empty() {
            continue;
        }
        has_errors |= file.messages.iter().any(is_error);

        output.push_str(&format!(
            "{} ({}x)\n",
            paint.underline(&file.file_path),
            file.occurrence
        ));

        let table = file_table(file, options.color);
        if !options.show_source {
            output.push_str(&table.to_string());
            output.push_str("\n\n");
        } else {
            for (row, m) in table.lines().zip(&file.messages) {
                output.push_str(&row);
                output.push('\n');
                if let Some(context) = source_context(m, options, &paint) {
                    output.push_str(&context);
                }
            }
            output.push('\n');
        }
    }

    let total = totals.problems();
    if total == 0 {
        return String::new();
    }

    output.push_str(&paint.summary(
        &format!(
            "\u{2716} {} {} ({} {}, {} {})",
            total,
            pluralize("problem", total),
            totals.errors,
            pluralize("error", totals.errors),
            totals.warnings,
            pluralize("warning", totals.warnings)
        ),
        has_errors,
    ));
    output.push('\n');

    if totals.fixable_errors > 0 || totals.fixable_warnings > 0 {
        output.push_str(&paint.summary(
            &format!(
                "  {} {} and {} {} potentially fixable with the `--fix` option.",
                totals.fixable_errors,
                pluralize("error", totals.fixable_errors),
                totals.fixable_warnings,
                pluralize("warning", totals.fixable_warnings)
            ),
            has_errors,
        ));
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::{parse_results, InputSource};
    use crate::report::identity::IdentityPolicy;
    use crate::report::merger::{merge_results, MergeConfig};

    const RUNS: &str = r#"
[{"filePath":"/repo/first/index.js","source":"function foo () {\n  return x\n}\n","messages":[
  {"ruleId":"no-undef","severity":2,"message":"'x' is not defined.","line":2,"column":10},
  {"ruleId":"semi","severity":1,"message":"Missing semicolon.","line":2,"column":11,"fix":{"range":[1,1],"text":";"}}
]}]
[{"filePath":"/repo/index.js","source":"function foo () {\n  return x\n}\n","messages":[
  {"ruleId":"no-undef","severity":2,"message":"'x' is not defined.","line":2,"column":10}
]}]"#;

    fn merged(threshold: f64, hide: bool) -> Vec<MergedFileRecord> {
        let raw = parse_results(RUNS, &InputSource::Stdin).unwrap();
        let config = MergeConfig {
            identity: IdentityPolicy::Basename,
            threshold,
            hide_below_threshold: hide,
        };
        merge_results(&raw, &config).unwrap()
    }

    fn plain() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn test_stylish_table_and_summary() {
        let out = render(&merged(0.0, false), &plain());
        assert!(out.contains("index.js (2x)"));
        assert!(out.contains("2:10"));
        assert!(out.contains("2x"));
        assert!(out.contains("1x"));
        assert!(out.contains("'x' is not defined"));
        assert!(!out.contains("defined."));
        assert!(out.contains("no-undef"));
        assert!(out.contains("warning"));
        assert!(out.contains("\u{2716} 2 problems (1 error, 1 warning)"));
        assert!(out.contains(
            "0 errors and 1 warning potentially fixable with the `--fix` option."
        ));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_hidden_messages_leave_the_summary() {
        let out = render(&merged(0.6, true), &plain());
        assert!(out.contains("2x"));
        assert!(!out.contains("1x"));
        assert!(out.contains("\u{2716} 1 problem (1 error, 0 warnings)"));
        assert!(!out.contains("potentially fixable"));
    }

    #[test]
    fn test_no_problems_renders_nothing() {
        let raw =
            parse_results(r#"[{"filePath":"a.js","messages":[]}]"#, &InputSource::Stdin).unwrap();
        let files = merge_results(&raw, &MergeConfig::default()).unwrap();
        assert_eq!(render(&files, &plain()), "");
        assert_eq!(render(&[], &plain()), "");
    }

    #[test]
    fn test_show_source_prints_context() {
        let options = RenderOptions {
            show_source: true,
            color: false,
            cwd: Some(PathBuf::from("/repo")),
        };
        let out = render(&merged(0.0, false), &options);
        assert!(out.contains("first/index.js\n"));
        assert!(out.contains("1: function foo () {"));
        assert!(out.contains("2:   return x"));
        assert!(out.contains("3: }"));
    }

    #[test]
    fn test_colors_only_when_enabled() {
        let options = RenderOptions {
            color: true,
            ..Default::default()
        };
        let out = render(&merged(0.6, false), &options);
        assert!(out.contains('\u{1b}'));
    }

    #[test]
    fn test_message_text_trims_only_a_closing_period() {
        assert_eq!(message_text("Missing semicolon."), "Missing semicolon");
        assert_eq!(message_text("Ends with space ."), "Ends with space .");
        assert_eq!(
            message_text("Parsing error:\nUnexpected token"),
            "Parsing error: Unexpected token"
        );
        assert_eq!(message_text("."), ".");
    }
}
