//! Terminal output utilities: table rendering, ANSI formatting, event lines.

use pulsedrive_core::{AgentKind, EventStatus};
use pulsedrive_processor::{LogColor, PipelineStepView};

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const GRAY: &str = "\x1b[90m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

/// Print a formatted INFO note to stdout.
pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

/// Print a formatted WARNING note.
pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Column alignment.
pub enum Align {
    Left,
    Right,
}

/// A table column definition.
pub struct Column {
    pub header: String,
    pub align: Align,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left, max_width: None }
    }
    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right, max_width: None }
    }
    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Render a table with given columns and rows.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    // Compute column widths.
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            let w = visible_width(cell);
            let w = columns[i].max_width.map_or(w, |max| w.min(max));
            widths[i] = widths[i].max(w);
        }
    }

    let mut out = String::new();

    // Header.
    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    out.push_str(&format!("{BOLD}  {}  {RESET}\n", header_cells.join("  ")));

    // Separator.
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    // Rows.
    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let cell = truncate(cell, columns[i].max_width);
                pad_cell(&cell, widths[i], &columns[i].align)
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/// Plain cells longer than `max` are cut with an ellipsis; colored cells are left intact.
fn truncate(s: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if s.chars().count() > max && !s.contains('\x1b') && max > 0 => {
            let mut cut: String = s.chars().take(max - 1).collect();
            cut.push('…');
            cut
        }
        _ => s.to_string(),
    }
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(visible_width(s));
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

// ---------------------------------------------------------------------------
// Workflow rendering
// ---------------------------------------------------------------------------

pub fn log_color_code(color: LogColor) -> &'static str {
    match color {
        LogColor::Red => RED,
        LogColor::Blue => BLUE,
        LogColor::Gray => GRAY,
        LogColor::Green => GREEN,
    }
}

fn status_label(status: &EventStatus, color: bool) -> String {
    let code = match status {
        EventStatus::Alert => RED,
        EventStatus::Running => BLUE,
        EventStatus::Completed => GREEN,
        _ => DIM,
    };
    paint(&status.as_str().to_uppercase(), code, color)
}

/// One event as a log line: `HH:MM:SS  Agent  message`.
pub fn format_log_line(
    time: chrono::DateTime<chrono::Utc>,
    agent: &str,
    message: &str,
    log_color: LogColor,
    color: bool,
) -> String {
    let stamp = paint(&time.format("%H:%M:%S").to_string(), DIM, color);
    let agent = paint(agent, BOLD, color);
    let message = paint(message, log_color_code(log_color), color);
    format!("{stamp}  {agent}  {message}")
}

/// The per-agent pipeline table in pipeline order.
pub fn render_pipeline(rows: &[PipelineStepView], color: bool) -> String {
    let columns = vec![
        Column::right("#"),
        Column::left("Agent"),
        Column::left("Status"),
        Column::left("Last update").max_width(60),
    ];
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            vec![
                row.agent.order().to_string(),
                format!("{} {}", row.agent.icon(), row.name),
                status_label(&row.status, color),
                row.last_log.clone(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// The agent registry as a table.
pub fn render_agents() -> String {
    let columns = vec![
        Column::right("#"),
        Column::left("Key"),
        Column::left("Name"),
        Column::left("Icon"),
    ];
    let rows: Vec<Vec<String>> = AgentKind::ALL
        .iter()
        .map(|kind| {
            vec![
                kind.order().to_string(),
                kind.key().to_string(),
                kind.display_name().to_string(),
                kind.icon().to_string(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_table() {
        let cols = vec![Column::left("Name"), Column::right("Count")];
        let rows = vec![
            vec!["Alice".to_string(), "42".to_string()],
            vec!["Bob".to_string(), "7".to_string()],
        ];
        let table = render_table(&cols, &rows);
        assert!(table.contains("Alice"));
        assert!(table.contains("   7"));
    }

    #[test]
    fn truncates_long_plain_cells() {
        let cols = vec![Column::left("Msg").max_width(5)];
        let rows = vec![vec!["abcdefghij".to_string()]];
        let table = render_table(&cols, &rows);
        assert!(table.contains("abcd…"));
        assert!(!table.contains("abcdefghij"));
    }

    #[test]
    fn pipeline_table_lists_every_agent() {
        let rows: Vec<PipelineStepView> =
            AgentKind::ALL.iter().map(|k| PipelineStepView::idle(*k)).collect();
        let table = render_pipeline(&rows, false);
        for kind in AgentKind::ALL {
            assert!(table.contains(kind.display_name()));
        }
        assert!(table.contains("IDLE"));
        assert!(table.contains("Waiting..."));
    }

    #[test]
    fn log_line_plain() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 9, 5, 7).unwrap();
        let line = format_log_line(at, "Diagnosis Agent", "boom", LogColor::Red, false);
        assert_eq!(line, "09:05:07  Diagnosis Agent  boom");

        let colored = format_log_line(at, "Diagnosis Agent", "boom", LogColor::Red, true);
        assert!(colored.contains(RED));
        assert_eq!(strip_ansi(&colored), line);
    }

    #[test]
    fn agents_table_has_keys() {
        let table = render_agents();
        assert!(table.contains("data_analysis"));
        assert!(table.contains("UEBA Security Agent"));
    }
}
