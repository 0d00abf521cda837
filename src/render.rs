// Text rendering of a table body for the terminal

use crate::table::{Column, TableBody};
use std::fmt::Write;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const COLUMN_GAP: &str = "   ";
const STALE_MARKER: &str = " (stale)";

/// Header line plus one line per row, columns padded to their widest cell.
/// Stale rows get a trailing marker.
pub fn render_table(body: &TableBody) -> String {
    let mut widths: Vec<usize> = Column::ALL.iter().map(|c| c.header().len()).collect();
    for row in body.rows() {
        for (i, cell) in row.cells().iter().enumerate() {
            widths[i] = widths[i].max(cell.text.chars().count());
        }
    }

    let mut out = String::new();
    let headers: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
    push_line(&mut out, &headers, &widths, "");
    for row in body.rows() {
        let texts: Vec<&str> = row.cells().iter().map(|c| c.text.as_str()).collect();
        let suffix = if row.is_stale() { STALE_MARKER } else { "" };
        push_line(&mut out, &texts, &widths, suffix);
    }
    out
}

/// Full redraw: optional screen clear, timestamp line, then the table.
pub fn render_frame(body: &TableBody, updated_at: &str, clear_screen: bool) -> String {
    let mut out = String::new();
    if clear_screen {
        out.push_str(CLEAR_SCREEN);
    }
    let _ = writeln!(out, "updated {} - {} containers", updated_at, body.len());
    out.push_str(&render_table(body));
    out
}

fn push_line(out: &mut String, texts: &[&str], widths: &[usize], suffix: &str) {
    let mut line = String::new();
    for (i, (text, width)) in texts.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(COLUMN_GAP);
        }
        let _ = write!(line, "{:<width$}", text, width = width);
    }
    let line = line.trim_end();
    let _ = writeln!(out, "{}{}", line, suffix);
}
