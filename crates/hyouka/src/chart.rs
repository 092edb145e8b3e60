//! Terminal horizontal bar chart.
//!
//! Consumes (label, value) pairs in ranking order and renders them top
//! to bottom: padded label, proportional bar, numeric value. Labels are
//! measured by display width so CJK titles stay aligned.

use std::fmt::Write as _;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_BAR_WIDTH: usize = 50;
const MAX_LABEL_WIDTH: usize = 42;

/// Renders the chart. Empty input renders nothing.
#[must_use]
pub fn render(title: &str, entries: &[(String, f64)]) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push('\n');
    out.push_str(title);
    out.push('\n');

    let labels: Vec<String> = entries.iter().map(|(label, _)| clip_label(label)).collect();
    let label_width = labels
        .iter()
        .map(|label| UnicodeWidthStr::width(label.as_str()))
        .max()
        .unwrap_or(0);
    let max_value = entries
        .iter()
        .map(|(_, value)| *value)
        .fold(f64::NEG_INFINITY, f64::max);

    for (label, (_, value)) in labels.iter().zip(entries) {
        let pad = label_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
        out.push_str("  ");
        out.push_str(label);
        out.push_str(&" ".repeat(pad));
        out.push_str("  ");
        out.push_str(&"█".repeat(bar_len(*value, max_value)));
        let _ = writeln!(out, " {value:.3}");
    }
    out
}

fn bar_len(value: f64, max_value: f64) -> usize {
    if max_value <= 0.0 {
        return 0;
    }
    ((value / max_value).clamp(0.0, 1.0) * MAX_BAR_WIDTH as f64).round() as usize
}

/// Truncates by display width, appending an ellipsis.
fn clip_label(label: &str) -> String {
    if UnicodeWidthStr::width(label) <= MAX_LABEL_WIDTH {
        return label.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in label.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w > MAX_LABEL_WIDTH - 1 {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}
