use std::borrow::Cow;
use std::fmt::Write as _;

use crate::{
    record::{CanonicalRecord, FIELD_NAMES},
    recommend::Recommendation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// Plain-text table with two-space column gaps and a dashed separator.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = vec![Align::Left; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
        }
    }

    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &idx in columns {
            if let Some(slot) = self.align.get_mut(idx) {
                *slot = Align::Right;
            }
        }
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| display_width(h)).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_width(&sanitize_cell(cell)));
            }
        }

        let mut output = String::new();
        let _ = writeln!(output, "{}", self.format_line(&self.headers, &widths));
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
        let separator_widths: Vec<usize> = widths.iter().map(|w| (*w).max(3)).collect();
        let _ = writeln!(
            output,
            "{}",
            self.format_cells(&separator, &separator_widths, false)
        );
        for row in &self.rows {
            let _ = writeln!(output, "{}", self.format_line(row, &widths));
        }
        output
    }

    fn format_line(&self, cells: &[String], widths: &[usize]) -> String {
        self.format_cells(cells, widths, true)
    }

    fn format_cells(&self, cells: &[String], widths: &[usize], honour_align: bool) -> String {
        let mut line = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(idx, (cell, width))| {
                let text = sanitize_cell(cell);
                let padding = " ".repeat(width.saturating_sub(display_width(&text)));
                let align = if honour_align {
                    self.align.get(idx).copied().unwrap_or_default()
                } else {
                    Align::Left
                };
                match align {
                    Align::Left => format!("{text}{padding}"),
                    Align::Right => format!("{padding}{text}"),
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        while line.ends_with(' ') {
            line.pop();
        }
        line
    }
}

pub fn render_recommendations(rows: &[Recommendation]) -> String {
    let mut table = Table::new([
        "rank",
        "wax_brand",
        "wax_product",
        "avg_rating",
        "count",
        "avg_layers",
    ])
    .align_right(&[0, 3, 4, 5]);
    for (idx, row) in rows.iter().enumerate() {
        table.push_row(vec![
            (idx + 1).to_string(),
            row.wax_brand.clone(),
            row.wax_product.clone(),
            row.avg_rating.map(|v| format!("{v:.2}")).unwrap_or_default(),
            row.count.to_string(),
            row.avg_layers.map(|v| format!("{v:.1}")).unwrap_or_default(),
        ]);
    }
    table.render()
}

pub fn render_records(records: &[CanonicalRecord]) -> String {
    let mut table = Table::new(FIELD_NAMES).align_right(&[2, 7, 8, 9]);
    for record in records {
        table.push_row(record.to_fields().to_vec());
    }
    table.render()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequence
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
