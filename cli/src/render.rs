use std::fmt::Write;

use items_core::{ItemsTable, TableBody, Toast, ToastKind};

/// Plain-text table with a pagination footer.
pub fn table(table: &ItemsTable) -> String {
    let mut header: Vec<&str> = vec!["ID"];
    header.extend(table.columns.iter().filter(|column| !column.is_empty()));
    let lines: Vec<Vec<String>> = match &table.body {
        TableBody::Skeleton { cells } => vec![vec!["…".to_string(); cells + 1]],
        TableBody::Rows(rows) => rows
            .iter()
            .map(|row| {
                let action = if row.can_complete { "complete | edit | delete" } else { "edit | delete" };
                vec![
                    row.id.to_string(),
                    row.title.clone(),
                    row.description.clone(),
                    row.due_date.clone(),
                    action.to_string(),
                ]
            })
            .collect(),
    };

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, header.iter().copied(), &widths);
    for line in &lines {
        push_line(&mut out, line.iter().map(String::as_str), &widths);
    }
    if lines.is_empty() {
        out.push_str("(no items)\n");
    }
    let _ = writeln!(
        out,
        "page {} [{}]{}{}{}",
        table.page,
        table.status,
        if table.has_previous_page { "  < previous" } else { "" },
        if table.has_next_page { "  next >" } else { "" },
        if table.dimmed { "  (stale)" } else { "" },
    );
    if let Some(error) = &table.error {
        let _ = writeln!(out, "error: {error}");
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

pub fn toast(toast: &Toast) -> String {
    let marker = match toast.kind {
        ToastKind::Success => "✓",
        ToastKind::Error => "✗",
    };
    format!("{marker} {}: {}", toast.title, toast.message)
}
