use client_core::{Resource, ResourceState, ResourceStore};
use shared::domain::{RunId, RunTime};

const HEADERS: [&str; 5] = ["ID", "NAME", "USER", "STARTED", "STATUS"];
const EMPTY: &str = "-";

pub trait RunRow {
    fn columns(&self) -> [String; 5];
}

pub fn run_columns(
    id: &RunId,
    name: &Option<String>,
    user: &Option<String>,
    start_time: &Option<RunTime>,
    status: &Option<String>,
) -> [String; 5] {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| EMPTY.to_string());
    [
        id.to_string(),
        text(name),
        text(user),
        start_time
            .as_ref()
            .map(RunTime::display)
            .unwrap_or_else(|| EMPTY.to_string()),
        text(status),
    ]
}

pub fn render_store<R>(title: &str, store: &ResourceStore<R>) -> String
where
    R: Resource + RunRow,
{
    render_state(title, &store.snapshot())
}

fn render_state<R: RunRow>(title: &str, state: &ResourceState<R>) -> String {
    if let Some(error) = &state.error {
        return format!("{title}: {error}\n");
    }
    if state.loading {
        return format!("{title}: loading\n");
    }
    if state.items.is_empty() {
        return format!("{title}: none\n");
    }

    let rows: Vec<[String; 5]> = state.items.iter().map(RunRow::columns).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = format!("{title} ({})\n", rows.len());
    let header = HEADERS.map(str::to_string);
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
