use chrono::NaiveDateTime;
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use gxupload_transfer::ResumeRecord;
use gxupload_upload::Destination;

fn styled_table() -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);
    table
}

fn header(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .add_attribute(Attribute::Dim)
}

fn apply_column_padding(table: &mut Table, padding: (u16, u16)) {
    for i in 0..table.column_count() {
        if let Some(col) = table.column_mut(i) {
            col.set_padding(padding);
        }
    }
}

fn format_time(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%c").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// ID / Name / Last Modified, or bare IDs when `quiet`.
pub fn histories_table(histories: &[Destination], quiet: bool) -> Table {
    let mut table = styled_table();
    if quiet {
        for h in histories {
            table.add_row(vec![&h.id]);
        }
        apply_column_padding(&mut table, (0, 0));
        return table;
    }

    table.set_header(vec![header("ID"), header("Name"), header("Last Modified")]);
    for h in histories {
        table.add_row(vec![h.id.clone(), h.name.clone(), format_time(h.update_time)]);
    }
    apply_column_padding(&mut table, (0, 4));
    table
}

/// Histories matched by an ambiguous name.
pub fn candidates_table(candidates: &[Destination]) -> Table {
    histories_table(candidates, false)
}

pub fn resume_table(records: &[ResumeRecord]) -> Table {
    let mut table = styled_table();
    table.set_header(vec![
        header("Fingerprint"),
        header("History"),
        header("Size"),
        header("Created"),
        header("Upload URL"),
    ]);
    for r in records {
        table.add_row(vec![
            r.fingerprint.to_string(),
            r.destination.clone(),
            r.total_size.to_string(),
            r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.session_handle.clone(),
        ]);
    }
    apply_column_padding(&mut table, (0, 4));
    table
}
