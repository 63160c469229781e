use std::path::Path;

use chrono::NaiveDate;

use crate::engine::GanttEngine;
use crate::store::ScheduleStore;

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}

/// Export the visible rows to a semicolon-delimited CSV file.
///
/// Columns: Level ; Name ; Start ; End ; Progress ; Baseline Start ;
/// Baseline End ; Variance (days)
/// Dates are formatted as DD/MM/YYYY; missing values are left empty.
/// Returns the number of rows written.
pub fn export_rows<S: ScheduleStore>(engine: &GanttEngine<S>, path: &Path) -> Result<usize, String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| format!("Failed to create CSV file: {}", e))?;

    wtr.write_record([
        "Level",
        "Name",
        "Start",
        "End",
        "Progress",
        "Baseline Start",
        "Baseline End",
        "Variance (days)",
    ])
    .map_err(|e| format!("Failed to write header: {}", e))?;

    let mut written = 0;
    for (row, item) in engine.visible_items() {
        let span = item.display_span();
        let baseline = engine.baseline_span(row.key);
        let indent = "  ".repeat(usize::from(row.level().depth() - 1));
        wtr.write_record([
            row.level().label().to_string(),
            format!("{indent}{}", item.name),
            date_cell(span.map(|s| s.start)),
            date_cell(span.map(|s| s.end)),
            format!("{:.0}%", item.progress),
            date_cell(baseline.map(|s| s.start)),
            date_cell(baseline.map(|s| s.end)),
            engine
                .variance_days(row.key)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        ])
        .map_err(|e| format!("Failed to write '{}': {}", item.name, e))?;
        written += 1;
    }

    wtr.flush().map_err(|e| format!("Failed to flush CSV: {}", e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemKey;
    use crate::store::{MemoryStore, Scope};
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_visible_rows_with_baseline_columns() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut engine = GanttEngine::new(MemoryStore::sample(today), today);
        engine.load(Scope::new(1, Some(2)));
        engine.toggle_expand(ItemKey::phase(1));
        engine.toggle_expand(ItemKey::work_package(1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        let written = export_rows(&engine, &path).unwrap();
        assert_eq!(written, engine.rows().len());

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), written + 1);
        assert_eq!(
            lines[0],
            "Level;Name;Start;End;Progress;Baseline Start;Baseline End;Variance (days)"
        );
        assert!(lines[1].starts_with("Phase;Design;"));
        // Floor plans: planned end today-2, baseline end today-4.
        let floor_plans = lines.iter().find(|l| l.contains("Floor plans")).unwrap();
        assert!(floor_plans.starts_with("Task;    Floor plans;"));
        assert!(floor_plans.ends_with(";2"));
    }

    #[test]
    fn unwritable_path_is_reported() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let engine = GanttEngine::new(MemoryStore::new(), today);
        let dir = tempfile::tempdir().unwrap();
        let err = export_rows(&engine, &dir.path().join("missing").join("x.csv")).unwrap_err();
        assert!(err.starts_with("Failed to create CSV file"));
    }
}
