use crate::models::VisualizationPayload;
use anyhow::{Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name used when saving an export.
pub const EXPORT_FILE_NAME: &str = "visualization_data.csv";
/// MIME type of an export.
pub const EXPORT_MIME: &str = "text/csv;charset=utf-8;";

/// Serialize the raw payload: header `label,<series...>`, one row per label, missing values
/// empty. Fields are written verbatim (no quoting) and rows are `\n`-separated without a
/// trailing newline.
pub fn export_csv(raw: &VisualizationPayload) -> String {
    // One-column rows: the csv writer would emit a lone empty field as `""`.
    if raw.values.is_empty() {
        return std::iter::once("label")
            .chain(raw.labels.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut buf = Vec::new();
    if let Err(e) = write_rows(raw, &mut buf) {
        log::warn!("csv export truncated: {e:#}");
    }
    let mut out = String::from_utf8_lossy(&buf).into_owned();
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_rows<W: Write>(raw: &VisualizationPayload, sink: W) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(sink);

    let header = std::iter::once("label").chain(raw.values.iter().map(|s| s.label.as_str()));
    wtr.write_record(header)?;

    for (i, label) in raw.labels.iter().enumerate() {
        let mut row = Vec::with_capacity(raw.values.len() + 1);
        row.push(label.clone());
        row.extend(raw.values.iter().map(|s| match s.data.get(i) {
            Some(Some(v)) => v.to_string(),
            _ => String::new(),
        }));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write [`export_csv`] output to `dir/visualization_data.csv`, creating `dir` if needed.
pub fn save_csv<P: AsRef<Path>>(raw: &VisualizationPayload, dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    save_csv_to(raw, &path)?;
    Ok(path)
}

/// Write [`export_csv`] output to an explicit file path (used by save dialogs).
pub fn save_csv_to<P: AsRef<Path>>(raw: &VisualizationPayload, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, export_csv(raw)).with_context(|| format!("write {}", path.display()))?;
    log::debug!("exported {} rows to {}", raw.labels.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Series;
    use tempfile::tempdir;

    fn payload() -> VisualizationPayload {
        VisualizationPayload::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                Series::new("X", vec![1.0, 2.5]),
                Series::new("Y", vec![3.0, 4.0, 5.0, 6.0]),
            ],
        )
    }

    #[test]
    fn missing_values_are_empty_and_extra_values_dropped() {
        assert_eq!(export_csv(&payload()), "label,X,Y\na,1,3\nb,2.5,4\nc,,5");
    }

    #[test]
    fn shape_is_labels_plus_header_by_series_plus_label() {
        let out = export_csv(&payload());
        let rows: Vec<&str> = out.split('\n').collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.split(',').count() == 3));
    }

    #[test]
    fn fields_are_not_escaped() {
        let raw = VisualizationPayload::new(
            vec!["x\"y".into()],
            vec![Series::new("Sales \"EU\"", vec![7.0])],
        );
        assert_eq!(export_csv(&raw), "label,Sales \"EU\"\nx\"y,7");
    }

    #[test]
    fn empty_payload_is_header_only() {
        assert_eq!(export_csv(&VisualizationPayload::default()), "label");
    }

    #[test]
    fn empty_labels_without_series_stay_empty() {
        let raw = VisualizationPayload::new(vec!["".into(), "b".into()], vec![]);
        assert_eq!(export_csv(&raw), "label\n\nb");
    }

    #[test]
    fn holes_export_as_empty_fields() {
        let raw = VisualizationPayload::new(
            vec!["a".into(), "b".into()],
            vec![Series::with_holes("X", vec![None, Some(2.0)])],
        );
        assert_eq!(export_csv(&raw), "label,X\na,\nb,2");
    }

    #[test]
    fn save_writes_fixed_name() {
        let dir = tempdir().unwrap();
        let path = save_csv(&payload(), dir.path().join("out")).unwrap();
        assert!(path.ends_with(EXPORT_FILE_NAME));
        assert_eq!(std::fs::read_to_string(path).unwrap(), export_csv(&payload()));
    }
}
