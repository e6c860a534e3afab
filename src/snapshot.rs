//! CSV output: table snapshots and serialized report rows
//!
//! Files are written UTF-8 with a leading BOM and `,` as separator, the
//! layout the upstream extraction job hands over. Reading them back goes
//! through the usual loader, whose header cleanup strips the BOM again.

use crate::error::Result;
use crate::table::Table;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn bom_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;
    Ok(csv::WriterBuilder::new().delimiter(b',').from_writer(file))
}

/// Write every row of `table`; nulls become empty fields
pub fn write_snapshot(table: &Table, path: &Path) -> Result<()> {
    let mut writer = bom_writer(path)?;
    writer.write_record(table.headers())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Serialize report rows (agent summaries, counts, ...) with a header line
pub fn write_rows_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut writer = bom_writer(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AgentSummary;
    use crate::source::load_csv;

    #[test]
    fn test_snapshot_reloads_unchanged() {
        let t = Table::from_strs(
            &["Gestor", "Observacion"],
            &[&["Ana", "llamar, mañana"], &["Luis", ""]],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&t, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        // The loader decodes Latin-1, so only compare ASCII cells
        let back = load_csv(&path).unwrap();
        assert_eq!(back.headers(), t.headers());
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(0, "Gestor"), Some("Ana"));
        assert_eq!(back.get(1, "Observacion"), None);
    }

    #[test]
    fn test_snapshot_with_multiline_cell_reloads() {
        let t = Table::from_strs(
            &["NumeroOperacion", "Gestor", "Observacion"],
            &[&["1", "Ana", "llamar\nmanana, sin falta"], &["2", "Luis", "ok"]],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&t, &path).unwrap();

        let back = load_csv(&path).unwrap();
        assert_eq!(back.headers(), t.headers());
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(0, "Observacion"), Some("llamar\nmanana, sin falta"));
        assert_eq!(back.get(1, "Gestor"), Some("Luis"));
    }

    #[test]
    fn test_agent_summary_csv_header() {
        let rows = vec![AgentSummary {
            gestor: "Ana".to_string(),
            gestiones: 0,
            cd: 0,
            compromisos: 0,
            contacto_directo: 0,
            pct_directo: None,
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gestores.csv");
        write_rows_csv(&rows, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let text = text.trim_start_matches('\u{feff}');
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Gestor,Gestiones,CD,Compromisos,ContactoDirecto,% Directo")
        );
        assert_eq!(lines.next(), Some("Ana,0,0,0,0,"));
    }
}
