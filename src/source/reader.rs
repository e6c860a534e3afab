use super::sniff::sniff_delimiter;
use crate::error::{PanelError, Result};
use crate::table::{Cell, Table};
use csv::{ReaderBuilder, Trim};
use std::path::Path;

/// Number of leading bytes inspected to guess the delimiter
pub const SNIFF_BYTES: usize = 1024;

/// Delimiter used when sniffing finds nothing
pub const FALLBACK_DELIMITER: u8 = b';';

/// UTF-8 byte-order mark as it reads after a single-byte decode
const BOM_MISDECODED: &str = "\u{ef}\u{bb}\u{bf}";
const BOM: char = '\u{feff}';

/// Read a delimited export from disk.
///
/// The file is decoded as ISO-8859-1, which accepts any byte sequence.
pub fn load_csv(path: &Path) -> Result<Table> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PanelError::MissingFile(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let table = read_csv_bytes(&bytes, &path.display().to_string())?;
    log::info!(
        "Loaded {}: {} rows, {} columns",
        path.display(),
        table.len(),
        table.headers().len()
    );
    Ok(table)
}

/// Parse raw bytes into a table. `origin` is only used in log messages.
pub fn read_csv_bytes(bytes: &[u8], origin: &str) -> Result<Table> {
    let text = decode_latin1(bytes);

    let sample_len = bytes.len().min(SNIFF_BYTES);
    let sample: String = text.chars().take(sample_len).collect();
    let delimiter = match sniff_delimiter(&sample, bytes.len() > SNIFF_BYTES) {
        Some(d) => d,
        None => {
            log::debug!("{}: could not sniff delimiter, using ';'", origin);
            FALLBACK_DELIMITER
        }
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();
    let width = headers.len();
    let mut table = Table::new(headers);

    let mut skipped = 0;
    for (row_num, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                log::warn!("{}: row {} unreadable: {}", origin, row_num + 2, e);
                continue;
            }
        };

        if record.len() > width {
            skipped += 1;
            log::warn!(
                "{}: row {} has {} fields, expected {}",
                origin,
                row_num + 2,
                record.len(),
                width
            );
            continue;
        }

        table.push_row(record.iter().map(to_cell).collect());
    }

    if skipped > 0 {
        log::warn!("{}: skipped {} malformed rows", origin, skipped);
    }

    Ok(table)
}

/// ISO-8859-1 maps each byte to the code point of the same value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Strip byte-order-mark artifacts and surrounding whitespace.
///
/// Internal spaces are kept, so `Orden Etapa` stays distinct from `OrdenEtapa`.
pub fn clean_header(raw: &str) -> String {
    raw.replace(BOM_MISDECODED, "")
        .replace(BOM, "")
        .trim()
        .to_string()
}

fn to_cell(value: &str) -> Cell {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_header() {
        assert_eq!(clean_header("\u{ef}\u{bb}\u{bf}NumeroOperacion"), "NumeroOperacion");
        assert_eq!(clean_header("\u{feff}Etapa "), "Etapa");
        assert_eq!(clean_header("  Orden Etapa  "), "Orden Etapa");
    }

    #[test]
    fn test_decode_latin1_accepts_any_bytes() {
        let text = decode_latin1(&[b'G', 0xE9, b's', 0xFF]);
        assert_eq!(text, "G\u{e9}s\u{ff}");
    }

    #[test]
    fn test_read_bom_header_and_latin1_cells() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"CodigoTipoContacto;TipoContacto\nCD;Contacto Directo\nNC;Gesti");
        bytes.push(0xF3);
        bytes.extend_from_slice(b"n\n");

        let table = read_csv_bytes(&bytes, "test").unwrap();
        assert_eq!(table.headers(), &["CodigoTipoContacto", "TipoContacto"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "TipoContacto"), Some("Gesti\u{f3}n"));
    }

    #[test]
    fn test_read_comma_file() {
        let table = read_csv_bytes(b"Etapa,Orden\nPREVENTIVA,1\nTEMPRANA,2\n", "test").unwrap();
        assert_eq!(table.headers(), &["Etapa", "Orden"]);
        assert_eq!(table.get(1, "Orden"), Some("2"));
    }

    #[test]
    fn test_single_column_falls_back_to_semicolon() {
        let table = read_csv_bytes(b"Gestor\nAna Perez\nLuis, Jr\n", "test").unwrap();
        assert_eq!(table.headers(), &["Gestor"]);
        assert_eq!(table.get(1, "Gestor"), Some("Luis, Jr"));
    }

    #[test]
    fn test_empty_cells_are_null_and_values_trimmed() {
        let table = read_csv_bytes(b"A;B;C\n 1 ;;x\n2\n", "test").unwrap();
        assert_eq!(table.get(0, "A"), Some("1"));
        assert_eq!(table.get(0, "B"), None);
        // Short rows are padded
        assert_eq!(table.get(1, "C"), None);
    }

    #[test]
    fn test_overlong_rows_are_skipped() {
        let table = read_csv_bytes(b"A;B\n1;2\n3;4;5\n6;7\n", "test").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "A"), Some("6"));
    }

    #[test]
    fn test_multiline_quoted_cell_keeps_comma_delimiter() {
        let bytes = b"NumeroOperacion,Gestor,Observacion\n1,Ana,\"llamar\nmanana\"\n2,Luis,ok\n";
        let table = read_csv_bytes(bytes, "test").unwrap();
        assert_eq!(table.headers(), &["NumeroOperacion", "Gestor", "Observacion"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Observacion"), Some("llamar\nmanana"));
        assert_eq!(table.get(1, "Gestor"), Some("Luis"));
    }

    #[test]
    fn test_malformed_row_skipped_not_whole_file() {
        let bytes = b"NumeroOperacion,Gestor,Respuesta\n1,Ana,PAGA\n2,Luis,NO CONTESTA, VOLVER\n3,Eva,PAGA\n";
        let table = read_csv_bytes(bytes, "test").unwrap();
        assert_eq!(table.headers(), &["NumeroOperacion", "Gestor", "Respuesta"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "Gestor"), Some("Eva"));
    }

    #[test]
    fn test_empty_input() {
        let table = read_csv_bytes(b"", "test").unwrap();
        assert!(table.headers().is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv(Path::new("/nonexistent/Gestion_part9.csv")).unwrap_err();
        assert!(matches!(err, PanelError::MissingFile(_)));
        assert!(err.to_string().contains("Gestion_part9.csv"));
    }
}
