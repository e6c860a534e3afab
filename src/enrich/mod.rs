//! Join the gestion export against its reference tables and derive metrics

pub mod join;
pub mod metrics;

pub use join::left_join;
pub use metrics::{add_metrics, parse_flag, parse_hour};

use crate::columns::*;
use crate::error::Result;
use crate::table::Table;

/// The four reference tables
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub contact_types: Table,
    pub products: Table,
    pub stage_order: Table,
    pub calendar: Table,
}

/// Left-join `primary` against every lookup, in order: contact type,
/// product, stage order, calendar. Row count is preserved.
pub fn enrich(primary: &Table, lookups: &Lookups) -> Result<Table> {
    let joined = left_join(primary, &lookups.contact_types, CODIGO_TIPO_CONTACTO, "TipoContacto")?;

    // Only the key and category label of the product table are used
    let products = lookups
        .products
        .select("Producto", &[PRODUCTO_GESTION, PRODUCTO])?;
    let joined = left_join(&joined, &products, PRODUCTO_GESTION, "Producto")?;

    let joined = left_join(&joined, &lookups.stage_order, ETAPA, "OrdenEtapa")?;

    let calendar = calendar_keyed_by_gestion_date(&lookups.calendar);
    let joined = left_join(&joined, &calendar, FECHA_GESTION, "Semana")?;

    debug_assert_eq!(joined.len(), primary.len());
    Ok(joined)
}

/// The calendar export spells its date column `fechaGestion`
fn calendar_keyed_by_gestion_date(calendar: &Table) -> Table {
    let mut calendar = calendar.clone();
    let existing = calendar
        .headers()
        .iter()
        .find(|h| h.eq_ignore_ascii_case(FECHA_GESTION) && h.as_str() != FECHA_GESTION)
        .cloned();
    if let Some(name) = existing {
        if !calendar.has_column(FECHA_GESTION) {
            calendar.rename_column(&name, FECHA_GESTION);
        }
    }
    calendar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;

    fn lookups() -> Lookups {
        Lookups {
            contact_types: Table::from_strs(
                &["CodigoTipoContacto", "TipoContacto"],
                &[&["CD", "Contacto Directo"], &["NC", "No Contacto"]],
            ),
            products: Table::from_strs(
                &["ProductoGestion", "Producto", "Descripcion", "Etapa"],
                &[&["P1", "ALIA", "x", "IGNORED"], &["P2", "MICROCREDITO", "y", "IGNORED"]],
            ),
            stage_order: Table::from_strs(
                &["Etapa", "Orden"],
                &[&["PREVENTIVA", "1"], &["TEMPRANA", "2"]],
            ),
            calendar: Table::from_strs(
                &["fechaGestion", "DiaSemana", "MesDia"],
                &[&["2025-11-21", "viernes", "11-21"]],
            ),
        }
    }

    fn primary() -> Table {
        Table::from_strs(
            &["NumeroOperacion", "CodigoTipoContacto", "ProductoGestion", "Etapa", "FechaGestion"],
            &[
                &["1", "CD", "P1", "PREVENTIVA", "2025-11-21"],
                &["2", "ZZ", "P9", "TARDIA", "2025-11-22"],
                &["3", "NC", "P2 ", "TEMPRANA", "2025-11-21"],
            ],
        )
    }

    #[test]
    fn test_enrich_joins_all_lookups() {
        let out = enrich(&primary(), &lookups()).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out.get(0, "TipoContacto"), Some("Contacto Directo"));
        assert_eq!(out.get(0, "Producto"), Some("ALIA"));
        assert_eq!(out.get(0, "Orden"), Some("1"));
        assert_eq!(out.get(0, "MesDia"), Some("11-21"));
        assert_eq!(out.get(2, "Producto"), Some("MICROCREDITO"));
        // Product extra columns are projected away
        assert!(!out.has_column("Descripcion"));
    }

    #[test]
    fn test_unmatched_row_survives_with_nulls() {
        let out = enrich(&primary(), &lookups()).unwrap();
        assert_eq!(out.get(1, "NumeroOperacion"), Some("2"));
        assert_eq!(out.get(1, "TipoContacto"), None);
        assert_eq!(out.get(1, "Producto"), None);
        assert_eq!(out.get(1, "Orden"), None);
        assert_eq!(out.get(1, "DiaSemana"), None);
    }

    #[test]
    fn test_product_lookup_needs_both_columns() {
        let mut l = lookups();
        l.products = Table::from_strs(&["ProductoGestion"], &[&["P1"]]);
        match enrich(&primary(), &l).unwrap_err() {
            PanelError::MissingColumns { table, columns } => {
                assert_eq!(table, "Producto");
                assert_eq!(columns, vec!["Producto"]);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
