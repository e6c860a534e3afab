use crate::error::Result;
use crate::report::render::NOT_AVAILABLE;
use crate::report::{Comparison, CrossTab, Detail, Overview, ValueCount};
use crate::table::Table;
use rust_xlsxwriter::{
    ConditionalFormat3ColorScale, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};
use std::path::Path;

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border_bottom(FormatBorder::Thin)
}

fn write_headers(sheet: &mut Worksheet, row: u32, headers: &[&str]) -> Result<()> {
    let header_format = header_format();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(row, col as u16, *header, &header_format)?;
    }
    Ok(())
}

/// Write the views to an Excel workbook, one sheet per table.
/// Views that could not be built are passed as `None` and skipped.
pub fn write_views_to_xlsx(
    overview: &Overview,
    detail: Option<&Detail>,
    comparison: Option<&Comparison>,
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, overview)?;

    let agents_sheet = workbook.add_worksheet();
    write_agents_sheet(agents_sheet, overview)?;

    let hours_sheet = workbook.add_worksheet();
    write_crosstab_sheet(hours_sheet, &overview.crosstab)?;

    if let Some(detail) = detail {
        let detail_sheet = workbook.add_worksheet();
        write_table_sheet(detail_sheet, "Detalle", &detail.rows)?;
    }

    if let Some(comparison) = comparison {
        let compare_sheet = workbook.add_worksheet();
        write_comparison_sheet(compare_sheet, comparison)?;
    }

    workbook.save(path)?;
    log::info!("Wrote workbook {}", path.display());
    Ok(())
}

/// KPIs, funnel and contact type counts stacked on one sheet
fn write_summary_sheet(sheet: &mut Worksheet, view: &Overview) -> Result<()> {
    sheet.set_name("Resumen")?;
    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 12)?;

    let label_format = Format::new().set_bold();
    let number_format = Format::new().set_align(FormatAlign::Right);

    sheet.write_string_with_format(0, 0, "Filtros", &label_format)?;
    sheet.write_string(0, 1, view.filters.to_string())?;

    write_headers(sheet, 2, &["Indicador", "Valor"])?;
    let k = &view.kpis;
    let kpis = [
        ("Gestiones", k.gestiones),
        ("Operaciones únicas", k.operaciones_unicas as i64),
        ("Contacto", k.contacto),
        ("Directo", k.directo),
        ("Compromisos", k.compromisos),
    ];
    let mut row = 3;
    for (label, value) in kpis {
        sheet.write_string(row, 0, label)?;
        sheet.write_number_with_format(row, 1, value as f64, &number_format)?;
        row += 1;
    }

    row += 1;
    write_headers(sheet, row, &["Embudo", "Cantidad"])?;
    row += 1;
    for (stage, value) in k.funnel() {
        sheet.write_string(row, 0, stage)?;
        sheet.write_number_with_format(row, 1, value as f64, &number_format)?;
        row += 1;
    }

    row += 1;
    write_counts(sheet, row, "TipoContacto", &view.contact_types)?;
    Ok(())
}

fn write_counts(sheet: &mut Worksheet, start: u32, label: &str, counts: &[ValueCount]) -> Result<()> {
    write_headers(sheet, start, &[label, "Cantidad"])?;
    for (i, c) in counts.iter().enumerate() {
        let row = start + 1 + i as u32;
        sheet.write_string(row, 0, &c.value)?;
        sheet.write_number(row, 1, c.count as f64)?;
    }
    Ok(())
}

fn write_agents_sheet(sheet: &mut Worksheet, view: &Overview) -> Result<()> {
    sheet.set_name("Gestores")?;

    let col_widths = [
        24, // Gestor
        10, // Gestiones
        8,  // CD
        12, // Compromisos
        16, // ContactoDirecto
        10, // % Directo
        4,
        24, // Gestor
        12, // Primera gestion
    ];
    for (col, width) in col_widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    let headers = ["Gestor", "Gestiones", "CD", "Compromisos", "ContactoDirecto", "% Directo"];
    write_headers(sheet, 0, &headers)?;

    let center_format = Format::new().set_align(FormatAlign::Center);
    let pct_format = Format::new().set_align(FormatAlign::Right).set_num_format("0.0");

    for (row_idx, agent) in view.agents.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string(row, 0, &agent.gestor)?;
        sheet.write_number_with_format(row, 1, agent.gestiones as f64, &center_format)?;
        sheet.write_number_with_format(row, 2, agent.cd as f64, &center_format)?;
        sheet.write_number_with_format(row, 3, agent.compromisos as f64, &center_format)?;
        sheet.write_number_with_format(row, 4, agent.contacto_directo as f64, &center_format)?;
        match agent.pct_directo {
            Some(pct) => sheet.write_number_with_format(row, 5, pct, &pct_format)?,
            None => sheet.write_string_with_format(row, 5, NOT_AVAILABLE, &center_format)?,
        };
    }

    // Red (low) -> Yellow (mid) -> Green (high)
    if !view.agents.is_empty() {
        let last_row = view.agents.len() as u32;
        let scale = ConditionalFormat3ColorScale::new()
            .set_minimum_color("F8696B")
            .set_midpoint_color("FFEB84")
            .set_maximum_color("63BE7B");
        sheet.add_conditional_format(1, 5, last_row, 5, &scale)?;
        sheet.autofilter(0, 0, last_row, (headers.len() - 1) as u16)?;
    }

    let header_format = header_format();
    sheet.write_string_with_format(0, 7, "Gestor", &header_format)?;
    sheet.write_string_with_format(0, 8, "Primera gestión", &header_format)?;
    for (row_idx, first) in view.first_gestion.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string(row, 7, &first.gestor)?;
        sheet.write_string_with_format(row, 8, &first.hora_gestion, &center_format)?;
    }

    Ok(())
}

fn write_crosstab_sheet(sheet: &mut Worksheet, ct: &CrossTab) -> Result<()> {
    sheet.set_name("Gestor x Hora")?;
    sheet.set_column_width(0, 24)?;

    let header_format = header_format();
    sheet.write_string_with_format(0, 0, "Gestor", &header_format)?;
    for (i, hour) in ct.hours.iter().enumerate() {
        sheet.write_string_with_format(0, (i + 1) as u16, CrossTab::hour_label(*hour), &header_format)?;
    }

    let center_format = Format::new().set_align(FormatAlign::Center);
    for (row_idx, (agent, cells)) in ct.agents.iter().zip(&ct.cells).enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string(row, 0, agent)?;
        for (i, value) in cells.iter().enumerate() {
            sheet.write_number_with_format(row, (i + 1) as u16, *value as f64, &center_format)?;
        }
    }

    if !ct.agents.is_empty() && !ct.hours.is_empty() {
        let scale = ConditionalFormat3ColorScale::new()
            .set_minimum_color("FFFFFF")
            .set_midpoint_color("FFEB84")
            .set_maximum_color("63BE7B");
        sheet.add_conditional_format(1, 1, ct.agents.len() as u32, ct.hours.len() as u16, &scale)?;
    }
    Ok(())
}

/// Dump a table as-is, nulls left blank
fn write_table_sheet(sheet: &mut Worksheet, name: &str, table: &Table) -> Result<()> {
    sheet.set_name(name)?;

    let headers: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    write_headers(sheet, 0, &headers)?;
    for col in 0..headers.len() {
        sheet.set_column_width(col as u16, 16)?;
    }

    let left_format = Format::new().set_align(FormatAlign::Left);
    for (row_idx, cells) in table.rows().iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, cell) in cells.iter().enumerate() {
            if let Some(value) = cell {
                sheet.write_string_with_format(row, col as u16, value, &left_format)?;
            }
        }
    }

    if !table.is_empty() && !headers.is_empty() {
        sheet.autofilter(0, 0, table.len() as u32, (headers.len() - 1) as u16)?;
    }
    Ok(())
}

fn write_comparison_sheet(sheet: &mut Worksheet, view: &Comparison) -> Result<()> {
    sheet.set_name("Comparativo")?;

    write_headers(sheet, 0, &["TipoContacto", "MesDia", "Gestiones"])?;
    sheet.set_column_width(0, 20)?;
    for (row_idx, r) in view.by_type.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        sheet.write_string(row, 0, &r.tipo_contacto)?;
        sheet.write_string(row, 1, &r.mes_dia)?;
        sheet.write_number(row, 2, r.gestiones as f64)?;
    }

    // Wide per-agent table below, one blank row apart
    let start = view.by_type.len() as u32 + 2;
    let names = view.by_agent.column_names();
    let headers: Vec<&str> = names.iter().map(String::as_str).collect();
    write_headers(sheet, start, &headers)?;

    let center_format = Format::new().set_align(FormatAlign::Center);
    for (row_idx, agent) in view.by_agent.agents.iter().enumerate() {
        let row = start + 1 + row_idx as u32;
        sheet.write_string(row, 0, &agent.gestor)?;
        for (day_idx, day) in agent.days.iter().enumerate() {
            let Some(m) = day else { continue };
            let col = (1 + day_idx * 4) as u16;
            sheet.write_number_with_format(row, col, m.gestiones as f64, &center_format)?;
            sheet.write_number_with_format(row, col + 1, m.contacto_directo as f64, &center_format)?;
            sheet.write_number_with_format(row, col + 2, m.compromisos as f64, &center_format)?;
            if let Some(ref hora) = m.first_hora {
                sheet.write_string_with_format(row, col + 3, hora, &center_format)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{overview, FilterSet};

    #[test]
    fn test_write_overview_workbook() {
        let t = Table::from_strs(
            &[
                "NumeroOperacion", "Gestor", "Hora", "HoraGestion", "TipoContacto",
                "Gestiones", "CD", "Contacto", "ContactoDirecto", "Compromisos",
            ],
            &[
                &["1", "Ana", "8", "08:00:00", "Directo", "1", "1", "1", "1", "0"],
                &["2", "Luis", "", "", "", "1", "0", "0", "0", "0"],
            ],
        );
        let view = overview(&t, &FilterSet::new()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.xlsx");
        write_views_to_xlsx(&view, None, None, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
